//! Text normalization: label construction for structured credits and stemmed tokens
//! for synopsis text.

pub mod normalizer;
pub mod stopwords;

pub use normalizer::TextNormalizer;
pub use stopwords::StopWords;
