//! Pairwise similarity matrix: Pearson correlation over feature vectors, published row
//! by row to the cache under positional keys.

pub mod builder;
pub mod manifest;
pub mod matrix;
pub mod pearson;

pub use builder::{BuildReport, SimilarityMatrixBuilder};
pub use manifest::{row_key, SimilarityManifest, MANIFEST_KEY};
pub use matrix::SimilarityMatrix;
pub use pearson::{pearson, round_score};
