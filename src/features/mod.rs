//! Feature extraction: catalog items to aligned TF-IDF vectors.

pub mod vectorizer;

use rayon::prelude::*;
use tracing::debug;

use crate::config::FeatureConfig;
use crate::error::{MarqueeError, Result};
use crate::text::TextNormalizer;
use crate::types::{CatalogItem, FeatureVector, MovieId};

pub use vectorizer::{TfIdfModel, TfIdfVectorizer};

/// Vectors for a batch of catalog items. `ids[i]` owns `vectors[i]`.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    pub ids: Vec<MovieId>,
    pub vectors: Vec<FeatureVector>,
    pub vocabulary_size: usize,
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Normalizer plus vectorizer.
#[derive(Debug)]
pub struct FeaturePipeline {
    normalizer: TextNormalizer,
}

impl FeaturePipeline {
    pub fn new(config: &FeatureConfig) -> Self {
        Self {
            normalizer: TextNormalizer::new(config),
        }
    }

    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    /// Tokenize and vectorize `items`, which must be in strictly ascending id order.
    pub fn build(&self, items: &[CatalogItem], restrict_to_frequent: bool) -> Result<FeatureSet> {
        if let Some(pair) = items.windows(2).find(|w| w[0].id >= w[1].id) {
            return Err(MarqueeError::Catalog(format!(
                "catalog items out of order: {} before {}",
                pair[0].id, pair[1].id
            )));
        }

        let corpus: Vec<Vec<String>> = items
            .par_iter()
            .map(|item| self.normalizer.tokens(item))
            .collect();

        let (model, vectors) = TfIdfVectorizer::new(restrict_to_frequent).fit_transform(&corpus);

        for (item, vector) in items.iter().zip(&vectors) {
            if vector.iter().any(|w| !w.is_finite()) {
                return Err(MarqueeError::MalformedFeatureData {
                    movie_id: item.id,
                    reason: "non-finite term weight".into(),
                });
            }
        }

        debug!(
            items = items.len(),
            vocabulary = model.vocabulary_size(),
            restrict_to_frequent,
            "feature vectors built"
        );

        Ok(FeatureSet {
            ids: items.iter().map(|i| i.id).collect(),
            vectors,
            vocabulary_size: model.vocabulary_size(),
        })
    }
}
