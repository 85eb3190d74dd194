use serde::{Deserialize, Serialize};

use crate::cache::{self, CacheStore};
use crate::error::Result;
use crate::types::MovieId;

/// Prefix shared by every similarity row key.
pub const ROW_KEY_PREFIX: &str = "SimilarityItems-";

/// Key of the publish manifest. Never collides with a row key since rows are numeric.
pub const MANIFEST_KEY: &str = "SimilarityItems-manifest";

/// Cache key of the similarity row at catalog position `index`.
pub fn row_key(index: usize) -> String {
    format!("{ROW_KEY_PREFIX}{index}")
}

/// What the last completed publish wrote: the row count and the id order the rows
/// were built against.
///
/// The manifest is removed first and written last by a publish, so its presence means
/// every row below `row_count` belongs to the same build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarityManifest {
    pub row_count: usize,
    pub movie_ids: Vec<MovieId>,
}

impl SimilarityManifest {
    pub fn new(movie_ids: Vec<MovieId>) -> Self {
        Self {
            row_count: movie_ids.len(),
            movie_ids,
        }
    }

    /// Whether rows were built against exactly this id order.
    pub fn matches(&self, order: &[MovieId]) -> bool {
        self.row_count == order.len() && self.movie_ids == order
    }

    /// Read the manifest. Returns `None` if none has been published.
    pub async fn read(cache: &dyn CacheStore) -> Result<Option<Self>> {
        cache::get_json(cache, MANIFEST_KEY).await
    }

    pub async fn write(&self, cache: &dyn CacheStore) -> Result<()> {
        cache::set_json(cache, MANIFEST_KEY, self).await
    }

    pub async fn remove(cache: &dyn CacheStore) -> Result<()> {
        cache.remove(MANIFEST_KEY).await
    }
}
