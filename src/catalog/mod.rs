//! Read-only access to the movie catalog.
//!
//! The engine depends on one property of the catalog: displayable items are served in
//! ascending id order, and that order stays fixed for the duration of a build.

pub mod decode;
pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{CatalogItem, Movie, MovieId};

pub use decode::RawMovieRow;
pub use memory::MemoryCatalog;

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Ids of displayable items in ascending order, truncated to `limit`.
    async fn ordered_ids(&self, limit: Option<usize>) -> Result<Vec<MovieId>>;

    /// Feature projections of displayable items in ascending id order, truncated to `limit`.
    async fn feature_items(&self, limit: Option<usize>) -> Result<Vec<CatalogItem>>;

    /// Look up one record. `None` when the id has no catalog entry.
    async fn get(&self, id: MovieId) -> Result<Option<Movie>>;

    /// Look up several records, preserving the order of `ids` and skipping unknown ids.
    async fn get_many(&self, ids: &[MovieId]) -> Result<Vec<Movie>>;
}
