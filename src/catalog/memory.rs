use std::collections::BTreeMap;
use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::info;

use crate::error::{MarqueeError, Result};
use crate::types::{CatalogItem, Movie, MovieId};

use super::decode::decode_rows;
use super::CatalogStore;

/// Catalog held in memory, keyed and ordered by id.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    movies: RwLock<BTreeMap<MovieId, Movie>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_movies(movies: impl IntoIterator<Item = Movie>) -> Self {
        let movies = movies.into_iter().map(|m| (m.id, m)).collect();
        Self {
            movies: RwLock::new(movies),
        }
    }

    /// Load a JSON array of catalog rows. Structured fields are decoded here; a
    /// malformed field fails the whole load.
    pub async fn from_json_file(path: &Path) -> Result<Self> {
        let data = tokio::fs::read(path).await?;
        let movies = decode_rows(&data)?;
        info!(path = %path.display(), movies = movies.len(), "catalog loaded");
        Ok(Self::from_movies(movies))
    }

    /// Insert or replace a record.
    pub fn upsert(&self, movie: Movie) -> Result<()> {
        self.write()?.insert(movie.id, movie);
        Ok(())
    }

    /// Remove a record, returning it if present.
    pub fn remove(&self, id: MovieId) -> Result<Option<Movie>> {
        Ok(self.write()?.remove(&id))
    }

    pub fn len(&self) -> usize {
        self.movies.read().map(|m| m.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, BTreeMap<MovieId, Movie>>> {
        self.movies
            .read()
            .map_err(|_| MarqueeError::Internal("catalog lock poisoned".into()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, BTreeMap<MovieId, Movie>>> {
        self.movies
            .write()
            .map_err(|_| MarqueeError::Internal("catalog lock poisoned".into()))
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn ordered_ids(&self, limit: Option<usize>) -> Result<Vec<MovieId>> {
        let movies = self.read()?;
        Ok(movies
            .values()
            .filter(|m| m.displayable)
            .take(limit.unwrap_or(usize::MAX))
            .map(|m| m.id)
            .collect())
    }

    async fn feature_items(&self, limit: Option<usize>) -> Result<Vec<CatalogItem>> {
        let movies = self.read()?;
        Ok(movies
            .values()
            .filter(|m| m.displayable)
            .take(limit.unwrap_or(usize::MAX))
            .map(CatalogItem::from)
            .collect())
    }

    async fn get(&self, id: MovieId) -> Result<Option<Movie>> {
        Ok(self.read()?.get(&id).cloned())
    }

    async fn get_many(&self, ids: &[MovieId]) -> Result<Vec<Movie>> {
        let movies = self.read()?;
        Ok(ids.iter().filter_map(|id| movies.get(id).cloned()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> MemoryCatalog {
        let mut hidden = Movie::new(2, "Hidden");
        hidden.displayable = false;
        MemoryCatalog::from_movies(vec![
            Movie::new(30, "C"),
            Movie::new(1, "A"),
            hidden,
            Movie::new(7, "B"),
        ])
    }

    #[tokio::test]
    async fn test_ordered_ids_ascending_and_displayable_only() {
        let catalog = catalog();
        assert_eq!(catalog.ordered_ids(None).await.unwrap(), vec![1, 7, 30]);
        assert_eq!(catalog.ordered_ids(Some(2)).await.unwrap(), vec![1, 7]);
    }

    #[tokio::test]
    async fn test_feature_items_follow_ordered_ids() {
        let catalog = catalog();
        let ids: Vec<MovieId> = catalog
            .feature_items(None)
            .await
            .unwrap()
            .iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, catalog.ordered_ids(None).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_many_preserves_request_order() {
        let catalog = catalog();
        let titles: Vec<String> = catalog
            .get_many(&[30, 99, 1])
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.title)
            .collect();
        assert_eq!(titles, vec!["C", "A"]);
    }

    #[tokio::test]
    async fn test_upsert_and_remove() {
        let catalog = catalog();
        catalog.upsert(Movie::new(4, "D")).unwrap();
        assert_eq!(catalog.ordered_ids(None).await.unwrap(), vec![1, 4, 7, 30]);
        assert!(catalog.remove(1).unwrap().is_some());
        assert!(catalog.get(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_from_json_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"[{"id": 2, "title": "B", "genres": "[{\"id\": 18, \"name\": \"Drama\"}]"},
                {"id": 1, "title": "A"}]"#,
        )
        .unwrap();

        let catalog = MemoryCatalog::from_json_file(&path).await.unwrap();
        assert_eq!(catalog.len(), 2);
        let b = catalog.get(2).await.unwrap().unwrap();
        assert_eq!(b.genres[0].name, "Drama");
    }
}
