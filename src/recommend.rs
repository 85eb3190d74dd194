//! Movie id to ranked neighbors.
//!
//! A movie with a cluster label is answered from its cluster co-members. Otherwise its
//! similarity row is read from the cache and ranked. A missing or stale row is handled
//! according to the configured [`RebuildPolicy`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::catalog::CatalogStore;
use crate::cluster::ClusterState;
use crate::config::RebuildPolicy;
use crate::error::{MarqueeError, Result};
use crate::similarity::SimilarityMatrixBuilder;
use crate::types::{Movie, MovieId, RecommendationSource};

/// A resolved recommendation, with the records in rank order.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub movie_id: MovieId,
    pub source: RecommendationSource,
    pub movies: Vec<Movie>,
}

pub struct RecommendationResolver {
    catalog: Arc<dyn CatalogStore>,
    builder: Arc<SimilarityMatrixBuilder>,
    clusters: Arc<ClusterState>,
    policy: RebuildPolicy,
    rebuilds: AtomicU64,
}

impl RecommendationResolver {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        builder: Arc<SimilarityMatrixBuilder>,
        clusters: Arc<ClusterState>,
        policy: RebuildPolicy,
    ) -> Self {
        Self {
            catalog,
            builder,
            clusters,
            policy,
            rebuilds: AtomicU64::new(0),
        }
    }

    /// Rebuilds run or started by lookups, in either blocking or background mode.
    /// A lookup that finds the rows already rebuilt by a concurrent lookup is not counted.
    pub fn rebuilds_triggered(&self) -> u64 {
        self.rebuilds.load(Ordering::SeqCst)
    }

    /// Up to `top_n` movies similar to `movie_id`, best first.
    pub async fn recommend(&self, movie_id: MovieId, top_n: usize) -> Result<Vec<Movie>> {
        Ok(self.resolve(movie_id, top_n).await?.movies)
    }

    /// Resolve `movie_id` to ranked neighbors and report where they came from.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when `movie_id` is not part of the current catalog order.
    /// Missing similarity or cluster data never fails a lookup; it yields an empty
    /// result instead.
    #[instrument(skip(self))]
    pub async fn resolve(&self, movie_id: MovieId, top_n: usize) -> Result<Resolution> {
        let order = self.builder.row_order().await?;
        let position = order
            .binary_search(&movie_id)
            .map_err(|_| MarqueeError::NotFound { movie_id })?;

        let (source, ids) = match self.cluster_neighbors(movie_id, &order) {
            Some(mut members) => {
                members.truncate(top_n);
                (RecommendationSource::Cluster, members)
            }
            None => match self.load_row(position, &order).await {
                Some(scores) => (
                    RecommendationSource::Similarity,
                    rank_neighbors(&order, &scores, movie_id, top_n),
                ),
                None => (RecommendationSource::Empty, Vec::new()),
            },
        };

        let movies = self.catalog.get_many(&ids).await?;
        crate::metrics::RECOMMENDATIONS_TOTAL
            .with_label_values(&[source.to_string().as_str()])
            .inc();

        if tracing::enabled!(tracing::Level::DEBUG) {
            let title = self
                .catalog
                .get(movie_id)
                .await
                .ok()
                .flatten()
                .map(|m| m.title)
                .unwrap_or_default();
            let neighbors: Vec<&str> = movies.iter().map(|m| m.title.as_str()).collect();
            debug!(%source, title = %title, ?neighbors, "recommendations resolved");
        }

        Ok(Resolution {
            movie_id,
            source,
            movies,
        })
    }

    fn cluster_neighbors(&self, movie_id: MovieId, order: &[MovieId]) -> Option<Vec<MovieId>> {
        self.clusters.snapshot()?.co_members(movie_id, order)
    }

    /// The similarity row at `position`, rebuilding the matrix on a miss when the
    /// policy allows it.
    async fn load_row(&self, position: usize, order: &[MovieId]) -> Option<Vec<f64>> {
        let seen = self.builder.completed_builds();
        match self.read_valid_row(position, order).await {
            Ok(Some(row)) => return Some(row),
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, position, "similarity row read failed");
                return None;
            }
        }

        match self.policy {
            RebuildPolicy::Blocking => {
                // Runs detached: dropping this lookup does not cancel the publish.
                let builder = Arc::clone(&self.builder);
                let rebuild = tokio::spawn(async move { builder.rebuild_if_stale(seen).await });
                match rebuild.await {
                    Ok(Ok(Some(_))) => {
                        self.rebuilds.fetch_add(1, Ordering::SeqCst);
                    }
                    Ok(Ok(None)) => {}
                    Ok(Err(e)) => {
                        warn!(error = %e, "similarity rebuild on miss failed");
                        return None;
                    }
                    Err(e) => {
                        warn!(error = %e, "similarity rebuild task failed");
                        return None;
                    }
                }
                match self.read_valid_row(position, order).await {
                    Ok(row) => row,
                    Err(e) => {
                        warn!(error = %e, position, "similarity row read failed after rebuild");
                        None
                    }
                }
            }
            RebuildPolicy::Background => {
                if self.builder.spawn_rebuild_if_idle() {
                    self.rebuilds.fetch_add(1, Ordering::SeqCst);
                }
                None
            }
            RebuildPolicy::Disabled => None,
        }
    }

    /// Read the row at `position`. A row is a miss when absent, when its length does
    /// not match `order`, or when the manifest says it was built against another order.
    async fn read_valid_row(&self, position: usize, order: &[MovieId]) -> Result<Option<Vec<f64>>> {
        let lookups = &crate::metrics::SIMILARITY_LOOKUPS_TOTAL;

        if let Some(manifest) = self.builder.read_manifest().await? {
            if !manifest.matches(order) {
                debug!(
                    published = manifest.row_count,
                    current = order.len(),
                    "similarity rows built against a different catalog order"
                );
                lookups.with_label_values(&["stale"]).inc();
                return Ok(None);
            }
        }

        match self.builder.read_row(position).await? {
            Some(row) if row.len() == order.len() => {
                lookups.with_label_values(&["hit"]).inc();
                Ok(Some(row))
            }
            Some(row) => {
                debug!(len = row.len(), expected = order.len(), "stale similarity row");
                lookups.with_label_values(&["stale"]).inc();
                Ok(None)
            }
            None => {
                lookups.with_label_values(&["miss"]).inc();
                Ok(None)
            }
        }
    }
}

/// Rank `order` by `scores` descending, excluding `movie_id`, and keep `top_n`.
/// Equal scores keep catalog order.
pub fn rank_neighbors(
    order: &[MovieId],
    scores: &[f64],
    movie_id: MovieId,
    top_n: usize,
) -> Vec<MovieId> {
    let mut ranked: Vec<(MovieId, f64)> = order
        .iter()
        .copied()
        .zip(scores.iter().copied())
        .filter(|&(id, _)| id != movie_id)
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.into_iter().take(top_n).map(|(id, _)| id).collect()
}
