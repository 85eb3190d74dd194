use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::cache::{self, CacheStore};
use crate::catalog::CatalogStore;
use crate::config::SimilarityConfig;
use crate::error::{MarqueeError, Result};
use crate::features::FeaturePipeline;
use crate::types::MovieId;

use super::manifest::{row_key, SimilarityManifest};
use super::matrix::SimilarityMatrix;

/// Summary of a completed publish.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub rows: usize,
    pub vocabulary_size: Option<usize>,
    pub purged_keys: usize,
    pub elapsed_ms: u64,
}

/// Builds the similarity matrix from the catalog and publishes it to the cache.
///
/// Builds are serialized by an internal lock. A build computes the full matrix before
/// touching the cache, so a failure leaves the previous publish in place.
pub struct SimilarityMatrixBuilder {
    catalog: Arc<dyn CatalogStore>,
    cache: Arc<dyn CacheStore>,
    pipeline: Arc<FeaturePipeline>,
    config: SimilarityConfig,
    build_lock: Mutex<()>,
    background: AtomicBool,
    completed: AtomicU64,
}

impl SimilarityMatrixBuilder {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        cache: Arc<dyn CacheStore>,
        pipeline: Arc<FeaturePipeline>,
        config: SimilarityConfig,
    ) -> Self {
        Self {
            catalog,
            cache,
            pipeline,
            config,
            build_lock: Mutex::new(()),
            background: AtomicBool::new(false),
            completed: AtomicU64::new(0),
        }
    }

    /// Catalog ids in the order rows are built against.
    pub async fn row_order(&self) -> Result<Vec<MovieId>> {
        self.catalog.ordered_ids(self.config.max_items).await
    }

    /// Number of publishes that have completed since start-up.
    pub fn completed_builds(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    /// Whether a background rebuild is running.
    pub fn is_rebuilding(&self) -> bool {
        self.background.load(Ordering::SeqCst)
    }

    /// Read one published row.
    pub async fn read_row(&self, index: usize) -> Result<Option<Vec<f64>>> {
        cache::get_json(self.cache.as_ref(), &row_key(index)).await
    }

    pub async fn read_manifest(&self) -> Result<Option<SimilarityManifest>> {
        SimilarityManifest::read(self.cache.as_ref()).await
    }

    /// Recompute the matrix from the catalog and publish it.
    #[instrument(skip(self))]
    pub async fn rebuild(&self) -> Result<BuildReport> {
        let _guard = self.build_lock.lock().await;
        self.timed_rebuild().await
    }

    /// Rebuild unless a build that completed after `seen` builds already published
    /// rows for the current catalog order. Returns `None` when the rebuild was skipped.
    ///
    /// Callers read `completed_builds()` before looking at the cache, so lookups that
    /// miss together while one of them rebuilds do not each start another build.
    #[instrument(skip(self))]
    pub async fn rebuild_if_stale(&self, seen: u64) -> Result<Option<BuildReport>> {
        let _guard = self.build_lock.lock().await;
        if self.completed_builds() != seen && self.published_for_current_order().await? {
            debug!(seen, "similarity rows already rebuilt for the current order");
            return Ok(None);
        }
        self.timed_rebuild().await.map(Some)
    }

    async fn published_for_current_order(&self) -> Result<bool> {
        let order = self.row_order().await?;
        Ok(self
            .read_manifest()
            .await?
            .is_some_and(|manifest| manifest.matches(&order)))
    }

    async fn timed_rebuild(&self) -> Result<BuildReport> {
        let start = Instant::now();

        let result = self.rebuild_locked(start).await;
        let status = if result.is_ok() { "success" } else { "error" };
        crate::metrics::SIMILARITY_BUILDS_TOTAL
            .with_label_values(&["rebuild", status])
            .inc();
        crate::metrics::SIMILARITY_BUILD_DURATION.observe(start.elapsed().as_secs_f64());
        result
    }

    async fn rebuild_locked(&self, start: Instant) -> Result<BuildReport> {
        let items = self.catalog.feature_items(self.config.max_items).await?;
        info!(items = items.len(), "building similarity matrix");

        let pipeline = self.pipeline.clone();
        let (matrix, vocabulary_size) = tokio::task::spawn_blocking(move || {
            let features = pipeline.build(&items, false)?;
            let vocabulary_size = features.vocabulary_size;
            let matrix = SimilarityMatrix::compute(features.ids, &features.vectors)?;
            Ok::<_, MarqueeError>((matrix, vocabulary_size))
        })
        .await
        .map_err(|e| MarqueeError::Internal(format!("similarity build task failed: {e}")))??;

        debug!(
            rows = matrix.len(),
            vocabulary_size,
            compute_ms = start.elapsed().as_millis() as u64,
            "similarity matrix computed"
        );

        if let Some(path) = &self.config.export_path {
            let data = matrix.to_csv()?;
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path, data).await?;
            debug!(path = %path.display(), "similarity matrix exported");
        }

        let purged_keys = self.publish(&matrix).await?;
        let report = BuildReport {
            rows: matrix.len(),
            vocabulary_size: Some(vocabulary_size),
            purged_keys,
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            rows = report.rows,
            purged_keys,
            elapsed_ms = report.elapsed_ms,
            "similarity matrix published"
        );
        Ok(report)
    }

    /// Republish the exported CSV matrix without recomputing it.
    #[instrument(skip(self))]
    pub async fn sync_from_file(&self) -> Result<BuildReport> {
        let _guard = self.build_lock.lock().await;
        let start = Instant::now();

        let result = self.sync_locked(start).await;
        let status = if result.is_ok() { "success" } else { "error" };
        crate::metrics::SIMILARITY_BUILDS_TOTAL
            .with_label_values(&["sync", status])
            .inc();
        result
    }

    async fn sync_locked(&self, start: Instant) -> Result<BuildReport> {
        let path = self.config.export_path.as_ref().ok_or_else(|| {
            MarqueeError::Validation("similarity.export_path is not configured".into())
        })?;
        let data = tokio::fs::read(path).await?;
        let order = self.row_order().await?;
        let matrix = SimilarityMatrix::from_csv(order, &data)?;

        let purged_keys = self.publish(&matrix).await?;
        let report = BuildReport {
            rows: matrix.len(),
            vocabulary_size: None,
            purged_keys,
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            path = %path.display(),
            rows = report.rows,
            "similarity matrix synced from file"
        );
        Ok(report)
    }

    /// Start a rebuild on the runtime unless one is already running from here.
    /// Returns whether a rebuild was started.
    pub fn spawn_rebuild_if_idle(self: &Arc<Self>) -> bool {
        if self
            .background
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }

        let builder = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = builder.rebuild().await {
                warn!(error = %e, "background similarity rebuild failed");
            }
            builder.background.store(false, Ordering::SeqCst);
        });
        true
    }

    /// Replace the published rows with `matrix`. Returns the number of keys purged.
    ///
    /// The manifest goes first and comes back last, so readers never see a manifest
    /// describing a half-written set of rows.
    async fn publish(&self, matrix: &SimilarityMatrix) -> Result<usize> {
        let cache = self.cache.as_ref();
        let concurrency = self.config.publish_concurrency.max(1);
        let n = matrix.len();

        let payloads = (0..n)
            .filter_map(|i| matrix.row(i))
            .map(|row| -> Result<(String, String)> {
                Ok((row_key(row.row_index), serde_json::to_string(&row.scores)?))
            })
            .collect::<Result<Vec<_>>>()?;

        let previous = match SimilarityManifest::read(cache).await {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!(error = %e, "unreadable similarity manifest, purging up to the configured bound");
                None
            }
        };
        let bound = match &previous {
            Some(manifest) => manifest.row_count.max(n),
            None => self.config.purge_upper_bound.max(n),
        };

        SimilarityManifest::remove(cache).await?;

        stream::iter(0..bound)
            .map(|i| {
                let cache = Arc::clone(&self.cache);
                async move { cache.remove(&row_key(i)).await }
            })
            .buffer_unordered(concurrency)
            .try_collect::<Vec<()>>()
            .await?;
        debug!(purged = bound, "old similarity rows purged");

        let written = Arc::new(AtomicUsize::new(0));
        let step = (n / 10).max(1);
        let start = Instant::now();
        stream::iter(payloads)
            .map(|(key, value)| {
                let cache = Arc::clone(&self.cache);
                let written = Arc::clone(&written);
                async move {
                    cache.set(&key, value).await?;
                    let done = written.fetch_add(1, Ordering::Relaxed) + 1;
                    if done % step == 0 {
                        let elapsed = start.elapsed().as_secs_f64();
                        let eta = elapsed / done as f64 * (n - done) as f64;
                        debug!(done, total = n, eta_secs = eta, "writing similarity rows");
                    }
                    Ok::<_, MarqueeError>(())
                }
            })
            .buffer_unordered(concurrency)
            .try_collect::<Vec<()>>()
            .await?;

        SimilarityManifest::new(matrix.ids().to_vec())
            .write(cache)
            .await?;

        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(bound)
    }
}
