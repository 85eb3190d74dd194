use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::catalog::CatalogStore;
use crate::config::ClusteringConfig;
use crate::error::{MarqueeError, Result};
use crate::features::{FeaturePipeline, FeatureSet};
use crate::types::{ClusterLabel, MovieId};

use super::export;
use super::kmeans::MiniBatchKMeans;
use super::state::{ClusterAssignment, ClusterState};

/// Outcome of a cluster build or import.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterReport {
    pub assigned: usize,
    pub num_clusters: usize,
    pub inertia: Option<f64>,
    pub iterations: Option<usize>,
    pub export_path: Option<PathBuf>,
    pub elapsed_ms: u64,
}

/// Inertia for one cluster count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepPoint {
    pub k: usize,
    pub inertia: f64,
}

/// Computes or imports cluster assignments and installs them into a [`ClusterState`].
pub struct ClusterAssigner {
    catalog: Arc<dyn CatalogStore>,
    pipeline: Arc<FeaturePipeline>,
    state: Arc<ClusterState>,
    config: ClusteringConfig,
    build_lock: Mutex<()>,
}

impl ClusterAssigner {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        pipeline: Arc<FeaturePipeline>,
        state: Arc<ClusterState>,
        config: ClusteringConfig,
    ) -> Self {
        Self {
            catalog,
            pipeline,
            state,
            config,
            build_lock: Mutex::new(()),
        }
    }

    pub fn state(&self) -> &Arc<ClusterState> {
        &self.state
    }

    /// Cluster the sampled catalog and replace the current assignment.
    ///
    /// # Errors
    ///
    /// Returns `ClusterBuild` when the sample cannot be clustered. The current
    /// assignment is left untouched on any error.
    #[instrument(skip(self), fields(k = self.config.num_clusters))]
    pub async fn compute(&self) -> Result<ClusterReport> {
        let _guard = self.build_lock.lock().await;
        let start = Instant::now();

        let result = self.compute_locked(start).await;
        let status = if result.is_ok() { "success" } else { "error" };
        crate::metrics::CLUSTER_BUILDS_TOTAL
            .with_label_values(&["compute", status])
            .inc();
        result
    }

    async fn compute_locked(&self, start: Instant) -> Result<ClusterReport> {
        let features = self.sample_features().await?;
        let n = features.len();
        let kmeans = MiniBatchKMeans::new(
            self.config.num_clusters,
            self.config.max_batch_size.min(n),
            self.config.seed,
        )
        .with_max_iterations(self.config.max_iterations)
        .with_tolerance(self.config.tolerance);

        let (model, ids) = tokio::task::spawn_blocking(move || {
            let model = kmeans.fit(&features.vectors)?;
            Ok::<_, MarqueeError>((model, features.ids))
        })
        .await
        .map_err(|e| MarqueeError::Internal(format!("cluster build task failed: {e}")))??;

        let labels: HashMap<MovieId, ClusterLabel> = ids
            .into_iter()
            .zip(&model.labels)
            .map(|(id, &label)| (id, label as ClusterLabel))
            .collect();
        let mut assignment = ClusterAssignment::new(labels, Some(model.inertia));
        assignment.num_clusters = model.k();

        let export_path = match &self.config.export_dir {
            Some(dir) => Some(self.export(&assignment, dir).await?),
            None => None,
        };

        let report = ClusterReport {
            assigned: assignment.len(),
            num_clusters: assignment.num_clusters,
            inertia: assignment.inertia,
            iterations: Some(model.iterations),
            export_path,
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        self.state.replace(assignment);

        info!(
            assigned = report.assigned,
            inertia = model.inertia,
            iterations = model.iterations,
            elapsed_ms = report.elapsed_ms,
            "cluster assignment computed"
        );
        Ok(report)
    }

    /// Replace the current assignment with one read from an exported table.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn load_from_file(&self, path: &Path) -> Result<ClusterReport> {
        let _guard = self.build_lock.lock().await;
        let start = Instant::now();

        let result = match tokio::fs::read(path).await {
            Ok(data) => export::from_csv(&data),
            Err(e) => Err(MarqueeError::from(e)),
        };
        let status = if result.is_ok() { "success" } else { "error" };
        crate::metrics::CLUSTER_BUILDS_TOTAL
            .with_label_values(&["load", status])
            .inc();

        let assignment = ClusterAssignment::new(result?, None);
        let report = ClusterReport {
            assigned: assignment.len(),
            num_clusters: assignment.num_clusters,
            inertia: None,
            iterations: None,
            export_path: None,
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        self.state.replace(assignment);

        info!(assigned = report.assigned, "cluster assignment loaded");
        Ok(report)
    }

    /// Fit once per k in `min_k..=max_k` and report the inertia of each. Stops early
    /// once k exceeds the sample size. Does not touch the current assignment.
    #[instrument(skip(self))]
    pub async fn sweep(&self, min_k: usize, max_k: usize) -> Result<Vec<SweepPoint>> {
        if min_k == 0 || min_k > max_k {
            return Err(MarqueeError::Validation(format!(
                "invalid sweep range {min_k}..={max_k}"
            )));
        }

        let features = self.sample_features().await?;
        let n = features.len();
        let config = self.config.clone();

        let points = tokio::task::spawn_blocking(move || {
            let mut points = Vec::new();
            for k in min_k..=max_k {
                if k > n {
                    break;
                }
                let model = MiniBatchKMeans::new(k, config.max_batch_size.min(n), config.seed)
                    .with_max_iterations(config.max_iterations)
                    .with_tolerance(config.tolerance)
                    .fit(&features.vectors)?;
                info!(k, inertia = model.inertia, "sweep point");
                points.push(SweepPoint {
                    k,
                    inertia: model.inertia,
                });
            }
            Ok::<_, MarqueeError>(points)
        })
        .await
        .map_err(|e| MarqueeError::Internal(format!("cluster sweep task failed: {e}")))??;

        Ok(points)
    }

    async fn sample_features(&self) -> Result<FeatureSet> {
        let items = self.catalog.feature_items(self.config.sample_limit).await?;
        debug!(sample = items.len(), "clustering sample loaded");
        let pipeline = self.pipeline.clone();
        tokio::task::spawn_blocking(move || pipeline.build(&items, true))
            .await
            .map_err(|e| MarqueeError::Internal(format!("feature task failed: {e}")))?
    }

    async fn export(&self, assignment: &ClusterAssignment, dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let name = format!(
            "clusters-{}.csv",
            chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ")
        );
        let path = dir.join(name);
        tokio::fs::write(&path, export::to_csv(assignment)?).await?;
        debug!(path = %path.display(), "cluster assignment exported");
        Ok(path)
    }
}
