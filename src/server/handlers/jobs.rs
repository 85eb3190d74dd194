use std::path::PathBuf;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::cluster::{ClusterReport, SweepPoint};
use crate::error::MarqueeError;
use crate::server::AppState;
use crate::similarity::BuildReport;

use super::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct LoadClustersRequest {
    /// Exported cluster table. Falls back to `clustering.import_path`.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SweepRequest {
    #[serde(default)]
    pub min_k: Option<usize>,
    #[serde(default)]
    pub max_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub points: Vec<SweepPoint>,
}

#[instrument(skip(state))]
pub async fn rebuild_similarity(
    State(state): State<AppState>,
) -> Result<Json<BuildReport>, ApiError> {
    let report = state.engine.similarity.rebuild().await?;
    Ok(Json(report))
}

#[instrument(skip(state))]
pub async fn sync_similarity(
    State(state): State<AppState>,
) -> Result<Json<BuildReport>, ApiError> {
    let report = state.engine.similarity.sync_from_file().await?;
    Ok(Json(report))
}

#[instrument(skip(state))]
pub async fn compute_clusters(
    State(state): State<AppState>,
) -> Result<Json<ClusterReport>, ApiError> {
    let report = state.engine.assigner.compute().await?;
    Ok(Json(report))
}

#[instrument(skip(state, req))]
pub async fn load_clusters(
    State(state): State<AppState>,
    req: Option<Json<LoadClustersRequest>>,
) -> Result<Json<ClusterReport>, ApiError> {
    let req = req.map(|Json(r)| r).unwrap_or_default();
    let path = req
        .path
        .or_else(|| state.config.clustering.import_path.clone())
        .ok_or_else(|| {
            ApiError(MarqueeError::Validation(
                "'path' is required when clustering.import_path is not configured".into(),
            ))
        })?;
    let report = state.engine.assigner.load_from_file(&path).await?;
    Ok(Json(report))
}

#[instrument(skip(state, req))]
pub async fn sweep_clusters(
    State(state): State<AppState>,
    req: Option<Json<SweepRequest>>,
) -> Result<Json<SweepResponse>, ApiError> {
    let req = req.map(|Json(r)| r).unwrap_or_default();
    let clustering = &state.config.clustering;
    let min_k = req.min_k.unwrap_or(clustering.sweep_min_k);
    let max_k = req.max_k.unwrap_or(clustering.sweep_max_k);

    let points = state.engine.assigner.sweep(min_k, max_k).await?;
    Ok(Json(SweepResponse { points }))
}
