use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::MarqueeError;
use crate::server::AppState;
use crate::types::{Movie, MovieId, RecommendationSource};

use super::ApiError;

#[derive(Debug, Deserialize)]
pub struct RecommendationParams {
    /// Number of recommendations. Defaults to `server.default_top_n`, capped at
    /// `server.max_top_n`.
    #[serde(default)]
    pub top: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub movie_id: MovieId,
    pub source: RecommendationSource,
    pub top: usize,
    pub movies: Vec<Movie>,
}

#[instrument(skip(state))]
pub async fn get_movie(
    State(state): State<AppState>,
    Path(id): Path<MovieId>,
) -> Result<Json<Movie>, ApiError> {
    let movie = state
        .engine
        .catalog
        .get(id)
        .await?
        .ok_or(MarqueeError::NotFound { movie_id: id })?;
    Ok(Json(movie))
}

#[instrument(skip(state, params), fields(top = ?params.top))]
pub async fn get_recommendations(
    State(state): State<AppState>,
    Path(id): Path<MovieId>,
    Query(params): Query<RecommendationParams>,
) -> Result<Json<RecommendationResponse>, ApiError> {
    let start = std::time::Instant::now();
    let server = &state.config.server;
    let top = params
        .top
        .unwrap_or(server.default_top_n)
        .min(server.max_top_n);

    let resolution = state.engine.resolver.resolve(id, top).await?;

    info!(
        movie_id = id,
        source = %resolution.source,
        returned = resolution.movies.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "recommendations served"
    );

    Ok(Json(RecommendationResponse {
        movie_id: resolution.movie_id,
        source: resolution.source,
        top,
        movies: resolution.movies,
    }))
}
