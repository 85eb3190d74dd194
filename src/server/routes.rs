use std::time::Duration;

use axum::extract::{DefaultBodyLimit, MatchedPath, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::handlers::{health, jobs, metrics, movies};
use super::AppState;

pub fn build_router(state: AppState) -> Router {
    let server = &state.config.server;

    // Batch jobs and recommendations (which may rebuild the matrix on a miss) run
    // to completion. Only plain reads get a timeout.
    let reads = Router::new()
        .route("/healthz", get(health::health_check))
        .route("/metrics", get(metrics::metrics_handler))
        .route("/v1/movies/:id", get(movies::get_movie))
        .layer(TimeoutLayer::new(Duration::from_secs(
            server.request_timeout_secs,
        )));

    let recommendations = Router::new().route(
        "/v1/movies/:id/recommendations",
        get(movies::get_recommendations),
    );

    let job_routes = Router::new()
        .route("/v1/jobs/similarity/rebuild", post(jobs::rebuild_similarity))
        .route("/v1/jobs/similarity/sync", post(jobs::sync_similarity))
        .route("/v1/jobs/clusters/compute", post(jobs::compute_clusters))
        .route("/v1/jobs/clusters/load", post(jobs::load_clusters))
        .route("/v1/jobs/clusters/sweep", post(jobs::sweep_clusters));

    Router::new()
        .merge(reads)
        .merge(recommendations)
        .merge(job_routes)
        .layer(middleware::from_fn(track_requests))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(server.max_body_bytes)),
        )
        .with_state(state)
}

async fn track_requests(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;
    crate::metrics::HTTP_REQUESTS_TOTAL
        .with_label_values(&[method.as_str(), path.as_str(), response.status().as_str()])
        .inc();
    response
}
