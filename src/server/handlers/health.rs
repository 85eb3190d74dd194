use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::server::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "similarity_builds": state.engine.similarity.completed_builds(),
        "clusters_loaded": state.engine.clusters.snapshot().is_some(),
    }))
}
