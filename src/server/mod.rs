pub mod handlers;
pub mod routes;

use std::sync::Arc;

use crate::config::Config;
use crate::engine::Engine;

/// Shared application state injected into all handlers via axum's State extractor.
#[derive(Clone)]
pub struct AppState {
    pub engine: Engine,
    pub config: Arc<Config>,
}
