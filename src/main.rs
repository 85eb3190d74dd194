use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use marquee::config::Config;
use marquee::engine::Engine;
use marquee::server::routes::build_router;
use marquee::server::AppState;

#[tokio::main]
async fn main() {
    // Load .env
    let _ = dotenvy::dotenv();

    // Load config first (needed for logging setup)
    let config = Config::load(None).expect("failed to load config");

    // Initialize tracing from LoggingConfig
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .init();
        }
    }

    tracing::info!("marquee starting");
    marquee::metrics::init();

    // Catalog, cache, builders and cluster state (imports the cluster table if configured)
    let engine = Engine::from_config(&config)
        .await
        .expect("failed to initialize engine");

    if let Some(snapshot) = engine.clusters.snapshot() {
        tracing::info!(assigned = snapshot.len(), "cluster assignment imported");
    }

    let state = AppState {
        engine,
        config: Arc::new(config.clone()),
    };

    let app = build_router(state);

    // Bind and serve
    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(addr = %addr, "listening");

    let listener = TcpListener::bind(&addr)
        .await
        .expect("failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
