mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::net::TcpListener;

use common::movies::sample_movies;
use common::{test_config, TestHarness};

use marquee::config::Config;
use marquee::server::routes::build_router;
use marquee::server::AppState;

/// Start a test server on a random port, returning (base_url, harness).
async fn start_test_server() -> (String, TestHarness) {
    start_test_server_with(test_config()).await
}

async fn start_test_server_with(config: Config) -> (String, TestHarness) {
    let harness = TestHarness::with_config(sample_movies(), config.clone());
    serve(harness, config).await
}

async fn serve(harness: TestHarness, config: Config) -> (String, TestHarness) {
    let state = AppState {
        engine: harness.engine.clone(),
        config: Arc::new(config),
    };

    let app = build_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{addr}");

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (base_url, harness)
}

#[tokio::test]
async fn test_health_check() {
    let (base_url, _harness) = start_test_server().await;

    let resp = reqwest::get(format!("{base_url}/healthz")).await.unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["similarity_builds"], 0);
}

#[tokio::test]
async fn test_get_movie() {
    let (base_url, _harness) = start_test_server().await;

    let resp = reqwest::get(format!("{base_url}/v1/movies/30")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["id"], 30);
    assert_eq!(body["title"], "Orbit");
    assert_eq!(body["genres"][0]["name"], "Science Fiction");

    let resp = reqwest::get(format!("{base_url}/v1/movies/999")).await.unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], 404);
    assert!(body["error"].as_str().unwrap().contains("999"));
}

#[tokio::test]
async fn test_recommendations_rebuild_on_first_request() {
    let (base_url, harness) = start_test_server().await;

    let resp = reqwest::get(format!("{base_url}/v1/movies/10/recommendations?top=2"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["movie_id"], 10);
    assert_eq!(body["source"], "similarity");
    assert_eq!(body["top"], 2);

    let movies = body["movies"].as_array().unwrap();
    assert_eq!(movies.len(), 2);
    assert_eq!(movies[0]["id"], 20);
    assert!(movies.iter().all(|m| m["id"] != 10));

    assert_eq!(harness.engine.similarity.completed_builds(), 1);
}

#[tokio::test]
async fn test_recommendations_default_and_capped_top() {
    let mut config = test_config();
    config.server.default_top_n = 3;
    config.server.max_top_n = 4;
    let (base_url, _harness) = start_test_server_with(config).await;

    let body: Value = reqwest::get(format!("{base_url}/v1/movies/10/recommendations"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["top"], 3);
    assert_eq!(body["movies"].as_array().unwrap().len(), 3);

    let body: Value = reqwest::get(format!("{base_url}/v1/movies/10/recommendations?top=50"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["top"], 4);
    assert_eq!(body["movies"].as_array().unwrap().len(), 4);

    let body: Value = reqwest::get(format!("{base_url}/v1/movies/10/recommendations?top=0"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["movies"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_slow_rebuild_outlasts_request_timeout() {
    let mut config = test_config();
    config.server.request_timeout_secs = 1;
    let harness =
        TestHarness::with_slow_cache(sample_movies(), config.clone(), Duration::from_millis(700));
    let (base_url, harness) = serve(harness, config).await;

    let resp = reqwest::get(format!("{base_url}/v1/movies/10/recommendations?top=3"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["source"], "similarity");
    assert_eq!(body["movies"].as_array().unwrap().len(), 3);
    assert_eq!(harness.engine.similarity.completed_builds(), 1);
}

#[tokio::test]
async fn test_recommendations_unknown_movie() {
    let (base_url, harness) = start_test_server().await;

    let resp = reqwest::get(format!("{base_url}/v1/movies/12345/recommendations"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    assert_eq!(harness.engine.similarity.completed_builds(), 0);
}

#[tokio::test]
async fn test_similarity_rebuild_job() {
    let (base_url, harness) = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base_url}/v1/jobs/similarity/rebuild"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["rows"], 6);
    assert!(body["vocabulary_size"].as_u64().unwrap() > 0);
    assert_eq!(harness.engine.similarity.completed_builds(), 1);
}

#[tokio::test]
async fn test_similarity_sync_without_export_path() {
    let (base_url, _harness) = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base_url}/v1/jobs/similarity/sync"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_cluster_jobs() {
    let (base_url, _harness) = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base_url}/v1/jobs/clusters/compute"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["assigned"], 6);
    assert_eq!(body["num_clusters"], 3);

    let body: Value = reqwest::get(format!("{base_url}/v1/movies/10/recommendations?top=10"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["source"], "cluster");

    let resp = client
        .post(format!("{base_url}/v1/jobs/clusters/sweep"))
        .json(&json!({ "min_k": 2, "max_k": 4 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let ks: Vec<u64> = body["points"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["k"].as_u64().unwrap())
        .collect();
    assert_eq!(ks, vec![2, 3, 4]);
}

#[tokio::test]
async fn test_cluster_load_job() {
    let (base_url, _harness) = start_test_server().await;
    let client = reqwest::Client::new();

    // no path and no configured import path
    let resp = client
        .post(format!("{base_url}/v1/jobs/clusters/load"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clusters.csv");
    tokio::fs::write(&path, "movie_id,cluster_label\n10,1\n40,1\n")
        .await
        .unwrap();

    let resp = client
        .post(format!("{base_url}/v1/jobs/clusters/load"))
        .json(&json!({ "path": path }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = reqwest::get(format!("{base_url}/v1/movies/10/recommendations"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["source"], "cluster");
    assert_eq!(body["movies"][0]["id"], 40);
}

#[tokio::test]
async fn test_cluster_sweep_invalid_range() {
    let (base_url, _harness) = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base_url}/v1/jobs/clusters/sweep"))
        .json(&json!({ "min_k": 9, "max_k": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    marquee::metrics::init();
    let (base_url, _harness) = start_test_server().await;

    reqwest::get(format!("{base_url}/healthz")).await.unwrap();
    let resp = reqwest::get(format!("{base_url}/metrics")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let text = resp.text().await.unwrap();
    assert!(text.contains("marquee_http_requests_total"));
}
