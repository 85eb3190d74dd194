mod common;

use common::assertions::ids;
use common::movies::{bare, sample_movies};
use common::{test_config, TestHarness};

use marquee::cluster::ClusterAssignment;
use marquee::error::MarqueeError;
use marquee::types::{MovieId, RecommendationSource};

#[tokio::test]
async fn test_compute_groups_similar_movies() {
    let movies = sample_movies();
    let h = TestHarness::new(movies.clone());

    let report = h.engine.assigner.compute().await.unwrap();
    assert_eq!(report.assigned, movies.len());
    assert_eq!(report.num_clusters, 3);
    assert!(report.inertia.unwrap() >= 0.0);

    let snapshot = h.engine.clusters.snapshot().unwrap();
    for m in &movies {
        assert!(snapshot.label(m.id).unwrap() < 3);
    }
}

#[tokio::test]
async fn test_compute_is_deterministic() {
    let a = TestHarness::new(sample_movies());
    let b = TestHarness::new(sample_movies());
    a.engine.assigner.compute().await.unwrap();
    b.engine.assigner.compute().await.unwrap();
    assert_eq!(
        a.engine.clusters.snapshot().unwrap().labels,
        b.engine.clusters.snapshot().unwrap().labels
    );
}

#[tokio::test]
async fn test_sample_limit_bounds_assignment() {
    let mut config = test_config();
    config.clustering.sample_limit = Some(4);
    let h = TestHarness::with_config(sample_movies(), config);

    let report = h.engine.assigner.compute().await.unwrap();
    assert_eq!(report.assigned, 4);
    let snapshot = h.engine.clusters.snapshot().unwrap();
    assert!(snapshot.label(50).is_none());
}

#[tokio::test]
async fn test_too_few_movies_keeps_previous_assignment() {
    let h = TestHarness::new(bare(&[1, 2]));
    h.engine
        .clusters
        .replace(ClusterAssignment::new([(1, 0), (2, 0)].into_iter().collect(), None));

    let err = h.engine.assigner.compute().await.unwrap_err();
    assert!(matches!(err, MarqueeError::ClusterBuild(_)));
    assert_eq!(h.engine.clusters.snapshot().unwrap().label(2), Some(0));
}

#[tokio::test]
async fn test_empty_catalog_fails_cluster_build() {
    let h = TestHarness::new(Vec::new());
    let err = h.engine.assigner.compute().await.unwrap_err();
    assert!(matches!(err, MarqueeError::ClusterBuild(_)));
    assert!(h.engine.clusters.snapshot().is_none());
}

#[tokio::test]
async fn test_load_from_file_replaces_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clusters.csv");
    tokio::fs::write(&path, "movie_id,cluster_label\n10,4\n20,4\n30,9\n")
        .await
        .unwrap();

    let h = TestHarness::new(sample_movies());
    let report = h.engine.assigner.load_from_file(&path).await.unwrap();
    assert_eq!(report.assigned, 3);
    assert_eq!(report.num_clusters, 2);

    let result = h.engine.resolver.resolve(10, 5).await.unwrap();
    assert_eq!(result.source, RecommendationSource::Cluster);
    assert_eq!(ids(&result.movies), vec![20]);
}

#[tokio::test]
async fn test_load_rejects_bad_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clusters.csv");
    tokio::fs::write(&path, "10,4\n20,x\n").await.unwrap();

    let h = TestHarness::new(sample_movies());
    let err = h.engine.assigner.load_from_file(&path).await.unwrap_err();
    assert!(matches!(err, MarqueeError::ClusterImport { line: 2, .. }));
    assert!(h.engine.clusters.snapshot().is_none());
}

#[tokio::test]
async fn test_export_round_trip_through_resolver() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config();
    config.clustering.export_dir = Some(dir.path().to_path_buf());
    let movies = sample_movies();
    let h = TestHarness::with_config(movies.clone(), config);

    let report = h.engine.assigner.compute().await.unwrap();
    let exported = report.export_path.unwrap();
    let computed = h.engine.clusters.snapshot().unwrap();

    let other = TestHarness::new(movies.clone());
    other.engine.assigner.load_from_file(&exported).await.unwrap();
    assert_eq!(other.engine.clusters.snapshot().unwrap().labels, computed.labels);

    // every co-member shows up when top_n covers the cluster
    for m in &movies {
        let expected: Vec<MovieId> = computed.co_members(m.id, &ids(&movies)).unwrap();
        let result = other.engine.resolver.resolve(m.id, movies.len()).await.unwrap();
        assert_eq!(result.source, RecommendationSource::Cluster);
        assert_eq!(ids(&result.movies), expected);
    }
}

#[tokio::test]
async fn test_sweep_reports_inertia_per_k() {
    let h = TestHarness::new(sample_movies());
    let points = h.engine.assigner.sweep(1, 10).await.unwrap();

    let ks: Vec<usize> = points.iter().map(|p| p.k).collect();
    assert_eq!(ks, vec![1, 2, 3, 4, 5, 6]);
    assert!(points.iter().all(|p| p.inertia >= 0.0));
    assert!(points.last().unwrap().inertia <= points[0].inertia);
    assert!(h.engine.clusters.snapshot().is_none());
}
