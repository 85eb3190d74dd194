use prometheus::{
    register_histogram, register_int_counter_vec, Histogram, IntCounterVec,
};

lazy_static::lazy_static! {
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "marquee_http_requests_total", "Total HTTP requests", &["method", "path", "status"]
    ).unwrap();
    pub static ref SIMILARITY_BUILDS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "marquee_similarity_builds_total", "Similarity matrix builds", &["kind", "status"]
    ).unwrap();
    pub static ref SIMILARITY_BUILD_DURATION: Histogram = register_histogram!(
        "marquee_similarity_build_duration_seconds", "Similarity matrix build duration",
        vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 300.0, 900.0]
    ).unwrap();
    pub static ref CLUSTER_BUILDS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "marquee_cluster_builds_total", "Cluster assignment builds and imports", &["kind", "status"]
    ).unwrap();
    pub static ref SIMILARITY_LOOKUPS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "marquee_similarity_lookups_total", "Similarity row reads", &["result"]
    ).unwrap();
    pub static ref RECOMMENDATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "marquee_recommendations_total", "Recommendation lookups", &["source"]
    ).unwrap();
}

pub fn init() {
    lazy_static::initialize(&HTTP_REQUESTS_TOTAL);
    lazy_static::initialize(&SIMILARITY_BUILDS_TOTAL);
    lazy_static::initialize(&SIMILARITY_BUILD_DURATION);
    lazy_static::initialize(&CLUSTER_BUILDS_TOTAL);
    lazy_static::initialize(&SIMILARITY_LOOKUPS_TOTAL);
    lazy_static::initialize(&RECOMMENDATIONS_TOTAL);
}
