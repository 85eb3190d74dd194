use thiserror::Error;

use crate::types::MovieId;

#[derive(Error, Debug)]
pub enum MarqueeError {
    // Catalog errors
    #[error("movie not found: {movie_id}")]
    NotFound { movie_id: MovieId },

    #[error("malformed feature data for movie {movie_id}: {reason}")]
    MalformedFeatureData { movie_id: MovieId, reason: String },

    #[error("catalog error: {0}")]
    Catalog(String),

    // Cache / storage errors
    #[error("storage error: {0}")]
    Storage(#[from] object_store::Error),

    #[error("storage path error: {0}")]
    StoragePath(#[from] object_store::path::Error),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("cache error: {0}")]
    Cache(String),

    // Serialization errors
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    // Similarity errors
    #[error("similarity matrix error: {0}")]
    SimilarityMatrix(String),

    // Cluster errors
    #[error("cluster build failed: {0}")]
    ClusterBuild(String),

    #[error("cluster import failed at line {line}: {reason}")]
    ClusterImport { line: u64, reason: String },

    // Validation errors
    #[error("validation error: {0}")]
    Validation(String),

    // Config errors
    #[error("config error: {0}")]
    Config(String),

    // IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    // Internal
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, MarqueeError>;

impl MarqueeError {
    pub fn status_code(&self) -> u16 {
        match self {
            MarqueeError::NotFound { .. } => 404,

            MarqueeError::Validation(_) => 400,

            MarqueeError::MalformedFeatureData { .. }
            | MarqueeError::ClusterImport { .. }
            | MarqueeError::ClusterBuild(_)
            | MarqueeError::SimilarityMatrix(_) => 422,

            MarqueeError::Storage(_) | MarqueeError::Redis(_) | MarqueeError::Cache(_) => 503,

            _ => 500,
        }
    }
}
