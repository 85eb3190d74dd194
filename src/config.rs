use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MarqueeError, Result};

/// Top-level configuration. Every section falls back to its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub cache: CacheConfig,
    pub features: FeatureConfig,
    pub similarity: SimilarityConfig,
    pub clustering: ClusteringConfig,
    pub recommend: RecommendConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound accepted for `top` on recommendation requests.
    pub max_top_n: usize,
    pub default_top_n: usize,
    /// Timeout applied to read routes. Batch job routes run to completion.
    pub request_timeout_secs: u64,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_top_n: 100,
            default_top_n: 10,
            request_timeout_secs: 30,
            max_body_bytes: 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// JSON file holding the catalog rows. An empty catalog is used when unset.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    #[default]
    Memory,
    Local,
    Redis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Root directory for the `local` backend.
    pub local_dir: PathBuf,
    pub redis_url: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            local_dir: PathBuf::from("./data/cache"),
            redis_url: "redis://localhost:6379".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Case-fold labels and overview tokens.
    pub lowercase: bool,
    /// Labels kept per structured group (directors, cast, keywords, genres).
    pub labels_per_group: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            labels_per_group: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Cap on the number of catalog items included in a build.
    pub max_items: Option<usize>,
    /// Number of row keys purged when no manifest from a previous build exists.
    pub purge_upper_bound: usize,
    /// Concurrent cache operations while publishing.
    pub publish_concurrency: usize,
    /// CSV export of every built matrix, also the source for `sync_from_file`.
    pub export_path: Option<PathBuf>,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            max_items: None,
            purge_upper_bound: 100_000,
            publish_concurrency: 64,
            export_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub num_clusters: usize,
    pub max_batch_size: usize,
    /// Cap on the number of catalog items sampled for a build.
    pub sample_limit: Option<usize>,
    pub seed: u64,
    pub max_iterations: usize,
    /// Stop once no centroid moves by more than this (squared euclidean).
    pub tolerance: f64,
    /// Directory receiving `clusters-<timestamp>.csv` after each build.
    pub export_dir: Option<PathBuf>,
    /// Cluster table imported at start-up, if set.
    pub import_path: Option<PathBuf>,
    pub sweep_min_k: usize,
    pub sweep_max_k: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            num_clusters: 21,
            max_batch_size: 300,
            sample_limit: Some(5000),
            seed: 0,
            max_iterations: 100,
            tolerance: 1e-6,
            export_dir: None,
            import_path: None,
            sweep_min_k: 5,
            sweep_max_k: 35,
        }
    }
}

/// What a recommendation lookup does when its similarity row is missing or stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebuildPolicy {
    /// Rebuild the matrix before answering, then retry the read once.
    #[default]
    Blocking,
    /// Start a rebuild without waiting and answer with an empty ranking.
    Background,
    /// Answer with an empty ranking.
    Disabled,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendConfig {
    pub rebuild_on_miss: RebuildPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `text` or `json`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// Reads TOML from `path`, or from `MARQUEE_CONFIG` when no path is given, then
    /// applies `MARQUEE_*` environment overrides. With neither, defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var("MARQUEE_CONFIG").ok().map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(env_path) {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            MarqueeError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| MarqueeError::Config(e.to_string()))
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("MARQUEE_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("MARQUEE_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| MarqueeError::Config(format!("invalid MARQUEE_PORT: {port}")))?;
        }
        if let Ok(path) = std::env::var("MARQUEE_CATALOG_PATH") {
            self.catalog.path = Some(PathBuf::from(path));
        }
        if let Ok(backend) = std::env::var("MARQUEE_CACHE_BACKEND") {
            self.cache.backend = match backend.to_ascii_lowercase().as_str() {
                "memory" => CacheBackend::Memory,
                "local" => CacheBackend::Local,
                "redis" => CacheBackend::Redis,
                other => {
                    return Err(MarqueeError::Config(format!(
                        "invalid MARQUEE_CACHE_BACKEND: {other}"
                    )))
                }
            };
        }
        if let Ok(url) = std::env::var("MARQUEE_REDIS_URL") {
            self.cache.redis_url = url;
        }
        if let Ok(level) = std::env::var("MARQUEE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("MARQUEE_LOG_FORMAT") {
            self.logging.format = format;
        }
        Ok(())
    }
}
