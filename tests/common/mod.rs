#![allow(dead_code)]

pub mod assertions;
pub mod movies;
pub mod slow;

use std::sync::Arc;
use std::time::Duration;

use marquee::cache::MemoryCache;
use marquee::catalog::MemoryCatalog;
use marquee::config::{Config, RebuildPolicy};
use marquee::engine::Engine;
use marquee::types::Movie;

use slow::SlowCache;

/// An engine over an in-memory catalog and cache, with handles to both.
pub struct TestHarness {
    pub engine: Engine,
    pub catalog: Arc<MemoryCatalog>,
    pub cache: Arc<MemoryCache>,
    pub config: Config,
}

impl TestHarness {
    pub fn new(movies: Vec<Movie>) -> Self {
        Self::with_config(movies, test_config())
    }

    pub fn with_policy(movies: Vec<Movie>, policy: RebuildPolicy) -> Self {
        let mut config = test_config();
        config.recommend.rebuild_on_miss = policy;
        Self::with_config(movies, config)
    }

    pub fn with_config(movies: Vec<Movie>, config: Config) -> Self {
        let catalog = Arc::new(MemoryCatalog::from_movies(movies));
        let cache = Arc::new(MemoryCache::new());
        let engine = Engine::new(&config, catalog.clone(), cache.clone());
        Self {
            engine,
            catalog,
            cache,
            config,
        }
    }

    /// Like `with_config`, but every cache write through the engine waits `delay`.
    /// `cache` still points at the underlying memory cache.
    pub fn with_slow_cache(movies: Vec<Movie>, config: Config, delay: Duration) -> Self {
        let catalog = Arc::new(MemoryCatalog::from_movies(movies));
        let cache = Arc::new(MemoryCache::new());
        let slow = Arc::new(SlowCache::new(cache.clone(), delay));
        let engine = Engine::new(&config, catalog.clone(), slow);
        Self {
            engine,
            catalog,
            cache,
            config,
        }
    }
}

/// Defaults with a small purge bound and cluster count, sized for the fixtures.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.similarity.purge_upper_bound = 32;
    config.clustering.num_clusters = 3;
    config
}
