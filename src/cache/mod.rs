//! Key/value cache that holds the published similarity rows.
//!
//! The engine only needs `get`, `set` and `remove` over string keys and JSON string
//! values. `MemoryCache` keeps everything in-process, `ObjectStoreCache` writes one
//! object per key through `object_store`, and `RedisCache` talks to a Redis server.

pub mod memory;
pub mod object;
pub mod redis;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{CacheBackend, CacheConfig};
use crate::error::Result;

pub use self::memory::MemoryCache;
pub use self::object::ObjectStoreCache;
pub use self::redis::RedisCache;

/// A string-keyed, string-valued cache.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read a value. A missing key is `Ok(None)`, not an error.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Remove a key. Removing a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Read and deserialize a JSON value.
pub async fn get_json<T: DeserializeOwned>(cache: &dyn CacheStore, key: &str) -> Result<Option<T>> {
    match cache.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Serialize a value as JSON and write it.
pub async fn set_json<T: Serialize + ?Sized>(cache: &dyn CacheStore, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    cache.set(key, raw).await
}

/// Build the cache selected by configuration.
pub async fn from_config(config: &CacheConfig) -> Result<Arc<dyn CacheStore>> {
    let cache: Arc<dyn CacheStore> = match config.backend {
        CacheBackend::Memory => Arc::new(MemoryCache::new()),
        CacheBackend::Local => Arc::new(ObjectStoreCache::local(&config.local_dir)?),
        CacheBackend::Redis => Arc::new(RedisCache::connect(&config.redis_url).await?),
    };
    tracing::info!(backend = ?config.backend, "cache initialized");
    Ok(cache)
}
