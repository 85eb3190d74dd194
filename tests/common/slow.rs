use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use marquee::cache::{CacheStore, MemoryCache};
use marquee::error::Result;

/// A memory cache whose writes take `delay` each.
pub struct SlowCache {
    inner: Arc<MemoryCache>,
    delay: Duration,
}

impl SlowCache {
    pub fn new(inner: Arc<MemoryCache>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl CacheStore for SlowCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove(key).await
    }
}
