use async_trait::async_trait;
use ::redis::aio::ConnectionManager;
use ::redis::{AsyncCommands, Client};
use tracing::info;

use crate::error::Result;

use super::CacheStore;

/// Cache backed by a Redis server.
///
/// Uses a `ConnectionManager`, which multiplexes commands over one connection and
/// reconnects on failure, so clones are cheap.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        info!(url = redis_url, "connected to redis");
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }
}
