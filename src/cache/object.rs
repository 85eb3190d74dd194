use std::path::Path as FsPath;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};
use tracing::debug;

use crate::error::{MarqueeError, Result};

use super::CacheStore;

/// Cache that stores one object per key in an `object_store` backend.
#[derive(Debug, Clone)]
pub struct ObjectStoreCache {
    store: Arc<dyn ObjectStore>,
}

impl ObjectStoreCache {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Objects live as files under `dir`, which is created if missing.
    pub fn local(dir: &FsPath) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let store = LocalFileSystem::new_with_prefix(dir)?;
        debug!(dir = %dir.display(), "local object cache");
        Ok(Self::new(Arc::new(store)))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()))
    }

    fn path(key: &str) -> Result<Path> {
        Ok(Path::parse(key)?)
    }
}

#[async_trait]
impl CacheStore for ObjectStoreCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = Self::path(key)?;
        match self.store.get(&path).await {
            Ok(result) => {
                let data = result.bytes().await?;
                let value = String::from_utf8(data.to_vec()).map_err(|e| {
                    MarqueeError::Cache(format!("value at '{key}' is not utf-8: {e}"))
                })?;
                Ok(Some(value))
            }
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let path = Self::path(key)?;
        self.store
            .put(&path, PutPayload::from(Bytes::from(value)))
            .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = Self::path(key)?;
        match self.store.delete(&path).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
