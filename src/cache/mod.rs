//! Distributed cache abstraction.
//!
//! # Responsibilities
//! - Byte-oriented get/set/remove against an external store
//! - JSON object helpers on top of the byte API
//!
//! # Design Decisions
//! - Trait object (`Arc<dyn DistributedCache>`) so the backend is chosen at startup
//! - No client-side locking; every call is a single round trip
//! - `MemoryCache` for single-node deployments and tests, `RedisCache` behind the
//!   `redis` feature

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::config::{CacheBackend, CacheConfig};

pub use memory::MemoryCache;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),

    #[error("cache payload error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[async_trait]
pub trait DistributedCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), CacheError>;

    async fn remove(&self, key: &str) -> Result<(), CacheError>;
}

/// JSON helpers for any [`DistributedCache`].
#[async_trait]
pub trait CacheExt: DistributedCache {
    async fn set_object<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> Result<(), CacheError>
    where
        T: Serialize + Sync + ?Sized,
    {
        let bytes = serde_json::to_vec(value)?;
        self.set(key, bytes, ttl).await
    }

    async fn get_object<T>(&self, key: &str) -> Result<Option<T>, CacheError>
    where
        T: DeserializeOwned + Send,
    {
        match self.get(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Add `item` to the JSON set stored under `key`, creating it if missing.
    async fn add_to_set<T>(&self, key: &str, item: T) -> Result<(), CacheError>
    where
        T: Serialize + DeserializeOwned + Eq + Hash + Send + Sync,
    {
        let mut set: HashSet<T> = self.get_object(key).await?.unwrap_or_default();
        set.insert(item);
        self.set_object(key, &set, None).await
    }

    /// Remove `item` from the JSON set stored under `key`.
    async fn remove_from_set<T>(&self, key: &str, item: &T) -> Result<(), CacheError>
    where
        T: Serialize + DeserializeOwned + Eq + Hash + Send + Sync,
    {
        let Some(mut set) = self.get_object::<HashSet<T>>(key).await? else {
            return Ok(());
        };
        if set.remove(item) {
            self.set_object(key, &set, None).await?;
        }
        Ok(())
    }
}

impl<C: DistributedCache + ?Sized> CacheExt for C {}

/// Build the configured cache backend.
pub async fn from_config(config: &CacheConfig) -> Result<Arc<dyn DistributedCache>, CacheError> {
    match config.backend {
        CacheBackend::Memory => Ok(Arc::new(MemoryCache::new())),
        #[cfg(feature = "redis")]
        CacheBackend::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .ok_or_else(|| CacheError::Backend("redis_url is not set".into()))?;
            Ok(Arc::new(self::redis::RedisCache::connect(url).await?))
        }
        #[cfg(not(feature = "redis"))]
        CacheBackend::Redis => Err(CacheError::Backend(
            "built without the `redis` feature".into(),
        )),
    }
}
