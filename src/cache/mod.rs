//! Response cache
//!
//! A [`CacheStore`] holds raw bytes with a TTL. Two backends implement it:
//!
//! - [`RedisStore`]: shared store, preferred when `REDIS_URL` is reachable
//! - [`MemoryStore`]: in-process map with lazy expiry, used as fallback
//!
//! [`Cache`] wraps whichever backend was selected and owns the single JSON
//! encoding, so callers never see backend differences. A miss is `Ok(None)`.

#[cfg(test)]
use mockall::automock;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::CacheConfig;
use crate::error::CacheError;

pub mod memo;
pub mod memory;
pub mod redis_store;

pub use memo::Memo;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// Byte-level cache backend contract
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    /// Short backend name for logs ("redis", "memory")
    fn backend(&self) -> &'static str;

    /// Returns `None` when the key is absent or expired
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    async fn close(&self) -> Result<(), CacheError>;
}

/// Cache key builders, one per cached operation
pub mod keys {
    use crate::models::Category;

    pub fn versions(category: Category) -> String {
        format!("versions:{}", category)
    }

    pub fn builds(category: Category, version: &str) -> String {
        format!("builds:{}:{}", category, version)
    }
}

/// Typed, JSON-encoded view over a [`CacheStore`]
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl Cache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// In-process cache, mostly for tests and single-node setups
    pub fn in_memory(ttl: Duration) -> Self {
        Self::new(Arc::new(MemoryStore::new()), ttl)
    }

    /// Select a backend from configuration.
    ///
    /// Never fails: an unset or unreachable Redis falls back to memory.
    pub async fn connect(config: &CacheConfig) -> Self {
        let Some(url) = config.redis_url.as_deref() else {
            info!("Using memory cache");
            return Self::in_memory(config.ttl);
        };

        match RedisStore::connect(url, config.connect_timeout).await {
            Ok(store) => {
                info!("Using Redis cache");
                Self::new(Arc::new(store), config.ttl)
            }
            Err(e) => {
                warn!("Failed to connect to Redis ({}), using memory cache", e);
                Self::in_memory(config.ttl)
            }
        }
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let Some(bytes) = self.store.get(key).await? else {
            debug!("Cache miss: {}", key);
            return Ok(None);
        };

        debug!("Cache hit: {}", key);
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value)?;
        self.store.set(key, &bytes, self.ttl).await
    }

    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.store.delete(key).await
    }

    pub async fn close(&self) -> Result<(), CacheError> {
        self.store.close().await
    }
}
