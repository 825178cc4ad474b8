use std::time::Duration;

use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use tracing::debug;

use crate::cache::CacheStore;
use crate::error::CacheError;

/// Prefix applied to every key so the store can share a Redis database
const KEY_PREFIX: &str = "jarvault:";

/// Redis-backed cache store
///
/// A multiplexed connection is cloned per operation; Redis itself handles
/// concurrent access.
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    /// Connect to Redis, failing if no connection is established within `timeout`
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;

        let conn = tokio::time::timeout(timeout, client.get_multiplexed_async_connection())
            .await
            .map_err(|_| CacheError::ConnectTimeout(timeout.as_millis() as u64))??;

        debug!("Connected to Redis");
        Ok(Self { conn })
    }

    fn prefixed_key(key: &str) -> String {
        format!("{}{}", KEY_PREFIX, key)
    }
}

#[async_trait::async_trait]
impl CacheStore for RedisStore {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(Self::prefixed_key(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        // SETEX rejects a zero expiry
        let seconds = ttl.as_secs().max(1);
        let _: () = conn.set_ex(Self::prefixed_key(key), value, seconds).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(Self::prefixed_key(key)).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), CacheError> {
        // The multiplexed connection shuts down once the last clone is dropped
        debug!("Closing Redis cache");
        Ok(())
    }
}
