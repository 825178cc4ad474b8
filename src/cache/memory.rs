use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::cache::CacheStore;
use crate::error::CacheError;

struct Entry {
    data: Vec<u8>,
    /// `None` when the TTL reaches past what `Instant` can represent
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// In-process cache backend.
///
/// Expired entries are removed on the next read of their key; there is no
/// background sweep.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Entry>>, CacheError> {
        self.entries.read().map_err(|_| CacheError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Entry>>, CacheError> {
        self.entries.write().map_err(|_| CacheError::LockPoisoned)
    }

    /// Number of stored entries, expired ones included until they are read
    pub fn len(&self) -> usize {
        self.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl CacheStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = Instant::now();
        {
            let entries = self.read()?;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.data.clone())),
                Some(_) => {}
            }
        }

        // Re-check under the write lock: a writer may have refreshed the key
        let mut entries = self.write()?;
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            debug!("Evicting expired entry: {}", key);
            entries.remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).map(|e| e.data.clone()))
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let entry = Entry {
            data: value.to_vec(),
            expires_at: Instant::now().checked_add(ttl),
        };
        self.write()?.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.write()?.remove(key);
        Ok(())
    }

    async fn close(&self) -> Result<(), CacheError> {
        self.write()?.clear();
        Ok(())
    }
}
