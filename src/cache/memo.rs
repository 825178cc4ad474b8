//! Single-value TTL cell for provider-local memoization

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// Holds one value for `ttl`, refreshed lazily on the first read after expiry.
///
/// The lock is held across check, fetch and store, so concurrent callers
/// that find the value stale wait for a single refresh instead of each
/// issuing their own.
pub struct Memo<T> {
    ttl: Duration,
    slot: Mutex<Option<(Instant, Arc<T>)>>,
}

impl<T> Memo<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// Return the memoized value, or run `fetch` and store its result.
    ///
    /// Errors are returned as-is and nothing is stored for them.
    pub async fn get_or_refresh<F, Fut, E>(&self, fetch: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut slot = self.slot.lock().await;

        if let Some((stored_at, value)) = slot.as_ref() {
            if stored_at.elapsed() < self.ttl {
                return Ok(Arc::clone(value));
            }
        }

        let value = Arc::new(fetch().await?);
        *slot = Some((Instant::now(), Arc::clone(&value)));
        Ok(value)
    }

    /// Drop the memoized value so the next read refetches
    pub async fn clear(&self) {
        *self.slot.lock().await = None;
    }
}
