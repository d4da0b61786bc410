//! Keyed TTL cache with single-flight refresh.
//!
//! Each key owns an async mutex around its entry. A caller that finds the
//! entry stale computes while holding the lock, so concurrent callers for
//! the same key wait and then read what was stored.

use dashmap::DashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

struct CacheEntry<V> {
    value: Arc<V>,
    inserted_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() < ttl
    }
}

type Slot<V> = Arc<Mutex<Option<CacheEntry<V>>>>;

pub struct ResultCache<K, V> {
    ttl: Duration,
    slots: DashMap<K, Slot<V>>,
}

impl<K, V> ResultCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: DashMap::new(),
        }
    }

    fn slot(&self, key: &K) -> Slot<V> {
        self.slots
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .value()
            .clone()
    }

    /// Return the fresh entry for `key`, or run `compute` and store its
    /// value. A failed compute keeps the previous entry and hands the error
    /// back to this caller only.
    pub async fn get_or_compute<F, Fut, E>(&self, key: &K, compute: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let slot = self.slot(key);
        let mut entry = slot.lock().await;

        if let Some(cached) = entry.as_ref() {
            if cached.is_fresh(self.ttl) {
                return Ok(Arc::clone(&cached.value));
            }
        }

        let value = Arc::new(compute().await?);
        *entry = Some(CacheEntry {
            value: Arc::clone(&value),
            inserted_at: Instant::now(),
        });
        Ok(value)
    }
}
