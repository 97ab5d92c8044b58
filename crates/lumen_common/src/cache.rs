//! TTL cache for provider results.
//!
//! Staleness is checked lazily on read; there is no eviction task. Expired
//! entries are dropped when touched and never returned. The LRU bound only
//! limits memory, it does not affect freshness.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::time::Instant;

/// Default time-to-live for a cached provider result
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Default number of keys kept per coordinator
pub const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: T,
    pub provider: String,
    pub inserted_at: Instant,
}

impl<T> CacheEntry<T> {
    pub fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) < ttl
    }
}

/// Bounded cache keyed by `domain:key`
pub struct TtlCache<T> {
    entries: LruCache<String, CacheEntry<T>>,
    ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            ttl,
        }
    }

    /// Fresh entry for `key`, dropping it if it has expired
    pub fn get(&mut self, key: &str) -> Option<CacheEntry<T>> {
        let now = Instant::now();
        let fresh = self.entries.get(key).map(|e| e.is_fresh(self.ttl, now))?;
        if fresh {
            self.entries.get(key).cloned()
        } else {
            self.entries.pop(key);
            None
        }
    }

    pub fn insert(&mut self, key: String, value: T, provider: &str) {
        self.entries.put(
            key,
            CacheEntry {
                value,
                provider: provider.to_string(),
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.pop(key).is_some()
    }

    /// Drop every entry a given provider produced
    pub fn evict_provider(&mut self, provider: &str) -> usize {
        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, e)| e.provider == provider)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &keys {
            self.entries.pop(key);
        }
        keys.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
