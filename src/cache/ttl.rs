//! TTL cache storage and invalidation.

use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::observability::metrics;

/// A single cached value with its expiry and invalidation tags.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
    expires_at: Instant,
    tags: HashSet<String>,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

/// Counters describing cache behaviour since construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// A bounded key-value store with per-entry time-to-live.
///
/// Cloning is cheap; clones share the same underlying storage.
#[derive(Clone)]
pub struct TtlCache<V> {
    inner: Arc<DashMap<String, CacheEntry<V>>>,
    max_entries: usize,
    default_ttl: Duration,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    evictions: Arc<AtomicU64>,
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache holding at most `max_entries` values.
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            max_entries,
            default_ttl,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
            evictions: Arc::new(AtomicU64::new(0)),
        }
    }

    /// TTL applied when the caller does not override one.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Look up a live value. An expired entry is deleted on inspection and
    /// reported as absent.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let expired = match self.inner.get(key) {
            Some(entry) => {
                if !entry.is_expired(now) {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(entry.value.clone());
                }
                true
            }
            None => false,
        };

        if expired {
            self.inner.remove(key);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store a value under `key`, overwriting any previous entry.
    ///
    /// When `key` is new and the cache is at capacity, the single
    /// oldest-inserted entry is evicted first.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration, tags: Vec<String>) {
        let key = key.into();
        let now = Instant::now();

        if !self.inner.contains_key(&key) && self.inner.len() >= self.max_entries {
            self.evict_oldest();
        }

        self.inner.insert(
            key,
            CacheEntry {
                value,
                stored_at: now,
                expires_at: now + ttl,
                tags: tags.into_iter().collect(),
            },
        );
        metrics::record_cache_size(self.inner.len());
    }

    /// Remove every entry carrying `tag`. Returns the removal count.
    pub fn invalidate_by_tag(&self, tag: &str) -> usize {
        let keys: Vec<String> = self
            .inner
            .iter()
            .filter(|e| e.tags.contains(tag))
            .map(|e| e.key().clone())
            .collect();
        self.remove_keys(keys)
    }

    /// Remove every entry whose key starts with `prefix`. Returns the
    /// removal count.
    pub fn invalidate_by_prefix(&self, prefix: &str) -> usize {
        let keys: Vec<String> = self
            .inner
            .iter()
            .filter(|e| e.key().starts_with(prefix))
            .map(|e| e.key().clone())
            .collect();
        self.remove_keys(keys)
    }

    /// Remove all currently-expired entries. Returns the removal count.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let keys: Vec<String> = self
            .inner
            .iter()
            .filter(|e| e.is_expired(now))
            .map(|e| e.key().clone())
            .collect();
        self.remove_keys(keys)
    }

    /// Number of entries currently stored, expired or not.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.inner.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    fn remove_keys(&self, keys: Vec<String>) -> usize {
        let mut removed = 0;
        for key in keys {
            if self.inner.remove(&key).is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            metrics::record_cache_size(self.inner.len());
        }
        removed
    }

    fn evict_oldest(&self) {
        let oldest = self
            .inner
            .iter()
            .min_by_key(|e| e.stored_at)
            .map(|e| e.key().clone());

        if let Some(key) = oldest {
            self.inner.remove(&key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
            metrics::record_cache_eviction();
            tracing::debug!(key = %key, "Evicted oldest cache entry");
        }
    }
}
