// ! Metric cache
// !
// ! Read-through cache of collected metrics keyed by joined namespace, with
// ! optional LRU capacity and optional time-to-live.

use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::protocol::metric::Metric;

/// Cache bounds. The default never evicts and never expires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries; `None` or zero means unbounded
    pub capacity: Option<usize>,
    /// Entry lifetime in milliseconds; `None` means entries never expire
    pub ttl_ms: Option<u64>,
}

impl CacheConfig {
    /// Bound the number of entries
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Expire entries after `ttl`
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_ms = Some(ttl.as_millis().try_into().unwrap_or(u64::MAX));
        self
    }

    /// Entry lifetime as a duration
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_ms.map(Duration::from_millis)
    }
}

/// Counters reported by [`MetricCache::stats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

struct CacheEntry {
    metric: Metric,
    inserted_at: Instant,
}

/// Thread-safe metric cache
///
/// Shared between concurrent `collect_metrics` calls. A miss followed by a
/// fetch may race with another caller fetching the same namespace; the later
/// `put` wins.
pub struct MetricCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    ttl: Option<Duration>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MetricCache {
    /// Create a cache with the given bounds
    pub fn new(config: &CacheConfig) -> Self {
        let entries = match config.capacity.and_then(NonZeroUsize::new) {
            Some(capacity) => LruCache::new(capacity),
            None => LruCache::unbounded(),
        };
        Self {
            entries: Mutex::new(entries),
            ttl: config.ttl(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Cache that never evicts and never expires
    pub fn unbounded() -> Self {
        Self::new(&CacheConfig::default())
    }

    /// Look up a metric by joined namespace
    ///
    /// Expired entries are dropped and reported as misses.
    pub fn get(&self, key: &str) -> Option<Metric> {
        let mut entries = self.entries.lock();
        let expired = match entries.get(key) {
            Some(entry) => self.is_expired(entry),
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        if expired {
            entries.pop(key);
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!(key, "Cache entry expired");
            return None;
        }

        self.hits.fetch_add(1, Ordering::Relaxed);
        entries.peek(key).map(|entry| entry.metric.clone())
    }

    /// Insert or overwrite the entry for `key`
    pub fn put(&self, key: impl Into<String>, metric: Metric) {
        let mut entries = self.entries.lock();
        let key = key.into();
        if let Some((evicted, _)) = entries.push(
            key.clone(),
            CacheEntry {
                metric,
                inserted_at: Instant::now(),
            },
        ) {
            if evicted != key {
                debug!(evicted = %evicted, "Cache entry evicted");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains(key)
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        self.ttl
            .is_some_and(|ttl| entry.inserted_at.elapsed() >= ttl)
    }
}

impl Default for MetricCache {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl std::fmt::Debug for MetricCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricCache")
            .field("len", &self.len())
            .field("capacity", &self.entries.lock().cap())
            .field("ttl", &self.ttl)
            .finish()
    }
}
