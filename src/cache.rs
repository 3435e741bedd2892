use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::config::CacheConfig;
use crate::types::CapabilityRecord;

struct CacheEntry {
    record: Arc<CapabilityRecord>,
    inserted_at: Instant,
}

struct CacheInner {
    /// Insertion order doubles as eviction order.
    entries: IndexMap<String, CacheEntry>,
    max_size: usize,
    prune_amount: usize,
    ttl: Option<Duration>,
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub size: usize,
}

/// Bounded, process-local map from cache key to a completed record.
///
/// When a new key would exceed `max_size`, the oldest `prune_amount` entries
/// are dropped in one batch. A `max_size` of zero disables caching.
pub struct ResultCache {
    inner: RwLock<CacheInner>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl ResultCache {
    pub fn new(max_size: usize, prune_amount: usize, ttl: Option<Duration>) -> Self {
        Self {
            inner: RwLock::new(CacheInner {
                entries: IndexMap::new(),
                max_size,
                prune_amount,
                ttl,
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(
            config.effective_max_size(),
            config.prune_amount,
            config.ttl_ms.map(Duration::from_millis),
        )
    }

    // A panic while holding the lock cannot leave the map half-updated
    // (every mutation is a single IndexMap call), so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, CacheInner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheInner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, key: &str) -> Option<Arc<CapabilityRecord>> {
        {
            let inner = self.read();
            let entry = match inner.entries.get(key) {
                Some(entry) => entry,
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
            };
            let fresh = inner
                .ttl
                .map_or(true, |ttl| entry.inserted_at.elapsed() <= ttl);
            if fresh {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(Arc::clone(&entry.record));
            }
        }

        // Expired: drop it under the write lock.
        let mut inner = self.write();
        // Re-check: another writer may have refreshed the entry meanwhile.
        let still_expired = match (inner.entries.get(key), inner.ttl) {
            (Some(entry), Some(ttl)) => entry.inserted_at.elapsed() > ttl,
            _ => false,
        };
        if still_expired {
            inner.entries.shift_remove(key);
            self.expirations.fetch_add(1, Ordering::Relaxed);
            trace!(key, "cache entry expired");
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn put(&self, key: String, record: Arc<CapabilityRecord>) {
        let mut inner = self.write();
        if inner.max_size == 0 {
            return;
        }

        if !inner.entries.contains_key(&key) && inner.entries.len() >= inner.max_size {
            let overflow = inner.entries.len() + 1 - inner.max_size;
            let n = inner.prune_amount.max(overflow).min(inner.entries.len());
            inner.entries.drain(..n);
            self.evictions.fetch_add(n as u64, Ordering::Relaxed);
            debug!(evicted = n, "result cache pruned");
        }

        inner.entries.insert(
            key,
            CacheEntry {
                record,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.write().entries.clear();
    }

    /// Apply new limits and drop every entry.
    pub fn reconfigure(&self, config: &CacheConfig) {
        let mut inner = self.write();
        inner.entries.clear();
        inner.max_size = config.effective_max_size();
        inner.prune_amount = config.prune_amount;
        inner.ttl = config.ttl_ms.map(Duration::from_millis);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            size: self.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::DefaultStrategy;
    use std::thread;

    fn record() -> Arc<CapabilityRecord> {
        Arc::new(DefaultStrategy::baseline_record(
            &crate::config::DetectorConfig::default(),
        ))
    }

    #[test]
    fn get_after_put() {
        let cache = ResultCache::new(10, 2, None);
        let r = record();
        cache.put("k".into(), Arc::clone(&r));
        assert!(Arc::ptr_eq(&cache.get("k").unwrap(), &r));
        assert!(cache.get("other").is_none());
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.size), (1, 1, 1));
    }

    #[test]
    fn eviction_bound() {
        let (max, prune) = (10, 3);
        let cache = ResultCache::new(max, prune, None);
        let r = record();
        for i in 0..(max + prune) {
            cache.put(format!("k{i}"), Arc::clone(&r));
            assert!(cache.len() <= max);
        }
        assert!(cache.len() <= max);
        // Oldest keys went first.
        assert!(cache.get("k0").is_none());
        assert!(cache.get(&format!("k{}", max + prune - 1)).is_some());
    }

    #[test]
    fn prune_removes_a_batch() {
        let cache = ResultCache::new(4, 2, None);
        let r = record();
        for i in 0..4 {
            cache.put(format!("k{i}"), Arc::clone(&r));
        }
        cache.put("k4".into(), Arc::clone(&r));
        assert_eq!(cache.len(), 3);
        assert!(cache.get("k0").is_none());
        assert!(cache.get("k1").is_none());
        assert!(cache.get("k2").is_some());
        assert_eq!(cache.stats().evictions, 2);
    }

    #[test]
    fn overwrite_does_not_evict() {
        let cache = ResultCache::new(2, 1, None);
        let r = record();
        cache.put("a".into(), Arc::clone(&r));
        cache.put("b".into(), Arc::clone(&r));
        cache.put("a".into(), Arc::clone(&r));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn zero_size_disables() {
        let cache = ResultCache::new(0, 1, None);
        cache.put("k".into(), record());
        assert!(cache.is_empty());
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn ttl_expiry_is_a_miss() {
        let cache = ResultCache::new(10, 1, Some(Duration::from_millis(1)));
        cache.put("k".into(), record());
        thread::sleep(Duration::from_millis(10));
        assert!(cache.get("k").is_none());
        assert!(cache.is_empty());
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn concurrent_writers_respect_bound() {
        let cache = Arc::new(ResultCache::new(50, 5, None));
        let r = record();
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                let r = Arc::clone(&r);
                thread::spawn(move || {
                    for i in 0..200 {
                        let key = format!("{t}-{}", i % 60);
                        cache.put(key.clone(), Arc::clone(&r));
                        let _ = cache.get(&key);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert!(cache.len() <= 50);
    }

    #[test]
    fn reconfigure_clears_and_resizes() {
        let cache = ResultCache::new(10, 1, None);
        cache.put("k".into(), record());
        cache.reconfigure(&CacheConfig {
            max_size: 1,
            ..Default::default()
        });
        assert!(cache.is_empty());
        cache.put("a".into(), record());
        cache.put("b".into(), record());
        assert_eq!(cache.len(), 1);
    }
}
