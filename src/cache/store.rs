//! In-memory TTL cache keyed by [`CacheKey`].
//!
//! Synchronous and infallible: every operation is a plain map mutation, keyed
//! atomically by dashmap. An expired entry is indistinguishable from an
//! absent one; it is removed lazily on the `get` that finds it dead.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use crate::cache::key::{CacheKey, ViewKind};

struct Entry<V> {
    value: V,
    stored_at: Instant,
    last_used: Instant,
    ttl: Duration,
}

impl<V> Entry<V> {
    fn expired(&self) -> bool {
        self.stored_at.elapsed() >= self.ttl
    }
}

/// Expiring key-value map for catalog views.
pub struct CacheStore<V> {
    entries: DashMap<CacheKey, Entry<V>>,
    capacity: Option<usize>,
}

impl<V: Clone> CacheStore<V> {
    /// `capacity` bounds the number of live entries; `None` means unbounded.
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            entries: DashMap::new(),
            capacity,
        }
    }

    /// Store a value, replacing any prior value for the key and resetting
    /// its expiry. At capacity, the least-recently-used entry makes room.
    pub fn put(&self, key: CacheKey, value: V, ttl: Duration) {
        if let Some(capacity) = self.capacity {
            if !self.entries.contains_key(&key) && self.entries.len() >= capacity {
                self.evict_lru();
            }
        }
        let now = Instant::now();
        self.entries.insert(
            key,
            Entry {
                value,
                stored_at: now,
                last_used: now,
                ttl,
            },
        );
    }

    /// Return the value for the key if present and not expired.
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        if let Some(mut entry) = self.entries.get_mut(key) {
            if !entry.expired() {
                entry.last_used = Instant::now();
                return Some(entry.value.clone());
            }
        } else {
            return None;
        }
        // Expired: logically evicted, drop the carcass.
        debug!(cache_key = %key, "cache entry expired");
        self.entries.remove(key);
        None
    }

    /// Remove an entry unconditionally. A missing key is a no-op.
    pub fn invalidate(&self, key: &CacheKey) {
        if self.entries.remove(key).is_some() {
            debug!(cache_key = %key, "cache entry invalidated");
        }
    }

    /// Remove every entry of a view family.
    pub fn invalidate_family(&self, family: ViewKind) {
        self.entries.retain(|key, _| key.family() != family);
        debug!(view = %family, "cache view family invalidated");
    }

    /// Number of entries currently held, expired carcasses included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_lru(&self) {
        let victim = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().last_used)
            .map(|entry| *entry.key());
        if let Some(key) = victim {
            debug!(cache_key = %key, "evicting least-recently-used cache entry");
            self.entries.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    const TTL: Duration = Duration::from_secs(60);

    #[test]
    fn put_then_get_returns_value() {
        let cache = CacheStore::new(None);
        cache.put(CacheKey::Product(1), "bread", TTL);
        assert_eq!(cache.get(&CacheKey::Product(1)), Some("bread"));
        assert_eq!(cache.get(&CacheKey::Product(2)), None);
    }

    #[test]
    fn put_overwrites_prior_value() {
        let cache = CacheStore::new(None);
        cache.put(CacheKey::AllProducts, 1u32, TTL);
        cache.put(CacheKey::AllProducts, 2u32, TTL);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&CacheKey::AllProducts), Some(2));
    }

    #[test]
    fn expired_entry_reads_as_absent() {
        let cache = CacheStore::new(None);
        cache.put(CacheKey::Product(1), "bread", Duration::ZERO);
        assert_eq!(cache.get(&CacheKey::Product(1)), None);
        // Lazily removed on the failed get.
        assert!(cache.is_empty());

        cache.put(CacheKey::Product(1), "bread", Duration::from_millis(10));
        sleep(Duration::from_millis(20));
        assert_eq!(cache.get(&CacheKey::Product(1)), None);
    }

    #[test]
    fn reinsert_after_expiry_serves_again() {
        let cache = CacheStore::new(None);
        cache.put(CacheKey::Product(1), "stale", Duration::ZERO);
        assert_eq!(cache.get(&CacheKey::Product(1)), None);
        cache.put(CacheKey::Product(1), "fresh", TTL);
        assert_eq!(cache.get(&CacheKey::Product(1)), Some("fresh"));
    }

    #[test]
    fn invalidate_is_idempotent() {
        let cache = CacheStore::new(None);
        cache.put(CacheKey::Product(1), "bread", TTL);
        cache.invalidate(&CacheKey::Product(1));
        assert_eq!(cache.get(&CacheKey::Product(1)), None);
        // Second call on the now-missing key is a no-op.
        cache.invalidate(&CacheKey::Product(1));
        assert_eq!(cache.get(&CacheKey::Product(1)), None);
    }

    #[test]
    fn invalidate_family_spares_other_families() {
        let cache = CacheStore::new(None);
        cache.put(CacheKey::AllProducts, "bulk", TTL);
        cache.put(CacheKey::Product(1), "one", TTL);
        cache.put(CacheKey::Product(2), "two", TTL);

        cache.invalidate_family(ViewKind::Products);

        assert_eq!(cache.get(&CacheKey::Product(1)), None);
        assert_eq!(cache.get(&CacheKey::Product(2)), None);
        assert_eq!(cache.get(&CacheKey::AllProducts), Some("bulk"));
    }

    #[test]
    fn capacity_evicts_least_recently_used() {
        let cache = CacheStore::new(Some(2));
        cache.put(CacheKey::Product(1), 1u32, TTL);
        sleep(Duration::from_millis(2));
        cache.put(CacheKey::Product(2), 2u32, TTL);
        sleep(Duration::from_millis(2));

        // Touch 1 so 2 becomes the LRU victim.
        assert_eq!(cache.get(&CacheKey::Product(1)), Some(1));
        sleep(Duration::from_millis(2));

        cache.put(CacheKey::Product(3), 3u32, TTL);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&CacheKey::Product(2)), None);
        assert_eq!(cache.get(&CacheKey::Product(1)), Some(1));
        assert_eq!(cache.get(&CacheKey::Product(3)), Some(3));
    }

    #[test]
    fn overwrite_at_capacity_does_not_evict() {
        let cache = CacheStore::new(Some(2));
        cache.put(CacheKey::Product(1), 1u32, TTL);
        cache.put(CacheKey::Product(2), 2u32, TTL);
        cache.put(CacheKey::Product(2), 20u32, TTL);
        assert_eq!(cache.get(&CacheKey::Product(1)), Some(1));
        assert_eq!(cache.get(&CacheKey::Product(2)), Some(20));
    }
}
