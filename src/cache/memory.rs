//! Memory Tier Module
//!
//! HashMap-backed cache with lazy TTL expiry, guarded by a single RwLock.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::cache::{Cache, CacheItem};
use crate::error::{CacheError, Result};

// == Memory Cache ==
/// In-memory cache tier.
///
/// Expired entries are only removed when a lookup finds them; there is no
/// background sweep and no capacity bound.
#[derive(Debug)]
pub struct MemoryCache<V> {
    /// Key-value storage
    caches: RwLock<HashMap<String, CacheItem<V>>>,
    /// Most recent failure recorded by any operation
    last_err: Mutex<Option<CacheError>>,
}

impl<V> Default for MemoryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> MemoryCache<V> {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            caches: RwLock::new(HashMap::new()),
            last_err: Mutex::new(None),
        }
    }

    // == Count ==
    /// Number of entries in the map, including expired ones not yet swept.
    pub fn count(&self) -> usize {
        self.caches.read().len()
    }

    // == Last Error ==
    /// The most recent error recorded by a failing operation.
    pub fn last_err(&self) -> Option<CacheError> {
        self.last_err.lock().clone()
    }

    /// Stores `err` in the last-error slot and hands it back.
    pub(crate) fn record_err(&self, err: CacheError) -> CacheError {
        warn!(error = %err, "Cache operation failed");
        *self.last_err.lock() = Some(err.clone());
        err
    }

    /// Inserts an already-built item, replacing any previous entry.
    pub(crate) fn insert_item(&self, key: &str, item: CacheItem<V>) {
        self.caches.write().insert(key.to_string(), item);
    }

    /// Snapshot of the keys currently in the map.
    pub(crate) fn keys(&self) -> Vec<String> {
        self.caches.read().keys().cloned().collect()
    }

    /// Removes `key` if the entry stored there is still expired.
    ///
    /// Called after the read guard is released, so the entry may have been
    /// refreshed in the meantime.
    fn sweep(&self, key: &str) {
        let mut caches = self.caches.write();
        if caches.get(key).is_some_and(CacheItem::is_expired) {
            caches.remove(key);
            debug!(key = %key, "Swept expired entry");
        }
    }
}

impl<V: Clone> MemoryCache<V> {
    /// Stores a new item and returns a copy of what now sits in the map.
    pub(crate) fn store(&self, key: &str, val: V, ttl: Duration) -> CacheItem<V> {
        let item = CacheItem::with_ttl(val, ttl);
        self.caches.write().insert(key.to_string(), item.clone());
        debug!(key = %key, exp = item.exp, "Stored entry");
        item
    }
}

impl<V: Clone> Cache<V> for MemoryCache<V> {
    // == Has ==
    fn has(&self, key: &str) -> bool {
        let live = match self.caches.read().get(key) {
            Some(item) => item.is_live(),
            None => return false,
        };

        if !live {
            self.sweep(key);
        }
        live
    }

    // == Get ==
    fn get(&self, key: &str) -> Option<V> {
        {
            let caches = self.caches.read();
            match caches.get(key) {
                Some(item) if item.is_live() => return Some(item.val.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        self.sweep(key);
        None
    }

    // == Set ==
    fn set(&self, key: &str, val: V, ttl: Duration) -> Result<()> {
        self.store(key, val, ttl);
        Ok(())
    }

    // == Delete ==
    fn del(&self, key: &str) -> Result<()> {
        if self.caches.write().remove(key).is_some() {
            debug!(key = %key, "Deleted entry");
        }
        Ok(())
    }

    // == Clear ==
    fn clear(&self) -> Result<()> {
        self.caches.write().clear();
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::current_timestamp;
    use crate::cache::item::wait_for_second_start;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::thread;

    fn expired_item<V>(val: V) -> CacheItem<V> {
        CacheItem {
            exp: current_timestamp() - 10,
            val,
        }
    }

    #[test]
    fn test_memory_new() {
        let cache: MemoryCache<String> = MemoryCache::new();
        assert_eq!(cache.count(), 0);
        assert!(cache.last_err().is_none());
    }

    #[test]
    fn test_set_has_get_del() {
        let cache = MemoryCache::new();

        cache.set("a", 42, Duration::ZERO).unwrap();
        assert!(cache.has("a"));
        assert_eq!(cache.get("a"), Some(42));

        cache.del("a").unwrap();
        assert!(!cache.has("a"));
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_get_nonexistent() {
        let cache: MemoryCache<i32> = MemoryCache::new();
        assert_eq!(cache.get("nonexistent"), None);
    }

    #[test]
    fn test_del_nonexistent_is_ok() {
        let cache: MemoryCache<i32> = MemoryCache::new();
        assert!(cache.del("nonexistent").is_ok());
    }

    #[test]
    fn test_overwrite_replaces_item() {
        let cache = MemoryCache::new();

        cache.set("k", "v1", Duration::from_secs(60)).unwrap();
        cache.set("k", "v2", Duration::ZERO).unwrap();

        assert_eq!(cache.get("k"), Some("v2"));
        assert_eq!(cache.count(), 1);
    }

    #[test]
    fn test_expired_entry_is_swept_on_get() {
        let cache = MemoryCache::new();
        cache.insert_item("old", expired_item("stale"));

        // Unswept entries still count
        assert_eq!(cache.count(), 1);

        assert_eq!(cache.get("old"), None);
        assert_eq!(cache.count(), 0);
    }

    #[test]
    fn test_expired_entry_is_swept_on_has() {
        let cache = MemoryCache::new();
        cache.insert_item("old", expired_item(1));

        assert!(!cache.has("old"));
        assert_eq!(cache.count(), 0);
    }

    #[test]
    fn test_ttl_expiration() {
        wait_for_second_start();
        let cache = MemoryCache::new();
        cache.set("b", "x", Duration::from_secs(1)).unwrap();

        assert_eq!(cache.get("b"), Some("x"));

        thread::sleep(Duration::from_millis(1100));

        assert_eq!(cache.get("b"), None);
        assert!(!cache.has("b"));
    }

    #[test]
    fn test_ttl_boundary_late_in_second() {
        // Set late in a second; the entry must still be gone once ttl has passed
        wait_for_second_start();
        thread::sleep(Duration::from_millis(700));
        let cache = MemoryCache::new();
        let set_second = current_timestamp();
        cache.set("b", "x", Duration::from_secs(1)).unwrap();

        thread::sleep(Duration::from_millis(1050));

        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.count(), 0);
        assert!(current_timestamp() >= set_second + 1);
    }

    #[test]
    fn test_stored_exp_is_set_second_plus_ttl() {
        wait_for_second_start();
        let cache = MemoryCache::new();
        let set_second = current_timestamp();

        let item = cache.store("k", 1u8, Duration::from_secs(30));

        assert_eq!(item.exp, set_second + 30);
    }

    #[test]
    fn test_get_multi_positional() {
        let cache = MemoryCache::new();
        cache.set("k1", 1, Duration::ZERO).unwrap();
        cache.set("k3", 3, Duration::ZERO).unwrap();
        cache.insert_item("k4", expired_item(4));

        let values = cache.get_multi(&["k1", "k2", "k3", "k4"]);
        assert_eq!(values, vec![Some(1), None, Some(3), None]);
    }

    #[test]
    fn test_set_multi_and_del_multi() {
        let cache = MemoryCache::new();
        let values: HashMap<&str, u32> = [("a", 1), ("b", 2), ("c", 3)].into_iter().collect();

        cache.set_multi(values, Duration::ZERO).unwrap();
        assert_eq!(cache.count(), 3);

        cache.del_multi(&["a", "c", "missing"]).unwrap();
        assert_eq!(cache.count(), 1);
        assert_eq!(cache.get("b"), Some(2));
    }

    #[test]
    fn test_clear() {
        let cache = MemoryCache::new();
        cache.set("a", 1, Duration::ZERO).unwrap();
        cache.set("b", 2, Duration::ZERO).unwrap();

        cache.clear().unwrap();

        assert_eq!(cache.count(), 0);
        assert!(!cache.has("a"));
        // Still usable after clearing
        cache.set("c", 3, Duration::ZERO).unwrap();
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn test_record_err_keeps_latest() {
        let cache: MemoryCache<()> = MemoryCache::new();
        let first = CacheError::io(std::path::Path::new("one"), std::io::ErrorKind::NotFound.into());
        let second = CacheError::io(
            std::path::Path::new("two"),
            std::io::ErrorKind::PermissionDenied.into(),
        );

        cache.record_err(first);
        cache.record_err(second);

        let last = cache.last_err().unwrap();
        assert!(last.to_string().contains("two"));
    }

    #[test]
    fn test_concurrent_access() {
        let cache: Arc<MemoryCache<u32>> = Arc::new(MemoryCache::new());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..100 {
                        let key = format!("{t}-{i}");
                        cache.set(&key, i, Duration::ZERO).unwrap();
                        assert_eq!(cache.get(&key), Some(i));
                        assert!(cache.has(&key));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.count(), 800);
    }
}
