//! In-memory cache backed by mini-moka.

use super::traits::{CacheBackend, CacheConfig};
use crate::error::Result;
use mini_moka::sync::Cache;

/// In-process cache with a TTL, lost when the process exits.
///
/// Used when persistence is disabled and in tests.
pub struct MemoryCache {
    entries: Cache<String, Vec<u8>>,
}

impl MemoryCache {
    /// Maximum number of pages kept.
    pub const MAX_CAPACITY: u64 = 1_000;

    pub fn new() -> Self {
        Self::with_config(&CacheConfig::default())
    }

    /// Create a cache using the TTL from `config`.
    ///
    /// The namespace is ignored since the cache is private to its owner.
    pub fn with_config(config: &CacheConfig) -> Self {
        Self {
            entries: Cache::builder()
                .time_to_live(config.default_ttl)
                .max_capacity(Self::MAX_CAPACITY)
                .build(),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheBackend for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(&key.to_string()))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn invalidate(&self, key: &str) -> Result<bool> {
        let key = key.to_string();
        let existed = self.entries.get(&key).is_some();
        self.entries.invalidate(&key);
        Ok(existed)
    }

    fn clear_all(&self) -> Result<()> {
        self.entries.invalidate_all();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_set_get_invalidate() {
        let cache = MemoryCache::new();

        cache.set("users_page_0", b"[1]").unwrap();
        assert_eq!(cache.get("users_page_0").unwrap().unwrap(), b"[1]");

        assert!(cache.invalidate("users_page_0").unwrap());
        assert!(!cache.invalidate("users_page_0").unwrap());
        assert!(cache.get("users_page_0").unwrap().is_none());
    }

    #[test]
    fn test_clear_all() {
        let cache = MemoryCache::new();
        cache.set("a", b"1").unwrap();
        cache.set("b", b"2").unwrap();

        cache.clear_all().unwrap();

        assert!(cache.get("a").unwrap().is_none());
        assert!(cache.get("b").unwrap().is_none());
        assert_eq!(cache.cleanup_expired().unwrap(), 0);
    }

    #[test]
    fn test_ttl_expiry() {
        let config = CacheConfig::default().with_ttl(Duration::from_millis(50));
        let cache = MemoryCache::with_config(&config);

        cache.set("short", b"lived").unwrap();
        assert!(cache.get("short").unwrap().is_some());

        std::thread::sleep(Duration::from_millis(120));
        assert!(cache.get("short").unwrap().is_none());
    }
}
