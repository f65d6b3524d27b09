//! Cache backend trait and configuration.

use crate::error::Result;
use std::time::Duration;

/// Configuration for cache behavior.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Time-to-live applied to every entry written with [`CacheBackend::set`].
    pub default_ttl: Duration,
    /// Namespace the backend reads and writes. Backends sharing one database
    /// but using different namespaces never see each other's keys.
    pub namespace: String,
}

impl CacheConfig {
    /// Default time-to-live for cache entries (1 day).
    pub const DEFAULT_TTL_SECS: u64 = 86_400;
    /// Namespace used for GitHub user pages.
    pub const DEFAULT_NAMESPACE: &'static str = "github_users";

    /// Set the time-to-live.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(CacheConfig::DEFAULT_TTL_SECS),
            namespace: CacheConfig::DEFAULT_NAMESPACE.to_string(),
        }
    }
}

/// Key-value byte storage with expiry.
///
/// All operations are synchronous to match rusqlite's API. There is no
/// transactional guarantee between a `get` and a later `set`.
pub trait CacheBackend: Send + Sync {
    /// Get cached data by key.
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store data under `key` with the configured TTL, replacing any
    /// existing entry.
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Delete one key. Returns whether an entry was removed.
    fn invalidate(&self, key: &str) -> Result<bool>;

    /// Delete every entry.
    fn clear_all(&self) -> Result<()>;

    /// Remove expired entries, returning how many were removed.
    ///
    /// Backends that drop expired entries on their own return 0.
    fn cleanup_expired(&self) -> Result<usize> {
        Ok(0)
    }
}
