//! SQLite-based persistent cache.

use super::traits::{CacheBackend, CacheConfig};
use crate::error::{HubViewError, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// SQLite-based cache backend.
///
/// Entries are stored under the namespace from [`CacheConfig`], so several
/// caches may share one database file. Thread-safe via an internal mutex on
/// the connection.
pub struct SqliteCache {
    /// Database connection (wrapped for thread safety).
    conn: Arc<Mutex<Connection>>,
    /// Cache configuration.
    config: CacheConfig,
}

impl SqliteCache {
    /// Create a new cache at the specified database path.
    ///
    /// Creates the database and tables if they don't exist.
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(db_path, CacheConfig::default())
    }

    /// Create a new cache with custom configuration.
    pub fn with_config(db_path: impl AsRef<Path>, config: CacheConfig) -> Result<Self> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| HubViewError::Io {
                message: format!("Failed to create cache directory: {}", e),
                path: Some(parent.to_path_buf()),
                source: Some(e),
            })?;
        }

        let conn = Connection::open(db_path).map_err(|e| HubViewError::Database {
            message: format!("Failed to open cache database: {}", e),
            source: Some(e),
        })?;

        // WAL lets a second process read while this one writes.
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| HubViewError::Database {
                message: format!("Failed to set pragmas: {}", e),
                source: Some(e),
            })?;

        let cache = Self {
            conn: Arc::new(Mutex::new(conn)),
            config,
        };

        cache.init_schema()?;
        debug!(
            "Opened SQLite cache at {} (namespace '{}')",
            db_path.display(),
            cache.config.namespace
        );

        Ok(cache)
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| HubViewError::Database {
            message: format!("Failed to lock database: {}", e),
            source: None,
        })
    }

    /// Initialize database schema.
    fn init_schema(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS cache_entries (
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                value BLOB NOT NULL,
                cached_at TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                PRIMARY KEY (namespace, key)
            );

            CREATE INDEX IF NOT EXISTS idx_cache_expires
                ON cache_entries(namespace, expires_at);
            "#,
        )
        .map_err(|e| HubViewError::Database {
            message: format!("Failed to initialize cache schema: {}", e),
            source: Some(e),
        })?;

        Ok(())
    }

    /// Store data with an explicit expiration time.
    pub fn set_with_expiry(&self, key: &str, value: &[u8], expires_at: DateTime<Utc>) -> Result<()> {
        let conn = self.lock()?;

        let now = Utc::now().to_rfc3339();
        let expires_str = expires_at.to_rfc3339();

        conn.execute(
            r#"
            INSERT OR REPLACE INTO cache_entries
            (namespace, key, value, cached_at, expires_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![self.config.namespace, key, value, now, expires_str],
        )
        .map_err(|e| HubViewError::Database {
            message: format!("Failed to set cache entry: {}", e),
            source: Some(e),
        })?;

        Ok(())
    }

    /// Number of unexpired entries in this namespace.
    pub fn entry_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM cache_entries WHERE namespace = ?1 AND expires_at > ?2",
                params![self.config.namespace, now],
                |row| row.get(0),
            )
            .map_err(|e| HubViewError::Database {
                message: format!("Failed to count cache entries: {}", e),
                source: Some(e),
            })?;

        Ok(count as usize)
    }
}

impl CacheBackend for SqliteCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();

        conn.query_row(
            r#"
            SELECT value FROM cache_entries
            WHERE namespace = ?1 AND key = ?2 AND expires_at > ?3
            "#,
            params![self.config.namespace, key, now],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| HubViewError::Database {
            message: format!("Failed to query cache entry: {}", e),
            source: Some(e),
        })
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let expires_at =
            Utc::now() + chrono::Duration::from_std(self.config.default_ttl).unwrap_or_default();
        self.set_with_expiry(key, value, expires_at)
    }

    fn invalidate(&self, key: &str) -> Result<bool> {
        let conn = self.lock()?;

        let deleted = conn
            .execute(
                "DELETE FROM cache_entries WHERE namespace = ?1 AND key = ?2",
                params![self.config.namespace, key],
            )
            .map_err(|e| HubViewError::Database {
                message: format!("Failed to invalidate cache entry: {}", e),
                source: Some(e),
            })?;

        Ok(deleted > 0)
    }

    fn clear_all(&self) -> Result<()> {
        let conn = self.lock()?;

        let deleted = conn
            .execute(
                "DELETE FROM cache_entries WHERE namespace = ?1",
                params![self.config.namespace],
            )
            .map_err(|e| HubViewError::Database {
                message: format!("Failed to clear cache entries: {}", e),
                source: Some(e),
            })?;

        debug!(
            "Cleared {} entries from namespace '{}'",
            deleted, self.config.namespace
        );

        Ok(())
    }

    fn cleanup_expired(&self) -> Result<usize> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();

        let deleted = conn
            .execute(
                "DELETE FROM cache_entries WHERE namespace = ?1 AND expires_at <= ?2",
                params![self.config.namespace, now],
            )
            .map_err(|e| HubViewError::Database {
                message: format!("Failed to cleanup expired entries: {}", e),
                source: Some(e),
            })?;

        if deleted > 0 {
            debug!("Cleaned up {} expired cache entries", deleted);
        }

        Ok(deleted)
    }
}
