//! Typed access to a [`CacheBackend`].

use super::traits::CacheBackend;
use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Cache key for one page of the user list.
pub fn users_page_key(page: u32) -> String {
    format!("users_page_{}", page)
}

/// Cache namespace for user pages fetched from `api_base` with `page_size`
/// users per page. Page `n` only has a fixed offset for one such pair.
pub fn users_namespace(api_base: &str, page_size: u32) -> String {
    format!("users:{}:{}", api_base, page_size)
}

/// Serializes values to JSON bytes on the way in and back on the way out.
#[derive(Clone)]
pub struct CacheService {
    backend: Arc<dyn CacheBackend>,
}

impl CacheService {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }

    /// Store `value` under `key`.
    pub fn cache<T: Serialize + ?Sized>(&self, value: &T, key: &str) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.backend.set(key, &bytes)?;
        debug!("Cached {} bytes under '{}'", bytes.len(), key);
        Ok(())
    }

    /// Load the value stored under `key`.
    ///
    /// Missing keys, storage errors and undecodable data all come back as
    /// `None`; the latter two are logged.
    pub fn retrieve<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = match self.backend.get(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read cache entry '{}': {}", key, e);
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Discarding corrupt cache entry '{}': {}", key, e);
                None
            }
        }
    }

    /// Remove one key.
    pub fn clear(&self, key: &str) -> Result<bool> {
        self.backend.invalidate(key)
    }

    /// Remove every key.
    pub fn clear_all(&self) -> Result<()> {
        self.backend.clear_all()
    }

    /// Remove expired entries.
    pub fn prune(&self) -> Result<usize> {
        self.backend.cleanup_expired()
    }
}
