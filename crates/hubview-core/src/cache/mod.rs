//! Page cache for hubview.
//!
//! Provides:
//! - [`CacheBackend`], the byte-level key-value store interface
//! - [`SqliteCache`], persistent and namespaced, shared across runs
//! - [`MemoryCache`], in-process with a TTL
//! - [`CacheService`], the typed JSON facade the controllers use

mod memory;
mod service;
mod sqlite;
mod traits;

pub use memory::MemoryCache;
pub use service::{users_namespace, users_page_key, CacheService};
pub use sqlite::SqliteCache;
pub use traits::{CacheBackend, CacheConfig};
