//! Hubview Core - paginated, cached, retrying GitHub user browser.
//!
//! This crate provides the data-fetch core of a GitHub user viewer: a
//! controller that pages through `GET /users` with a cache in front of it,
//! and a controller that loads one user's profile and repositories. Both
//! retry transient failures with exponential backoff and publish their
//! state to subscribers.
//!
//! The `hubview` binary in `hubview-cli` drives these controllers from a
//! terminal.
//!
//! # Example
//!
//! ```rust,ignore
//! use hubview_core::{AppConfig, GitHubViewer};
//!
//! #[tokio::main]
//! async fn main() -> hubview_core::Result<()> {
//!     let viewer = GitHubViewer::builder(AppConfig::from_env()?).build()?;
//!
//!     let list = viewer.user_list();
//!     list.fetch_users().await;
//!     println!("Loaded {} users", list.snapshot().users.len());
//!
//!     let detail = viewer.user_detail("octocat");
//!     detail.load().await;
//!     println!("{} repositories", detail.snapshot().repositories.len());
//!
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod cache;
pub mod config;
pub mod controllers;
pub mod error;
pub mod models;
pub mod network;
pub mod state;

mod viewer;

// Re-export commonly used types
pub use analytics::{AnalyticsSink, EventName, TracingAnalytics};
pub use cache::{CacheBackend, CacheConfig, CacheService, MemoryCache, SqliteCache};
pub use config::{AppConfig, Environment};
pub use controllers::{
    UserDetailController, UserDetailField, UserDetailState, UserListController, UserListField,
    UserListState,
};
pub use error::{HubViewError, NetworkError, NetworkErrorKind, NetworkResult, Result};
pub use models::{Repository, User};
pub use network::{
    BackoffStrategy, ExponentialBackoff, GitHubClient, GitHubService, RetryPolicy,
};
pub use state::StateChange;
pub use viewer::{GitHubViewer, GitHubViewerBuilder};
