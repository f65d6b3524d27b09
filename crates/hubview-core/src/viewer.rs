//! Composition root: wires configuration, client, cache and analytics into
//! controllers.

use crate::analytics::{AnalyticsSink, TracingAnalytics};
use crate::cache::{
    users_namespace, CacheBackend, CacheConfig, CacheService, MemoryCache, SqliteCache,
};
use crate::config::AppConfig;
use crate::controllers::{UserDetailController, UserListController};
use crate::error::Result;
use crate::network::{GitHubClient, GitHubService, RetryPolicy};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Shared services for building controllers.
///
/// Cheap to clone; every controller built from one viewer shares its client,
/// cache and analytics sink.
#[derive(Clone)]
pub struct GitHubViewer {
    config: AppConfig,
    github: Arc<dyn GitHubService>,
    cache: CacheService,
    analytics: Arc<dyn AnalyticsSink>,
    retry_policy: RetryPolicy,
}

impl GitHubViewer {
    /// Start configuring a viewer.
    pub fn builder(config: AppConfig) -> GitHubViewerBuilder {
        GitHubViewerBuilder::new(config)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn cache(&self) -> &CacheService {
        &self.cache
    }

    /// New user list controller starting at page 0.
    ///
    /// Nothing is fetched yet; call [`UserListController::fetch_users`] for
    /// the first page.
    pub fn user_list(&self) -> Arc<UserListController> {
        Arc::new(UserListController::new(
            self.github.clone(),
            self.cache.clone(),
            self.analytics.clone(),
            self.retry_policy.clone(),
            self.config.max_users_per_page,
        ))
    }

    /// New detail controller bound to `username`.
    ///
    /// Nothing is fetched yet; call [`UserDetailController::load`] to fetch
    /// the profile and repositories.
    pub fn user_detail(&self, username: impl Into<String>) -> Arc<UserDetailController> {
        Arc::new(UserDetailController::new(
            username,
            self.github.clone(),
            self.analytics.clone(),
            self.retry_policy.clone(),
        ))
    }

    /// Remove every cached page in this viewer's namespace.
    pub fn clear_cache(&self) -> Result<()> {
        self.cache.clear_all()?;
        info!("Cleared user page cache");
        Ok(())
    }

    /// Remove expired cache entries, returning how many were removed.
    pub fn prune_cache(&self) -> Result<usize> {
        self.cache.prune()
    }
}

enum CacheChoice {
    Memory,
    Sqlite(PathBuf),
    Custom(Arc<dyn CacheBackend>),
}

/// Builder for [`GitHubViewer`].
///
/// # Example
///
/// ```rust,ignore
/// use hubview_core::{AppConfig, GitHubViewer};
///
/// let viewer = GitHubViewer::builder(AppConfig::from_env()?)
///     .with_sqlite_cache("/tmp/hubview/cache.sqlite")
///     .build()?;
/// let list = viewer.user_list();
/// list.fetch_users().await;
/// ```
pub struct GitHubViewerBuilder {
    config: AppConfig,
    cache: CacheChoice,
    cache_config: Option<CacheConfig>,
    analytics: Option<Arc<dyn AnalyticsSink>>,
    retry_policy: Option<RetryPolicy>,
    github: Option<Arc<dyn GitHubService>>,
}

impl GitHubViewerBuilder {
    /// Create a builder. Defaults to an in-memory cache, the tracing
    /// analytics sink and [`RetryPolicy::default`].
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            cache: CacheChoice::Memory,
            cache_config: None,
            analytics: None,
            retry_policy: None,
            github: None,
        }
    }

    /// Persist pages in a SQLite database at `path`.
    pub fn with_sqlite_cache(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache = CacheChoice::Sqlite(path.into());
        self
    }

    /// Keep pages in memory only.
    pub fn with_memory_cache(mut self) -> Self {
        self.cache = CacheChoice::Memory;
        self
    }

    /// Use a caller-provided cache backend.
    pub fn with_cache_backend(mut self, backend: Arc<dyn CacheBackend>) -> Self {
        self.cache = CacheChoice::Custom(backend);
        self
    }

    /// TTL and namespace for the built-in cache backends.
    ///
    /// Without one, pages live in a namespace derived from the API base URL
    /// and page size (see [`users_namespace`]), so configurations sharing a
    /// database never read each other's pages.
    pub fn with_cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = Some(config);
        self
    }

    pub fn with_analytics(mut self, analytics: Arc<dyn AnalyticsSink>) -> Self {
        self.analytics = Some(analytics);
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Replace the GitHub client, e.g. with a test double.
    pub fn with_github_service(mut self, github: Arc<dyn GitHubService>) -> Self {
        self.github = Some(github);
        self
    }

    /// Build the viewer.
    pub fn build(self) -> Result<GitHubViewer> {
        let github: Arc<dyn GitHubService> = match self.github {
            Some(github) => github,
            None => Arc::new(GitHubClient::new(&self.config)?),
        };

        let cache_config = self.cache_config.unwrap_or_else(|| {
            CacheConfig::default().with_namespace(users_namespace(
                self.config.api_base(),
                self.config.max_users_per_page,
            ))
        });

        let backend: Arc<dyn CacheBackend> = match self.cache {
            CacheChoice::Memory => Arc::new(MemoryCache::with_config(&cache_config)),
            CacheChoice::Sqlite(path) => Arc::new(SqliteCache::with_config(&path, cache_config)?),
            CacheChoice::Custom(backend) => backend,
        };

        debug!(
            "Building viewer for {} ({}, {} users per page)",
            self.config.api_base(),
            self.config.environment,
            self.config.max_users_per_page
        );

        Ok(GitHubViewer {
            config: self.config,
            github,
            cache: CacheService::new(backend),
            analytics: self
                .analytics
                .unwrap_or_else(|| Arc::new(TracingAnalytics)),
            retry_policy: self.retry_policy.unwrap_or_default(),
        })
    }
}
