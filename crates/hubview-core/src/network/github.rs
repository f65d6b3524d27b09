//! GitHub API access for users and repositories.
//!
//! Provides:
//! - [`GitHubService`], the narrow interface the controllers depend on
//! - [`GitHubClient`], its implementation over [`HttpClient`]
//!
//! Retries are not done here; callers wrap these calls in a
//! [`RetryPolicy`](crate::network::RetryPolicy).

use crate::config::AppConfig;
use crate::error::NetworkResult;
use crate::models::{Repository, User};
use crate::network::client::HttpClient;
use async_trait::async_trait;
use tracing::debug;
use url::Url;

/// Read-only GitHub operations used by the controllers.
#[async_trait]
pub trait GitHubService: Send + Sync {
    /// One page of users with ids greater than `since`.
    async fn fetch_users(&self, since: u64) -> NetworkResult<Vec<User>>;

    /// Full profile of one user.
    async fn fetch_user_details(&self, username: &str) -> NetworkResult<User>;

    /// Repositories owned by one user, forks included.
    async fn fetch_user_repositories(&self, username: &str) -> NetworkResult<Vec<Repository>>;
}

/// GitHub REST API client.
pub struct GitHubClient {
    http: HttpClient,
    api_base: String,
}

impl GitHubClient {
    /// Create a client for the configured base URL, timeout and token.
    pub fn new(config: &AppConfig) -> NetworkResult<Self> {
        Ok(Self {
            http: HttpClient::new(config)?,
            api_base: config.api_base().to_string(),
        })
    }

    fn users_url(&self, since: u64) -> NetworkResult<Url> {
        Ok(Url::parse(&format!("{}/users?since={}", self.api_base, since))?)
    }

    fn user_url(&self, username: &str) -> NetworkResult<Url> {
        Ok(Url::parse(&format!(
            "{}/users/{}",
            self.api_base,
            urlencoding::encode(username)
        ))?)
    }

    fn repos_url(&self, username: &str) -> NetworkResult<Url> {
        Ok(Url::parse(&format!(
            "{}/users/{}/repos?type=owner",
            self.api_base,
            urlencoding::encode(username)
        ))?)
    }
}

#[async_trait]
impl GitHubService for GitHubClient {
    async fn fetch_users(&self, since: u64) -> NetworkResult<Vec<User>> {
        let users: Vec<User> = self.http.get_json(self.users_url(since)?).await?;
        debug!("Fetched {} users since {}", users.len(), since);
        Ok(users)
    }

    async fn fetch_user_details(&self, username: &str) -> NetworkResult<User> {
        self.http.get_json(self.user_url(username)?).await
    }

    async fn fetch_user_repositories(&self, username: &str) -> NetworkResult<Vec<Repository>> {
        let repos: Vec<Repository> = self.http.get_json(self.repos_url(username)?).await?;
        debug!("Fetched {} repositories for {}", repos.len(), username);
        Ok(repos)
    }
}
