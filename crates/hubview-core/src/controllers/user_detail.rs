//! Profile and repositories of a single user.
//!
//! The two requests are independent: each has its own loading flag and only
//! writes its own part of the state, so one failing leaves the other's
//! result in place. Repositories are never cached and forks are dropped.

use crate::analytics::{AnalyticsSink, EventName};
use crate::error::NetworkError;
use crate::models::{Repository, User};
use crate::network::{GitHubService, RetryPolicy};
use crate::state::{StateChange, StateStore, Transaction};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Published state of a [`UserDetailController`].
#[derive(Debug, Clone, Default)]
pub struct UserDetailState {
    pub user: Option<User>,
    /// Non-fork repositories from the latest successful fetch.
    pub repositories: Vec<Repository>,
    /// True while either request is running.
    pub is_loading: bool,
    pub loading_user: bool,
    pub loading_repositories: bool,
    pub error: Option<NetworkError>,
}

/// Field of [`UserDetailState`] named in change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserDetailField {
    User,
    Repositories,
    IsLoading,
    LoadingUser,
    LoadingRepositories,
    Error,
}

pub type UserDetailChange = StateChange<UserDetailState, UserDetailField>;

#[derive(Debug, Clone, Copy)]
enum Request {
    User,
    Repositories,
}

impl Request {
    fn field(self) -> UserDetailField {
        match self {
            Request::User => UserDetailField::LoadingUser,
            Request::Repositories => UserDetailField::LoadingRepositories,
        }
    }
}

/// Loads one user's profile and repositories.
pub struct UserDetailController {
    username: String,
    github: Arc<dyn GitHubService>,
    analytics: Arc<dyn AnalyticsSink>,
    retry_policy: RetryPolicy,
    store: StateStore<UserDetailState, UserDetailField>,
    generation: AtomicU64,
}

impl UserDetailController {
    /// Create an idle controller. Nothing is fetched until
    /// [`load`](Self::load) or one of the fetch methods is called.
    pub fn new(
        username: impl Into<String>,
        github: Arc<dyn GitHubService>,
        analytics: Arc<dyn AnalyticsSink>,
        retry_policy: RetryPolicy,
    ) -> Self {
        let username = username.into();
        debug!("User detail controller created for {}", username);

        Self {
            username,
            github,
            analytics,
            retry_policy,
            store: StateStore::new(UserDetailState::default()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn snapshot(&self) -> UserDetailState {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<UserDetailChange> {
        self.store.subscribe()
    }

    /// Fetch profile and repositories concurrently.
    pub async fn load(&self) {
        let username = self.username.as_str();
        tokio::join!(
            self.fetch_user_details(username),
            self.fetch_user_repositories(username)
        );
    }

    /// Clear the error and fetch both again.
    pub async fn retry(&self) {
        self.store.transaction(|tx| {
            self.generation.fetch_add(1, Ordering::SeqCst);
            tx.set(UserDetailField::Error, |s| s.error = None);
        });
        info!("Retrying user detail for {}", self.username);

        self.load().await;
    }

    /// Fetch the profile of `username`.
    pub async fn fetch_user_details(&self, username: &str) {
        let generation = self.begin(Request::User);

        let github = self.github.as_ref();
        let result = self
            .retry_policy
            .run(|| github.fetch_user_details(username))
            .await;

        let viewed = result.as_ref().ok().map(|user| user.login.clone());
        let applied = self.finish(generation, Request::User, result, |tx, user| {
            tx.set(UserDetailField::User, |s| s.user = Some(user));
        });

        if let (true, Some(login)) = (applied, viewed) {
            self.analytics
                .track_event(EventName::USER_DETAIL_VIEWED, json!({ "username": login }));
        }
    }

    /// Fetch the repositories of `username`, dropping forks.
    pub async fn fetch_user_repositories(&self, username: &str) {
        let generation = self.begin(Request::Repositories);

        let github = self.github.as_ref();
        let result = self
            .retry_policy
            .run(|| github.fetch_user_repositories(username))
            .await
            .map(|repos| {
                repos
                    .into_iter()
                    .filter(|repo| !repo.fork)
                    .collect::<Vec<_>>()
            });

        if let Ok(repos) = &result {
            debug!("{} has {} non-fork repositories", username, repos.len());
        }

        self.finish(generation, Request::Repositories, result, |tx, repos| {
            tx.set(UserDetailField::Repositories, |s| s.repositories = repos);
        });
    }

    /// Mark `request` as loading and return the current generation.
    fn begin(&self, request: Request) -> u64 {
        self.store.transaction(|tx| {
            set_loading(tx, request, true);
            self.generation.load(Ordering::SeqCst)
        })
    }

    /// Publish the outcome of `request` unless a retry superseded it.
    fn finish<T>(
        &self,
        generation: u64,
        request: Request,
        result: Result<T, NetworkError>,
        on_success: impl FnOnce(&mut Transaction<'_, UserDetailState, UserDetailField>, T),
    ) -> bool {
        let applied = self.store.transaction(|tx| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return None;
            }
            let failure = match result {
                Ok(value) => {
                    on_success(tx, value);
                    None
                }
                Err(e) => {
                    let wrapped = NetworkError::network_failure(e);
                    tx.set(UserDetailField::Error, |s| s.error = Some(wrapped.clone()));
                    Some(wrapped)
                }
            };
            set_loading(tx, request, false);
            Some(failure)
        });

        match applied {
            None => {
                debug!("Discarding stale {:?} response for {}", request, self.username);
                false
            }
            Some(Some(err)) => {
                error!("Failed to load {:?} for {}: {}", request, self.username, err);
                false
            }
            Some(None) => true,
        }
    }
}

/// Set one request's loading flag and keep `is_loading` in sync with the pair.
fn set_loading(
    tx: &mut Transaction<'_, UserDetailState, UserDetailField>,
    request: Request,
    value: bool,
) {
    tx.set(request.field(), |s| match request {
        Request::User => s.loading_user = value,
        Request::Repositories => s.loading_repositories = value,
    });

    let any = tx.state().loading_user || tx.state().loading_repositories;
    if tx.state().is_loading != any {
        tx.set(UserDetailField::IsLoading, |s| s.is_loading = any);
    }
}
