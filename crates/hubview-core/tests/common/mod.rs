//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use hubview_core::analytics::AnalyticsSink;
use hubview_core::{
    BackoffStrategy, CacheService, GitHubService, MemoryCache, NetworkError, NetworkResult,
    Repository, RetryPolicy, User,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub fn user(id: u64) -> User {
    User {
        id,
        login: format!("user{}", id),
        avatar_url: format!("https://avatars.example.com/u/{}", id),
        name: None,
        followers: None,
        following: None,
    }
}

pub fn users(ids: std::ops::Range<u64>) -> Vec<User> {
    ids.map(user).collect()
}

pub fn repo(id: u64, fork: bool) -> Repository {
    Repository {
        id,
        name: format!("repo{}", id),
        description: None,
        language: Some("Rust".to_string()),
        stargazers_count: id as u32,
        html_url: format!("https://github.com/octocat/repo{}", id),
        fork,
    }
}

pub fn transient() -> NetworkError {
    NetworkError::network_failure(std::io::Error::new(
        std::io::ErrorKind::ConnectionReset,
        "connection reset",
    ))
}

/// Backoff that never waits.
pub struct NoDelay;

impl BackoffStrategy for NoDelay {
    fn delay(&self, _retry: u32) -> Duration {
        Duration::ZERO
    }
}

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new().with_backoff(NoDelay)
}

pub fn memory_cache() -> CacheService {
    CacheService::new(Arc::new(MemoryCache::new()))
}

/// Scripted [`GitHubService`]. Each call pops the next queued response;
/// an empty queue answers with a terminal error.
#[derive(Default)]
pub struct MockGitHub {
    users: Mutex<VecDeque<NetworkResult<Vec<User>>>>,
    details: Mutex<VecDeque<NetworkResult<User>>>,
    repos: Mutex<VecDeque<NetworkResult<Vec<Repository>>>>,
    since_calls: Mutex<Vec<u64>>,
    detail_calls: AtomicUsize,
    repo_calls: AtomicUsize,
    users_gate: Mutex<Option<Arc<Notify>>>,
    details_gate: Mutex<Option<Arc<Notify>>>,
}

impl MockGitHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_users(&self, response: NetworkResult<Vec<User>>) {
        self.users.lock().unwrap().push_back(response);
    }

    pub fn push_details(&self, response: NetworkResult<User>) {
        self.details.lock().unwrap().push_back(response);
    }

    pub fn push_repos(&self, response: NetworkResult<Vec<Repository>>) {
        self.repos.lock().unwrap().push_back(response);
    }

    /// Hold the next `fetch_users` call until `gate` is notified.
    pub fn gate_next_users_call(&self, gate: Arc<Notify>) {
        *self.users_gate.lock().unwrap() = Some(gate);
    }

    /// Hold the next `fetch_user_details` call until `gate` is notified.
    pub fn gate_next_details_call(&self, gate: Arc<Notify>) {
        *self.details_gate.lock().unwrap() = Some(gate);
    }

    /// `since` values of every `fetch_users` call so far.
    pub fn since_calls(&self) -> Vec<u64> {
        self.since_calls.lock().unwrap().clone()
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub fn repo_calls(&self) -> usize {
        self.repo_calls.load(Ordering::SeqCst)
    }

    /// Wait until `fetch_users` has been called `n` times.
    pub async fn wait_for_users_calls(&self, n: usize) {
        while self.since_calls.lock().unwrap().len() < n {
            tokio::task::yield_now().await;
        }
    }

    /// Wait until `fetch_user_details` has been called `n` times.
    pub async fn wait_for_detail_calls(&self, n: usize) {
        while self.detail_calls() < n {
            tokio::task::yield_now().await;
        }
    }
}

fn unscripted<T>() -> NetworkResult<T> {
    Err(NetworkError::Unknown("no scripted response".to_string()))
}

#[async_trait]
impl GitHubService for MockGitHub {
    async fn fetch_users(&self, since: u64) -> NetworkResult<Vec<User>> {
        let response = self.users.lock().unwrap().pop_front();
        let gate = self.users_gate.lock().unwrap().take();
        self.since_calls.lock().unwrap().push(since);

        if let Some(gate) = gate {
            gate.notified().await;
        }
        response.unwrap_or_else(unscripted)
    }

    async fn fetch_user_details(&self, _username: &str) -> NetworkResult<User> {
        let response = self.details.lock().unwrap().pop_front();
        let gate = self.details_gate.lock().unwrap().take();
        self.detail_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = gate {
            gate.notified().await;
        }
        response.unwrap_or_else(unscripted)
    }

    async fn fetch_user_repositories(&self, _username: &str) -> NetworkResult<Vec<Repository>> {
        self.repo_calls.fetch_add(1, Ordering::SeqCst);
        let response = self.repos.lock().unwrap().pop_front();
        response.unwrap_or_else(unscripted)
    }
}

/// Analytics sink that records everything it is given.
#[derive(Default)]
pub struct RecordingAnalytics {
    screens: Mutex<Vec<String>>,
    events: Mutex<Vec<(String, Value)>>,
    errors: Mutex<Vec<NetworkError>>,
}

impl RecordingAnalytics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn screens(&self) -> Vec<String> {
        self.screens.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<(String, Value)> {
        self.events.lock().unwrap().clone()
    }

    pub fn event_names(&self) -> Vec<String> {
        self.events().into_iter().map(|(name, _)| name).collect()
    }

    pub fn errors(&self) -> Vec<NetworkError> {
        self.errors.lock().unwrap().clone()
    }
}

impl AnalyticsSink for RecordingAnalytics {
    fn track_screen_view(&self, screen: &str) {
        self.screens.lock().unwrap().push(screen.to_string());
    }

    fn track_event(&self, name: &str, parameters: Value) {
        self.events
            .lock()
            .unwrap()
            .push((name.to_string(), parameters));
    }

    fn track_error(&self, error: &NetworkError) {
        self.errors.lock().unwrap().push(error.clone());
    }
}
