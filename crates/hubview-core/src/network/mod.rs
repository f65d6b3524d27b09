//! Network access: HTTP client, GitHub API and retries.
//!
//! This module provides:
//! - HTTP client with rate limit awareness and error classification
//! - GitHub users/repositories API behind the [`GitHubService`] trait
//! - Retry logic with exponential backoff and jitter

mod client;
mod github;
mod retry;

pub use client::{HttpClient, RateLimitState};
pub use github::{GitHubClient, GitHubService};
pub use retry::{retry_async, BackoffStrategy, ExponentialBackoff, RetryPolicy};
