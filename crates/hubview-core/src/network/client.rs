//! HTTP client for the GitHub REST API.
//!
//! Provides a wrapper around reqwest with:
//! - Configured request timeout and user agent
//! - Optional `Authorization: token …` header
//! - Rate limit tracking from response headers
//! - Classification of transport, status and decoding failures into
//!   [`NetworkError`]

use crate::config::{AppConfig, NetworkConfig};
use crate::error::{HttpStatusError, NetworkError, NetworkResult};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Rate limit state extracted from response headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitState {
    /// Remaining requests allowed.
    pub remaining: Option<u64>,
    /// Total request limit.
    pub limit: Option<u64>,
}

impl RateLimitState {
    /// True when fewer than 10% of the window's requests remain.
    pub fn is_low(&self) -> bool {
        match (self.remaining, self.limit) {
            (Some(remaining), Some(limit)) if limit > 0 => remaining < (limit / 10).max(1),
            _ => false,
        }
    }
}

/// HTTP client bound to one token and timeout.
pub struct HttpClient {
    client: Client,
    token: Option<String>,
    timeout: Duration,
    rate_limit_remaining: AtomicI64,
    rate_limit_limit: AtomicI64,
}

impl HttpClient {
    /// Create a client from the application configuration.
    pub fn new(config: &AppConfig) -> NetworkResult<Self> {
        Self::with_timeout(config.request_timeout, config.personal_access_token.clone())
    }

    /// Create a client with an explicit timeout and token.
    pub fn with_timeout(timeout: Duration, token: Option<String>) -> NetworkResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(NetworkConfig::USER_AGENT)
            .build()
            .map_err(NetworkError::network_failure)?;

        Ok(Self {
            client,
            token,
            timeout,
            rate_limit_remaining: AtomicI64::new(-1),
            rate_limit_limit: AtomicI64::new(-1),
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Rate limit reported by the most recent response.
    pub fn rate_limit_state(&self) -> RateLimitState {
        let load = |value: &AtomicI64| {
            let v = value.load(Ordering::SeqCst);
            (v >= 0).then_some(v as u64)
        };
        RateLimitState {
            remaining: load(&self.rate_limit_remaining),
            limit: load(&self.rate_limit_limit),
        }
    }

    /// GET `url` and decode the JSON body into `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> NetworkResult<T> {
        let mut request = self.client.get(url.clone()).header(ACCEPT, NetworkConfig::ACCEPT);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("token {}", token));
        }

        debug!("GET {}", url);
        let response = request.send().await?;
        self.update_rate_limits(&response);

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status, &url));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Check if an HTTP status code indicates a transient error.
    pub fn is_retryable_status(status: StatusCode) -> bool {
        matches!(status.as_u16(), 408 | 429 | 500 | 502 | 503 | 504)
    }

    fn update_rate_limits(&self, response: &Response) {
        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<i64>().ok())
        };

        if let Some(remaining) = header("X-RateLimit-Remaining") {
            self.rate_limit_remaining.store(remaining, Ordering::SeqCst);
        }
        if let Some(limit) = header("X-RateLimit-Limit") {
            self.rate_limit_limit.store(limit, Ordering::SeqCst);
        }

        let state = self.rate_limit_state();
        if state.is_low() {
            warn!(
                "GitHub rate limit nearly exhausted ({:?}/{:?} remaining)",
                state.remaining, state.limit
            );
        }
    }
}

/// Map a non-success status into the error taxonomy.
///
/// Transient statuses become network failures (and are retried); anything
/// else is terminal.
fn classify_status(status: StatusCode, url: &Url) -> NetworkError {
    let err = HttpStatusError {
        status: status.as_u16(),
        url: url.to_string(),
    };
    if HttpClient::is_retryable_status(status) {
        NetworkError::network_failure(err)
    } else {
        NetworkError::Unknown(err.to_string())
    }
}
