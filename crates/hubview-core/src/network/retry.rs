//! Retry logic with exponential backoff and jitter.
//!
//! Provides retry behavior for network operations with:
//! - Exponential backoff (delay doubles each retry)
//! - Jitter drawn from a seedable RNG so delays can be reproduced in tests
//! - Retry eligibility decided by [`NetworkError::is_retryable`]
//!
//! Attempts are numbered from 1. After the first failure up to `max_retries`
//! further attempts are made; once they are used up the caller gets
//! [`NetworkError::MaxRetriesExceeded`] instead of the last failure.

use crate::config::NetworkConfig;
use crate::error::{NetworkError, NetworkResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

/// Computes the delay before a retry.
pub trait BackoffStrategy: Send + Sync {
    /// Delay before retry number `retry` (1-based).
    fn delay(&self, retry: u32) -> Duration;
}

/// Exponential backoff with jitter:
/// `min(max_delay, base_delay * 2^retry * (1 + jitter))`, `jitter` in `[0, 1)`.
pub struct ExponentialBackoff {
    base_delay: Duration,
    max_delay: Duration,
    rng: Mutex<StdRng>,
}

impl ExponentialBackoff {
    /// Backoff with the default 1s base and 30s cap, seeded from the OS.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Backoff with a fixed seed, producing a reproducible delay sequence.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            base_delay: NetworkConfig::BASE_RETRY_DELAY,
            max_delay: NetworkConfig::MAX_RETRY_DELAY,
            rng: Mutex::new(rng),
        }
    }

    /// Set the base delay.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the maximum delay cap.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Delay for `retry` given an explicit jitter value in `[0, 1)`.
    pub fn delay_with_jitter(&self, retry: u32, jitter: f64) -> Duration {
        let multiplier = 2f64.powi(retry as i32);
        let delay_secs = self.base_delay.as_secs_f64() * multiplier * (1.0 + jitter);
        Duration::from_secs_f64(delay_secs.min(self.max_delay.as_secs_f64()))
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExponentialBackoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExponentialBackoff")
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish_non_exhaustive()
    }
}

impl BackoffStrategy for ExponentialBackoff {
    fn delay(&self, retry: u32) -> Duration {
        let jitter: f64 = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .random();
        self.delay_with_jitter(retry, jitter)
    }
}

/// How many times to retry and how long to wait in between.
#[derive(Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    backoff: Arc<dyn BackoffStrategy>,
}

impl RetryPolicy {
    /// Three retries with [`ExponentialBackoff`].
    pub fn new() -> Self {
        Self {
            max_retries: NetworkConfig::MAX_RETRIES,
            backoff: Arc::new(ExponentialBackoff::new()),
        }
    }

    /// Set the number of retries after the first attempt.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Replace the backoff strategy.
    pub fn with_backoff(mut self, backoff: impl BackoffStrategy + 'static) -> Self {
        self.backoff = Arc::new(backoff);
        self
    }

    pub fn backoff(&self) -> &dyn BackoffStrategy {
        self.backoff.as_ref()
    }

    /// Run `operation` under this policy. See [`retry_async`].
    pub async fn run<F, Fut, T>(&self, operation: F) -> NetworkResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = NetworkResult<T>>,
    {
        retry_async(operation, self.max_retries, self.backoff.as_ref()).await
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

/// Retry an async operation with backoff.
///
/// Errors that are not [retryable](NetworkError::is_retryable) are returned
/// unchanged after the first attempt. Retryable errors are retried up to
/// `max_retries` times, sleeping `backoff.delay(k)` before retry `k`; if every
/// attempt fails the result is [`NetworkError::MaxRetriesExceeded`].
pub async fn retry_async<F, Fut, T>(
    mut operation: F,
    max_retries: u32,
    backoff: &dyn BackoffStrategy,
) -> NetworkResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = NetworkResult<T>>,
{
    let mut retry = 0;

    loop {
        match operation().await {
            Ok(value) => {
                if retry > 0 {
                    debug!("Operation succeeded after {} attempts", retry + 1);
                }
                return Ok(value);
            }
            Err(e) if !e.is_retryable() => {
                debug!("Error is not retryable: {}", e);
                return Err(e);
            }
            Err(e) => {
                if retry >= max_retries {
                    warn!(
                        "All {} attempts exhausted. Last error: {}",
                        retry + 1,
                        e
                    );
                    return Err(NetworkError::MaxRetriesExceeded { attempts: retry + 1 });
                }

                retry += 1;
                let delay = backoff.delay(retry);
                warn!(
                    attempt = retry,
                    delay_secs = delay.as_secs_f64(),
                    "Retrying network call. Attempt: {}, Delay: {:.2}s ({})",
                    retry,
                    delay.as_secs_f64(),
                    e
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{HttpStatusError, NetworkErrorKind};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn transient() -> NetworkError {
        NetworkError::network_failure(HttpStatusError {
            status: 503,
            url: "https://api.github.com/users".into(),
        })
    }

    /// Records requested retry numbers and never waits.
    #[derive(Default)]
    struct RecordingBackoff {
        calls: Mutex<Vec<u32>>,
    }

    impl BackoffStrategy for RecordingBackoff {
        fn delay(&self, retry: u32) -> Duration {
            self.calls.lock().unwrap().push(retry);
            Duration::ZERO
        }
    }

    #[test]
    fn test_delay_without_jitter() {
        let backoff = ExponentialBackoff::seeded(1);

        assert_eq!(backoff.delay_with_jitter(1, 0.0), Duration::from_secs(2));
        assert_eq!(backoff.delay_with_jitter(2, 0.0), Duration::from_secs(4));
        assert_eq!(backoff.delay_with_jitter(3, 0.0), Duration::from_secs(8));
        assert_eq!(backoff.delay_with_jitter(3, 0.5), Duration::from_secs(12));
    }

    #[test]
    fn test_delay_capped_at_max() {
        let backoff = ExponentialBackoff::seeded(1);

        // 1 * 2^5 = 32s before jitter, capped at 30s
        assert_eq!(backoff.delay_with_jitter(5, 0.0), Duration::from_secs(30));
        assert_eq!(backoff.delay_with_jitter(10, 0.99), Duration::from_secs(30));
    }

    #[test]
    fn test_jittered_delay_within_bounds() {
        let backoff = ExponentialBackoff::seeded(42);

        for retry in 1..=6u32 {
            let floor = 2f64.powi(retry as i32).min(30.0);
            let ceiling = (2f64.powi(retry as i32) * 2.0).min(30.0);
            for _ in 0..50 {
                let delay = backoff.delay(retry).as_secs_f64();
                assert!(
                    delay >= floor && delay <= ceiling,
                    "retry {} delay {} outside [{}, {}]",
                    retry,
                    delay,
                    floor,
                    ceiling
                );
            }
        }
    }

    #[test]
    fn test_seeded_backoff_is_reproducible() {
        let a = ExponentialBackoff::seeded(7);
        let b = ExponentialBackoff::seeded(7);

        let first: Vec<Duration> = (1..=3).map(|k| a.delay(k)).collect();
        let second: Vec<Duration> = (1..=3).map(|k| b.delay(k)).collect();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_retry_succeeds_first_try() {
        let backoff = RecordingBackoff::default();

        let result = retry_async(|| async { Ok::<_, NetworkError>(42) }, 3, &backoff).await;

        assert_eq!(result.unwrap(), 42);
        assert!(backoff.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_failures() {
        let backoff = RecordingBackoff::default();
        let counter = AtomicU32::new(0);

        let result = retry_async(
            || {
                let count = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if count < 2 {
                        Err(transient())
                    } else {
                        Ok(42)
                    }
                }
            },
            3,
            &backoff,
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(*backoff.calls.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_retry_exhausted() {
        let backoff = RecordingBackoff::default();
        let counter = AtomicU32::new(0);

        let result: NetworkResult<u32> = retry_async(
            || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(transient()) }
            },
            3,
            &backoff,
        )
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.kind(), NetworkErrorKind::MaxRetriesExceeded);
        assert!(matches!(err, NetworkError::MaxRetriesExceeded { attempts: 4 }));
        assert_eq!(counter.load(Ordering::SeqCst), 4);
        assert_eq!(*backoff.calls.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_invalid_url_is_retried() {
        let backoff = RecordingBackoff::default();
        let counter = AtomicU32::new(0);

        let result: NetworkResult<u32> = retry_async(
            || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(NetworkError::InvalidUrl("::".into())) }
            },
            2,
            &backoff,
        )
        .await;

        assert_eq!(result.unwrap_err().kind(), NetworkErrorKind::MaxRetriesExceeded);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_non_retryable_error() {
        let backoff = RecordingBackoff::default();
        let counter = AtomicU32::new(0);

        let result: NetworkResult<u32> = retry_async(
            || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(NetworkError::Unknown("HTTP 404".into())) }
            },
            3,
            &backoff,
        )
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.kind(), NetworkErrorKind::Unknown);
        assert_eq!(err.to_string(), "An unknown error occurred: HTTP 404");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(backoff.calls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_policy_sleeps_between_attempts() {
        let policy = RetryPolicy::new()
            .with_max_retries(2)
            .with_backoff(ExponentialBackoff::seeded(3));
        let started = tokio::time::Instant::now();

        let result: NetworkResult<u32> = policy.run(|| async { Err(transient()) }).await;

        assert!(result.is_err());
        // Retry 1 waits at least 2s and retry 2 at least 4s.
        assert!(started.elapsed() >= Duration::from_secs(6));
        assert!(started.elapsed() <= Duration::from_secs(12));
    }
}
