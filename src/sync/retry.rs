//! Retry manager for throttled platform calls with exponential backoff
//!
//! This module provides a retry mechanism with configurable backoff strategy,
//! jitter, and attempt limits. Only errors reporting themselves as retryable
//! (HTTP 429) are retried; everything else is returned to the caller as is.

use async_trait::async_trait;
use rand::Rng;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::config::RetryConfig;
use crate::error::{ApiError, RetryableError};

/// Suspends the current task between attempts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Sleep for the given duration
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Per-call retry bookkeeping
///
/// Created fresh for every logical call and dropped when the call returns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryState {
    /// Throttled attempts made so far
    pub attempt_count: u32,
    /// Wait before the next attempt
    pub wait: Duration,
}

impl RetryState {
    /// Initial state for a new call
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            attempt_count: 0,
            wait: Duration::from_secs(config.initial_backoff_secs),
        }
    }

    /// Record a throttled attempt and grow the wait, capped at the maximum
    pub fn advance(&mut self, config: &RetryConfig) {
        self.attempt_count += 1;
        let next = self.wait.as_secs_f64() * config.backoff_multiplier;
        self.wait = Duration::from_secs_f64(next.min(config.max_backoff_secs as f64));
    }

    /// Whether the attempt budget is used up
    pub fn exhausted(&self, config: &RetryConfig) -> bool {
        self.attempt_count >= config.max_attempts
    }
}

/// Retry manager with exponential backoff support
#[derive(Clone)]
pub struct RetryManager {
    config: RetryConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl fmt::Debug for RetryManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RetryManager {
    /// Create a RetryManager with a custom sleeper
    pub fn with_sleeper(config: RetryConfig, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { config, sleeper }
    }

    /// Execute an async operation with retry logic
    ///
    /// A retryable error is followed by a backoff sleep and a new attempt,
    /// until `max_attempts` attempts have been throttled. At that point
    /// `ApiError::RetriesExhausted` is returned without a further attempt.
    /// Non-retryable errors are returned immediately.
    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<T, ApiError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut state = RetryState::new(&self.config);

        loop {
            match operation().await {
                Ok(result) => {
                    if state.attempt_count > 0 {
                        debug!(
                            attempts = state.attempt_count + 1,
                            "Call succeeded after throttling"
                        );
                    }
                    return Ok(result);
                }
                Err(err) if err.is_retryable() => {
                    let delay = self.jittered(state.wait);
                    warn!(
                        attempt = state.attempt_count + 1,
                        max_attempts = self.config.max_attempts,
                        wait_secs = delay.as_secs(),
                        "Rate limit exceeded (429), waiting before retrying"
                    );

                    self.sleeper.sleep(delay).await;
                    state.advance(&self.config);

                    if state.exhausted(&self.config) {
                        error!(
                            attempts = state.attempt_count,
                            "Maximum attempts reached due to API throttling"
                        );
                        return Err(ApiError::RetriesExhausted {
                            attempts: state.attempt_count,
                        });
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn jittered(&self, wait: Duration) -> Duration {
        if self.config.jitter {
            // 50-100% of the calculated backoff
            let jitter = rand::thread_rng().gen_range(0.5..1.0);
            wait.mul_f64(jitter)
        } else {
            wait
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Sleeper that records requested durations instead of waiting
    #[derive(Default)]
    struct RecordingSleeper {
        slept: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        fn slept_secs(&self) -> Vec<u64> {
            self.slept.lock().unwrap().iter().map(|d| d.as_secs()).collect()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.slept.lock().unwrap().push(duration);
        }
    }

    fn manager(config: RetryConfig) -> (RetryManager, Arc<RecordingSleeper>) {
        let sleeper = Arc::new(RecordingSleeper::default());
        (RetryManager::with_sleeper(config, sleeper.clone()), sleeper)
    }

    // Test 1: Success on first attempt returns immediately
    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let (manager, sleeper) = manager(RetryConfig::default());
        let call_count = AtomicU32::new(0);

        let result = manager
            .execute(|| async {
                call_count.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ApiError>("success")
            })
            .await;

        assert_eq!(result, Ok("success"));
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert!(sleeper.slept_secs().is_empty());
    }

    // Test 2: Two throttles then success waits 60s then 120s
    #[tokio::test]
    async fn test_retry_succeeds_after_throttling() {
        let (manager, sleeper) = manager(RetryConfig::default());
        let call_count = AtomicU32::new(0);

        let result = manager
            .execute(|| async {
                let current = call_count.fetch_add(1, Ordering::SeqCst);
                if current < 2 {
                    Err(ApiError::Throttled)
                } else {
                    Ok("payload")
                }
            })
            .await;

        assert_eq!(result, Ok("payload"));
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
        assert_eq!(sleeper.slept_secs(), vec![60, 120]);
    }

    // Test 3: Gives up after max attempts without an extra sleep
    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let (manager, sleeper) = manager(RetryConfig::default());
        let call_count = AtomicU32::new(0);

        let result: Result<(), ApiError> = manager
            .execute(|| async {
                call_count.fetch_add(1, Ordering::SeqCst);
                Err(ApiError::Throttled)
            })
            .await;

        assert_eq!(result, Err(ApiError::RetriesExhausted { attempts: 10 }));
        assert_eq!(call_count.load(Ordering::SeqCst), 10);
        assert_eq!(
            sleeper.slept_secs(),
            vec![60, 120, 240, 480, 960, 1920, 3600, 3600, 3600, 3600]
        );
    }

    // Test 4: Non-retryable error returns immediately
    #[tokio::test]
    async fn test_non_retryable_error_returns_immediately() {
        let (manager, sleeper) = manager(RetryConfig::default());
        let call_count = AtomicU32::new(0);

        let result: Result<(), ApiError> = manager
            .execute(|| async {
                call_count.fetch_add(1, Ordering::SeqCst);
                Err(ApiError::Status {
                    status: 500,
                    body: "server exploded".to_string(),
                })
            })
            .await;

        assert!(matches!(result, Err(ApiError::Status { status: 500, .. })));
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert!(sleeper.slept_secs().is_empty());
    }

    // Test 5: RetryState doubles the wait from 60s
    #[test]
    fn test_retry_state_exponential_schedule() {
        let config = RetryConfig::default();
        let mut state = RetryState::new(&config);
        let mut waits = Vec::new();

        for _ in 0..6 {
            waits.push(state.wait.as_secs());
            state.advance(&config);
        }

        assert_eq!(waits, vec![60, 120, 240, 480, 960, 1920]);
    }

    // Test 6: RetryState wait is capped at max_backoff
    #[test]
    fn test_retry_state_capped_at_max() {
        let config = RetryConfig::default();
        let mut state = RetryState::new(&config);

        for _ in 0..9 {
            state.advance(&config);
        }

        assert_eq!(state.wait, Duration::from_secs(3600));
        assert_eq!(state.attempt_count, 9);
    }

    // Test 7: RetryState is exhausted after max_attempts advances
    #[test]
    fn test_retry_state_exhausted() {
        let config = RetryConfig::default();
        let mut state = RetryState::new(&config);

        for attempt in 0..config.max_attempts {
            assert_eq!(state.attempt_count, attempt);
            assert!(!state.exhausted(&config));
            state.advance(&config);
        }
        assert!(state.exhausted(&config));
    }

    // Test 8: Jitter reduces the sleep to the 50-100% range
    #[tokio::test]
    async fn test_jitter_within_range() {
        let (manager, sleeper) = manager(RetryConfig {
            max_attempts: 1,
            jitter: true,
            ..RetryConfig::default()
        });

        for _ in 0..50 {
            let _: Result<(), ApiError> =
                manager.execute(|| async { Err(ApiError::Throttled) }).await;
        }

        for secs in sleeper.slept.lock().unwrap().iter() {
            assert!(
                *secs >= Duration::from_secs(30) && *secs <= Duration::from_secs(60),
                "Backoff {:?} should be between 30-60 seconds",
                secs
            );
        }
    }

    // Test 9: Single attempt budget still sleeps once before giving up
    #[tokio::test]
    async fn test_single_attempt_budget() {
        let mut sleeper = MockSleeper::new();
        sleeper
            .expect_sleep()
            .withf(|d| *d == Duration::from_secs(5))
            .times(1)
            .returning(|_| ());

        let manager = RetryManager::with_sleeper(
            RetryConfig {
                max_attempts: 1,
                initial_backoff_secs: 5,
                ..RetryConfig::default()
            },
            Arc::new(sleeper),
        );

        let result: Result<(), ApiError> =
            manager.execute(|| async { Err(ApiError::Throttled) }).await;
        assert_eq!(result, Err(ApiError::RetriesExhausted { attempts: 1 }));
    }

    // Test 10: Each call starts with a fresh retry state
    #[tokio::test]
    async fn test_retry_state_not_shared_between_calls() {
        let (manager, sleeper) = manager(RetryConfig::default());

        for _ in 0..2 {
            let call_count = AtomicU32::new(0);
            let result = manager
                .execute(|| async {
                    if call_count.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(ApiError::Throttled)
                    } else {
                        Ok(())
                    }
                })
                .await;
            assert!(result.is_ok());
        }

        assert_eq!(sleeper.slept_secs(), vec![60, 60]);
    }
}
