//! Retry with exponential backoff

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use contracts::ResilienceConfig;
use tracing::{debug, error, warn};

/// Bounded retry policy: `max_attempts` tries, delay doubling from `initial_delay`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first one (0 behaves as 1)
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
        }
    }

    pub fn from_config(config: &ResilienceConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.initial_delay_ms),
        )
    }

    /// Delay after the `failures`-th failed attempt (1-indexed):
    /// `initial_delay × 2^(failures-1)`, no jitter and no cap.
    pub fn delay_for(&self, failures: u32) -> Duration {
        let factor = 2u32.saturating_pow(failures.saturating_sub(1));
        self.initial_delay.saturating_mul(factor)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ResilienceConfig::default())
    }
}

/// Retry `op` on any error.
///
/// Attempts are strictly sequential. After the last attempt the error is
/// returned as-is, so callers can still match on its kind.
pub async fn retry_with_backoff<F, Fut, T, E>(policy: &RetryPolicy, op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    retry_with_backoff_if(policy, op, |_| true).await
}

/// Retry `op` while `is_retryable` accepts the error.
///
/// A rejected error is returned immediately, without waiting.
pub async fn retry_with_backoff_if<F, Fut, T, E, R>(
    policy: &RetryPolicy,
    mut op: F,
    is_retryable: R,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    R: Fn(&E) -> bool,
{
    let max_attempts = policy.attempts();
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if !is_retryable(&e) => {
                warn!(attempt, error = %e, "Operation failed with non-retryable error");
                return Err(e);
            }
            Err(e) if attempt >= max_attempts => {
                observability::record_retry_exhausted();
                error!(attempts = attempt, error = %e, "Retry attempts exhausted");
                return Err(e);
            }
            Err(e) => {
                let delay = policy.delay_for(attempt);
                let delay_ms = delay.as_millis() as u64;
                warn!(
                    attempt,
                    max_attempts,
                    delay_ms,
                    error = %e,
                    "Attempt failed, retrying after backoff"
                );
                observability::record_retry_attempt(attempt, delay_ms);

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tokio::time::Instant;

    fn policy(max_attempts: u32, initial_ms: u64) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(initial_ms))
    }

    #[test]
    fn test_delay_doubles() {
        let p = policy(5, 500);
        assert_eq!(p.delay_for(1), Duration::from_millis(500));
        assert_eq!(p.delay_for(2), Duration::from_millis(1000));
        assert_eq!(p.delay_for(3), Duration::from_millis(2000));
        assert_eq!(p.delay_for(4), Duration::from_millis(4000));
    }

    #[test]
    fn test_delay_saturates() {
        let p = policy(100, 500);
        assert_eq!(p.delay_for(64), p.delay_for(33));
        assert!(p.delay_for(64) > p.delay_for(32));
    }

    #[test]
    fn test_default_matches_config_defaults() {
        assert_eq!(RetryPolicy::default(), policy(3, 500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_two_failures() {
        let calls = Cell::new(0);
        let started = Instant::now();

        let result: Result<&str, String> = retry_with_backoff(&policy(3, 500), || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move {
                if n < 3 {
                    Err(format!("failure {n}"))
                } else {
                    Ok("done")
                }
            }
        })
        .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.get(), 3);
        assert!(started.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error_unchanged() {
        let calls = Cell::new(0);

        let result: Result<(), String> = retry_with_backoff(&policy(3, 500), || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move { Err(format!("failure {n}")) }
        })
        .await;

        assert_eq!(result, Err("failure 3".to_string()));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error_returns_immediately() {
        let calls = Cell::new(0);
        let started = Instant::now();

        let result: Result<(), String> = retry_with_backoff_if(
            &policy(3, 500),
            || {
                calls.set(calls.get() + 1);
                async { Err("bad input".to_string()) }
            },
            |e| !e.starts_with("bad"),
        )
        .await;

        assert_eq!(result, Err("bad input".to_string()));
        assert_eq!(calls.get(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_runs_once() {
        let calls = Cell::new(0);

        let result: Result<(), String> = retry_with_backoff(&policy(0, 500), || {
            calls.set(calls.get() + 1);
            async { Err("nope".to_string()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_waits_for_previous_backoff() {
        let stamps = std::cell::RefCell::new(Vec::new());
        let started = Instant::now();

        let _: Result<(), String> = retry_with_backoff(&policy(3, 100), || {
            stamps.borrow_mut().push(started.elapsed());
            async { Err("down".to_string()) }
        })
        .await;

        let stamps = stamps.into_inner();
        assert_eq!(stamps.len(), 3);
        assert!(stamps[1] - stamps[0] >= Duration::from_millis(100));
        assert!(stamps[2] - stamps[1] >= Duration::from_millis(200));
    }
}
