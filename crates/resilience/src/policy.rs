//! ExecutionPolicy - retry and timeout composed per configuration

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use contracts::{CoordError, ResilienceConfig, TimeoutError, TimeoutScope};

use crate::retry::{retry_with_backoff_if, RetryPolicy};
use crate::timeout::with_timeout;

/// Retry policy plus a timeout budget and where that budget applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionPolicy {
    pub retry: RetryPolicy,
    pub timeout: Duration,
    pub scope: TimeoutScope,
}

impl ExecutionPolicy {
    pub fn new(retry: RetryPolicy, timeout: Duration, scope: TimeoutScope) -> Self {
        Self {
            retry,
            timeout,
            scope,
        }
    }

    pub fn from_config(config: &ResilienceConfig) -> Self {
        Self::new(
            RetryPolicy::from_config(config),
            Duration::from_millis(config.timeout_ms),
            config.timeout_scope,
        )
    }

    /// Retry classification for coordination errors.
    ///
    /// Transient failures are retried. Timeouts are retried only when the
    /// budget applies per attempt.
    pub fn should_retry(&self, err: &CoordError) -> bool {
        err.is_transient() || (self.scope == TimeoutScope::PerAttempt && err.is_timeout())
    }

    /// Run `op` under this policy.
    ///
    /// - `Overall`: `with_timeout(budget, retry(op))`
    /// - `PerAttempt`: `retry(with_timeout(budget, op))`
    pub async fn run<F, Fut, T, E, R>(&self, mut op: F, is_retryable: R) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<TimeoutError> + Display,
        R: Fn(&E) -> bool,
    {
        match self.scope {
            TimeoutScope::Overall => {
                with_timeout(
                    self.timeout,
                    retry_with_backoff_if(&self.retry, op, is_retryable),
                )
                .await
            }
            TimeoutScope::PerAttempt => {
                let timeout = self.timeout;
                retry_with_backoff_if(&self.retry, || with_timeout(timeout, op()), is_retryable)
                    .await
            }
        }
    }
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self::from_config(&ResilienceConfig::default())
    }
}
