//! Deadline race

use std::future::Future;
use std::time::Duration;

use contracts::TimeoutError;
use tracing::warn;

/// Race `fut` against `timeout`.
///
/// On timeout the future is dropped, which cancels it at its next
/// suspension point. Work it already handed to other tasks keeps running;
/// use [`spawn_with_timeout`] when the work itself must be stopped.
pub async fn with_timeout<F, T, E>(timeout: Duration, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<TimeoutError>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(timed_out(timeout).into()),
    }
}

/// Run `fut` on its own task, aborting the task on timeout.
///
/// A panic inside the task is resumed on the caller.
pub async fn spawn_with_timeout<F, T, E>(timeout: Duration, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: From<TimeoutError> + Send + 'static,
{
    let mut handle = tokio::spawn(fut);

    match tokio::time::timeout(timeout, &mut handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => match join_err.try_into_panic() {
            Ok(payload) => std::panic::resume_unwind(payload),
            // cancelled by runtime shutdown
            Err(_) => Err(timed_out(timeout).into()),
        },
        Err(_) => {
            handle.abort();
            Err(timed_out(timeout).into())
        }
    }
}

fn timed_out(timeout: Duration) -> TimeoutError {
    let err = TimeoutError::new(timeout);
    observability::record_timeout(err.timeout_ms);
    warn!(timeout_ms = err.timeout_ms, "Operation timed out");
    err
}
