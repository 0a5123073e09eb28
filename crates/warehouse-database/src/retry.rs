//! Bounded retries for transient storage failures.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use warehouse_core::config::retry::RetryConfig;
use warehouse_core::{AppError, AppResult};

use crate::error::{is_transient, translate};

/// Upper bound on any single backoff sleep.
const MAX_DELAY: Duration = Duration::from_secs(30);

/// Attempts, initial delay, and multiplicative backoff.
///
/// The closure handed to [`RetryPolicy::run`] must be a complete unit:
/// a read, or a whole transaction that is either committed or rolled back
/// by the time it returns.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    attempts: u32,
    delay: Duration,
    backoff: f64,
}

impl RetryPolicy {
    /// Build a policy from configuration.
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.attempts, config.delay(), config.backoff)
    }

    /// Build a policy from explicit values. At least one attempt is made.
    pub fn new(attempts: u32, delay: Duration, backoff: f64) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
            backoff: if backoff.is_finite() && backoff > 0.0 { backoff } else { 1.0 },
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO, 1.0)
    }

    /// Sleep before retry number `retry` (1-based).
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.delay.as_secs_f64() * self.backoff.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(MAX_DELAY)
            .min(MAX_DELAY)
    }

    /// Run `op` until it succeeds, fails permanently, runs out of
    /// attempts, or `cancel` fires.
    ///
    /// Cancellation drops the in-flight attempt, which rolls back any open
    /// transaction, and returns `Cancelled`.
    pub async fn run<T, F, Fut>(
        &self,
        operation: &'static str,
        cancel: &CancellationToken,
        mut op: F,
    ) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, sqlx::Error>>,
    {
        let mut attempt = 1;
        loop {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(AppError::cancelled(operation)),
                result = op() => result,
            };

            match result {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.attempts && is_transient(&err) => {
                    let delay = self.delay_for_retry(attempt);
                    warn!(
                        operation,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "Transient storage error, retrying"
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(AppError::cancelled(operation)),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
                Err(err) => return Err(translate(operation, err)),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use warehouse_core::ErrorKind;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(100), 2.0)
    }

    #[test]
    fn test_backoff_grows_multiplicatively() {
        let p = policy();
        assert_eq!(p.delay_for_retry(1), Duration::from_millis(100));
        assert_eq!(p.delay_for_retry(2), Duration::from_millis(200));
        assert_eq!(p.delay_for_retry(3), Duration::from_millis(400));
        assert_eq!(
            RetryPolicy::new(3, Duration::from_secs(10), 100.0).delay_for_retry(5),
            MAX_DELAY
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_are_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let cancel = CancellationToken::new();

        let value = policy()
            .run("test.read", &cancel, || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(sqlx::Error::PoolTimedOut)
                    } else {
                        Ok(42)
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempts_are_bounded() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let cancel = CancellationToken::new();

        let err = policy()
            .run("test.read", &cancel, || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(sqlx::Error::PoolTimedOut)
                }
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Internal);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let cancel = CancellationToken::new();

        let err = policy()
            .run("test.get", &cancel, || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(sqlx::Error::RowNotFound)
                }
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = policy()
            .run("test.read", &cancel, || async { Ok::<_, sqlx::Error>(1) })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_backoff() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = RetryPolicy::new(5, Duration::from_secs(10), 1.0)
            .run("test.read", &cancel, || async {
                Err::<(), _>(sqlx::Error::PoolTimedOut)
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Cancelled);
    }
}
