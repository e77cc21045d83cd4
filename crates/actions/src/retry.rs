//! Bounded retry executor with cooperative cancellation.
//!
//! # Policy
//!
//! - Budget: 3 attempts by default (the first call counts)
//! - Backoff: fixed 1 second between attempts, not exponential
//! - Cancellation: checked before every attempt and raced against the backoff
//!   wait; an attempt already running is never interrupted
//!
//! The last attempt's error is returned unchanged so callers see the
//! operation's own failure, not a wrapper.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::Aborted;

/// Default number of attempts per logical call.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default fixed delay between attempts.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// Maximum number of attempts for one logical call. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RetryBudget(u32);

impl RetryBudget {
    /// Creates a budget of `attempts`.
    ///
    /// Returns `None` if `attempts` is zero.
    #[must_use]
    pub fn new(attempts: u32) -> Option<Self> {
        if attempts == 0 {
            None
        } else {
            Some(Self(attempts))
        }
    }

    /// A budget of exactly one attempt (no retries).
    pub fn single() -> Self {
        Self(1)
    }

    /// Returns the number of attempts.
    pub fn attempts(self) -> u32 {
        self.0
    }
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self(DEFAULT_MAX_ATTEMPTS)
    }
}

impl std::fmt::Display for RetryBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of attempts.
    pub budget: RetryBudget,
    /// Fixed delay between a failed attempt and the next one.
    pub backoff: Duration,
}

impl RetryConfig {
    /// Default backoff with the given budget.
    pub fn with_budget(budget: RetryBudget) -> Self {
        Self {
            budget,
            backoff: DEFAULT_BACKOFF,
        }
    }

    /// Replaces the backoff delay.
    #[must_use]
    pub fn backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::with_budget(RetryBudget::default())
    }
}

/// Runs `operation` until it succeeds, the budget is spent, or `cancellation`
/// fires.
///
/// # Errors
///
/// - `E::from(Aborted)` if the token is cancelled before an attempt starts or
///   while waiting between attempts.
/// - The operation's own error from the last permitted attempt.
pub async fn attempt<T, E, F, Fut>(
    mut operation: F,
    config: &RetryConfig,
    cancellation: Option<&CancellationToken>,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<Aborted> + std::fmt::Display,
{
    let attempts = config.budget.attempts();
    let mut index = 0;

    loop {
        if cancellation.is_some_and(CancellationToken::is_cancelled) {
            tracing::debug!(attempt = index, "Cancelled before attempt");
            return Err(Aborted.into());
        }

        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };
        index += 1;

        if index >= attempts {
            tracing::warn!(attempts, error = %error, "Retry budget exhausted");
            return Err(error);
        }

        tracing::debug!(
            attempt = index,
            error = %error,
            delay_ms = config.backoff.as_millis() as u64,
            "Attempt failed; retrying after backoff"
        );
        wait_backoff(config.backoff, cancellation).await?;
    }
}

async fn wait_backoff(
    backoff: Duration,
    cancellation: Option<&CancellationToken>,
) -> Result<(), Aborted> {
    match cancellation {
        Some(token) => tokio::select! {
            _ = token.cancelled() => {
                tracing::debug!("Cancelled during backoff");
                Err(Aborted)
            }
            _ = tokio::time::sleep(backoff) => Ok(()),
        },
        None => {
            tokio::time::sleep(backoff).await;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use thiserror::Error;

    #[derive(Debug, Error, PartialEq)]
    enum TestError {
        #[error("aborted")]
        Aborted,
        #[error("attempt {0} failed")]
        Failed(u32),
    }

    impl From<Aborted> for TestError {
        fn from(_: Aborted) -> Self {
            Self::Aborted
        }
    }

    /// Fast retry config for tests (no delays).
    fn fast_config(attempts: u32) -> RetryConfig {
        RetryConfig::with_budget(RetryBudget::new(attempts).unwrap()).backoff(Duration::ZERO)
    }

    #[test]
    fn test_budget_rejects_zero() {
        assert!(RetryBudget::new(0).is_none());
        assert_eq!(RetryBudget::default().attempts(), 3);
        assert_eq!(RetryBudget::single().attempts(), 1);
        assert_eq!(RetryConfig::default().backoff, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_success_on_first_attempt_calls_once() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<&str, TestError> = attempt(
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok("done")
            },
            &fast_config(3),
            None,
        )
        .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_succeeds_on_third_attempt() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<u32, TestError> = attempt(
            move || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(TestError::Failed(n))
                } else {
                    Ok(n)
                }
            },
            &fast_config(3),
            None,
        )
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_budget_returns_last_error() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<u32, TestError> = attempt(
            move || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(TestError::Failed(n))
                } else {
                    Ok(n)
                }
            },
            &fast_config(2),
            None,
        )
        .await;

        assert_eq!(result, Err(TestError::Failed(2)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancelled_token_prevents_any_attempt() {
        let calls = AtomicU32::new(0);
        let token = CancellationToken::new();
        token.cancel();

        let counter = &calls;
        let result: Result<(), TestError> = attempt(
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
            &fast_config(3),
            Some(&token),
        )
        .await;

        assert_eq!(result, Err(TestError::Aborted));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_inside_attempt_stops_next_attempt() {
        let calls = AtomicU32::new(0);
        let token = CancellationToken::new();

        let (counter, canceller) = (&calls, &token);
        let result: Result<(), TestError> = attempt(
            move || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                canceller.cancel();
                Err(TestError::Failed(n))
            },
            &fast_config(3),
            Some(&token),
        )
        .await;

        assert_eq!(result, Err(TestError::Aborted));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_is_fixed_one_second() {
        let start = tokio::time::Instant::now();
        let result: Result<(), TestError> = attempt(
            || async { Err(TestError::Failed(0)) },
            &RetryConfig::default(),
            None,
        )
        .await;

        assert_eq!(result, Err(TestError::Failed(0)));
        // Two waits between three attempts.
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff_returns_immediately() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            canceller.cancel();
        });

        let start = tokio::time::Instant::now();
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), TestError> = attempt(
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Failed(1))
            },
            &RetryConfig::default().backoff(Duration::from_secs(60)),
            Some(&token),
        )
        .await;

        assert_eq!(result, Err(TestError::Aborted));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() < Duration::from_secs(60));
    }
}
