//! Retry execution with policy-based backoff
//!
//! Remote calls against the AtomSphere API share one retry driver so the
//! backoff behavior stays consistent across the catalog fetcher and the
//! per-component XML retrieval. A predicate decides which errors are worth
//! retrying; authentication failures short-circuit on the first attempt.

use std::future::Future;
use std::time::{Duration, Instant};

use rand::Rng;

/// How the delay between attempts grows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetryStrategy {
    /// No delay between attempts
    None,

    /// Same delay before every attempt
    FixedDelay,

    /// Delay doubles (by `backoff_multiplier`) each attempt (default)
    #[default]
    ExponentialBackoff,
}

/// Retry policy for a class of remote calls
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,

    /// Backoff strategy
    pub strategy: RetryStrategy,

    /// Multiplier applied per attempt for exponential backoff
    pub backoff_multiplier: f64,

    /// Delay before the second attempt, in milliseconds
    pub initial_delay_ms: u64,

    /// Cap on any single delay, in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            strategy: RetryStrategy::ExponentialBackoff,
            backoff_multiplier: 2.0,
            initial_delay_ms: 500,
            max_delay_ms: 10_000,
        }
    }
}

/// Error from a retried operation
#[derive(Debug)]
pub enum RetryError<E> {
    /// All attempts failed; carries the error from the final attempt
    Exhausted {
        attempts: u32,
        source: E,
        total_duration: Duration,
    },

    /// The predicate rejected the error, so no further attempts were made
    NonRetryable(E),
}

impl<E: std::fmt::Display> std::fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryError::Exhausted {
                attempts,
                source,
                total_duration,
            } => write!(
                f,
                "retry exhausted after {} attempts over {:.2}s: {}",
                attempts,
                total_duration.as_secs_f64(),
                source
            ),
            RetryError::NonRetryable(source) => write!(f, "non-retryable error: {}", source),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RetryError::Exhausted { source, .. } => Some(source),
            RetryError::NonRetryable(source) => Some(source),
        }
    }
}

impl<E> RetryError<E> {
    /// Whether all attempts were used up
    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }

    /// Get the underlying error, consuming this error
    pub fn into_source(self) -> E {
        match self {
            RetryError::Exhausted { source, .. } => source,
            RetryError::NonRetryable(source) => source,
        }
    }
}

/// Calculate the delay before the next attempt
///
/// `attempt` is 1-indexed (the attempt that just failed). Jitter adds up to
/// 25% random variation to spread out concurrent retries.
pub fn calculate_delay(policy: &RetryPolicy, attempt: u32, jitter: bool) -> Duration {
    let attempt_index = attempt.saturating_sub(1);

    let base_delay_ms = match policy.strategy {
        RetryStrategy::None => 0,
        RetryStrategy::FixedDelay => policy.initial_delay_ms,
        RetryStrategy::ExponentialBackoff => {
            let multiplier = policy.backoff_multiplier.powf(attempt_index as f64);
            (policy.initial_delay_ms as f64 * multiplier) as u64
        }
    };

    let capped_delay_ms = base_delay_ms.min(policy.max_delay_ms);

    let final_delay_ms = if jitter && capped_delay_ms > 0 {
        let jitter_range = capped_delay_ms / 4;
        capped_delay_ms + rand::rng().random_range(0..=jitter_range)
    } else {
        capped_delay_ms
    };

    Duration::from_millis(final_delay_ms)
}

/// Execute an async operation with retry logic
///
/// `operation` names the call for log context. `should_retry` is consulted
/// after every failure; a `false` stops immediately with
/// [`RetryError::NonRetryable`].
pub async fn retry_with_policy<F, Fut, T, E>(
    operation: &str,
    policy: &RetryPolicy,
    should_retry: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let start = Instant::now();

    for attempt in 1..=policy.max_attempts.max(1) {
        tracing::debug!(
            operation,
            attempt,
            max_attempts = policy.max_attempts,
            "starting attempt"
        );

        match op().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(operation, attempt, "succeeded after retry");
                }
                return Ok(result);
            }
            Err(err) => {
                if !should_retry(&err) {
                    tracing::warn!(operation, attempt, error = %err, "not retryable, giving up");
                    return Err(RetryError::NonRetryable(err));
                }

                if attempt >= policy.max_attempts.max(1) {
                    tracing::error!(
                        operation,
                        attempts = attempt,
                        error = %err,
                        "all retry attempts exhausted"
                    );
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        source: err,
                        total_duration: start.elapsed(),
                    });
                }

                let delay = calculate_delay(policy, attempt, true);
                tracing::warn!(
                    operation,
                    attempt,
                    error = %err,
                    delay_ms = delay.as_millis() as u64,
                    "attempt failed, will retry"
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    unreachable!("retry loop returns on the final attempt")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn test_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            strategy: RetryStrategy::FixedDelay,
            backoff_multiplier: 2.0,
            initial_delay_ms: 5,
            max_delay_ms: 50,
        }
    }

    #[test]
    fn exponential_delays_grow_and_cap() {
        let policy = RetryPolicy {
            max_attempts: 5,
            strategy: RetryStrategy::ExponentialBackoff,
            backoff_multiplier: 2.0,
            initial_delay_ms: 1000,
            max_delay_ms: 3000,
        };

        assert_eq!(
            calculate_delay(&policy, 1, false),
            Duration::from_millis(1000)
        );
        assert_eq!(
            calculate_delay(&policy, 2, false),
            Duration::from_millis(2000)
        );
        // 4000 capped at 3000
        assert_eq!(
            calculate_delay(&policy, 3, false),
            Duration::from_millis(3000)
        );
    }

    #[test]
    fn fixed_delay_is_constant() {
        let policy = test_policy();
        assert_eq!(calculate_delay(&policy, 1, false), Duration::from_millis(5));
        assert_eq!(calculate_delay(&policy, 3, false), Duration::from_millis(5));
    }

    #[test]
    fn none_strategy_has_no_delay() {
        let policy = RetryPolicy {
            strategy: RetryStrategy::None,
            ..test_policy()
        };
        assert_eq!(calculate_delay(&policy, 2, true), Duration::ZERO);
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let policy = RetryPolicy {
            strategy: RetryStrategy::FixedDelay,
            initial_delay_ms: 1000,
            max_delay_ms: 30_000,
            ..test_policy()
        };

        for _ in 0..100 {
            let delay = calculate_delay(&policy, 1, true);
            assert!(delay >= Duration::from_millis(1000));
            assert!(delay <= Duration::from_millis(1250));
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = attempts.clone();

        let result = retry_with_policy(
            "test",
            &test_policy(),
            |_: &io::Error| true,
            || {
                let attempts = attempts_clone.clone();
                async move {
                    let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    if attempt < 3 {
                        Err(io::Error::new(io::ErrorKind::TimedOut, "timeout"))
                    } else {
                        Ok("success")
                    }
                }
            },
        )
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausts_after_max_attempts() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = attempts.clone();

        let result: Result<(), _> = retry_with_policy(
            "test",
            &test_policy(),
            |_: &io::Error| true,
            || {
                let attempts = attempts_clone.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(io::Error::new(io::ErrorKind::TimedOut, "always fails"))
                }
            },
        )
        .await;

        let err = result.unwrap_err();
        assert!(err.is_exhausted());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retryable_stops_on_first_attempt() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = attempts.clone();

        let result: Result<(), _> = retry_with_policy(
            "test",
            &test_policy(),
            |err: &io::Error| err.kind() != io::ErrorKind::PermissionDenied,
            || {
                let attempts = attempts_clone.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
                }
            },
        )
        .await;

        assert!(matches!(result.unwrap_err(), RetryError::NonRetryable(_)));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
