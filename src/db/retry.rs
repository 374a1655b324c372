//! Bounded fixed-delay retry shared by the connection provider and the
//! query executor.

use backon::{ConstantBuilder, Retryable};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// A retry budget: `max_attempts` total attempts with a constant delay
/// between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Budget for reaching a server-backed store that may still be starting.
    pub const fn connect_default() -> Self {
        Self::new(5, Duration::from_secs(2))
    }

    /// Budget for transient statement failures.
    pub const fn query_default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }

    fn backoff(&self) -> ConstantBuilder {
        ConstantBuilder::default()
            .with_delay(self.delay)
            .with_max_times(self.max_attempts.saturating_sub(1))
    }
}

/// Run `op` under `policy`, retrying only failures `retryable` approves of.
/// Each retry is logged; the final error is returned untouched.
pub async fn with_retry<T, E, Fut, Op, Cond>(
    policy: &RetryPolicy,
    op: Op,
    retryable: Cond,
    label: &str,
) -> Result<T, E>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    Cond: Fn(&E) -> bool,
{
    op.retry(policy.backoff())
        .when(|e| retryable(e))
        .notify(|err: &E, dur: Duration| {
            warn!("{label} failed, retrying in {dur:?}: {err}");
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn attempts_stop_exactly_at_the_bound() {
        let policy = RetryPolicy::new(5, Duration::from_millis(1));
        let attempts = AtomicUsize::new(0);
        let result: Result<(), String> = with_retry(
            &policy,
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err("connection refused".to_string()) }
            },
            |_| true,
            "connect",
        )
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn succeeds_once_the_backend_comes_up() {
        let policy = RetryPolicy::new(5, Duration::from_millis(1));
        let attempts = AtomicUsize::new(0);
        let result: Result<u32, String> = with_retry(
            &policy,
            || {
                let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Err("not yet".to_string())
                    } else {
                        Ok(n as u32)
                    }
                }
            },
            |_| true,
            "connect",
        )
        .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retryable_failures_do_not_burn_budget() {
        let policy = RetryPolicy::new(5, Duration::from_millis(1));
        let attempts = AtomicUsize::new(0);
        let result: Result<(), String> = with_retry(
            &policy,
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err("database does not exist".to_string()) }
            },
            |e| !e.contains("does not exist"),
            "connect",
        )
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
