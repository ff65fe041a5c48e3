use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{DurationSeconds, serde_as};
use tokio_util::sync::CancellationToken;

use crate::error::EngineError;

/// Fixed-delay retry policy shared by every RPC call site.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Attempts made after the first failure.
    pub max_retries: u32,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "delay_secs")]
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }
}

/// Sleeps for `delay` unless `cancel` fires first.
pub async fn sleep(delay: Duration, cancel: &CancellationToken) -> Result<(), EngineError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(EngineError::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}

/// Runs `op` until it succeeds, retrying up to `policy.max_retries` times with
/// a fixed delay. Both the operation and the delay race against `cancel`.
pub async fn retry<T, F, Fut>(
    policy: RetryPolicy,
    cancel: &CancellationToken,
    operation: &str,
    mut op: F,
) -> Result<T, EngineError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, EngineError>>,
{
    let mut retries = 0;
    loop {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(EngineError::Cancelled),
            result = op() => result,
        };

        match result {
            Ok(value) => return Ok(value),
            Err(error) if error.is_cancelled() => return Err(error),
            Err(error) if retries >= policy.max_retries => {
                tracing::error!(
                    operation,
                    attempts = retries + 1,
                    error = %error,
                    "Giving up after exhausting retries"
                );
                return Err(EngineError::RetriesExhausted {
                    operation: operation.to_string(),
                    attempts: retries + 1,
                    last_error: Box::new(error),
                });
            }
            Err(error) => {
                retries += 1;
                tracing::warn!(
                    operation,
                    retry = retries,
                    max_retries = policy.max_retries,
                    delay_secs = policy.delay.as_secs(),
                    error = %error,
                    "Operation failed, retrying"
                );
                sleep(policy.delay, cancel).await?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn failure() -> EngineError {
        EngineError::InternalError {
            message: "node unavailable".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::new(5, Duration::from_secs(10));
        let started = tokio::time::Instant::now();

        let value = retry(policy, &CancellationToken::new(), "eth_gasPrice", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(failure())
            } else {
                Ok(42u64)
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_retries() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::new(5, Duration::from_secs(10));

        let result: Result<(), _> =
            retry(policy, &CancellationToken::new(), "eth_getBalance", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(failure())
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 6);
        match result {
            Err(EngineError::RetriesExhausted {
                operation,
                attempts,
                ..
            }) => {
                assert_eq!(operation, "eth_getBalance");
                assert_eq!(attempts, 6);
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_backoff() {
        let cancel = CancellationToken::new();
        let policy = RetryPolicy::new(5, Duration::from_secs(3600));

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let result: Result<(), _> = retry(policy, &cancel, "eth_getTransactionCount", || async {
            Err(failure())
        })
        .await;

        assert!(matches!(result, Err(EngineError::Cancelled)));
    }

    #[test]
    fn policy_reads_delay_in_seconds() {
        let policy: RetryPolicy =
            serde_json::from_str(r#"{"max_retries": 5, "delay_secs": 10}"#).unwrap();
        assert_eq!(policy, RetryPolicy::new(5, Duration::from_secs(10)));
    }
}
