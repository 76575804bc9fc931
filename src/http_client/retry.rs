//! Fixed-backoff retry for outbound platform requests.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{SyncError, SyncResult};

/// Retry policy for platform API calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Whether another attempt may follow `attempt` (zero-based) failing
    /// with `error`. Network failures and 5xx responses are retried; every
    /// other error is final.
    pub fn should_retry(&self, attempt: u32, error: &SyncError) -> bool {
        attempt + 1 < self.max_attempts && error.is_transient()
    }

    /// Run `f` until it succeeds, fails with a final error, or the attempts
    /// run out. The last error is returned.
    pub async fn execute<F, Fut, T>(&self, operation: &str, mut f: F) -> SyncResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = SyncResult<T>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match f().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!("{} succeeded after {} attempts", operation, attempt + 1);
                    }
                    return Ok(value);
                }
                Err(error) => {
                    if !self.should_retry(attempt, &error) {
                        return Err(error);
                    }
                    match &error {
                        SyncError::Remote { status, .. } => {
                            warn!("Server error (status: {}), retrying {}", status, operation)
                        }
                        other => warn!("API request failed, retrying {}: {}", operation, other),
                    }
                    tokio::time::sleep(self.backoff).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast() -> RetryPolicy {
        RetryPolicy::new(2, Duration::from_millis(1))
    }

    #[test]
    fn test_should_retry_only_transient_errors() {
        let policy = fast();
        let server_error = SyncError::Remote {
            status: 503,
            message: "busy".into(),
        };
        let client_error = SyncError::Remote {
            status: 404,
            message: "missing".into(),
        };
        assert!(policy.should_retry(0, &server_error));
        assert!(!policy.should_retry(1, &server_error));
        assert!(!policy.should_retry(0, &client_error));
        assert!(policy.should_retry(0, &SyncError::TransientNetwork("reset".into())));
    }

    #[tokio::test]
    async fn test_execute_retries_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: SyncResult<u32> = fast()
            .execute("test", || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    if n == 0 {
                        Err(SyncError::TransientNetwork("timeout".into()))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_execute_gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: SyncResult<()> = fast()
            .execute("test", || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(SyncError::TransientNetwork("down".into()))
                }
            })
            .await;
        assert!(matches!(result, Err(SyncError::TransientNetwork(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
