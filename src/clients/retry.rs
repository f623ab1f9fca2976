//! Explicit retry policy for outbound calls
//!
//! Re-expresses the usual mounted-adapter retry behavior as a typed
//! policy applied inside the call: a fixed attempt budget, exponential
//! backoff doubling from a base delay, and an explicit set of retryable
//! statuses. Connection-level failures always retry; decode failures
//! never do.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use super::ClientError;

/// Statuses worth another attempt
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Retry policy: `max_attempts` total tries with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub retryable_statuses: &'static [u16],
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(1),
            retryable_statuses: &RETRYABLE_STATUSES,
        }
    }
}

impl RetryPolicy {
    /// Run `op` until it succeeds, fails unretryably, or the attempt
    /// budget is spent. Backoff doubles per attempt: base, 2x, 4x, ...
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, ClientError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.max_attempts || !self.should_retry(&err) {
                        return Err(err);
                    }
                    let delay = self.backoff_base * 2u32.saturating_pow(attempt - 1);
                    warn!(
                        "{what} attempt {attempt}/{} failed ({err}), retrying in {:?}",
                        self.max_attempts, delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn should_retry(&self, err: &ClientError) -> bool {
        match err {
            ClientError::Transport(_) => true,
            ClientError::Http { status, .. } => self.retryable_statuses.contains(status),
            ClientError::Decode(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn http(status: u16) -> ClientError {
        ClientError::Http {
            status,
            body: String::new(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_retryable_failures() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();

        let result = policy
            .run("test op", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(http(503))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_attempt_budget() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();

        let result: Result<(), _> = policy
            .run("test op", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(http(500)) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_status_fails_fast() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();

        let result: Result<(), _> = policy
            .run("test op", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(http(400)) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_errors_retry() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();

        let result: Result<(), _> = policy
            .run("test op", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ClientError::Transport("connection refused".to_string())) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
