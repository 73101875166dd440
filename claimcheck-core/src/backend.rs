//! Generative backend interface.
//!
//! Defines the `GroundedBackend` trait the verifier depends on, a retry
//! helper for transient failures, and a mock implementation for tests and
//! offline development.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use crate::config::RetryConfig;
use crate::error::BackendError;
use crate::types::GroundingChunk;

/// Raw reply from a generative backend: the text blob plus whatever
/// grounding metadata the provider attached.
#[derive(Debug, Clone, Default)]
pub struct GroundedReply {
    pub text: String,
    pub chunks: Vec<GroundingChunk>,
}

impl GroundedReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            chunks: Vec::new(),
        }
    }
}

/// A generative backend queried with web-search grounding enabled.
#[async_trait]
pub trait GroundedBackend: Send + Sync {
    /// Generate a reply for the composed prompt.
    async fn generate(&self, prompt: &str) -> Result<GroundedReply, BackendError>;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}

/// Execute an async operation with capped exponential backoff on transient
/// errors.
///
/// Retries on `RateLimited` (respecting `retry_after_secs`), `Timeout`, and
/// `Connection`. Permanent errors (auth, parse) return immediately.
pub async fn with_retry<F, Fut, T>(config: &RetryConfig, operation: F) -> Result<T, BackendError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, BackendError>>,
{
    let mut last_err = None;
    for attempt in 0..=config.max_retries {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(e) => {
                if !e.is_transient() || attempt == config.max_retries {
                    return Err(e);
                }

                let backoff_ms = compute_backoff(config, attempt, &e);
                warn!(
                    attempt = attempt + 1,
                    max = config.max_retries,
                    backoff_ms,
                    error = %e,
                    "Retrying after transient error"
                );
                sleep(Duration::from_millis(backoff_ms)).await;
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| BackendError::Connection {
        message: "All retry attempts exhausted".to_string(),
    }))
}

/// Compute backoff delay, respecting rate limit retry-after headers.
fn compute_backoff(config: &RetryConfig, attempt: u32, err: &BackendError) -> u64 {
    let computed = compute_exponential_backoff(config, attempt);
    if let BackendError::RateLimited { retry_after_secs } = err {
        let server_ms = retry_after_secs * 1000;
        return server_ms.max(computed);
    }
    computed
}

/// Pure exponential backoff, capped at `max_backoff_ms`.
fn compute_exponential_backoff(config: &RetryConfig, attempt: u32) -> u64 {
    let base = config.initial_backoff_ms as f64 * config.backoff_multiplier.powi(attempt as i32);
    base.min(config.max_backoff_ms as f64) as u64
}

/// A queued mock outcome, optionally delayed to simulate latency.
struct QueuedReply {
    delay: Duration,
    outcome: Result<GroundedReply, BackendError>,
}

/// A mock backend for testing and offline development.
///
/// Replies are consumed in queue order; per-reply delays let tests exercise
/// overlapping-request behavior deterministically.
pub struct MockBackend {
    replies: Mutex<Vec<QueuedReply>>,
    calls: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a backend that always returns the given text.
    ///
    /// Queues multiple copies so it can serve repeated calls.
    pub fn with_text(text: &str) -> Self {
        let backend = Self::new();
        for _ in 0..20 {
            backend.queue_reply(GroundedReply::text(text));
        }
        backend
    }

    /// Queue a reply to be returned by the next `generate` call.
    pub fn queue_reply(&self, reply: GroundedReply) {
        self.queue(Duration::ZERO, Ok(reply));
    }

    /// Queue a reply that resolves only after `delay`.
    pub fn queue_delayed_reply(&self, delay: Duration, reply: GroundedReply) {
        self.queue(delay, Ok(reply));
    }

    /// Queue an error to be returned by the next `generate` call.
    pub fn queue_error(&self, err: BackendError) {
        self.queue(Duration::ZERO, Err(err));
    }

    /// Number of `generate` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn queue(&self, delay: Duration, outcome: Result<GroundedReply, BackendError>) {
        self.replies
            .lock()
            .unwrap()
            .push(QueuedReply { delay, outcome });
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GroundedBackend for MockBackend {
    async fn generate(&self, _prompt: &str) -> Result<GroundedReply, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        // Take the next reply before awaiting; the lock must not be held
        // across the sleep.
        let queued = {
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                None
            } else {
                Some(replies.remove(0))
            }
        };

        match queued {
            Some(queued) => {
                if !queued.delay.is_zero() {
                    sleep(queued.delay).await;
                }
                queued.outcome
            }
            None => Ok(GroundedReply::text(
                "Mock backend has no queued replies available.",
            )),
        }
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_retry_succeeds_first_try() {
        let config = RetryConfig::default();
        let result = with_retry(&config, || async { Ok::<_, BackendError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_retry_permanent_error_no_retry() {
        let config = RetryConfig {
            max_retries: 3,
            ..Default::default()
        };
        let call_count = std::sync::Arc::new(AtomicUsize::new(0));
        let cc = call_count.clone();
        let result = with_retry(&config, || {
            let cc = cc.clone();
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(BackendError::AuthFailed {
                    provider: "test".into(),
                })
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_retry_transient_then_success() {
        let config = RetryConfig {
            max_retries: 3,
            initial_backoff_ms: 1,
            max_backoff_ms: 5,
            backoff_multiplier: 2.0,
        };
        let call_count = std::sync::Arc::new(AtomicUsize::new(0));
        let cc = call_count.clone();
        let result = with_retry(&config, || {
            let cc = cc.clone();
            async move {
                if cc.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(BackendError::Connection {
                        message: "refused".into(),
                    })
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_exhaustion_returns_last_error() {
        let config = RetryConfig {
            max_retries: 1,
            initial_backoff_ms: 1,
            max_backoff_ms: 2,
            backoff_multiplier: 2.0,
        };
        let result = with_retry(&config, || async {
            Err::<i32, _>(BackendError::Timeout { timeout_secs: 1 })
        })
        .await;
        assert!(matches!(result, Err(BackendError::Timeout { .. })));
    }

    #[test]
    fn test_compute_backoff_exponential_and_capped() {
        let config = RetryConfig {
            max_retries: 3,
            initial_backoff_ms: 1000,
            max_backoff_ms: 3000,
            backoff_multiplier: 2.0,
        };
        assert_eq!(compute_exponential_backoff(&config, 0), 1000);
        assert_eq!(compute_exponential_backoff(&config, 1), 2000);
        assert_eq!(compute_exponential_backoff(&config, 2), 3000); // capped
    }

    #[test]
    fn test_compute_backoff_rate_limit_uses_server_value() {
        let config = RetryConfig {
            max_retries: 3,
            initial_backoff_ms: 1000,
            max_backoff_ms: 60_000,
            backoff_multiplier: 2.0,
        };
        let err = BackendError::RateLimited {
            retry_after_secs: 30,
        };
        assert_eq!(compute_backoff(&config, 0, &err), 30_000);
    }

    #[tokio::test]
    async fn test_mock_consumes_replies_in_order() {
        let mock = MockBackend::new();
        mock.queue_reply(GroundedReply::text("first"));
        mock.queue_reply(GroundedReply::text("second"));

        assert_eq!(mock.generate("p").await.unwrap().text, "first");
        assert_eq!(mock.generate("p").await.unwrap().text, "second");
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_error_passthrough() {
        let mock = MockBackend::new();
        mock.queue_error(BackendError::Connection {
            message: "refused".into(),
        });
        assert!(matches!(
            mock.generate("p").await,
            Err(BackendError::Connection { .. })
        ));
    }

    #[tokio::test]
    async fn test_mock_default_reply_when_drained() {
        let mock = MockBackend::new();
        let reply = mock.generate("p").await.unwrap();
        assert!(reply.text.contains("no queued replies"));
    }
}
