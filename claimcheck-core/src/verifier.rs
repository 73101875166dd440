//! Request orchestrator for claim verification.
//!
//! The `Verifier` owns the single-claim lifecycle: it validates input,
//! drives the backend call, runs the protocol parser, and publishes state
//! transitions to observers through a `tokio::sync::watch` channel. Nothing
//! else writes the published state; observers hold read-only receivers.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::backend::GroundedBackend;
use crate::error::VerifyError;
use crate::prompt::fact_check_prompt;
use crate::protocol::parse_verification;
use crate::types::{RequestSnapshot, RequestState};

/// Stable user-facing message published when the backend call fails.
///
/// Diagnostic detail goes to the log; the caller only ever sees this.
pub const BACKEND_FAILURE_MESSAGE: &str =
    "Failed to get a response from the AI. Please try again.";

/// Orchestrates one outstanding verification request at a time.
///
/// Overlapping `submit` calls follow last-submit-wins semantics: every
/// request is stamped with a monotonically increasing token, and a
/// completion whose token is no longer the newest is discarded, so a slow
/// older request can never overwrite a newer one.
pub struct Verifier {
    backend: Arc<dyn GroundedBackend>,
    state_tx: watch::Sender<RequestSnapshot>,
    seq: AtomicU64,
}

impl Verifier {
    pub fn new(backend: Arc<dyn GroundedBackend>) -> Self {
        let (state_tx, _) = watch::channel(RequestSnapshot::default());
        Self {
            backend,
            state_tx,
            seq: AtomicU64::new(0),
        }
    }

    /// Subscribe to state change notifications.
    ///
    /// Receivers observe every published [`RequestSnapshot`] and must treat
    /// it as read-only.
    pub fn subscribe(&self) -> watch::Receiver<RequestSnapshot> {
        self.state_tx.subscribe()
    }

    /// The currently published snapshot.
    pub fn snapshot(&self) -> RequestSnapshot {
        self.state_tx.borrow().clone()
    }

    /// Submit a claim for verification.
    ///
    /// An empty or whitespace-only claim fails immediately with
    /// [`VerifyError::EmptyClaim`]: no backend call is made and the
    /// published state is untouched (it never enters `Loading`).
    ///
    /// Otherwise the state moves to `Loading` (clearing any previous result
    /// or error), and, once the newest request completes, to exactly one of
    /// `Succeeded` or `Failed`. A reply that does not follow the wire format
    /// still succeeds, carrying the parser's degraded result.
    pub async fn submit(&self, claim_text: &str) -> Result<(), VerifyError> {
        let claim = claim_text.trim();
        if claim.is_empty() {
            return Err(VerifyError::EmptyClaim);
        }

        let token = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.publish_if_current(
            token,
            RequestSnapshot {
                claim: claim.to_string(),
                state: RequestState::Loading,
            },
        );

        debug!(
            token,
            model = self.backend.model_name(),
            "Submitting claim for verification"
        );

        let outcome = self.backend.generate(&fact_check_prompt(claim)).await;

        let state = match outcome {
            Ok(reply) => {
                let result = parse_verification(&reply.text, &reply.chunks);
                debug!(token, verdict = %result.verdict, sources = result.sources.len(),
                    "Verification completed");
                RequestState::Succeeded(result)
            }
            Err(err) => {
                warn!(token, error = %err, "Backend call failed");
                RequestState::Failed(BACKEND_FAILURE_MESSAGE.to_string())
            }
        };

        let applied = self.publish_if_current(
            token,
            RequestSnapshot {
                claim: claim.to_string(),
                state,
            },
        );
        if !applied {
            debug!(token, "Discarded superseded verification outcome");
        }
        Ok(())
    }

    /// Publish a snapshot only if `token` still names the newest request.
    ///
    /// The token comparison runs inside the channel's send lock, so a stale
    /// completion can never interleave with a newer request's publish.
    fn publish_if_current(&self, token: u64, snapshot: RequestSnapshot) -> bool {
        self.state_tx.send_if_modified(|current| {
            if self.seq.load(Ordering::SeqCst) != token {
                return false;
            }
            *current = snapshot;
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{GroundedReply, MockBackend};
    use crate::error::BackendError;
    use crate::protocol::DEGRADED_NOTICE;
    use crate::types::{GroundingChunk, Verdict, WebSource};
    use std::time::Duration;

    const WELL_FORMED: &str =
        "[VERDICT: True]\n[TRUTH_PERCENTAGE: 95]\n[ANALYSIS]\nThe claim is supported.";

    fn verifier_with(mock: MockBackend) -> (Verifier, Arc<MockBackend>) {
        let mock = Arc::new(mock);
        (Verifier::new(mock.clone()), mock)
    }

    #[tokio::test]
    async fn test_empty_claim_is_rejected_without_backend_call() {
        let (verifier, mock) = verifier_with(MockBackend::with_text(WELL_FORMED));

        for claim in ["", "   ", "\n\t "] {
            let result = verifier.submit(claim).await;
            assert!(matches!(result, Err(VerifyError::EmptyClaim)), "claim: {claim:?}");
        }

        assert_eq!(mock.call_count(), 0);
        assert_eq!(verifier.snapshot().state, RequestState::Idle);
    }

    #[tokio::test]
    async fn test_successful_submit_publishes_result() {
        let mock = MockBackend::new();
        let mut reply = GroundedReply::text(WELL_FORMED);
        reply.chunks = vec![GroundingChunk {
            web: Some(WebSource {
                uri: "https://example.com/a".to_string(),
                title: "Example A".to_string(),
            }),
        }];
        mock.queue_reply(reply);
        let (verifier, mock) = verifier_with(mock);

        verifier.submit("  The sky is blue.  ").await.unwrap();

        let snapshot = verifier.snapshot();
        // The claim is trimmed before use and persists in the snapshot.
        assert_eq!(snapshot.claim, "The sky is blue.");
        assert!(!snapshot.state.is_loading());
        let result = snapshot.state.result().expect("should have succeeded");
        assert_eq!(result.verdict, Verdict::True);
        assert_eq!(result.truth_percentage, 95);
        assert_eq!(result.sources.len(), 1);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_backend_failure_publishes_stable_message() {
        let mock = MockBackend::new();
        mock.queue_error(BackendError::ApiRequest {
            message: "HTTP 500 from Gemini API: internal".to_string(),
        });
        let (verifier, _mock) = verifier_with(mock);

        verifier.submit("Some claim").await.unwrap();

        let snapshot = verifier.snapshot();
        assert!(!snapshot.state.is_loading());
        assert_eq!(snapshot.state.error(), Some(BACKEND_FAILURE_MESSAGE));
        // The raw diagnostic never leaks into the published state.
        assert!(!snapshot.state.error().unwrap().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn test_failure_clears_previous_result() {
        let mock = MockBackend::new();
        mock.queue_reply(GroundedReply::text(WELL_FORMED));
        mock.queue_error(BackendError::Connection {
            message: "refused".to_string(),
        });
        let (verifier, _mock) = verifier_with(mock);

        verifier.submit("First claim").await.unwrap();
        assert!(verifier.snapshot().state.result().is_some());

        verifier.submit("Second claim").await.unwrap();
        let snapshot = verifier.snapshot();
        assert_eq!(snapshot.state.result(), None);
        assert_eq!(snapshot.state.error(), Some(BACKEND_FAILURE_MESSAGE));
        assert_eq!(snapshot.claim, "Second claim");
    }

    #[tokio::test]
    async fn test_malformed_reply_succeeds_degraded() {
        let mock = MockBackend::new();
        mock.queue_reply(GroundedReply::text("I cannot verify this."));
        let (verifier, _mock) = verifier_with(mock);

        verifier.submit("Some claim").await.unwrap();

        let result = verifier
            .snapshot()
            .state
            .result()
            .expect("degraded replies still succeed")
            .clone();
        assert_eq!(result.verdict, Verdict::Unverifiable);
        assert!(result.analysis.starts_with(DEGRADED_NOTICE));
        assert!(result.analysis.contains("I cannot verify this."));
    }

    #[tokio::test]
    async fn test_observer_sees_loading_then_terminal() {
        let mock = MockBackend::new();
        mock.queue_delayed_reply(Duration::from_millis(50), GroundedReply::text(WELL_FORMED));
        let (verifier, _mock) = verifier_with(mock);
        let verifier = Arc::new(verifier);

        let mut rx = verifier.subscribe();
        let submitter = {
            let verifier = verifier.clone();
            tokio::spawn(async move { verifier.submit("Some claim").await })
        };

        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().state.is_loading());

        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().state.result().is_some());

        submitter.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_overlapping_submits_newest_wins() {
        let mock = MockBackend::new();
        // First request resolves long after the second.
        mock.queue_delayed_reply(
            Duration::from_millis(200),
            GroundedReply::text(
                "[VERDICT: False]\n[TRUTH_PERCENTAGE: 5]\n[ANALYSIS]\nStale outcome.",
            ),
        );
        mock.queue_delayed_reply(
            Duration::from_millis(20),
            GroundedReply::text(
                "[VERDICT: True]\n[TRUTH_PERCENTAGE: 90]\n[ANALYSIS]\nFresh outcome.",
            ),
        );
        let (verifier, mock) = verifier_with(mock);
        let verifier = Arc::new(verifier);

        let first = {
            let verifier = verifier.clone();
            tokio::spawn(async move { verifier.submit("First claim").await })
        };
        // Make sure the first submit claimed its reply before the second starts.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = {
            let verifier = verifier.clone();
            tokio::spawn(async move { verifier.submit("Second claim").await })
        };

        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();
        assert_eq!(mock.call_count(), 2);

        // The slow first request resolved last but must not clobber the
        // newer outcome.
        let snapshot = verifier.snapshot();
        assert_eq!(snapshot.claim, "Second claim");
        let result = snapshot.state.result().expect("should have succeeded");
        assert_eq!(result.verdict, Verdict::True);
        assert_eq!(result.analysis, "Fresh outcome.");
    }

    #[tokio::test]
    async fn test_new_submit_clears_previous_error() {
        let mock = MockBackend::new();
        mock.queue_error(BackendError::Connection {
            message: "refused".to_string(),
        });
        mock.queue_reply(GroundedReply::text(WELL_FORMED));
        let (verifier, _mock) = verifier_with(mock);

        verifier.submit("First claim").await.unwrap();
        assert!(verifier.snapshot().state.error().is_some());

        verifier.submit("Second claim").await.unwrap();
        let snapshot = verifier.snapshot();
        assert_eq!(snapshot.state.error(), None);
        assert!(snapshot.state.result().is_some());
    }
}
