//! Fundamental types for claim verification.
//!
//! Defines the closed verdict set, the typed verification result, the wire
//! types for backend grounding metadata, and the request lifecycle state
//! published by the verifier.

use serde::{Deserialize, Serialize};

/// Classification outcome for a checked claim.
///
/// The set is closed: verdict tokens outside these four are not representable
/// and cause the parser to fall back to a degraded result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    True,
    False,
    Mixed,
    Unverifiable,
}

impl Verdict {
    /// Parse a verdict token as captured from the `[VERDICT: ...]` tag.
    ///
    /// Tokens are matched exactly against the four the backend is instructed
    /// to emit. Returns `None` for anything else.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "True" => Some(Self::True),
            "False" => Some(Self::False),
            "Mixed" => Some(Self::Mixed),
            "Unverifiable" => Some(Self::Unverifiable),
            _ => None,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::True => write!(f, "True"),
            Verdict::False => write!(f, "False"),
            Verdict::Mixed => write!(f, "Mixed"),
            Verdict::Unverifiable => write!(f, "Unverifiable"),
        }
    }
}

/// A web citation assembled from the backend's grounding metadata.
///
/// Only grounding entries carrying both a non-empty URI and a non-empty
/// title become sources; order follows the metadata, without deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub uri: String,
    pub title: String,
}

/// One grounding-metadata entry as returned by the backend.
///
/// Entries without a `web` citation exist on the wire and are dropped when
/// sources are assembled.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroundingChunk {
    #[serde(default)]
    pub web: Option<WebSource>,
}

/// The web citation payload inside a grounding chunk.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebSource {
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub title: String,
}

/// Typed outcome of one verification request.
///
/// Created once per parse and never mutated; the next request replaces it
/// wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub verdict: Verdict,
    /// Confidence percentage as reported by the backend. By convention 0 for
    /// `Unverifiable`; the parser does not enforce an upper bound beyond the
    /// `u8` range.
    pub truth_percentage: u8,
    /// Narrative analysis in markdown. Never empty: on a malformed reply it
    /// carries the degraded-mode notice followed by the full raw text.
    pub analysis: String,
    pub sources: Vec<Source>,
}

/// Lifecycle state of the single outstanding verification request.
///
/// Exactly one variant holds at any instant. An error message lives in
/// `Failed` and is only cleared when a new request moves the state back to
/// `Loading`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestState {
    #[default]
    Idle,
    Loading,
    Succeeded(VerificationResult),
    Failed(String),
}

impl RequestState {
    pub fn is_loading(&self) -> bool {
        matches!(self, RequestState::Loading)
    }

    /// The result of the last completed request, if it succeeded.
    pub fn result(&self) -> Option<&VerificationResult> {
        match self {
            RequestState::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    /// The user-presentable error of the last completed request, if it failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            RequestState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Snapshot published to observers on every state transition.
///
/// The claim text persists across transitions independently of the lifecycle
/// state; observers treat the whole snapshot as read-only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestSnapshot {
    pub claim: String,
    pub state: RequestState,
}
