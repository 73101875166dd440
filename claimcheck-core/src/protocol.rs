//! Response protocol parser.
//!
//! The backend is instructed to reply in a three-line tagged format:
//!
//! ```text
//! [VERDICT: <True|False|Mixed|Unverifiable>]
//! [TRUTH_PERCENTAGE: <0-100>]
//! [ANALYSIS]
//! <free-form markdown>
//! ```
//!
//! Being an LLM, it sometimes doesn't. A reply that misses any marker, uses
//! a verdict token outside the closed set, or carries a percentage that does
//! not fit `u8` is a *data* condition, not a fault: parsing degrades to an
//! `Unverifiable` result that keeps the full raw text, and never errors.

use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

use crate::types::{GroundingChunk, Source, Verdict, VerificationResult};

/// Literal marker that begins the free-form analysis body.
const ANALYSIS_MARKER: &str = "[ANALYSIS]";

/// Sentence prepended to the raw reply when it does not follow the wire
/// format, so nothing the backend said is lost.
pub const DEGRADED_NOTICE: &str = "The AI's response was not in the expected format. \
It might be that this claim cannot be verified with the available information.";

static VERDICT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[VERDICT:\s*(.*?)\]").unwrap());
static PERCENTAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[TRUTH_PERCENTAGE:\s*(\d+)\]").unwrap());

/// Classification of a raw reply against the wire format.
#[derive(Debug, Clone, PartialEq)]
enum ParseOutcome {
    WellFormed {
        verdict: Verdict,
        truth_percentage: u8,
        analysis: String,
    },
    Degraded,
}

/// Convert a raw backend reply plus grounding metadata into a typed result.
///
/// Never fails. Sources are assembled from `chunks` independently of the tag
/// parse, so even a degraded result keeps its citations. Parsing is pure:
/// the same input always yields a structurally equal result.
pub fn parse_verification(raw: &str, chunks: &[GroundingChunk]) -> VerificationResult {
    let sources = collect_sources(chunks);

    match classify(raw) {
        ParseOutcome::WellFormed {
            verdict,
            truth_percentage,
            analysis,
        } => VerificationResult {
            verdict,
            truth_percentage,
            analysis,
            sources,
        },
        ParseOutcome::Degraded => {
            warn!(
                raw_len = raw.len(),
                "Backend reply did not match the wire format, degrading to Unverifiable"
            );
            VerificationResult {
                verdict: Verdict::Unverifiable,
                truth_percentage: 0,
                analysis: format!("{DEGRADED_NOTICE}\n\n{raw}"),
                sources,
            }
        }
    }
}

/// Extract the three tags, requiring all of them for a well-formed parse.
fn classify(raw: &str) -> ParseOutcome {
    let verdict_token = VERDICT_RE
        .captures(raw)
        .map(|caps| caps[1].trim().to_string());
    let percentage_token = PERCENTAGE_RE.captures(raw).map(|caps| caps[1].to_string());
    let analysis_start = raw.find(ANALYSIS_MARKER);

    let (Some(verdict_token), Some(percentage_token), Some(analysis_start)) =
        (verdict_token, percentage_token, analysis_start)
    else {
        return ParseOutcome::Degraded;
    };

    let Some(verdict) = Verdict::from_token(&verdict_token) else {
        warn!(token = %verdict_token, "Verdict token outside the closed set");
        return ParseOutcome::Degraded;
    };

    let Ok(truth_percentage) = percentage_token.parse::<u8>() else {
        warn!(token = %percentage_token, "Truth percentage does not fit 0-255");
        return ParseOutcome::Degraded;
    };

    let analysis = raw[analysis_start + ANALYSIS_MARKER.len()..]
        .trim()
        .to_string();

    ParseOutcome::WellFormed {
        verdict,
        truth_percentage,
        analysis,
    }
}

/// Map grounding chunks to sources.
///
/// Keeps only entries exposing both a non-empty URI and a non-empty title,
/// in metadata order, without deduplication. Entries lacking either field
/// are dropped silently.
fn collect_sources(chunks: &[GroundingChunk]) -> Vec<Source> {
    chunks
        .iter()
        .filter_map(|chunk| chunk.web.as_ref())
        .filter(|web| !web.uri.is_empty() && !web.title.is_empty())
        .map(|web| Source {
            uri: web.uri.clone(),
            title: web.title.clone(),
        })
        .collect()
}
