//! # Claimcheck Core
//!
//! Core library for the Claimcheck fact verifier. Provides the response
//! protocol parser, the web-grounded backend client, the request
//! orchestrator, configuration, and fundamental types.
//!
//! The flow is linear: a caller submits a claim to the [`Verifier`], which
//! validates it, queries a [`GroundedBackend`] with a fixed instruction
//! template, runs the reply through [`protocol::parse_verification`], and
//! publishes the outcome to observers.

pub mod backend;
pub mod config;
pub mod error;
pub mod gemini;
pub mod prompt;
pub mod protocol;
pub mod types;
pub mod verifier;

// Re-export commonly used types at the crate root.
pub use backend::{GroundedBackend, GroundedReply, MockBackend};
pub use config::{BackendConfig, Config, RetryConfig, load_config};
pub use error::{BackendError, ClaimcheckError, ConfigError, Result, VerifyError};
pub use gemini::GeminiBackend;
pub use protocol::parse_verification;
pub use types::{
    GroundingChunk, RequestSnapshot, RequestState, Source, Verdict, VerificationResult, WebSource,
};
pub use verifier::{BACKEND_FAILURE_MESSAGE, Verifier};
