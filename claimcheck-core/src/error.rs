//! Error types for the Claimcheck core.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering the backend, configuration, and local validation domains.
//!
//! Malformed backend *text* is deliberately absent from this module: text
//! that does not follow the wire format is a data condition handled by the
//! protocol parser, never an error.

use std::path::PathBuf;

/// Top-level error type for the Claimcheck core library.
#[derive(Debug, thiserror::Error)]
pub enum ClaimcheckError {
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Verification error: {0}")]
    Verify(#[from] VerifyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience result alias for the core library.
pub type Result<T> = std::result::Result<T, ClaimcheckError>;

/// Errors from generative backend interactions.
///
/// The verifier collapses all of these into one stable user-facing message;
/// the structured detail exists for logging and retry classification.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("API request failed: {message}")]
    ApiRequest { message: String },

    #[error("API response parse error: {message}")]
    ResponseParse { message: String },

    #[error("Authentication failed for {provider}")]
    AuthFailed { provider: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Provider connection failed: {message}")]
    Connection { message: String },
}

impl BackendError {
    /// Whether this error is transient and worth retrying.
    ///
    /// Auth and parse failures are permanent; retrying them only burns quota.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BackendError::RateLimited { .. }
                | BackendError::Timeout { .. }
                | BackendError::Connection { .. }
        )
    }
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Local validation errors from the request orchestrator.
///
/// These never reach the backend and are recovered by prompting the caller
/// to retry; they are not system faults.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("Claim text is empty")]
    EmptyClaim,
}
