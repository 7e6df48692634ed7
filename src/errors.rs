//! Domain error types for promptsweep.
//!
//! Typed errors at module boundaries replace string-encoded errors and
//! enable structured error handling via pattern matching.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Sweep configuration errors
// ---------------------------------------------------------------------------

/// Errors in the sweep configuration.
///
/// All of these are detected while parameter specs are built from the CLI
/// flags, before the corpus is read and before any inference call is issued.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SweepConfigError {
    #[error("invalid range for {name}: min {min} is greater than max {max}")]
    InvalidRange {
        name: String,
        min: String,
        max: String,
    },

    #[error("increment for {name} must be positive (got {increment})")]
    NonPositiveIncrement { name: String, increment: String },

    #[error("range for {name} needs both a minimum and a maximum")]
    PartialRange { name: String },
}

// ---------------------------------------------------------------------------
// Provider errors
// ---------------------------------------------------------------------------

/// Errors from inference backend operations.
///
/// Embedded in `anyhow::Error` so the `GenerateProvider` trait signature
/// (`-> anyhow::Result<StreamHandle>`) stays unchanged while callers
/// can downcast: `e.downcast_ref::<ProviderError>()`.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Server error (status {status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Stream ended abnormally: {0}")]
    StreamAborted(String),
}
