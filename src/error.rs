// src/error.rs
//! Error taxonomy for the estimation pipeline and source acquisition.
//!
//! Validation and configuration problems abort a run immediately. Transient
//! source failures are retried by the acquisition layer and surface only
//! after the attempt budget is exhausted; fatal responses surface at once.

use thiserror::Error;

/// Errors raised by the pure estimation pipeline. Never retried.
#[derive(Debug, Error)]
pub enum EstimateError {
    /// The input batch cannot be scored: empty, rank missing on every entry,
    /// or a scorer that broke the length-preserving contract.
    #[error("validation: {0}")]
    Validation(String),

    /// Malformed weights/decay configuration (wrong arity, non-finite values,
    /// non-positive decay).
    #[error("configuration: {0}")]
    Configuration(String),
}

/// Per-source failure during acquisition.
///
/// `Display`/`Error` are implemented by hand rather than via `thiserror`'s
/// derive: the `source` field here is the *name of the data source*, not an
/// underlying error, and `thiserror` unconditionally treats any field named
/// `source` as the error cause (which `&'static str` cannot be).
#[derive(Debug)]
pub enum SourceError {
    /// Transport failure, timeout, or a retryable status, still failing after
    /// the full attempt budget.
    Transient {
        source: &'static str,
        attempts: u32,
        message: String,
    },

    /// Non-retryable response status. Surfaced on the first occurrence.
    Fatal {
        source: &'static str,
        status: u16,
        message: String,
    },
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Transient {
                source,
                attempts,
                message,
            } => write!(
                f,
                "transient failure for '{source}' after {attempts} attempts: {message}"
            ),
            SourceError::Fatal {
                source,
                status,
                message,
            } => write!(f, "fatal response for '{source}' (status {status}): {message}"),
        }
    }
}

impl std::error::Error for SourceError {}

impl SourceError {
    /// Name of the source this failure belongs to.
    pub fn source_name(&self) -> &'static str {
        match self {
            SourceError::Transient { source, .. } => source,
            SourceError::Fatal { source, .. } => source,
        }
    }
}

/// Batch-level acquisition failure.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// The required ranking source failed after every source was attempted.
    /// Partial data from sibling sources is discarded with this error.
    #[error("required source '{source}' failed")]
    RequiredSourceFailed {
        source: &'static str,
        #[source]
        cause: SourceError,
    },
}
