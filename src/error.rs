//! Error types for county resolution, store parsing, and batch outcomes.

use thiserror::Error;

/// Errors raised by the external collaborators (county lookup, store discovery).
#[derive(Debug, Error)]
pub enum ScoreError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote API returned a non-success status code.
    #[error("API error ({status})")]
    Api {
        /// HTTP status code returned by the API.
        status: u16,
    },

    /// Failed to parse a response or document.
    #[error("parse error: {0}")]
    Parse(String),

    /// The lookup succeeded but named no county for the coordinate.
    #[error("no county found at {0}")]
    NoCounty(String),
}

/// Why a store was left out of a batch.
///
/// None of these abort the batch; they only exclude the one store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DropReason {
    #[error("county unresolved: {0}")]
    CountyUnresolved(String),

    #[error("county severity unavailable: {0}")]
    SeverityUnavailable(String),

    #[error("store timed out")]
    TimedOut,

    #[error("batch deadline exceeded")]
    DeadlineExceeded,

    #[error("store task failed: {0}")]
    TaskFailed(String),
}

impl DropReason {
    /// Short label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::CountyUnresolved(_) => "county_unresolved",
            DropReason::SeverityUnavailable(_) => "severity_unavailable",
            DropReason::TimedOut => "timed_out",
            DropReason::DeadlineExceeded => "deadline_exceeded",
            DropReason::TaskFailed(_) => "task_failed",
        }
    }
}

/// Invalid user-supplied location
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    #[error("Failed to get location, an address must be submitted.")]
    Empty,

    #[error("Location not provided in latitude, longitude format: {0}")]
    WrongFormat(String),

    #[error("Invalid value types for latitude, longitude format: {0}")]
    NotNumeric(String),
}
