/// Error types for backend fetches and embedded fixtures
use std::time::Duration;
use thiserror::Error;

/// A failed backend fetch.
///
/// An empty but well-formed response is not a failure; it decodes to an
/// empty payload.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Connection, DNS or protocol failure
    #[error("request to {endpoint} failed: {message}")]
    Transport {
        endpoint: &'static str,
        message: String,
    },

    /// Backend answered with a non-success status
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: &'static str, status: u16 },

    /// Body could not be decoded into the expected shape
    #[error("failed to decode {endpoint} response: {message}")]
    Decode {
        endpoint: &'static str,
        message: String,
    },

    /// No response within the configured bound
    #[error("{endpoint} timed out after {after:?}")]
    Timeout {
        endpoint: &'static str,
        after: Duration,
    },
}

impl FetchError {
    pub fn endpoint(&self) -> &'static str {
        match self {
            FetchError::Transport { endpoint, .. }
            | FetchError::Status { endpoint, .. }
            | FetchError::Decode { endpoint, .. }
            | FetchError::Timeout { endpoint, .. } => endpoint,
        }
    }
}

/// Failure to load an embedded or user-supplied fixture table.
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Failed to parse CSV: {0}")]
    CsvParse(#[from] csv::Error),

    #[error("Invalid bounding box for region {region}: {reason}")]
    InvalidBounds { region: String, reason: String },

    #[error("Duplicate region in bounds table: {0}")]
    DuplicateRegion(String),
}
