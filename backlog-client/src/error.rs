//! Transport-level client errors.
//!
//! These describe what went wrong on the wire. They stay below the
//! public pipeline operations, which classify them into the shared
//! taxonomy (`OperationFailed` carrying the cause message) at their
//! boundary.

use thiserror::Error;

/// Error type for backend client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message from the backend's error body, or the status text.
        message: String,
    },

    /// The backend answered with something we cannot interpret.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
