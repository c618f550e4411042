//! Token-acquisition error types.
//!
//! These stay inside the crate: the public resolution API classifies them
//! into the shared taxonomy (`AuthenticationFailed` wrapping the cause)
//! before they reach a caller.

use thiserror::Error;

/// Error type for token-acquisition operations.
#[derive(Debug, Error)]
pub enum TokenError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The identity service refused the request.
    #[error("token request denied ({code}): {description}")]
    Denied {
        /// Error code returned by the identity service (e.g. AADSTS code).
        code: String,
        /// Human-readable description from the identity service.
        description: String,
    },

    /// The identity service answered with something we cannot interpret.
    #[error("malformed token response: {0}")]
    MalformedResponse(String),

    /// Building or signing the client assertion failed.
    #[error("client assertion error: {0}")]
    Assertion(String),
}
