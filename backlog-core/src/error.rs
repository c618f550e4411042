//! The error taxonomy shared by every public backlog operation.
//!
//! Internal transport errors are classified into one of four kinds at each
//! public boundary; a raw HTTP or serialization error never reaches a
//! caller uninterpreted.

use thiserror::Error;

/// Classified failure surfaced by the credential, provisioning, and
/// retrieval operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing required input. Raised before any network
    /// activity; never worth retrying.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A credential-acquisition step failed (token endpoint unreachable,
    /// denied, or returned a malformed response).
    #[error("{0}")]
    AuthenticationFailed(String),

    /// A required remote structure is absent.
    #[error("{0}")]
    NotFound(String),

    /// Any other backend or transport failure during provisioning or
    /// retrieval. The call that raised it yields no partial results.
    #[error("{0}")]
    OperationFailed(String),
}

impl Error {
    /// Builds an `InvalidArgument` error naming the offending argument.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Builds an `AuthenticationFailed` error folding the cause message
    /// into the description, e.g.
    /// `"failed to authenticate with managed identity: <cause>"`.
    pub fn authentication(context: &str, cause: &dyn std::fmt::Display) -> Self {
        Self::AuthenticationFailed(format!("{context}: {cause}"))
    }

    /// Builds an `OperationFailed` error carrying the cause message.
    pub fn operation(context: &str, cause: &dyn std::fmt::Display) -> Self {
        Self::OperationFailed(format!("{context}: {cause}"))
    }

    /// Returns the kind of this error, for matching without caring about
    /// the message text.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::AuthenticationFailed(_) => ErrorKind::AuthenticationFailed,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::OperationFailed(_) => ErrorKind::OperationFailed,
        }
    }
}

/// The four error kinds, without their messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing required input.
    InvalidArgument,
    /// Credential acquisition failed.
    AuthenticationFailed,
    /// A required remote structure is absent.
    NotFound,
    /// Backend or transport failure during provisioning or retrieval.
    OperationFailed,
}
