// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Backlog Auth
//!
//! Credential resolution for the Azure DevOps backlog client.
//!
//! Five interchangeable strategies each produce an authenticated
//! [`Connection`] handle or a classified failure:
//!
//! - Managed identity (system- or user-assigned), via the IMDS endpoint
//! - Delegated access token, wrapped without network validation
//! - Username/password, legacy path, wrapped without network validation
//! - Service principal with certificate (signed client assertion)
//! - Service principal with shared secret
//!
//! Strategy selection is explicit: the caller builds a [`Credential`]
//! variant and resolves it. Token acquisition goes through the
//! [`TokenBroker`] seam so tests can substitute the Entra ID endpoints.
//!
//! ## Example
//!
//! ```ignore
//! use backlog_auth::Connection;
//!
//! let conn = Connection::managed_identity(
//!     "https://dev.azure.com/contoso",
//!     None,
//! ).await?;
//! ```

pub mod assertion;
pub mod broker;
pub mod connection;
pub mod credential;
pub mod error;

// Re-export key types at crate root
pub use assertion::ClientCertificate;
pub use broker::{EntraTokenBroker, TokenBroker, DEVOPS_RESOURCE, DEVOPS_SCOPE};
pub use connection::{AuthScheme, Connection};
pub use credential::Credential;
pub use error::TokenError;
