//! The resolved principal behind a connection.

use serde::{Deserialize, Serialize};

/// Principal resolved for an authenticated connection.
///
/// Populated lazily: credential resolution never asks the backend who the
/// token belongs to, so the identity only becomes known on first use of
/// the connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Backend identity id.
    pub id: String,
    /// Display name reported by the identity provider.
    #[serde(alias = "providerDisplayName")]
    pub display_name: String,
}
