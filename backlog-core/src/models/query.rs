//! Saved-query hierarchy types.
//!
//! Azure DevOps stores saved queries in a folder tree per project. A
//! single wire shape (`QueryHierarchyItem` in the REST payloads) covers
//! both folders and leaf queries; [`QueryNode`] mirrors it.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Constants
// ============================================================================

/// The well-known folder queries are provisioned under.
pub const MY_QUERIES_FOLDER: &str = "My Queries";

/// Listing depth that returns the folder level plus its immediate children.
pub const QUERY_FOLDER_DEPTH: u32 = 2;

// ============================================================================
// Query Id
// ============================================================================

/// Opaque identifier of a provisioned saved query.
///
/// The backend assigns these as GUID strings on creation; the client
/// never fabricates one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryId(String);

impl QueryId {
    /// Wraps a backend-assigned identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for QueryId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

// ============================================================================
// Query Node
// ============================================================================

/// A node in the saved-query hierarchy: a folder or a leaf query.
///
/// `id` is absent on a creation draft and populated by the backend once
/// the query exists. Node identity within a folder is its name, compared
/// case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryNode {
    /// Backend-assigned identifier; `None` until provisioned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<QueryId>,
    /// Node name, unique within its folder (case-insensitive).
    pub name: String,
    /// WIQL text; present on leaf queries only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wiql: Option<String>,
    /// Whether this node is a folder rather than a query.
    #[serde(default)]
    pub is_folder: bool,
    /// Immediate children, populated up to the requested listing depth.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<QueryNode>,
}

impl QueryNode {
    /// Builds a creation draft for a leaf query (no id, not a folder).
    pub fn draft(name: impl Into<String>, wiql: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            wiql: Some(wiql.into()),
            is_folder: false,
            children: Vec::new(),
        }
    }

    /// Case-insensitive name comparison, the identity rule for nodes
    /// within a folder.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Finds an immediate child by name, case-insensitively.
    pub fn child_named(&self, name: &str) -> Option<&QueryNode> {
        self.children.iter().find(|c| c.is_named(name))
    }
}
