//! Work items and query result references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Maximum number of work items requested per batch window.
pub const BATCH_SIZE: usize = 100;

/// Field projection requested for every fetched work item.
pub const WORK_ITEM_FIELDS: [&str; 5] = [
    "System.Id",
    "System.Title",
    "System.State",
    "System.AssignedTo",
    "System.CreatedDate",
];

// ============================================================================
// Work Item Reference
// ============================================================================

/// Lightweight pointer returned by query execution.
///
/// References come back as an ordered sequence; that order is preserved
/// through batching and into the final result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemRef {
    /// Work item id.
    pub id: i32,
    /// Resource URL for the referenced item, when the backend sends one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl WorkItemRef {
    /// Creates a bare reference from an id.
    pub fn new(id: i32) -> Self {
        Self { id, url: None }
    }
}

// ============================================================================
// Work Item
// ============================================================================

/// Immutable snapshot of a single work item as returned by the backend.
///
/// Fields arrive as a name-to-value map keyed by reference names such as
/// `System.Title`; this client aggregates items without mutating them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    /// Work item id.
    pub id: i32,
    /// Revision number, when projected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<i32>,
    /// Field map keyed by reference name.
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl WorkItem {
    /// Returns a raw field value by reference name.
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name)
    }

    /// Returns a field as a string slice, if present and textual.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(serde_json::Value::as_str)
    }

    /// The `System.Title` field.
    pub fn title(&self) -> Option<&str> {
        self.field_str("System.Title")
    }

    /// The `System.State` field.
    pub fn state(&self) -> Option<&str> {
        self.field_str("System.State")
    }

    /// The `System.CreatedDate` field, parsed.
    pub fn created_date(&self) -> Option<DateTime<Utc>> {
        self.field_str("System.CreatedDate")
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}
