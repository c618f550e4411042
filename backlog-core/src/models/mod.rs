//! Domain models for the backlog client.
//!
//! These types mirror the wire shapes of the Azure DevOps work-item
//! tracking REST API, with camelCase payload names mapped to snake_case
//! fields.
//!
//! ## Submodules
//!
//! - [`query`] - Saved-query hierarchy (QueryNode, QueryId)
//! - [`work_item`] - Work items and result references
//! - [`identity`] - The resolved principal behind a connection

mod identity;
mod query;
mod work_item;

// Re-export everything at the models level
pub use identity::Identity;
pub use query::{QueryId, QueryNode, MY_QUERIES_FOLDER, QUERY_FOLDER_DEPTH};
pub use work_item::{WorkItem, WorkItemRef, BATCH_SIZE, WORK_ITEM_FIELDS};
