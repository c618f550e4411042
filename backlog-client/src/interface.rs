//! The backend capability seam.
//!
//! [`WorkItemClient`] is the set of work-item tracking operations the
//! pipeline consumes. The REST implementation lives in [`crate::rest`];
//! tests substitute recording mocks.

use async_trait::async_trait;

use backlog_core::{Identity, QueryId, QueryNode, WorkItem, WorkItemRef};

use crate::error::ClientError;

/// Work-item tracking operations offered by the backend.
///
/// Implementations must be safe to share across concurrent facade
/// instances; every method is an independent request.
#[async_trait]
pub trait WorkItemClient: Send + Sync {
    /// Lists the saved-query hierarchy of a project down to `depth`
    /// levels (folders plus their children at depth 2).
    async fn query_folders(&self, project: &str, depth: u32)
        -> Result<Vec<QueryNode>, ClientError>;

    /// Creates a saved query under `parent_folder`. The backend assigns
    /// the identifier on the returned node.
    async fn create_query(
        &self,
        project: &str,
        parent_folder: &str,
        draft: &QueryNode,
    ) -> Result<QueryNode, ClientError>;

    /// Executes a saved query by id, returning its ordered result
    /// references.
    async fn run_query(&self, id: &QueryId) -> Result<Vec<WorkItemRef>, ClientError>;

    /// Fetches full work-item payloads for exactly `ids`, restricted to
    /// the `fields` projection.
    async fn work_items(&self, ids: &[i32], fields: &[&str])
        -> Result<Vec<WorkItem>, ClientError>;

    /// Resolves the principal behind the client's connection.
    async fn identity(&self) -> Result<Identity, ClientError>;
}
