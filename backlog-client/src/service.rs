//! The backlog service facade.
//!
//! One entry point per work-item category, each a fixed composition of
//! query provisioning and batched retrieval. The facade owns the backend
//! client and, through it, the connection; dropping the facade releases
//! both.

use tracing::instrument;

use backlog_auth::Connection;
use backlog_core::{Error, QueryId, WorkItem};

use crate::interface::WorkItemClient;
use crate::provision::ensure_query;
use crate::rest::RestWorkItemClient;
use crate::retrieve::fetch_items;

// ============================================================================
// Work Item Category
// ============================================================================

/// A work-item category with its fixed saved-query name and filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkItemCategory {
    /// Bugs in the "New" state.
    Bug,
    /// Features in the "New" state.
    Feature,
}

impl WorkItemCategory {
    /// The saved-query name provisioned for this category.
    pub fn query_name(&self) -> &'static str {
        match self {
            Self::Bug => "New Bugs Query",
            Self::Feature => "New Features Query",
        }
    }

    /// The work-item type the category filters on.
    pub fn work_item_type(&self) -> &'static str {
        match self {
            Self::Bug => "Bug",
            Self::Feature => "Feature",
        }
    }

    /// WIQL filter text for this category: current project, matching
    /// type, "New" state, newest first.
    pub fn wiql(&self) -> String {
        format!(
            "SELECT [System.Id], [System.WorkItemType], [System.Title], \
             [System.AssignedTo], [System.State], [System.Tags] \
             FROM WorkItems \
             WHERE [System.TeamProject] = @project \
             AND [System.WorkItemType] = '{}' \
             AND [System.State] = 'New' \
             ORDER BY [System.CreatedDate] DESC",
            self.work_item_type()
        )
    }
}

// ============================================================================
// Backlog Service
// ============================================================================

/// Facade composing provisioning and retrieval over one owned client.
///
/// Each facade instance is single-owner and runs its calls sequentially;
/// run one facade per project to work concurrently. The connection is
/// released when the facade is dropped, on every exit path.
pub struct BacklogService<C: WorkItemClient> {
    client: C,
}

impl BacklogService<RestWorkItemClient> {
    /// Builds a REST-backed service that takes ownership of the
    /// connection.
    pub fn connect(connection: Connection) -> Result<Self, Error> {
        let client = RestWorkItemClient::new(connection)
            .map_err(|e| Error::operation("failed to construct backend client", &e))?;
        Ok(Self::new(client))
    }
}

impl<C: WorkItemClient> BacklogService<C> {
    /// Wraps an existing client.
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// The owned backend client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Consumes the facade, handing the client (and its connection) back
    /// to the caller.
    pub fn into_client(self) -> C {
        self.client
    }

    /// Retrieves all bugs in the "New" state for `project`, newest
    /// first.
    pub async fn new_bugs(&self, project: &str) -> Result<Vec<WorkItem>, Error> {
        self.category_items(project, WorkItemCategory::Bug).await
    }

    /// Retrieves all features in the "New" state for `project`, newest
    /// first.
    pub async fn new_features(&self, project: &str) -> Result<Vec<WorkItem>, Error> {
        self.category_items(project, WorkItemCategory::Feature).await
    }

    /// Ensures the category's saved query exists, then retrieves every
    /// item it matches.
    #[instrument(skip(self))]
    pub async fn category_items(
        &self,
        project: &str,
        category: WorkItemCategory,
    ) -> Result<Vec<WorkItem>, Error> {
        let query_id = self.ensure_category_query(project, category).await?;
        fetch_items(&self.client, &query_id).await
    }

    /// Provisions the saved query for a category without executing it.
    pub async fn ensure_category_query(
        &self,
        project: &str,
        category: WorkItemCategory,
    ) -> Result<QueryId, Error> {
        ensure_query(
            &self.client,
            project,
            category.query_name(),
            &category.wiql(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_wiql_filters_on_type_and_state() {
        let wiql = WorkItemCategory::Bug.wiql();
        assert!(wiql.contains("[System.WorkItemType] = 'Bug'"));
        assert!(wiql.contains("[System.State] = 'New'"));
        assert!(wiql.contains("ORDER BY [System.CreatedDate] DESC"));

        let wiql = WorkItemCategory::Feature.wiql();
        assert!(wiql.contains("[System.WorkItemType] = 'Feature'"));
    }

    #[test]
    fn test_category_query_names_are_distinct() {
        assert_ne!(
            WorkItemCategory::Bug.query_name(),
            WorkItemCategory::Feature.query_name()
        );
    }
}
