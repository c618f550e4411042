//! Saved-query provisioning: locate-or-create under "My Queries".

use tracing::{debug, info, instrument};

use backlog_core::{Error, QueryId, QueryNode, MY_QUERIES_FOLDER, QUERY_FOLDER_DEPTH};

use crate::interface::WorkItemClient;

/// Ensures a saved query named `query_name` exists under the project's
/// "My Queries" folder and returns its identifier.
///
/// Looks the query up by case-insensitive name on every call; only
/// creates when absent, and never updates an existing query. This is a
/// best-effort idempotent create: two callers racing on the same
/// (project, name) pair against a backend that does not enforce name
/// uniqueness can still both create — the race is accepted, not
/// serialized here.
///
/// # Errors
///
/// - `InvalidArgument` when `project` is blank (no network call made)
/// - `NotFound` when the project has no "My Queries" folder
/// - `OperationFailed` for any backend failure, carrying the cause
#[instrument(skip(client, wiql), fields(query = query_name))]
pub async fn ensure_query<C>(
    client: &C,
    project: &str,
    query_name: &str,
    wiql: &str,
) -> Result<QueryId, Error>
where
    C: WorkItemClient + ?Sized,
{
    if project.trim().is_empty() {
        return Err(Error::invalid_argument("project name cannot be blank"));
    }

    let folders = client
        .query_folders(project, QUERY_FOLDER_DEPTH)
        .await
        .map_err(|e| Error::operation("failed to list query folders", &e))?;

    let my_queries = folders
        .iter()
        .find(|node| node.is_named(MY_QUERIES_FOLDER))
        .ok_or_else(|| Error::NotFound("'My Queries' folder not found in project".into()))?;

    if let Some(existing) = my_queries.child_named(query_name) {
        debug!(query = query_name, "query already provisioned");
        return existing.id.clone().ok_or_else(|| {
            Error::OperationFailed(format!("existing query '{query_name}' has no identifier"))
        });
    }

    let draft = QueryNode::draft(query_name, wiql);
    let created = client
        .create_query(project, &my_queries.name, &draft)
        .await
        .map_err(|e| Error::operation("failed to create query", &e))?;

    info!(query = query_name, "provisioned new query");
    created.id.ok_or_else(|| {
        Error::OperationFailed(format!("created query '{query_name}' has no identifier"))
    })
}
