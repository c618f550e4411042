//! Batched work-item retrieval.

use tracing::{debug, instrument};

use backlog_core::{Error, QueryId, WorkItem, BATCH_SIZE, WORK_ITEM_FIELDS};

use crate::interface::WorkItemClient;

/// Executes a saved query and fetches the full payload of every
/// referenced item.
///
/// References are paged through contiguous windows of at most
/// [`BATCH_SIZE`] ids, fetched one window at a time. Sequential batching
/// is deliberate: it bounds memory and avoids hammering the backend with
/// concurrent paging requests. The returned sequence has one item per
/// reference, in the original reference order.
///
/// # Errors
///
/// `OperationFailed` on any backend failure; partially accumulated
/// results are discarded, never returned.
#[instrument(skip(client), fields(query = %query_id))]
pub async fn fetch_items<C>(client: &C, query_id: &QueryId) -> Result<Vec<WorkItem>, Error>
where
    C: WorkItemClient + ?Sized,
{
    let refs = client
        .run_query(query_id)
        .await
        .map_err(|e| Error::operation("failed to execute query", &e))?;

    if refs.is_empty() {
        debug!("query returned no references");
        return Ok(Vec::new());
    }

    debug!(references = refs.len(), "fetching work items in windows");
    let mut items = Vec::with_capacity(refs.len());
    for window in refs.chunks(BATCH_SIZE) {
        let ids: Vec<i32> = window.iter().map(|r| r.id).collect();
        let batch = client
            .work_items(&ids, &WORK_ITEM_FIELDS)
            .await
            .map_err(|e| Error::operation("failed to retrieve work items", &e))?;
        items.extend(batch);
    }

    debug!(items = items.len(), "retrieval complete");
    Ok(items)
}
