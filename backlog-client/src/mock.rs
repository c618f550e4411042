//! Recording mock of the backend capability seam, shared by the
//! pipeline and facade tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use backlog_core::{Identity, QueryId, QueryNode, WorkItem, WorkItemRef, MY_QUERIES_FOLDER};

use crate::error::ClientError;
use crate::interface::WorkItemClient;

/// Where the mock should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    /// Fail the folder listing.
    Folders,
    /// Fail query creation.
    Create,
    /// Fail query execution.
    Run,
    /// Fail the item fetch once `after_windows` windows have succeeded.
    Items {
        /// Number of windows to serve before failing.
        after_windows: usize,
    },
}

/// Backend mock with canned responses and recorded calls.
///
/// Created queries become visible to later folder listings, so
/// idempotency can be exercised across repeated calls.
pub struct MockClient {
    folders: Mutex<Vec<QueryNode>>,
    refs: Vec<WorkItemRef>,
    fail: Option<FailPoint>,
    calls: Mutex<Vec<&'static str>>,
    creates: AtomicUsize,
    created_names: Mutex<Vec<String>>,
    windows: Mutex<Vec<Vec<i32>>>,
}

impl MockClient {
    pub const EXISTING_QUERY_ID: &'static str = "8a8c8212-15ca-41ed-97aa-1d6fbfbcd581";
    pub const CREATED_QUERY_ID: &'static str = "2b1f1e8d-5c51-4f2c-9f36-14a0c8d2b4aa";
    pub const FAILURE_MESSAGE: &'static str = "VS402337: simulated backend failure";

    fn new(folders: Vec<QueryNode>, refs: &[i32]) -> Self {
        Self {
            folders: Mutex::new(folders),
            refs: refs.iter().map(|&id| WorkItemRef::new(id)).collect(),
            fail: None,
            calls: Mutex::new(Vec::new()),
            creates: AtomicUsize::new(0),
            created_names: Mutex::new(Vec::new()),
            windows: Mutex::new(Vec::new()),
        }
    }

    /// A project whose "My Queries" folder already holds `query_name`.
    pub fn with_existing_query(query_name: &str, refs: &[i32]) -> Self {
        let mut folder = QueryNode::draft(MY_QUERIES_FOLDER, "");
        folder.is_folder = true;
        folder.wiql = None;
        folder.children = vec![QueryNode {
            id: Some(QueryId::from(Self::EXISTING_QUERY_ID)),
            name: query_name.to_owned(),
            wiql: None,
            is_folder: false,
            children: Vec::new(),
        }];
        Self::new(vec![folder], refs)
    }

    /// A project whose "My Queries" folder exists but is empty.
    pub fn with_empty_folder(refs: &[i32]) -> Self {
        let mut folder = QueryNode::draft(MY_QUERIES_FOLDER, "");
        folder.is_folder = true;
        folder.wiql = None;
        Self::new(vec![folder], refs)
    }

    /// A project with no "My Queries" folder at all.
    pub fn without_my_queries_folder() -> Self {
        let mut folder = QueryNode::draft("Shared Queries", "");
        folder.is_folder = true;
        folder.wiql = None;
        Self::new(vec![folder], &[])
    }

    /// Makes the mock fail at the given point.
    pub fn failing_at(mut self, fail: FailPoint) -> Self {
        self.fail = Some(fail);
        self
    }

    pub fn recorded_calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn created_names(&self) -> Vec<String> {
        self.created_names.lock().unwrap().clone()
    }

    pub fn fetched_windows(&self) -> Vec<Vec<i32>> {
        self.windows.lock().unwrap().clone()
    }

    fn failure() -> ClientError {
        ClientError::Api {
            status: 500,
            message: Self::FAILURE_MESSAGE.to_owned(),
        }
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl WorkItemClient for MockClient {
    async fn query_folders(
        &self,
        _project: &str,
        _depth: u32,
    ) -> Result<Vec<QueryNode>, ClientError> {
        self.record("query_folders");
        if self.fail == Some(FailPoint::Folders) {
            return Err(Self::failure());
        }
        Ok(self.folders.lock().unwrap().clone())
    }

    async fn create_query(
        &self,
        _project: &str,
        parent_folder: &str,
        draft: &QueryNode,
    ) -> Result<QueryNode, ClientError> {
        self.record("create_query");
        if self.fail == Some(FailPoint::Create) {
            return Err(Self::failure());
        }
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.created_names.lock().unwrap().push(draft.name.clone());
        let mut created = draft.clone();
        created.id = Some(QueryId::from(Self::CREATED_QUERY_ID));

        // Make the new query visible to later folder listings.
        let mut folders = self.folders.lock().unwrap();
        if let Some(folder) = folders.iter_mut().find(|f| f.is_named(parent_folder)) {
            folder.children.push(created.clone());
        }
        Ok(created)
    }

    async fn run_query(&self, _id: &QueryId) -> Result<Vec<WorkItemRef>, ClientError> {
        self.record("run_query");
        if self.fail == Some(FailPoint::Run) {
            return Err(Self::failure());
        }
        Ok(self.refs.clone())
    }

    async fn work_items(
        &self,
        ids: &[i32],
        _fields: &[&str],
    ) -> Result<Vec<WorkItem>, ClientError> {
        self.record("work_items");
        if let Some(FailPoint::Items { after_windows }) = self.fail {
            if self.windows.lock().unwrap().len() >= after_windows {
                return Err(Self::failure());
            }
        }
        self.windows.lock().unwrap().push(ids.to_vec());
        Ok(ids
            .iter()
            .map(|&id| {
                let mut fields = serde_json::Map::new();
                fields.insert(
                    "System.Title".into(),
                    serde_json::Value::String(format!("Item {id}")),
                );
                fields.insert("System.State".into(), serde_json::Value::String("New".into()));
                WorkItem {
                    id,
                    rev: Some(1),
                    fields,
                }
            })
            .collect())
    }

    async fn identity(&self) -> Result<Identity, ClientError> {
        self.record("identity");
        Ok(Identity {
            id: "00000000-0000-0000-0000-000000000042".into(),
            display_name: "Mock User".into(),
        })
    }
}
