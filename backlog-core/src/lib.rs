// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Backlog Core
//!
//! Core types and the error taxonomy for the Azure DevOps backlog client.
//!
//! This crate provides the foundational abstractions used across the other
//! backlog crates:
//!
//! - Domain models (query hierarchy, work items, result references)
//! - The four-kind error taxonomy shared by every public operation
//! - Shared constants (batch size, field projection, folder name)
//!
//! ## Key Types
//!
//! - [`QueryNode`] - A node in the saved-query hierarchy (folder or query)
//! - [`QueryId`] - Opaque identifier of a provisioned saved query
//! - [`WorkItemRef`] - Lightweight reference returned by query execution
//! - [`WorkItem`] - Full work-item snapshot with its field map
//! - [`Identity`] - The resolved principal behind a connection
//! - [`Error`] - Classified failure surfaced by every public operation

pub mod error;
pub mod models;

// Re-export error types
pub use error::{Error, ErrorKind};

// Re-export all model types
pub use models::{
    // Query hierarchy
    QueryId,
    QueryNode,
    MY_QUERIES_FOLDER,
    QUERY_FOLDER_DEPTH,
    // Work items
    WorkItem,
    WorkItemRef,
    BATCH_SIZE,
    WORK_ITEM_FIELDS,
    // Identity
    Identity,
};
