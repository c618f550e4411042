// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Backlog Client
//!
//! Saved-query provisioning and batched work-item retrieval for Azure
//! DevOps, behind a per-category service facade.
//!
//! ## Pipeline
//!
//! - [`interface::WorkItemClient`] - The backend capability seam
//! - [`rest::RestWorkItemClient`] - Its REST implementation
//! - [`provision::ensure_query`] - Locate-or-create a saved query under
//!   the "My Queries" folder (best-effort idempotent create)
//! - [`retrieve::fetch_items`] - Execute a query and page its results
//!   through fixed-size batch windows, preserving order
//! - [`service::BacklogService`] - One entry point per work-item
//!   category, owning the connection for its lifetime
//!
//! ## Example
//!
//! ```ignore
//! use backlog_auth::Connection;
//! use backlog_client::BacklogService;
//!
//! let conn = Connection::delegated_token(org_url, token)?;
//! let service = BacklogService::connect(conn)?;
//! let bugs = service.new_bugs("Fabrikam").await?;
//! ```

pub mod error;
pub mod interface;
pub mod provision;
pub mod rest;
pub mod retrieve;
pub mod service;

#[cfg(test)]
mod mock;

// Re-export key types at crate root
pub use error::ClientError;
pub use interface::WorkItemClient;
pub use provision::ensure_query;
pub use rest::{RestOptions, RestWorkItemClient};
pub use retrieve::fetch_items;
pub use service::{BacklogService, WorkItemCategory};
