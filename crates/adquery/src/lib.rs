//! Boolean ad queries with two back ends.
//!
//! One recursive query AST is either interpreted directly against the cached
//! candidate index or compiled into a search-engine boolean query and paged
//! through a search backend with session-bound continuation keys.

// Public fallible APIs in this crate share one concrete error contract (`QueryError`).
#![allow(
    clippy::missing_errors_doc,
    reason = "crate-wide fallible API uses one explicit error type; per-item boilerplate would duplicate contract"
)]

pub mod api;
pub mod candidate;
pub mod client;
pub mod config;
pub mod consistency;
pub mod dsl;
pub mod error;
pub mod index;
pub mod logging;
pub mod query;
pub mod search;
pub mod session;
pub mod store;

pub use api::{QueryRequest, QueryResponse};
pub use candidate::CandidatePath;
pub use client::AdQuery;
pub use config::AppConfig;
pub use error::{ErrorPayload, QueryError, Result};
pub use query::QueryNode;
