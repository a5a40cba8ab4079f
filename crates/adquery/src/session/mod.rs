//! Paged query sessions over the search backend.
//!
//! A request without a session is a one-shot query. A request naming a
//! stored session is paged: the response carries a continuation key while
//! more results may exist, and following the keys walks the result set in
//! one strict order (newest observation first, observation id as tiebreaker)
//! without repeats or gaps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{QueryError, Result};

mod continuation;
mod service;

pub use continuation::{ContinuationKey, query_fingerprint};
pub use service::QuerySessionService;

/// Persisted session record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySession {
    pub session_id: String,
    /// Sort keys applied to every page, as `field:order`.
    pub ordering: Vec<String>,
    /// Sort values of the last hit served, if any page was served.
    #[serde(default)]
    pub position_cursor: Option<Vec<Value>>,
    #[serde(default)]
    pub page_size: Option<usize>,
    #[serde(default)]
    pub full_query: bool,
    #[serde(default)]
    pub pages_served: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Paging inputs taken from a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageOptions {
    pub session_id: Option<String>,
    pub page_size: Option<usize>,
    pub full_query: bool,
    pub continuation_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryPage {
    pub results: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation_key: Option<String>,
}

/// Session ids become object-key segments, so they are restricted to
/// `[A-Za-z0-9_-]`.
pub(crate) fn validate_session_id(session_id: &str) -> Result<()> {
    let valid = !session_id.is_empty()
        && session_id.len() <= 128
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(QueryError::MalformedQuery(format!(
            "invalid session_id: {session_id:?}"
        )))
    }
}
