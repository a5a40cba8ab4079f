//! Request and response envelopes for the query endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{QueryError, Result};
use crate::query::QueryNode;
use crate::session::{PageOptions, QueryPage};

/// Paging hints carried in `context`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct QueryContext {
    #[serde(default)]
    pub page_size: Option<usize>,
    #[serde(default)]
    pub full_query: bool,
    #[serde(default)]
    pub continuation_key: Option<String>,
}

/// `{method, args, session_id?, context?}`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub query: QueryNode,
    pub session_id: Option<String>,
    pub context: QueryContext,
}

impl QueryRequest {
    pub fn from_json(value: &Value) -> Result<Self> {
        let query = QueryNode::from_json(value)?;
        let session_id = match value.get("session_id") {
            None | Some(Value::Null) => None,
            Some(Value::String(id)) => Some(id.clone()),
            Some(_) => {
                return Err(QueryError::MalformedQuery(
                    "`session_id` must be a string".to_string(),
                ));
            }
        };
        let context = match value.get("context") {
            None | Some(Value::Null) => QueryContext::default(),
            Some(raw) => serde_json::from_value::<QueryContext>(raw.clone())
                .map_err(|err| QueryError::MalformedQuery(format!("invalid `context`: {err}")))?,
        };
        Ok(Self {
            query,
            session_id,
            context,
        })
    }

    #[must_use]
    pub fn page_options(&self) -> PageOptions {
        PageOptions {
            session_id: self.session_id.clone(),
            page_size: self.context.page_size,
            full_query: self.context.full_query,
            continuation_key: self.context.continuation_key.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseContext {
    pub continuation_key: String,
}

/// Successful response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryResponse {
    pub success: bool,
    pub result: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ResponseContext>,
}

impl From<QueryPage> for QueryResponse {
    fn from(page: QueryPage) -> Self {
        Self {
            success: true,
            result: page.results,
            context: page
                .continuation_key
                .map(|continuation_key| ResponseContext { continuation_key }),
        }
    }
}

impl QueryResponse {
    #[must_use]
    pub fn from_results(result: Vec<String>) -> Self {
        Self {
            success: true,
            result,
            context: None,
        }
    }
}

/// Status code and body for a failed operation.
pub fn error_response(err: &QueryError, operation: &str) -> (u16, Value) {
    let body = serde_json::to_value(err.to_payload(operation)).unwrap_or_else(|_| {
        serde_json::json!({ "success": false, "code": err.code(), "comment": err.to_string() })
    });
    (err.status_code(), body)
}
