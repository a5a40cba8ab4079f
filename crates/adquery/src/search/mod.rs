//! Search backend seam.
//!
//! The production cluster client lives outside this crate; it only has to
//! accept a request body and return hits with their `_source` and `sort`
//! values. [`InMemorySearchBackend`] evaluates the same bodies over a list of
//! documents.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{QueryError, Result};

mod clause;
mod memory;

pub use memory::InMemorySearchBackend;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "_source")]
    pub source: Value,
    #[serde(default)]
    pub sort: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub hits: Vec<SearchHit>,
    /// Backend-reported duration in milliseconds.
    #[serde(default)]
    pub took: u64,
}

impl SearchResponse {
    /// Reads the cluster wire shape `{ "took": n, "hits": { "hits": [...] } }`.
    pub fn from_wire(value: &Value) -> Result<Self> {
        let hits = value
            .pointer("/hits/hits")
            .cloned()
            .ok_or_else(|| QueryError::Backend("response has no hits.hits array".to_string()))?;
        let hits = serde_json::from_value::<Vec<SearchHit>>(hits)
            .map_err(|err| QueryError::Backend(format!("malformed hit: {err}")))?;
        let took = value.get("took").and_then(Value::as_u64).unwrap_or(0);
        Ok(Self { hits, took })
    }
}

pub trait SearchBackend: Send + Sync {
    /// One blocking round trip. No retries.
    fn search(&self, body: &Value, timeout: Duration) -> Result<SearchResponse>;
}
