//! Compiles the query AST into a search-engine boolean query.
//!
//! Combinators map onto `bool.must`, `bool.should` and `bool.must_not` and
//! accept any number of sub-queries, unlike the interpreter which requires
//! binary `AND`/`OR`. Leaves go through the [`FormatterRegistry`]; a method
//! with no formatter compiles to a clause that matches nothing.

use serde_json::{Value, json};
use tracing::warn;

use crate::error::Result;
use crate::query::{CombinatorOp, QueryNode};

mod formatters;

pub use formatters::{Formatter, FormatterRegistry};

/// Document fields referenced by compiled clauses.
pub mod fields {
    pub const OBSERVED_ON_DEVICE_AT: &str = "observation.observed_on_device_at";
    pub const OBSERVER_UUID: &str = "observer.uuid";
    pub const OBSERVATION_UUID: &str = "observation.uuid";
    pub const PAGE_NAME: &str = "enrichment.meta_adlibrary_scrape.candidates.data.page_name";
    pub const CATEGORIES: &str = "enrichment.meta_adlibrary_scrape.candidates.data.categories";
}

/// Category segment used when mapping hits back to result paths.
pub const HIT_CATEGORY: &str = "temp";

#[must_use]
pub fn match_none() -> Value {
    json!({ "match_none": {} })
}

pub fn compile(registry: &FormatterRegistry, node: &QueryNode) -> Result<Value> {
    match node {
        QueryNode::Combinator { op, children } => {
            let clauses = children
                .iter()
                .map(|child| compile(registry, child))
                .collect::<Result<Vec<_>>>()?;
            Ok(match op {
                CombinatorOp::And => json!({ "bool": { "must": clauses } }),
                CombinatorOp::Or => json!({ "bool": { "should": clauses } }),
                CombinatorOp::Not => json!({ "bool": { "must_not": clauses } }),
            })
        }
        QueryNode::Leaf { method, args } => match registry.format(method, args)? {
            Some(clause) => Ok(clause),
            None => {
                warn!(method = %method, "no search formatter registered; clause matches nothing");
                Ok(match_none())
            }
        },
    }
}

/// Sort order shared by every paged request: newest first, ties broken by the
/// unique observation id so `search_after` never skips or repeats a hit.
#[must_use]
pub fn sort_clause() -> Value {
    json!([
        { (fields::OBSERVED_ON_DEVICE_AT): { "order": "desc" } },
        { (fields::OBSERVATION_UUID): { "order": "desc" } },
    ])
}

/// Full request body for one backend round trip.
#[must_use]
pub fn search_body(query: &Value, size: usize, search_after: Option<&[Value]>) -> Value {
    let mut body = json!({
        "size": size,
        "query": query,
        "sort": sort_clause(),
    });
    if let (Some(values), Some(object)) = (search_after, body.as_object_mut()) {
        object.insert("search_after".to_string(), Value::Array(values.to_vec()));
    }
    body
}

/// Maps a hit's `_source` to `{observer.uuid}/temp/{observation.uuid}`.
#[must_use]
pub fn hit_to_result(source: &Value) -> Option<String> {
    let observer = source.pointer("/observer/uuid")?.as_str()?;
    let observation = source.pointer("/observation/uuid")?.as_str()?;
    Some(format!("{observer}/{HIT_CATEGORY}/{observation}"))
}

#[cfg(test)]
mod tests;
