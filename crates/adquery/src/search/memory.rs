use std::cmp::Ordering;
use std::time::{Duration, Instant};

use serde_json::{Value, json};

use crate::error::{QueryError, Result};

use super::clause::{field_values, matches};
use super::{SearchBackend, SearchHit, SearchResponse};

const DEFAULT_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
struct SortKey {
    field: String,
    order: SortOrder,
}

/// Evaluates request bodies over an owned document list.
///
/// Supports `bool` (`must`, `filter`, `should`, `must_not`,
/// `minimum_should_match`), `range`, `wildcard`, `match_phrase`,
/// `simple_query_string`, `match_all` and `match_none`, plus `size`, field
/// `sort` and `search_after`. Missing sort values order last.
#[derive(Debug, Clone, Default)]
pub struct InMemorySearchBackend {
    documents: Vec<Value>,
}

impl InMemorySearchBackend {
    #[must_use]
    pub fn new(documents: Vec<Value>) -> Self {
        Self { documents }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl SearchBackend for InMemorySearchBackend {
    fn search(&self, body: &Value, timeout: Duration) -> Result<SearchResponse> {
        let started = Instant::now();
        let match_all = json!({ "match_all": {} });
        let query = body.get("query").unwrap_or(&match_all);
        let size = match body.get("size") {
            None => DEFAULT_SIZE,
            Some(value) => value
                .as_u64()
                .and_then(|size| usize::try_from(size).ok())
                .ok_or_else(|| QueryError::Backend(format!("invalid size: {value}")))?,
        };
        let sort = parse_sort(body.get("sort"))?;
        let after = match body.get("search_after") {
            None => None,
            Some(Value::Array(values)) if values.len() == sort.len() => Some(values.as_slice()),
            Some(other) => {
                return Err(QueryError::Backend(format!(
                    "search_after must hold one value per sort key, got {other}"
                )));
            }
        };

        let mut hits = Vec::new();
        for document in &self.documents {
            if !matches(query, document)? {
                continue;
            }
            let sort_values = sort
                .iter()
                .map(|key| {
                    field_values(document, &key.field)
                        .first()
                        .map_or(Value::Null, |value| (*value).clone())
                })
                .collect::<Vec<_>>();
            if after.is_some_and(|after| compare_tuples(&sort_values, after, &sort) != Ordering::Greater)
            {
                continue;
            }
            hits.push(SearchHit {
                source: document.clone(),
                sort: sort_values,
            });
        }
        hits.sort_by(|left, right| compare_tuples(&left.sort, &right.sort, &sort));
        hits.truncate(size);

        let elapsed = started.elapsed();
        if elapsed > timeout {
            return Err(QueryError::Backend(format!(
                "search exceeded timeout of {}s",
                timeout.as_secs()
            )));
        }
        Ok(SearchResponse {
            hits,
            took: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        })
    }
}

fn parse_sort(sort: Option<&Value>) -> Result<Vec<SortKey>> {
    let Some(sort) = sort else {
        return Ok(Vec::new());
    };
    let items = sort
        .as_array()
        .ok_or_else(|| QueryError::Backend("sort must be an array".to_string()))?;
    items.iter().map(parse_sort_key).collect()
}

fn parse_sort_key(item: &Value) -> Result<SortKey> {
    if let Some(field) = item.as_str() {
        return Ok(SortKey {
            field: field.to_string(),
            order: SortOrder::Asc,
        });
    }
    let (field, params) = item
        .as_object()
        .filter(|object| object.len() == 1)
        .and_then(|object| object.iter().next())
        .ok_or_else(|| QueryError::Backend(format!("unsupported sort key: {item}")))?;
    let order = params
        .as_str()
        .or_else(|| params.get("order").and_then(Value::as_str))
        .unwrap_or("asc");
    let order = match order {
        "asc" => SortOrder::Asc,
        "desc" => SortOrder::Desc,
        other => {
            return Err(QueryError::Backend(format!(
                "unsupported sort order {other:?} on {field}"
            )));
        }
    };
    Ok(SortKey {
        field: field.clone(),
        order,
    })
}

fn compare_tuples(left: &[Value], right: &[Value], keys: &[SortKey]) -> Ordering {
    for ((l, r), key) in left.iter().zip(right).zip(keys) {
        let ordering = match (l.is_null(), r.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let natural = compare_values(l, r);
                match key.order {
                    SortOrder::Asc => natural,
                    SortOrder::Desc => natural.reverse(),
                }
            }
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn compare_values(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => match (l.as_i64(), r.as_i64()) {
            (Some(l), Some(r)) => l.cmp(&r),
            _ => l
                .as_f64()
                .zip(r.as_f64())
                .and_then(|(l, r)| l.partial_cmp(&r))
                .unwrap_or(Ordering::Equal),
        },
        (Value::String(l), Value::String(r)) => l.cmp(r),
        (Value::Bool(l), Value::Bool(r)) => l.cmp(r),
        (Value::Number(_), _) => Ordering::Less,
        (_, Value::Number(_)) => Ordering::Greater,
        _ => left.to_string().cmp(&right.to_string()),
    }
}
