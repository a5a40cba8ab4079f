use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Value, json};

use crate::error::{QueryError, Result};
use crate::query::methods;

use super::fields;

/// Turns a leaf's literal arguments into one search clause.
pub type Formatter = fn(&[String]) -> Result<Value>;

/// Leaf formatters available to the search-DSL compiler. Independent of the
/// interpreter's predicate registry.
#[derive(Clone, Default)]
pub struct FormatterRegistry {
    entries: BTreeMap<String, Formatter>,
}

impl fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatterRegistry")
            .field("methods", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FormatterRegistry {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(methods::DATETIME_AFTER, datetime_after);
        registry.register(methods::DATETIME_BEFORE, datetime_before);
        registry.register(methods::OBSERVER_ID_CONTAINS, observer_id_contains);
        registry.register(methods::OBSERVATION_ID_CONTAINS, observation_id_contains);
        registry.register(methods::PAGE_NAME_CONTAINS, page_name_contains);
        registry.register(methods::CATEGORIES_CONTAINS, categories_contains);
        registry.register(methods::ANYTHING_CONTAINS, anything_contains);
        registry
    }

    pub fn register(&mut self, method: impl Into<String>, formatter: Formatter) {
        self.entries.insert(method.into(), formatter);
    }

    #[must_use]
    pub fn contains(&self, method: &str) -> bool {
        self.entries.contains_key(method)
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// `Ok(None)` when no formatter is registered for `method`.
    pub fn format(&self, method: &str, args: &[String]) -> Result<Option<Value>> {
        self.entries
            .get(method)
            .map(|formatter| formatter(args))
            .transpose()
    }
}

fn datetime_after(args: &[String]) -> Result<Value> {
    let seconds = millis_to_seconds(methods::DATETIME_AFTER, args)?;
    Ok(json!({ "range": { (fields::OBSERVED_ON_DEVICE_AT): { "gte": seconds } } }))
}

fn datetime_before(args: &[String]) -> Result<Value> {
    let seconds = millis_to_seconds(methods::DATETIME_BEFORE, args)?;
    Ok(json!({ "range": { (fields::OBSERVED_ON_DEVICE_AT): { "lte": seconds } } }))
}

fn observer_id_contains(args: &[String]) -> Result<Value> {
    Ok(any_of(args.iter().map(|value| wildcard(fields::OBSERVER_UUID, value))))
}

fn observation_id_contains(args: &[String]) -> Result<Value> {
    Ok(any_of(
        args.iter()
            .map(|value| wildcard(fields::OBSERVATION_UUID, value)),
    ))
}

fn page_name_contains(args: &[String]) -> Result<Value> {
    Ok(any_of(args.iter().map(|value| {
        json!({ "match_phrase": { (fields::PAGE_NAME): value } })
    })))
}

fn categories_contains(args: &[String]) -> Result<Value> {
    Ok(any_of(args.iter().map(|value| {
        json!({ "match_phrase": { (fields::CATEGORIES): value } })
    })))
}

fn anything_contains(args: &[String]) -> Result<Value> {
    Ok(any_of(args.iter().map(|text| {
        json!({
            "simple_query_string": {
                "query": quote_phrase(text),
                "fields": ["*"],
            }
        })
    })))
}

fn any_of(clauses: impl Iterator<Item = Value>) -> Value {
    json!({
        "bool": {
            "should": clauses.collect::<Vec<_>>(),
            "minimum_should_match": 1,
        }
    })
}

fn wildcard(field: &str, value: &str) -> Value {
    json!({ "wildcard": { (field): { "value": format!("*{}*", escape_wildcard(value)) } } })
}

fn escape_wildcard(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '*' | '?' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn quote_phrase(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        if matches!(ch, '"' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

/// Millisecond epoch string to whole seconds by dropping the last three
/// characters.
fn millis_to_seconds(method: &str, args: &[String]) -> Result<i64> {
    let raw = args
        .first()
        .ok_or_else(|| QueryError::invalid_argument(method, "missing timestamp argument"))?
        .trim();
    let invalid = || {
        QueryError::invalid_argument(
            method,
            format!("expected a millisecond timestamp, got {raw:?}"),
        )
    };
    if raw.len() <= 3 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    raw[..raw.len() - 3].parse::<i64>().map_err(|_| invalid())
}
