use globset::GlobBuilder;
use serde_json::{Map, Value};

use crate::error::{QueryError, Result};

/// Evaluates one boolean-query clause against a document.
pub(super) fn matches(clause: &Value, doc: &Value) -> Result<bool> {
    let object = clause
        .as_object()
        .filter(|object| object.len() == 1)
        .ok_or_else(|| unsupported(clause))?;
    let Some((kind, body)) = object.iter().next() else {
        return Err(unsupported(clause));
    };

    match kind.as_str() {
        "match_all" => Ok(true),
        "match_none" => Ok(false),
        "bool" => bool_matches(body, doc),
        "range" => range_matches(body, doc),
        "wildcard" => wildcard_matches(body, doc),
        "match_phrase" => match_phrase_matches(body, doc),
        "simple_query_string" => simple_query_string_matches(body, doc),
        _ => Err(unsupported(clause)),
    }
}

fn unsupported(clause: &Value) -> QueryError {
    QueryError::Backend(format!("unsupported query clause: {clause}"))
}

fn bool_matches(body: &Value, doc: &Value) -> Result<bool> {
    let body = body
        .as_object()
        .ok_or_else(|| QueryError::Backend("bool clause must be an object".to_string()))?;
    let must = clause_list(body, "must")?;
    let filter = clause_list(body, "filter")?;
    let should = clause_list(body, "should")?;
    let must_not = clause_list(body, "must_not")?;

    for clause in must.iter().chain(filter.iter()) {
        if !matches(clause, doc)? {
            return Ok(false);
        }
    }
    for clause in must_not {
        if matches(clause, doc)? {
            return Ok(false);
        }
    }

    let minimum = match body.get("minimum_should_match") {
        Some(value) => value.as_u64().ok_or_else(|| {
            QueryError::Backend(format!("unsupported minimum_should_match: {value}"))
        })?,
        None if !should.is_empty() && must.is_empty() && filter.is_empty() => 1,
        None => 0,
    };
    let mut matched = 0_u64;
    for clause in should {
        if matched >= minimum {
            break;
        }
        if matches(clause, doc)? {
            matched += 1;
        }
    }
    Ok(matched >= minimum)
}

/// `key` may hold a single clause or an array of clauses.
fn clause_list<'a>(body: &'a Map<String, Value>, key: &str) -> Result<Vec<&'a Value>> {
    match body.get(key) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.iter().collect()),
        Some(object @ Value::Object(_)) => Ok(vec![object]),
        Some(other) => Err(QueryError::Backend(format!(
            "bool.{key} must be a clause or an array, got {other}"
        ))),
    }
}

/// The single `{ field: params }` pair of a leaf clause.
fn field_params<'a>(kind: &str, body: &'a Value) -> Result<(&'a str, &'a Value)> {
    body.as_object()
        .filter(|object| object.len() == 1)
        .and_then(|object| object.iter().next())
        .map(|(field, params)| (field.as_str(), params))
        .ok_or_else(|| QueryError::Backend(format!("{kind} clause must name exactly one field")))
}

fn range_matches(body: &Value, doc: &Value) -> Result<bool> {
    let (field, params) = field_params("range", body)?;
    let params = params
        .as_object()
        .ok_or_else(|| QueryError::Backend(format!("range on {field} needs bounds")))?;
    let bound = |name: &str| -> Result<Option<f64>> {
        params
            .get(name)
            .map(|value| {
                value.as_f64().ok_or_else(|| {
                    QueryError::Backend(format!("range bound {name} on {field} is not numeric"))
                })
            })
            .transpose()
    };
    let (gte, gt, lte, lt) = (bound("gte")?, bound("gt")?, bound("lte")?, bound("lt")?);

    Ok(field_values(doc, field)
        .into_iter()
        .filter_map(Value::as_f64)
        .any(|value| {
            gte.is_none_or(|b| value >= b)
                && gt.is_none_or(|b| value > b)
                && lte.is_none_or(|b| value <= b)
                && lt.is_none_or(|b| value < b)
        }))
}

fn wildcard_matches(body: &Value, doc: &Value) -> Result<bool> {
    let (field, params) = field_params("wildcard", body)?;
    let pattern = params
        .as_str()
        .or_else(|| params.get("value").and_then(Value::as_str))
        .ok_or_else(|| QueryError::Backend(format!("wildcard on {field} needs a value")))?;
    let matcher = GlobBuilder::new(&wildcard_to_glob(pattern))
        .literal_separator(false)
        .backslash_escape(true)
        .build()
        .map_err(|err| QueryError::Backend(format!("invalid wildcard pattern {pattern:?}: {err}")))?
        .compile_matcher();

    Ok(field_values(doc, field)
        .into_iter()
        .filter_map(Value::as_str)
        .any(|value| matcher.is_match(value)))
}

/// Cluster wildcard syntax only knows `*`, `?` and `\`; everything else that
/// is special to glob syntax is escaped.
fn wildcard_to_glob(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                out.push('\\');
                out.push(chars.next().unwrap_or('\\'));
            }
            '*' | '?' => out.push(ch),
            '[' | ']' | '{' | '}' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out
}

fn match_phrase_matches(body: &Value, doc: &Value) -> Result<bool> {
    let (field, params) = field_params("match_phrase", body)?;
    let phrase = params
        .as_str()
        .or_else(|| params.get("query").and_then(Value::as_str))
        .ok_or_else(|| QueryError::Backend(format!("match_phrase on {field} needs a query")))?;
    let wanted = tokenize(phrase);
    Ok(field_values(doc, field)
        .into_iter()
        .filter_map(Value::as_str)
        .any(|value| contains_phrase(&tokenize(value), &wanted)))
}

fn simple_query_string_matches(body: &Value, doc: &Value) -> Result<bool> {
    let query = body
        .get("query")
        .and_then(Value::as_str)
        .ok_or_else(|| QueryError::Backend("simple_query_string needs a query".to_string()))?;
    let wanted = tokenize(&unquote(query));

    let fields = body
        .get("fields")
        .and_then(Value::as_array)
        .map(|fields| fields.iter().filter_map(Value::as_str).collect::<Vec<_>>())
        .unwrap_or_default();
    let mut values = Vec::new();
    if fields.is_empty() || fields.contains(&"*") {
        string_leaves(doc, &mut values);
    } else {
        for field in fields {
            values.extend(field_values(doc, field).into_iter().filter_map(Value::as_str));
        }
    }
    Ok(values
        .into_iter()
        .any(|value| contains_phrase(&tokenize(value), &wanted)))
}

/// Strips one pair of surrounding double quotes and backslash escapes.
fn unquote(query: &str) -> String {
    let trimmed = query.trim();
    let inner = trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(trimmed);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Lowercased alphanumeric runs, the same split a standard analyzer makes.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn contains_phrase(tokens: &[String], phrase: &[String]) -> bool {
    !phrase.is_empty()
        && tokens
            .windows(phrase.len())
            .any(|window| window == phrase)
}

/// Values at a dotted path. Arrays are traversed at every level, and arrays
/// at the end of the path are flattened.
pub(super) fn field_values<'a>(doc: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut current = vec![doc];
    for segment in path.split('.') {
        let mut next = Vec::new();
        for value in current {
            collect_child(value, segment, &mut next);
        }
        current = next;
    }
    let mut out = Vec::new();
    for value in current {
        flatten_into(value, &mut out);
    }
    out
}

fn collect_child<'a>(value: &'a Value, segment: &str, out: &mut Vec<&'a Value>) {
    match value {
        Value::Object(object) => {
            if let Some(child) = object.get(segment) {
                out.push(child);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_child(item, segment, out);
            }
        }
        _ => {}
    }
}

fn flatten_into<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten_into(item, out);
            }
        }
        Value::Null => {}
        other => out.push(other),
    }
}

fn string_leaves<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::String(text) => out.push(text),
        Value::Array(items) => {
            for item in items {
                string_leaves(item, out);
            }
        }
        Value::Object(object) => {
            for child in object.values() {
                string_leaves(child, out);
            }
        }
        _ => {}
    }
}
