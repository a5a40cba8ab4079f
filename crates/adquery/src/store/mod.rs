//! Object store seam.
//!
//! The production bucket client lives outside this crate. Anything exposing
//! keyed `get`/`put` plus a `/`-delimited `list` can back the candidate index
//! and the session records.

use chrono::{DateTime, Utc};

use crate::error::{QueryError, Result};

mod fs;
mod memory;

pub use fs::FsObjectStore;
pub use memory::MemoryObjectStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub last_modified: DateTime<Utc>,
}

pub trait ObjectStore: Send + Sync {
    /// `Ok(None)` when the key does not exist.
    fn get(&self, key: &str) -> Result<Option<StoredObject>>;

    fn put(&self, key: &str, body: &[u8]) -> Result<()>;

    /// Immediate children of `prefix`. Nested keys are folded into one
    /// `{prefix}{name}/` entry; leaf keys are returned in full. Sorted.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Rejects keys that could not round-trip through a bucket or a directory
/// tree: empty keys, empty segments and `.`/`..` segments.
pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(QueryError::Storage("object key is empty".to_string()));
    }
    if key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(QueryError::Storage(format!("invalid object key: {key}")));
    }
    Ok(())
}

pub(crate) fn validate_prefix(prefix: &str) -> Result<()> {
    match prefix.strip_suffix('/') {
        None if prefix.is_empty() => Ok(()),
        Some(inner) => validate_key(inner),
        None => Err(QueryError::Storage(format!(
            "list prefix must be empty or end with '/': {prefix}"
        ))),
    }
}
