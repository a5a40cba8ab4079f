use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::error::{QueryError, Result};

use super::{ObjectStore, StoredObject, validate_key, validate_prefix};

/// Process-local store. Used by tests and by callers that stage objects
/// before handing them to a real bucket.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl MemoryObjectStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `body` with an explicit modification time.
    pub fn put_at(&self, key: &str, body: &[u8], last_modified: DateTime<Utc>) -> Result<()> {
        validate_key(key)?;
        let mut objects = self
            .objects
            .write()
            .map_err(|_| QueryError::Internal("object store lock poisoned".to_string()))?;
        objects.insert(
            key.to_string(),
            StoredObject {
                body: body.to_vec(),
                last_modified,
            },
        );
        Ok(())
    }
}

impl ObjectStore for MemoryObjectStore {
    fn get(&self, key: &str) -> Result<Option<StoredObject>> {
        validate_key(key)?;
        let objects = self
            .objects
            .read()
            .map_err(|_| QueryError::Internal("object store lock poisoned".to_string()))?;
        Ok(objects.get(key).cloned())
    }

    fn put(&self, key: &str, body: &[u8]) -> Result<()> {
        self.put_at(key, body, Utc::now())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        validate_prefix(prefix)?;
        let objects = self
            .objects
            .read()
            .map_err(|_| QueryError::Internal("object store lock poisoned".to_string()))?;
        let mut out = Vec::<String>::new();
        for key in objects.keys() {
            let Some(rest) = key.strip_prefix(prefix) else {
                continue;
            };
            out.push(match rest.split_once('/') {
                Some((child, _)) => format!("{prefix}{child}/"),
                None => key.clone(),
            });
        }
        out.sort();
        out.dedup();
        Ok(out)
    }
}
