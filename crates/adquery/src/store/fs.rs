use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{QueryError, Result};

use super::{ObjectStore, StoredObject, validate_key, validate_prefix};

/// Directory-backed store: key segments map to path components under `root`.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Opens `root`, creating it when missing.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::new(root);
        fs::create_dir_all(&store.root)?;
        Ok(store)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> PathBuf {
        let mut out = self.root.clone();
        for segment in key.split('/').filter(|segment| !segment.is_empty()) {
            out.push(segment);
        }
        out
    }
}

impl ObjectStore for FsObjectStore {
    fn get(&self, key: &str) -> Result<Option<StoredObject>> {
        validate_key(key)?;
        let path = self.resolve(key);
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        if metadata.is_dir() {
            return Ok(None);
        }
        let body = fs::read(&path)?;
        let last_modified = DateTime::<Utc>::from(metadata.modified()?);
        Ok(Some(StoredObject {
            body,
            last_modified,
        }))
    }

    fn put(&self, key: &str, body: &[u8]) -> Result<()> {
        validate_key(key)?;
        let path = self.resolve(key);
        let parent = path
            .parent()
            .ok_or_else(|| QueryError::Storage(format!("key has no parent: {key}")))?;
        fs::create_dir_all(parent)?;

        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| QueryError::Storage(format!("invalid key file name: {key}")))?;
        let tmp_path = parent.join(format!(
            ".{file_name}.adquery.tmp.{}",
            uuid::Uuid::new_v4().simple()
        ));

        {
            let mut tmp = fs::OpenOptions::new()
                .create_new(true)
                .write(true)
                .open(&tmp_path)?;
            tmp.write_all(body)?;
            tmp.sync_all()?;
        }

        if let Err(err) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(QueryError::from(err));
        }
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        validate_prefix(prefix)?;
        let base = self.resolve(prefix);
        let entries = match fs::read_dir(&base) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut out = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            if entry.file_type()?.is_dir() {
                out.push(format!("{prefix}{name}/"));
            } else {
                out.push(format!("{prefix}{name}"));
            }
        }
        out.sort();
        Ok(out)
    }
}
