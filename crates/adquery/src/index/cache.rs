use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::candidate::timestamp_sort_key;
use crate::config::IndexConfig;
use crate::error::Result;
use crate::store::ObjectStore;

use super::CandidateIndex;

/// Serves the merged candidate index, rebuilding it from per-observer
/// partial indexes whenever the stored artifact is missing, stale or
/// unreadable.
///
/// Rebuilds write the artifact back. Two concurrent rebuilds produce the same
/// bytes, so whichever write lands last is correct.
#[derive(Clone)]
pub struct CandidateIndexCache {
    store: Arc<dyn ObjectStore>,
    config: IndexConfig,
}

impl fmt::Debug for CandidateIndexCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CandidateIndexCache")
            .field("artifact_key", &self.config.artifact_key)
            .finish_non_exhaustive()
    }
}

impl CandidateIndexCache {
    pub fn new(store: Arc<dyn ObjectStore>, config: IndexConfig) -> Self {
        Self { store, config }
    }

    #[must_use]
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Returns the index and whether it was rebuilt by this call.
    pub fn get_or_rebuild(&self, max_age: Duration) -> Result<(CandidateIndex, bool)> {
        self.get_or_rebuild_at(max_age, Utc::now())
    }

    pub(crate) fn get_or_rebuild_at(
        &self,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Result<(CandidateIndex, bool)> {
        if let Some(index) = self.load_fresh(max_age, now)? {
            return Ok((index, false));
        }
        Ok((self.rebuild()?, true))
    }

    fn load_fresh(&self, max_age: Duration, now: DateTime<Utc>) -> Result<Option<CandidateIndex>> {
        let key = self.config.artifact_key.as_str();
        let Some(object) = self.store.get(key)? else {
            debug!(key, "candidate index artifact missing");
            return Ok(None);
        };
        let age = now.signed_duration_since(object.last_modified);
        if age >= max_age {
            debug!(key, age_secs = age.num_seconds(), "candidate index artifact stale");
            return Ok(None);
        }
        match serde_json::from_slice::<CandidateIndex>(&object.body) {
            Ok(index) => Ok(Some(index)),
            Err(err) => {
                warn!(key, error = %err, "candidate index artifact unreadable; rebuilding");
                Ok(None)
            }
        }
    }

    /// Merges every observer's partial index and persists the result.
    pub fn rebuild(&self) -> Result<CandidateIndex> {
        let mut merged = BTreeMap::<String, Vec<String>>::new();
        let mut observers = 0_usize;
        let mut skipped = 0_usize;

        for entry in self.store.list("")? {
            let Some(observer) = entry.strip_suffix('/') else {
                continue;
            };
            let key = format!("{observer}/{}", self.config.partial_index_name);
            match self.read_partial(&key) {
                Some(partial) => {
                    observers += 1;
                    self.merge_partial(&key, partial, &mut merged);
                }
                None => skipped += 1,
            }
        }

        for paths in merged.values_mut() {
            paths.sort_by_cached_key(|path| timestamp_sort_key(path));
            let mut seen = HashSet::with_capacity(paths.len());
            paths.retain(|path| seen.insert(path.clone()));
        }

        let index = CandidateIndex::new(merged);
        self.store
            .put(&self.config.artifact_key, &serde_json::to_vec(&index)?)?;
        info!(
            observers,
            skipped,
            categories = index.categories.len(),
            paths = index.total_paths(),
            "candidate index rebuilt"
        );
        Ok(index)
    }

    /// A missing, unreadable or non-object partial yields `None`.
    fn read_partial(&self, key: &str) -> Option<serde_json::Map<String, Value>> {
        let object = match self.store.get(key) {
            Ok(Some(object)) => object,
            Ok(None) => return None,
            Err(err) => {
                warn!(key, error = %err, "skipping unreadable partial index");
                return None;
            }
        };
        match serde_json::from_slice::<Value>(&object.body) {
            Ok(Value::Object(map)) => Some(map),
            Ok(_) => {
                warn!(key, "skipping partial index that is not a JSON object");
                None
            }
            Err(err) => {
                warn!(key, error = %err, "skipping malformed partial index");
                None
            }
        }
    }

    fn merge_partial(
        &self,
        key: &str,
        partial: serde_json::Map<String, Value>,
        merged: &mut BTreeMap<String, Vec<String>>,
    ) {
        for (category, paths) in partial {
            if category == self.config.excluded_category {
                continue;
            }
            let Value::Array(paths) = paths else {
                warn!(key, category = %category, "skipping category that is not a list");
                continue;
            };
            merged.entry(category).or_default().extend(
                paths
                    .into_iter()
                    .filter_map(|path| path.as_str().map(ToString::to_string)),
            );
        }
    }
}
