//! Category-to-candidate-path index and its cached materialization.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

mod cache;

pub use cache::CandidateIndexCache;

/// Discovery category to candidate paths, each list ordered by ascending
/// embedded timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateIndex {
    categories: BTreeMap<String, Vec<String>>,
}

impl CandidateIndex {
    #[must_use]
    pub fn new(categories: BTreeMap<String, Vec<String>>) -> Self {
        Self { categories }
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    #[must_use]
    pub fn paths(&self, category: &str) -> &[String] {
        self.categories.get(category).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn total_paths(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_paths() == 0
    }

    /// Distinct paths across `categories`, in first-seen order. Unknown
    /// categories contribute nothing.
    #[must_use]
    pub fn union<'a, S: AsRef<str>>(&'a self, categories: &[S]) -> Vec<&'a str> {
        let mut seen = HashSet::new();
        categories
            .iter()
            .flat_map(|category| self.paths(category.as_ref()))
            .map(String::as_str)
            .filter(|path| seen.insert(*path))
            .collect()
    }

    /// Per-category path counts.
    #[must_use]
    pub fn summary(&self) -> BTreeMap<String, usize> {
        self.categories
            .iter()
            .map(|(category, paths)| (category.clone(), paths.len()))
            .collect()
    }
}
