use std::time::Instant;

use chrono::Duration;
use tracing::info;

use crate::error::Result;
use crate::index::CandidateIndex;
use crate::query::{QueryNode, prepare};

use super::AdQuery;

impl AdQuery {
    /// Returns the candidate index and whether this call rebuilt it.
    pub fn index(&self) -> Result<(CandidateIndex, bool)> {
        self.index.get_or_rebuild(self.config.index.max_age)
    }

    pub fn index_with_max_age(&self, max_age: Duration) -> Result<(CandidateIndex, bool)> {
        self.index.get_or_rebuild(max_age)
    }

    pub fn rebuild_index(&self) -> Result<CandidateIndex> {
        self.index.rebuild()
    }

    /// Interprets `node` against every candidate of the accepted categories.
    ///
    /// The query is bound before the index is touched, so an unknown method
    /// or a bad argument fails without a rebuild. Results are newest first,
    /// ties ordered by path.
    pub fn query_offline(&self, node: &QueryNode) -> Result<Vec<String>> {
        let started = Instant::now();
        let prepared = prepare(&self.predicates, node)?;
        let (index, rebuilt) = self.index()?;
        let candidates = index.union(&self.config.index.accepted_categories);

        let mut selected = prepared.select(candidates.iter().copied());
        selected.sort_by(|a, b| {
            b.timestamp()
                .cmp(&a.timestamp())
                .then_with(|| b.as_str().cmp(a.as_str()))
        });

        info!(
            method = node.method(),
            candidates = candidates.len(),
            matched = selected.len(),
            index_rebuilt = rebuilt,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "offline query evaluated"
        );
        Ok(selected
            .into_iter()
            .map(|candidate| candidate.as_str().to_string())
            .collect())
    }
}
