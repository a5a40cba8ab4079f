use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{SearchConfig, SessionConfig};
use crate::dsl::{fields, hit_to_result, search_body};
use crate::error::{QueryError, Result};
use crate::search::{SearchBackend, SearchHit};
use crate::store::ObjectStore;

use super::{
    ContinuationKey, PageOptions, QueryPage, QuerySession, query_fingerprint, validate_session_id,
};

/// Runs compiled queries against the backend, one page per call.
#[derive(Clone)]
pub struct QuerySessionService {
    store: Arc<dyn ObjectStore>,
    backend: Arc<dyn SearchBackend>,
    search: SearchConfig,
    session: SessionConfig,
}

impl fmt::Debug for QuerySessionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySessionService")
            .field("search", &self.search)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// Hits gathered for one page and whether the backend may hold more.
struct Collected {
    hits: Vec<SearchHit>,
    exhausted: bool,
}

impl QuerySessionService {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        backend: Arc<dyn SearchBackend>,
        search: SearchConfig,
        session: SessionConfig,
    ) -> Self {
        Self {
            store,
            backend,
            search,
            session,
        }
    }

    fn record_key(&self, session_id: &str) -> String {
        format!("{}{session_id}.json", self.session.key_prefix)
    }

    /// Creates and persists an empty session.
    pub fn new_session(&self) -> Result<QuerySession> {
        let now = Utc::now();
        let session = QuerySession {
            session_id: Uuid::new_v4().to_string(),
            ordering: vec![
                format!("{}:desc", fields::OBSERVED_ON_DEVICE_AT),
                format!("{}:desc", fields::OBSERVATION_UUID),
            ],
            position_cursor: None,
            page_size: None,
            full_query: false,
            pages_served: 0,
            created_at: now,
            updated_at: now,
        };
        self.save(&session)?;
        info!(session_id = %session.session_id, "query session created");
        Ok(session)
    }

    pub fn load(&self, session_id: &str) -> Result<Option<QuerySession>> {
        validate_session_id(session_id)?;
        let Some(object) = self.store.get(&self.record_key(session_id))? else {
            return Ok(None);
        };
        let session = serde_json::from_slice::<QuerySession>(&object.body).map_err(|err| {
            QueryError::Storage(format!("session record {session_id} is unreadable: {err}"))
        })?;
        Ok(Some(session))
    }

    fn save(&self, session: &QuerySession) -> Result<()> {
        self.store.put(
            &self.record_key(&session.session_id),
            &serde_json::to_vec(session)?,
        )
    }

    /// Serves one page of `query`, a compiled boolean clause.
    pub fn execute(&self, query: &Value, options: &PageOptions) -> Result<QueryPage> {
        let Some(session_id) = options.session_id.as_deref() else {
            if options.continuation_key.is_some() {
                return Err(QueryError::InvalidContinuation(
                    "a continuation key requires a session_id".to_string(),
                ));
            }
            return self.one_shot(query);
        };

        let Some(mut session) = self.load(session_id)? else {
            warn!(session_id, "query session not found; serving a one-shot query");
            return self.one_shot(query);
        };

        let page_size = match options.page_size {
            Some(0) => {
                return Err(QueryError::MalformedQuery(
                    "context.page_size must be positive".to_string(),
                ));
            }
            Some(size) => size,
            None => self.search.default_page_size,
        };
        let fingerprint = query_fingerprint(query)?;
        let cursor = options
            .continuation_key
            .as_deref()
            .map(|raw| ContinuationKey::decode_for(raw, session_id, &fingerprint))
            .transpose()?
            .map(|key| key.search_after);

        let collected = if options.full_query {
            self.collect_full(query, page_size, cursor)?
        } else {
            self.collect_single(query, page_size.min(self.search.max_page_size), cursor)?
        };

        let last_sort = collected.hits.last().map(|hit| hit.sort.clone());
        let continuation_key = match (&last_sort, collected.exhausted) {
            (Some(sort), false) if !sort.is_empty() => Some(
                ContinuationKey::new(session_id, &fingerprint, sort.clone()).encode()?,
            ),
            (Some(_), false) => {
                return Err(QueryError::Backend(
                    "hits carry no sort values; cannot continue".to_string(),
                ));
            }
            _ => None,
        };

        let results = map_hits(&collected.hits);
        session.position_cursor = last_sort.or(session.position_cursor);
        session.page_size = Some(page_size);
        session.full_query = options.full_query;
        session.pages_served += 1;
        session.updated_at = Utc::now();
        self.save(&session)?;

        info!(
            session_id,
            page = session.pages_served,
            results = results.len(),
            has_more = continuation_key.is_some(),
            "query page served"
        );
        Ok(QueryPage {
            results,
            continuation_key,
        })
    }

    fn one_shot(&self, query: &Value) -> Result<QueryPage> {
        let body = search_body(query, self.search.default_page_size, None);
        let response = self.backend.search(&body, self.search.timeout)?;
        debug!(hits = response.hits.len(), took_ms = response.took, "one-shot query served");
        Ok(QueryPage {
            results: map_hits(&response.hits),
            continuation_key: None,
        })
    }

    fn collect_single(
        &self,
        query: &Value,
        size: usize,
        cursor: Option<Vec<Value>>,
    ) -> Result<Collected> {
        let body = search_body(query, size, cursor.as_deref());
        let response = self.backend.search(&body, self.search.timeout)?;
        let exhausted = response.hits.len() < size;
        Ok(Collected {
            hits: response.hits,
            exhausted,
        })
    }

    /// Issues backend batches until `page_size` hits are gathered or the
    /// backend runs dry.
    fn collect_full(
        &self,
        query: &Value,
        page_size: usize,
        mut cursor: Option<Vec<Value>>,
    ) -> Result<Collected> {
        let batch_size = self.search.full_query_batch_size.max(1);
        let mut hits = Vec::with_capacity(page_size.min(self.search.max_page_size));
        let mut batches = 0_usize;
        loop {
            let remaining = page_size - hits.len();
            let batch = remaining.min(batch_size);
            let body = search_body(query, batch, cursor.as_deref());
            let response = self.backend.search(&body, self.search.timeout)?;
            batches += 1;

            let received = response.hits.len();
            if let Some(last) = response.hits.last() {
                if last.sort.is_empty() && received == batch {
                    return Err(QueryError::Backend(
                        "hits carry no sort values; cannot continue".to_string(),
                    ));
                }
                cursor = Some(last.sort.clone());
            }
            hits.extend(response.hits);

            if received < batch {
                debug!(batches, collected = hits.len(), "full query exhausted backend");
                return Ok(Collected {
                    hits,
                    exhausted: true,
                });
            }
            if hits.len() >= page_size {
                debug!(batches, collected = hits.len(), "full query page filled");
                return Ok(Collected {
                    hits,
                    exhausted: false,
                });
            }
        }
    }
}

fn map_hits(hits: &[SearchHit]) -> Vec<String> {
    let mut skipped = 0_usize;
    let results = hits
        .iter()
        .filter_map(|hit| {
            let mapped = hit_to_result(&hit.source);
            if mapped.is_none() {
                skipped += 1;
            }
            mapped
        })
        .collect();
    if skipped > 0 {
        warn!(skipped, "hits without observer or observation uuid were dropped");
    }
    results
}
