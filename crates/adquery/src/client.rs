use std::sync::Arc;

use crate::config::AppConfig;
use crate::consistency::{RegistryReport, check_registries};
use crate::dsl::FormatterRegistry;
use crate::index::CandidateIndexCache;
use crate::query::PredicateRegistry;
use crate::search::SearchBackend;
use crate::session::QuerySessionService;
use crate::store::ObjectStore;

mod offline_service;
mod online_service;
mod request_service;

/// Query engine wired to an object store and a search backend.
///
/// Offline queries interpret the AST against the cached candidate index.
/// Online queries compile it to the search DSL and page through the backend.
#[derive(Clone)]
pub struct AdQuery {
    config: AppConfig,
    predicates: PredicateRegistry,
    formatters: FormatterRegistry,
    registry_report: RegistryReport,
    index: CandidateIndexCache,
    sessions: QuerySessionService,
}

impl std::fmt::Debug for AdQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdQuery")
            .field("registry_report", &self.registry_report)
            .finish_non_exhaustive()
    }
}

impl AdQuery {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn ObjectStore>,
        backend: Arc<dyn SearchBackend>,
    ) -> Self {
        Self::with_registries(
            config,
            store,
            backend,
            PredicateRegistry::with_builtins(),
            FormatterRegistry::with_builtins(),
        )
    }

    /// Uses caller-supplied registries. Their consistency is checked once
    /// here.
    pub fn with_registries(
        config: AppConfig,
        store: Arc<dyn ObjectStore>,
        backend: Arc<dyn SearchBackend>,
        predicates: PredicateRegistry,
        formatters: FormatterRegistry,
    ) -> Self {
        let registry_report = check_registries(&predicates, &formatters);
        let index = CandidateIndexCache::new(store.clone(), config.index.clone());
        let sessions = QuerySessionService::new(
            store,
            backend,
            config.search.clone(),
            config.session.clone(),
        );
        Self {
            config,
            predicates,
            formatters,
            registry_report,
            index,
            sessions,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn predicates(&self) -> &PredicateRegistry {
        &self.predicates
    }

    #[must_use]
    pub fn formatters(&self) -> &FormatterRegistry {
        &self.formatters
    }

    #[must_use]
    pub fn registry_report(&self) -> &RegistryReport {
        &self.registry_report
    }

    #[must_use]
    pub fn sessions(&self) -> &QuerySessionService {
        &self.sessions
    }
}
