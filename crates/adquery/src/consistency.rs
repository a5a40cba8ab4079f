use serde::Serialize;
use tracing::warn;

use crate::dsl::FormatterRegistry;
use crate::query::PredicateRegistry;

/// Which leaf methods each back end understands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryReport {
    pub shared: Vec<String>,
    pub interpreter_only: Vec<String>,
    pub compiler_only: Vec<String>,
}

impl RegistryReport {
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.interpreter_only.is_empty() && self.compiler_only.is_empty()
    }
}

/// Compares the two registries and logs a warning per divergent method.
pub fn check_registries(
    predicates: &PredicateRegistry,
    formatters: &FormatterRegistry,
) -> RegistryReport {
    let mut report = RegistryReport::default();
    for method in predicates.methods() {
        if formatters.contains(method) {
            report.shared.push(method.to_string());
        } else {
            warn!(method, "method has a predicate but no search formatter");
            report.interpreter_only.push(method.to_string());
        }
    }
    for method in formatters.methods() {
        if !predicates.contains(method) {
            warn!(method, "method has a search formatter but no predicate");
            report.compiler_only.push(method.to_string());
        }
    }
    report
}
