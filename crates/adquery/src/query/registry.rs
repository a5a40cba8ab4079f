use std::collections::BTreeMap;
use std::fmt;

use crate::candidate::CandidatePath;
use crate::error::{QueryError, Result};

use super::predicates;

/// A bound predicate, ready to test candidates.
pub type Matcher = Box<dyn Fn(&CandidatePath) -> bool + Send + Sync>;

/// Binds a leaf's literal arguments into a [`Matcher`]. Argument parsing
/// happens here, once per query, not once per candidate.
pub type PredicateFactory = fn(&[String]) -> Result<Matcher>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Variadic,
    Exact(usize),
}

impl Arity {
    pub fn check(self, method: &str, got: usize) -> Result<()> {
        match self {
            Self::Exact(expected) if expected != got => Err(QueryError::ArgumentCount {
                method: method.to_string(),
                expected,
                got,
            }),
            _ => Ok(()),
        }
    }
}

#[derive(Clone, Copy)]
struct PredicateEntry {
    arity: Arity,
    factory: PredicateFactory,
}

/// Leaf predicates available to the direct interpreter.
///
/// Combinators are not registered here; their arity is fixed by the
/// interpreter.
#[derive(Clone, Default)]
pub struct PredicateRegistry {
    entries: BTreeMap<String, PredicateEntry>,
}

impl fmt::Debug for PredicateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateRegistry")
            .field("methods", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PredicateRegistry {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with `DATETIME_*` and the id substring predicates.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        predicates::register_builtins(&mut registry);
        registry
    }

    /// Registers or replaces `method`.
    pub fn register(&mut self, method: impl Into<String>, arity: Arity, factory: PredicateFactory) {
        self.entries
            .insert(method.into(), PredicateEntry { arity, factory });
    }

    #[must_use]
    pub fn contains(&self, method: &str) -> bool {
        self.entries.contains_key(method)
    }

    #[must_use]
    pub fn arity(&self, method: &str) -> Option<Arity> {
        self.entries.get(method).map(|entry| entry.arity)
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Resolves `method`, checks the argument count and binds the arguments.
    pub fn bind(&self, method: &str, args: &[String]) -> Result<Matcher> {
        let entry = self
            .entries
            .get(method)
            .ok_or_else(|| QueryError::UnknownMethod(method.to_string()))?;
        entry.arity.check(method, args.len())?;
        (entry.factory)(args)
    }
}
