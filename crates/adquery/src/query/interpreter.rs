use std::fmt;

use tracing::debug;

use crate::candidate::CandidatePath;
use crate::error::{QueryError, Result};

use super::registry::{Matcher, PredicateRegistry};
use super::{CombinatorOp, QueryNode};

/// A query whose methods are resolved and whose arguments are bound.
pub struct PreparedQuery {
    root: PreparedNode,
}

enum PreparedNode {
    Leaf(Matcher),
    And(Box<PreparedNode>, Box<PreparedNode>),
    Or(Box<PreparedNode>, Box<PreparedNode>),
    Not(Box<PreparedNode>),
}

impl fmt::Debug for PreparedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedQuery").finish_non_exhaustive()
    }
}

/// Validates `node` against `registry` and binds every leaf.
///
/// `AND` and `OR` take exactly two sub-queries and `NOT` exactly one; wider
/// conjunctions must be nested. Unknown methods fail here, before any
/// candidate is examined.
pub fn prepare(registry: &PredicateRegistry, node: &QueryNode) -> Result<PreparedQuery> {
    let root = prepare_node(registry, node)?;
    Ok(PreparedQuery { root })
}

fn prepare_node(registry: &PredicateRegistry, node: &QueryNode) -> Result<PreparedNode> {
    match node {
        QueryNode::Leaf { method, args } => registry.bind(method, args).map(PreparedNode::Leaf),
        QueryNode::Combinator { op, children } => {
            let expected = match op {
                CombinatorOp::And | CombinatorOp::Or => 2,
                CombinatorOp::Not => 1,
            };
            if children.len() != expected {
                return Err(QueryError::ArgumentCount {
                    method: op.as_str().to_string(),
                    expected,
                    got: children.len(),
                });
            }
            let mut prepared = children
                .iter()
                .map(|child| prepare_node(registry, child).map(Box::new))
                .collect::<Result<Vec<_>>>()?;
            let node = match (op, prepared.pop(), prepared.pop()) {
                (CombinatorOp::And, Some(right), Some(left)) => PreparedNode::And(left, right),
                (CombinatorOp::Or, Some(right), Some(left)) => PreparedNode::Or(left, right),
                (CombinatorOp::Not, Some(inner), None) => PreparedNode::Not(inner),
                _ => {
                    return Err(QueryError::Internal(format!(
                        "{op} prepared with unexpected operand count"
                    )));
                }
            };
            Ok(node)
        }
    }
}

impl PreparedNode {
    fn test(&self, candidate: &CandidatePath) -> bool {
        match self {
            Self::Leaf(matcher) => matcher(candidate),
            Self::And(left, right) => left.test(candidate) && right.test(candidate),
            Self::Or(left, right) => left.test(candidate) || right.test(candidate),
            Self::Not(inner) => !inner.test(candidate),
        }
    }
}

impl PreparedQuery {
    #[must_use]
    pub fn test(&self, candidate: &CandidatePath) -> bool {
        self.root.test(candidate)
    }

    /// Tests a raw path. Unparseable paths yield `None`.
    #[must_use]
    pub fn test_path(&self, raw: &str) -> Option<bool> {
        CandidatePath::parse(raw).map(|candidate| self.test(&candidate))
    }

    /// Keeps the accepted candidates, in input order. Unparseable paths are
    /// dropped.
    pub fn select<'a, I>(&self, paths: I) -> Vec<CandidatePath>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut skipped = 0_usize;
        let selected = paths
            .into_iter()
            .filter_map(|raw| {
                let parsed = CandidatePath::parse(raw);
                if parsed.is_none() {
                    skipped += 1;
                }
                parsed
            })
            .filter(|candidate| self.test(candidate))
            .collect::<Vec<_>>();
        if skipped > 0 {
            debug!(skipped, "skipped unparseable candidate paths");
        }
        selected
    }
}
