//! Query AST shared by the direct interpreter and the search-DSL compiler.
//!
//! A query arrives as nested `{ "method": ..., "args": [...] }` objects.
//! Combinators (`AND`, `OR`, `NOT`) take nested queries as arguments; every
//! other method is a leaf predicate taking string literals. The two shapes are
//! told apart once, at construction, so neither back end has to re-check
//! argument kinds while evaluating.

use std::fmt;

use serde_json::{Map, Value, json};

use crate::error::{QueryError, Result};

mod interpreter;
mod predicates;
mod registry;

pub use interpreter::{PreparedQuery, prepare};
pub use registry::{Arity, Matcher, PredicateFactory, PredicateRegistry};

/// Method names understood by the built-in registries.
pub mod methods {
    pub const AND: &str = "AND";
    pub const OR: &str = "OR";
    pub const NOT: &str = "NOT";
    pub const DATETIME_AFTER: &str = "DATETIME_AFTER";
    pub const DATETIME_BEFORE: &str = "DATETIME_BEFORE";
    pub const OBSERVER_ID_CONTAINS: &str = "OBSERVER_ID_CONTAINS";
    pub const OBSERVATION_ID_CONTAINS: &str = "OBSERVATION_ID_CONTAINS";
    pub const PAGE_NAME_CONTAINS: &str = "PAGE_NAME_CONTAINS";
    pub const CATEGORIES_CONTAINS: &str = "CATEGORIES_CONTAINS";
    pub const ANYTHING_CONTAINS: &str = "ANYTHING_CONTAINS";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombinatorOp {
    And,
    Or,
    Not,
}

impl CombinatorOp {
    #[must_use]
    pub fn parse(method: &str) -> Option<Self> {
        match method {
            methods::AND => Some(Self::And),
            methods::OR => Some(Self::Or),
            methods::NOT => Some(Self::Not),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => methods::AND,
            Self::Or => methods::OR,
            Self::Not => methods::NOT,
        }
    }
}

impl fmt::Display for CombinatorOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryNode {
    Leaf {
        method: String,
        args: Vec<String>,
    },
    Combinator {
        op: CombinatorOp,
        children: Vec<QueryNode>,
    },
}

impl QueryNode {
    pub fn leaf<I, S>(method: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Leaf {
            method: method.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn and(children: Vec<Self>) -> Self {
        Self::Combinator {
            op: CombinatorOp::And,
            children,
        }
    }

    #[must_use]
    pub fn or(children: Vec<Self>) -> Self {
        Self::Combinator {
            op: CombinatorOp::Or,
            children,
        }
    }

    #[must_use]
    pub fn not(child: Self) -> Self {
        Self::Combinator {
            op: CombinatorOp::Not,
            children: vec![child],
        }
    }

    #[must_use]
    pub fn method(&self) -> &str {
        match self {
            Self::Leaf { method, .. } => method,
            Self::Combinator { op, .. } => op.as_str(),
        }
    }

    /// Parses a query object. Keys other than `method` and `args` are
    /// ignored, so a whole request body can be passed in.
    pub fn from_json(value: &Value) -> Result<Self> {
        Self::from_json_at(value, "$")
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let value = serde_json::from_str::<Value>(raw)
            .map_err(|err| QueryError::MalformedQuery(format!("query is not valid JSON: {err}")))?;
        Self::from_json(&value)
    }

    fn from_json_at(value: &Value, location: &str) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            QueryError::MalformedQuery(format!("{location}: expected a query object"))
        })?;
        let method = object
            .get("method")
            .ok_or_else(|| QueryError::MalformedQuery(format!("{location}: missing `method`")))?
            .as_str()
            .ok_or_else(|| {
                QueryError::MalformedQuery(format!("{location}: `method` must be a string"))
            })?;
        let args = object
            .get("args")
            .ok_or_else(|| QueryError::MalformedQuery(format!("{location}: missing `args`")))?
            .as_array()
            .ok_or_else(|| {
                QueryError::MalformedQuery(format!("{location}: `args` must be an array"))
            })?;

        if let Some(op) = CombinatorOp::parse(method) {
            let children = args
                .iter()
                .enumerate()
                .map(|(idx, arg)| Self::from_json_at(arg, &format!("{location}.args[{idx}]")))
                .collect::<Result<Vec<_>>>()?;
            return Ok(Self::Combinator { op, children });
        }

        let args = args
            .iter()
            .enumerate()
            .map(|(idx, arg)| {
                arg.as_str().map(ToString::to_string).ok_or_else(|| {
                    QueryError::MalformedQuery(format!(
                        "{location}.args[{idx}]: {method} arguments must be strings"
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::Leaf {
            method: method.to_string(),
            args,
        })
    }

    /// Canonical JSON form. Object keys are sorted, so equal queries
    /// serialize identically.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Leaf { method, args } => json!({ "method": method, "args": args }),
            Self::Combinator { op, children } => {
                let mut out = Map::new();
                out.insert("method".to_string(), Value::from(op.as_str()));
                out.insert(
                    "args".to_string(),
                    Value::Array(children.iter().map(Self::to_json).collect()),
                );
                Value::Object(out)
            }
        }
    }
}

#[cfg(test)]
mod tests;
