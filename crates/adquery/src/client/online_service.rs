use serde_json::Value;
use tracing::debug;

use crate::dsl;
use crate::error::Result;
use crate::query::QueryNode;
use crate::session::{PageOptions, QueryPage, QuerySession};

use super::AdQuery;

impl AdQuery {
    /// Compiles `node` to a search-DSL clause. Methods without a formatter
    /// compile to a clause that matches nothing.
    pub fn compile(&self, node: &QueryNode) -> Result<Value> {
        let clause = dsl::compile(&self.formatters, node)?;
        debug!(method = node.method(), "query compiled");
        Ok(clause)
    }

    /// Compiles `node` and serves one page of it from the search backend.
    pub fn execute(&self, node: &QueryNode, options: &PageOptions) -> Result<QueryPage> {
        let clause = self.compile(node)?;
        self.sessions.execute(&clause, options)
    }

    pub fn new_session(&self) -> Result<QuerySession> {
        self.sessions.new_session()
    }
}
