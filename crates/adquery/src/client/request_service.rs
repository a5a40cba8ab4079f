use serde_json::Value;
use tracing::warn;

use crate::api::{QueryRequest, QueryResponse, error_response};
use crate::error::{QueryError, Result};

use super::AdQuery;

const QUERY_OPERATION: &str = "query";

impl AdQuery {
    /// Runs a parsed request through the compiled back end.
    pub fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let page = self.execute(&request.query, &request.page_options())?;
        Ok(QueryResponse::from(page))
    }

    /// Handles a raw request body and returns a status code with the
    /// response body. Failures become an error payload carrying a reason
    /// code.
    pub fn handle(&self, body: &Value) -> (u16, Value) {
        let outcome = QueryRequest::from_json(body)
            .and_then(|request| self.query(&request))
            .and_then(|response| serde_json::to_value(response).map_err(QueryError::from));
        match outcome {
            Ok(value) => (200, value),
            Err(err) => {
                warn!(code = err.code(), error = %err, "query request failed");
                error_response(&err, QUERY_OPERATION)
            }
        }
    }
}
