use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, QueryError>;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("malformed query: {0}")]
    MalformedQuery(String),

    #[error("method {method} expects {expected} arguments, got {got}")]
    ArgumentCount {
        method: String,
        expected: usize,
        got: usize,
    },

    #[error("unknown query method: {0}")]
    UnknownMethod(String),

    #[error("invalid argument for {method}: {message}")]
    InvalidArgument { method: String, message: String },

    #[error("invalid continuation key: {0}")]
    InvalidContinuation(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("search backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub success: bool,
    pub code: String,
    pub comment: String,
    pub operation: String,
    pub trace_id: String,
}

impl QueryError {
    pub(crate) fn invalid_argument(method: &str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            method: method.to_string(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedQuery(_) => "MALFORMED_QUERY",
            Self::ArgumentCount { .. } => "ARGUMENT_COUNT",
            Self::UnknownMethod(_) => "UNKNOWN_METHOD",
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::InvalidContinuation(_) => "INVALID_CONTINUATION_KEY",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Backend(_) => "SEARCH_BACKEND_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Client errors are the caller's to fix (400-equivalent); everything else
    /// is a collaborator or server fault (500-equivalent).
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedQuery(_)
                | Self::ArgumentCount { .. }
                | Self::UnknownMethod(_)
                | Self::InvalidArgument { .. }
                | Self::InvalidContinuation(_)
        )
    }

    #[must_use]
    pub const fn status_code(&self) -> u16 {
        if self.is_client_error() { 400 } else { 500 }
    }

    pub fn to_payload(&self, operation: impl Into<String>) -> ErrorPayload {
        ErrorPayload {
            success: false,
            code: self.code().to_string(),
            comment: self.to_string(),
            operation: operation.into(),
            trace_id: Uuid::new_v4().to_string(),
        }
    }
}
