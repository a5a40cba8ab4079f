use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{QueryError, Result};

const TOKEN_VERSION: u8 = 1;

/// Position of a session within one query's result order.
///
/// Encoded as hex over JSON so it survives any transport unchanged. The
/// token is bound to its session and to a fingerprint of the compiled query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuationKey {
    #[serde(rename = "v")]
    version: u8,
    #[serde(rename = "sid")]
    pub session_id: String,
    #[serde(rename = "fp")]
    pub fingerprint: String,
    #[serde(rename = "after")]
    pub search_after: Vec<Value>,
}

impl ContinuationKey {
    #[must_use]
    pub fn new(session_id: &str, fingerprint: &str, search_after: Vec<Value>) -> Self {
        Self {
            version: TOKEN_VERSION,
            session_id: session_id.to_string(),
            fingerprint: fingerprint.to_string(),
            search_after,
        }
    }

    pub fn encode(&self) -> Result<String> {
        Ok(hex::encode(serde_json::to_vec(self)?))
    }

    pub fn decode(raw: &str) -> Result<Self> {
        let bytes = hex::decode(raw.trim())
            .map_err(|err| QueryError::InvalidContinuation(format!("not hex: {err}")))?;
        let key = serde_json::from_slice::<Self>(&bytes)
            .map_err(|err| QueryError::InvalidContinuation(format!("unreadable token: {err}")))?;
        if key.version != TOKEN_VERSION {
            return Err(QueryError::InvalidContinuation(format!(
                "unsupported token version {}",
                key.version
            )));
        }
        if key.search_after.is_empty() {
            return Err(QueryError::InvalidContinuation(
                "token carries no position".to_string(),
            ));
        }
        Ok(key)
    }

    /// Decodes `raw` and checks it belongs to `session_id` and `fingerprint`.
    pub fn decode_for(raw: &str, session_id: &str, fingerprint: &str) -> Result<Self> {
        let key = Self::decode(raw)?;
        if key.session_id != session_id {
            return Err(QueryError::InvalidContinuation(
                "token was issued for another session".to_string(),
            ));
        }
        if key.fingerprint != fingerprint {
            return Err(QueryError::InvalidContinuation(
                "token was issued for another query".to_string(),
            ));
        }
        Ok(key)
    }
}

/// Stable digest of a compiled query body.
pub fn query_fingerprint(query: &Value) -> Result<String> {
    let canonical = serde_json::to_vec(query)?;
    Ok(blake3::hash(&canonical).to_hex().to_string())
}
