// 9.0.1: transport seam and gateway errors.

use crate::snapshot::SnapshotError;
use serde_json::Value;

/// Anything that can run a smart query against a contract and return its JSON
/// response. Retries and timeouts belong to the implementation.
pub trait LedgerClient {
    fn query(&self, contract: &str, msg: &Value) -> Result<Value, GatewayError>;
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("ledger transport error: {0}")]
    Transport(String),

    #[error("failed to decode {query} response: {source}")]
    Decode {
        query: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid snapshot: {0}")]
    Snapshot(#[from] SnapshotError),
}
