//! Network client error types.

/// Errors from algod, indexer, and KMD calls.
#[derive(Debug, thiserror::Error)]
pub enum AlgoApiError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Service returned a non-2xx status.
    #[error("{endpoint} returned {status}: {body}")]
    ApiError {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Response parsed as JSON but does not match the expected record shape.
    #[error("unrecognized record from {endpoint}: {reason}")]
    Schema { endpoint: String, reason: String },
    /// Transaction was rejected by the pool or never confirmed.
    #[error("transaction {tx_id} rejected: {reason}")]
    Rejected { tx_id: String, reason: String },
    /// The wallet provider has no wallet with the configured name.
    #[error("wallet \"{0}\" not found")]
    WalletNotFound(String),
    /// Canonical transaction encoding failed.
    #[error("transaction encoding error: {0}")]
    Encode(#[from] crate::txn::EncodeError),
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}

impl AlgoApiError {
    /// The message a node attached to a rejection, for surfacing verbatim.
    ///
    /// algod and KMD answer errors with `{"message": "..."}`; anything else
    /// falls back to the full display string.
    pub fn remote_message(&self) -> String {
        match self {
            Self::ApiError { body, .. } => serde_json::from_str::<serde_json::Value>(body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
                .unwrap_or_else(|| body.clone()),
            Self::Rejected { reason, .. } => reason.clone(),
            other => other.to_string(),
        }
    }
}
