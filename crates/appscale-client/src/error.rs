//! Error types for the transport layer.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised while talking to the orchestrator or a host.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("request to {uri} failed: {reason}")]
    Transport { uri: String, reason: String },

    #[error("request to {uri} timed out after {timeout:?}")]
    Timeout { uri: String, timeout: Duration },

    #[error("{uri} returned {status}: {body}")]
    Status {
        uri: String,
        status: u16,
        /// Parsed JSON error payload, or the raw text as a JSON string.
        body: serde_json::Value,
    },

    #[error("invalid response from {uri}: {reason}")]
    Decode { uri: String, reason: String },
}

impl ClientError {
    /// Network failure or timeout, as opposed to an answer we did not like.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport { .. } | ClientError::Timeout { .. })
    }
}
