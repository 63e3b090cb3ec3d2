//! Request engine error types.

use serde_json::Value;
use thiserror::Error;

/// Failure surfaced to callers of the request engine.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request did not complete within its timeout
    #[error("Request timed out")]
    Timeout,

    /// Device is offline; the request was persisted for later replay
    #[error("Device is offline, request queued for later")]
    Queued,

    /// Token refresh failed; the session has been cleared
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Server returned a non-2xx status
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        body: Value,
    },

    /// Transport failure after exhausting retries
    #[error("Network error after {attempts} attempt(s): {message}")]
    Network { attempts: u32, message: String },

    /// Request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Response body did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] vault_storage::StorageError),

    /// Token store error
    #[error("Token error: {0}")]
    Token(#[from] token_store::TokenError),
}

impl ClientError {
    /// Build an HTTP failure, taking the message from the body when present.
    pub fn http(status: u16, body: Value) -> Self {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", status));
        ClientError::Http {
            status,
            message,
            body,
        }
    }

    /// HTTP status, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if this error is transient and the operation can be retried.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Timeout | ClientError::Network { .. } => true,
            ClientError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Failures that are also queued when they happen while offline.
    pub(crate) fn is_offline_recoverable(&self) -> bool {
        matches!(
            self,
            ClientError::Timeout
                | ClientError::Network { .. }
                | ClientError::AuthenticationFailed(_)
        )
    }
}

/// Result type alias using ClientError.
pub type ClientResult<T> = Result<T, ClientError>;
