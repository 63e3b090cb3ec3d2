//! Authentication session error types.

use resilient_client::ClientError;
use thiserror::Error;

/// Authentication session error type.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Server rejected the credentials
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Operation needs an authenticated session
    #[error("Not logged in")]
    NotLoggedIn,

    /// Refresh failed and the session has been cleared
    #[error("Session expired")]
    SessionExpired,

    /// Biometric challenge failed, was cancelled, or has no cached credential
    #[error("Biometric authentication failed")]
    BiometricFailed,

    /// Server answered 2xx with a body missing required fields
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    /// Invalid state transition in the session FSM
    #[error("Invalid session state transition: {0}")]
    InvalidStateTransition(String),

    /// Request engine error
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Token store error
    #[error("Token error: {0}")]
    Token(#[from] token_store::TokenError),

    /// Biometric guard error
    #[error("Biometric error: {0}")]
    Biometric(#[from] biometric_guard::BiometricError),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] vault_storage::StorageError),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AuthError {
    /// Returns true if this error is transient and the operation can be retried.
    pub fn is_transient(&self) -> bool {
        match self {
            AuthError::Client(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;
