//! Token store error types.

use thiserror::Error;

/// Token store error type.
#[derive(Error, Debug)]
pub enum TokenError {
    /// Access token update attempted with no stored pair
    #[error("No existing session to update")]
    NoExistingSession,

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] vault_storage::StorageError),
}

/// Result type alias using TokenError.
pub type TokenResult<T> = Result<T, TokenError>;
