//! Biometric guard error types.

use thiserror::Error;

/// Biometric guard error type.
#[derive(Error, Debug)]
pub enum BiometricError {
    /// No usable hardware, or nothing enrolled
    #[error("Biometric authentication is not available on this device")]
    Unavailable,

    /// Platform prompt service failure
    #[error("Biometric platform error: {0}")]
    Platform(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] vault_storage::StorageError),
}

/// Result type alias using BiometricError.
pub type BiometricResult<T> = Result<T, BiometricError>;
