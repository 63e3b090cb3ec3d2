//! Credential vault for the resilient client.
//!
//! This crate provides:
//! - [`SecureStorage`]: the platform secure store contract, with per-entry
//!   presence gating
//! - [`MemoryStorage`] and [`FileStorage`]: reference platform stores
//! - [`Vault`]: integrity-checked records layered over any platform store

mod file;
mod keys;
mod memory;
mod traits;
mod vault;

pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use traits::{SecureStorage, StoreOptions};
pub use vault::Vault;

use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Platform-specific storage error
    #[error("Platform storage error: {0}")]
    Platform(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
