//! Storage trait definitions.

use crate::StorageResult;

/// Per-entry options forwarded to the platform store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreOptions {
    /// Gate release of this entry behind a user-presence challenge.
    pub require_authentication: bool,
}

impl StoreOptions {
    /// Options for an entry that needs user presence to be read.
    pub fn authenticated() -> Self {
        Self {
            require_authentication: true,
        }
    }
}

/// Trait for secure storage backends
pub trait SecureStorage: Send + Sync {
    /// Store a value securely
    fn set(&self, key: &str, value: &str, options: StoreOptions) -> StorageResult<()>;

    /// Retrieve a value
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Delete a value. Returns whether anything was removed.
    fn delete(&self, key: &str) -> StorageResult<bool>;

    /// Check if a key exists
    fn has(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}
