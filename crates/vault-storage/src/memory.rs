//! In-memory platform store.

use crate::{SecureStorage, StorageError, StorageResult, StoreOptions};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    require_authentication: bool,
}

/// Process-lifetime store. Records the presence-gate flag of every entry so
/// callers can inspect how a value was written.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: Mutex<HashMap<String, Entry>>,
    unavailable: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the entry was written with a presence gate, if it exists.
    pub fn requires_authentication(&self, key: &str) -> Option<bool> {
        self.data.lock().get(key).map(|e| e.require_authentication)
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.lock().is_empty()
    }

    /// Simulate the platform store refusing every operation.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> StorageResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Platform("secure store unavailable".to_string()));
        }
        Ok(())
    }
}

impl SecureStorage for MemoryStorage {
    fn set(&self, key: &str, value: &str, options: StoreOptions) -> StorageResult<()> {
        self.check_available()?;
        self.data.lock().insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                require_authentication: options.require_authentication,
            },
        );
        Ok(())
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.check_available()?;
        Ok(self.data.lock().get(key).map(|e| e.value.clone()))
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        self.check_available()?;
        Ok(self.data.lock().remove(key).is_some())
    }
}
