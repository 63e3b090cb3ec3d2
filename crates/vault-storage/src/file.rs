//! File-backed platform store for headless hosts.

use crate::{SecureStorage, StorageResult, StoreOptions};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FileEntry {
    value: String,
    #[serde(default)]
    require_authentication: bool,
}

/// Single JSON document on disk, rewritten atomically on every mutation.
///
/// Presence gating is recorded but not enforced; there is no prompt on a
/// headless host.
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, FileEntry>>,
}

impl FileStorage {
    /// Open the store at `path`, creating it lazily on first write.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), entries = entries.len(), "Opened file storage");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, FileEntry>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SecureStorage for FileStorage {
    fn set(&self, key: &str, value: &str, options: StoreOptions) -> StorageResult<()> {
        let mut entries = self.entries.lock();
        entries.insert(
            key.to_string(),
            FileEntry {
                value: value.to_string(),
                require_authentication: options.require_authentication,
            },
        );
        self.persist(&entries)
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.lock().get(key).map(|e| e.value.clone()))
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        let mut entries = self.entries.lock();
        if entries.remove(key).is_none() {
            return Ok(false);
        }
        self.persist(&entries)?;
        Ok(true)
    }
}
