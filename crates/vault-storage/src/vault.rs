//! Integrity-checked records over a platform secure store.
//!
//! Every value is stored as `base64(plaintext) "." hex(sha256(key || plaintext))`.
//! The key is a random seed hashed once and kept raw under
//! [`StorageKeys::ENCRYPTION_KEY`]. A record whose digest does not verify is
//! reported as absent.

use crate::{SecureStorage, StorageKeys, StorageResult, StoreOptions};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::RngCore;
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Credential vault shared by every component that keeps secrets.
pub struct Vault {
    storage: Arc<dyn SecureStorage>,
    key: String,
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault").finish_non_exhaustive()
    }
}

impl Vault {
    /// Open the vault, generating and persisting the integrity key on first run.
    pub fn open(storage: Arc<dyn SecureStorage>) -> StorageResult<Self> {
        let key = match storage.get(StorageKeys::ENCRYPTION_KEY)? {
            Some(existing) if !existing.is_empty() => existing,
            _ => {
                let key = generate_key();
                storage.set(StorageKeys::ENCRYPTION_KEY, &key, StoreOptions::default())?;
                info!("Generated vault integrity key");
                key
            }
        };

        Ok(Self { storage, key })
    }

    fn digest(&self, plaintext: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.key.as_bytes());
        hasher.update(plaintext.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn seal(&self, plaintext: &str) -> String {
        format!("{}.{}", BASE64.encode(plaintext.as_bytes()), self.digest(plaintext))
    }

    fn open_record(&self, key: &str, record: &str) -> Option<String> {
        let Some((encoded, digest)) = record.split_once('.') else {
            warn!(key = %key, "Vault record is malformed");
            return None;
        };

        let plaintext = match BASE64
            .decode(encoded)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
        {
            Some(plaintext) => plaintext,
            None => {
                warn!(key = %key, "Vault record payload is not valid base64 text");
                return None;
            }
        };

        if self.digest(&plaintext) != digest {
            warn!(key = %key, "Vault record failed integrity check");
            return None;
        }

        Some(plaintext)
    }

    /// Store a value, optionally behind a presence gate.
    pub fn set_item(&self, key: &str, value: &str, options: StoreOptions) -> StorageResult<()> {
        self.storage.set(key, &self.seal(value), options)?;
        debug!(key = %key, gated = options.require_authentication, "Stored vault item");
        Ok(())
    }

    /// Read a value. Absent and tampered records both yield `None`.
    pub fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self
            .storage
            .get(key)?
            .and_then(|record| self.open_record(key, &record)))
    }

    /// Remove a value. Removing an absent key is not an error.
    pub fn remove_item(&self, key: &str) -> StorageResult<()> {
        if self.storage.delete(key)? {
            debug!(key = %key, "Removed vault item");
        }
        Ok(())
    }

    /// Whether a verifiable record exists for `key`.
    pub fn has_item(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get_item(key)?.is_some())
    }

    /// Store a value as JSON.
    pub fn set_object<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        options: StoreOptions,
    ) -> StorageResult<()> {
        let json = serde_json::to_string(value)?;
        self.set_item(key, &json, options)
    }

    /// Read a JSON value. Unparseable records yield `None`.
    pub fn get_object<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        let Some(json) = self.get_item(key)? else {
            return Ok(None);
        };

        match serde_json::from_str(&json) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key = %key, error = %e, "Vault object could not be parsed");
                Ok(None)
            }
        }
    }
}

fn generate_key() -> String {
    let mut seed = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut seed);
    hex::encode(Sha256::digest(seed))
}
