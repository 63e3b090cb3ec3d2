//! Durable queue of requests made while offline.

use crate::HttpMethod;
use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, warn};
use vault_storage::{StorageKeys, StorageResult, StoreOptions, Vault};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// A request waiting for connectivity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineQueueItem {
    pub id: String,
    /// Path or absolute URL as the caller gave it.
    pub url: String,
    pub method: HttpMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Epoch milliseconds.
    pub enqueued_at: i64,
    pub retry_count: u32,
    pub max_retries: u32,
}

impl OfflineQueueItem {
    pub fn new(
        url: impl Into<String>,
        method: HttpMethod,
        body: Option<Value>,
        headers: BTreeMap<String, String>,
        max_retries: u32,
    ) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: generate_id(now),
            url: url.into(),
            method,
            body,
            headers,
            enqueued_at: now,
            retry_count: 0,
            max_retries,
        }
    }
}

/// `<millis>-<9 base36 chars>`
fn generate_id(now_millis: i64) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{}-{}", now_millis, suffix)
}

/// FIFO queue mirrored to the vault under `offline_queue`.
pub struct OfflineQueue {
    vault: Arc<Vault>,
    items: Mutex<VecDeque<OfflineQueueItem>>,
}

impl OfflineQueue {
    /// Load the persisted queue. An unreadable record starts an empty queue.
    pub fn load(vault: Arc<Vault>) -> StorageResult<Self> {
        let items: VecDeque<OfflineQueueItem> = vault
            .get_object::<Vec<OfflineQueueItem>>(StorageKeys::OFFLINE_QUEUE)?
            .unwrap_or_default()
            .into();

        if !items.is_empty() {
            debug!(count = items.len(), "Loaded offline queue");
        }

        Ok(Self {
            vault,
            items: Mutex::new(items),
        })
    }

    fn persist(&self, items: &VecDeque<OfflineQueueItem>) -> StorageResult<()> {
        self.vault
            .set_object(StorageKeys::OFFLINE_QUEUE, items, StoreOptions::default())
    }

    /// Append an item and persist before returning.
    pub fn enqueue(&self, item: OfflineQueueItem) -> StorageResult<()> {
        let mut items = self.items.lock();
        debug!(id = %item.id, method = %item.method, url = %item.url, "Queued offline request");
        items.push_back(item);
        self.persist(&items)
    }

    /// Remove and return everything, oldest first. The persisted copy is
    /// left in place until [`OfflineQueue::restore`] writes the outcome.
    pub fn take_all(&self) -> Vec<OfflineQueueItem> {
        self.items.lock().drain(..).collect()
    }

    /// Put items back ahead of anything enqueued since `take_all`, then persist.
    pub fn restore(&self, returned: Vec<OfflineQueueItem>) -> StorageResult<()> {
        let mut items = self.items.lock();
        for item in returned.into_iter().rev() {
            items.push_front(item);
        }
        self.persist(&items)
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    pub fn snapshot(&self) -> Vec<OfflineQueueItem> {
        self.items.lock().iter().cloned().collect()
    }

    pub fn clear(&self) -> StorageResult<()> {
        let mut items = self.items.lock();
        if !items.is_empty() {
            warn!(count = items.len(), "Discarding offline queue");
        }
        items.clear();
        self.persist(&items)
    }
}
