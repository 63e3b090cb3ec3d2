//! Connectivity state and its change feed.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Latest reachability snapshot, replaced wholesale on every update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkState {
    pub is_connected: bool,
    pub is_internet_reachable: Option<bool>,
    #[serde(rename = "type")]
    pub connection_type: Option<String>,
}

impl NetworkState {
    pub fn online() -> Self {
        Self {
            is_connected: true,
            is_internet_reachable: Some(true),
            connection_type: None,
        }
    }

    pub fn offline() -> Self {
        Self {
            is_connected: false,
            is_internet_reachable: Some(false),
            connection_type: None,
        }
    }
}

impl Default for NetworkState {
    fn default() -> Self {
        Self::online()
    }
}

/// Publishes network state to any number of subscribers.
///
/// Cloning yields another handle to the same state.
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
    sender: Arc<watch::Sender<NetworkState>>,
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(NetworkState::default())
    }
}

impl ConnectivityMonitor {
    pub fn new(initial: NetworkState) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Replace the current state, notifying subscribers.
    pub fn update(&self, state: NetworkState) {
        let previous = self.sender.send_replace(state.clone());
        if previous.is_connected != state.is_connected {
            info!(
                connected = state.is_connected,
                connection_type = ?state.connection_type,
                "Connectivity changed"
            );
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.update(if connected {
            NetworkState::online()
        } else {
            NetworkState::offline()
        });
    }

    pub fn current(&self) -> NetworkState {
        self.sender.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.sender.borrow().is_connected
    }

    pub fn subscribe(&self) -> watch::Receiver<NetworkState> {
        self.sender.subscribe()
    }
}
