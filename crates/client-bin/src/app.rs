//! Wiring of storage, token store, request engine and auth service.

use anyhow::Result;
use auth_session::AuthService;
use biometric_guard::{BiometricGuard, UnavailableAuthenticator};
use client_config_and_utils::{Config, Paths};
use resilient_client::{
    ApiClient, ClientConfig, ConnectivityMonitor, NetworkState, ReqwestTransport,
};
use std::sync::Arc;
use token_store::TokenStore;
use tracing::debug;
use vault_storage::{FileStorage, Vault};

/// Everything a command needs, backed by the vault file under `paths`.
pub struct ClientApp {
    pub client: ApiClient,
    pub auth: AuthService,
}

impl ClientApp {
    pub fn open(paths: &Paths, config: &Config, offline: bool) -> Result<Self> {
        paths.ensure_dirs()?;

        let storage = Arc::new(FileStorage::open(paths.vault_file())?);
        let vault = Arc::new(Vault::open(storage)?);
        let tokens = Arc::new(TokenStore::new(vault.clone()));

        let client_config = ClientConfig::from_config(config)?;
        debug!(base_url = %client_config.base_url, offline, "Opening client");

        let network = ConnectivityMonitor::new(if offline {
            NetworkState::offline()
        } else {
            NetworkState::online()
        });

        let client = ApiClient::new(
            client_config,
            Arc::new(ReqwestTransport::new()?),
            vault.clone(),
            tokens,
            network,
        )?;

        // No platform prompt service on a terminal host
        let guard = Arc::new(BiometricGuard::new(vault, Arc::new(UnavailableAuthenticator)));
        let auth = AuthService::new(client.clone(), guard);

        Ok(Self { client, auth })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use token_store::TokenPair;

    #[test]
    fn test_open_creates_vault_and_persists_session() {
        let dir = TempDir::new().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());
        let config = Config::default();

        let app = ClientApp::open(&paths, &config, false).unwrap();
        app.client
            .store_session(&TokenPair::new("a", "r", i64::MAX))
            .unwrap();
        assert!(paths.vault_file().exists());

        let reopened = ClientApp::open(&paths, &config, false).unwrap();
        assert_eq!(
            reopened
                .client
                .token_store()
                .get_access_token()
                .unwrap()
                .as_deref(),
            Some("a")
        );
    }

    #[test]
    fn test_offline_flag_sets_network_state() {
        let dir = TempDir::new().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let app = ClientApp::open(&paths, &Config::default(), true).unwrap();
        assert!(!app.client.network_state().is_connected);
    }
}
