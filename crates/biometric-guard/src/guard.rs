//! Biometric credential guard.

use crate::{
    BiometricAuthConfig, BiometricAuthenticator, BiometricCredential, BiometricError,
    BiometricResult, BiometricType, PromptOptions, PromptRequest,
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use vault_storage::{StorageKeys, StoreOptions, Vault};

const CREDENTIALS_PROMPT: &str = "Authenticate to access your saved credentials";

/// Gates the cached login credential behind a biometric challenge.
pub struct BiometricGuard {
    vault: Arc<Vault>,
    authenticator: Arc<dyn BiometricAuthenticator>,
}

impl BiometricGuard {
    pub fn new(vault: Arc<Vault>, authenticator: Arc<dyn BiometricAuthenticator>) -> Self {
        Self {
            vault,
            authenticator,
        }
    }

    /// Hardware present and at least one biometric enrolled.
    pub async fn is_available(&self) -> bool {
        let has_hardware = match self.authenticator.has_hardware().await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Failed to query biometric hardware");
                return false;
            }
        };
        if !has_hardware {
            return false;
        }

        match self.authenticator.is_enrolled().await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Failed to query biometric enrollment");
                false
            }
        }
    }

    pub async fn supported_types(&self) -> Vec<BiometricType> {
        self.authenticator
            .supported_types()
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to query supported biometric types");
                Vec::new()
            })
    }

    /// Preferred modality: face, then fingerprint, then iris.
    pub async fn biometric_type(&self) -> BiometricType {
        let types = self.supported_types().await;
        [BiometricType::Face, BiometricType::Fingerprint, BiometricType::Iris]
            .into_iter()
            .find(|t| types.contains(t))
            .unwrap_or(BiometricType::None)
    }

    /// Run a challenge. Any failure, including unavailability, is `false`.
    pub async fn authenticate(&self, options: PromptOptions) -> bool {
        if !self.is_available().await {
            debug!("Biometric challenge skipped: not available");
            return false;
        }

        let request = PromptRequest::resolve(options, self.biometric_type().await);
        match self.authenticator.authenticate(&request).await {
            Ok(success) => {
                debug!(success = success, "Biometric challenge finished");
                success
            }
            Err(e) => {
                warn!(error = %e, "Biometric challenge failed");
                false
            }
        }
    }

    /// Opt in, caching `credential` behind a presence gate.
    pub async fn enable_biometric_auth(
        &self,
        credential: &BiometricCredential,
    ) -> BiometricResult<()> {
        if !self.is_available().await {
            return Err(BiometricError::Unavailable);
        }

        let config = BiometricAuthConfig {
            is_enabled: true,
            biometric_type: self.biometric_type().await,
            is_enrolled: self.authenticator.is_enrolled().await?,
        };

        self.vault
            .set_object(StorageKeys::BIOMETRIC_CONFIG, &config, StoreOptions::default())?;
        self.vault.set_object(
            StorageKeys::BIOMETRIC_CREDENTIALS,
            credential,
            StoreOptions::authenticated(),
        )?;

        info!(biometric_type = ?config.biometric_type, "Enabled biometric authentication");
        Ok(())
    }

    /// Opt out and drop the cached credential.
    pub async fn disable_biometric_auth(&self) -> BiometricResult<()> {
        self.vault.set_object(
            StorageKeys::BIOMETRIC_CONFIG,
            &BiometricAuthConfig::disabled(),
            StoreOptions::default(),
        )?;
        self.vault.remove_item(StorageKeys::BIOMETRIC_CREDENTIALS)?;

        info!("Disabled biometric authentication");
        Ok(())
    }

    /// Config exactly as last written, without the live overlay.
    pub fn stored_config(&self) -> BiometricResult<Option<BiometricAuthConfig>> {
        Ok(self.vault.get_object(StorageKeys::BIOMETRIC_CONFIG)?)
    }

    /// Stored `is_enabled` with live modality and enrollment.
    pub async fn biometric_config(&self) -> BiometricResult<BiometricAuthConfig> {
        let Some(stored) = self.stored_config()? else {
            return Ok(BiometricAuthConfig::default());
        };

        Ok(BiometricAuthConfig {
            is_enabled: stored.is_enabled,
            biometric_type: self.biometric_type().await,
            is_enrolled: self.is_available().await,
        })
    }

    /// Release the cached credential after a fresh challenge.
    pub async fn biometric_credentials(&self) -> BiometricResult<Option<BiometricCredential>> {
        if !self
            .authenticate(PromptOptions::with_message(CREDENTIALS_PROMPT))
            .await
        {
            return Ok(None);
        }

        Ok(self.vault.get_object(StorageKeys::BIOMETRIC_CREDENTIALS)?)
    }

    /// Replace the cached credential. Does nothing unless biometrics are enabled.
    pub async fn update_biometric_credentials(
        &self,
        credential: &BiometricCredential,
    ) -> BiometricResult<()> {
        let enabled = self.stored_config()?.is_some_and(|c| c.is_enabled);
        if !enabled {
            return Ok(());
        }

        self.vault.set_object(
            StorageKeys::BIOMETRIC_CREDENTIALS,
            credential,
            StoreOptions::authenticated(),
        )?;
        debug!("Updated biometric credentials");
        Ok(())
    }

    /// Compare the stored snapshot with the device. On any difference,
    /// disable biometrics and return `true`.
    pub async fn check_biometric_changes(&self) -> BiometricResult<bool> {
        let Some(stored) = self.stored_config()? else {
            return Ok(false);
        };
        if !stored.is_enabled {
            return Ok(false);
        }

        let current_type = self.biometric_type().await;
        let currently_available = self.is_available().await;

        if stored.biometric_type == current_type && stored.is_enrolled == currently_available {
            return Ok(false);
        }

        warn!(
            stored_type = ?stored.biometric_type,
            current_type = ?current_type,
            stored_enrolled = stored.is_enrolled,
            current_enrolled = currently_available,
            "Biometric enrollment changed, disabling biometric authentication"
        );
        self.disable_biometric_auth().await?;
        Ok(true)
    }
}
