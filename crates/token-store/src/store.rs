//! Token persistence.

use crate::{Clock, SystemClock, TokenError, TokenResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use vault_storage::{StorageKeys, StoreOptions, Vault};

/// Tokens closer than this to expiry are not considered valid.
pub const TOKEN_EXPIRY_BUFFER_MS: i64 = 5 * 60 * 1000;

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Access/refresh token pair as issued by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Absolute expiry of `access_token` in epoch milliseconds.
    pub expires_at: i64,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

impl TokenPair {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_at: i64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_at,
            token_type: default_token_type(),
        }
    }
}

/// Persists the current token pair in the vault.
pub struct TokenStore {
    vault: Arc<Vault>,
    clock: Arc<dyn Clock>,
}

impl TokenStore {
    pub fn new(vault: Arc<Vault>) -> Self {
        Self::with_clock(vault, Arc::new(SystemClock))
    }

    pub fn with_clock(vault: Arc<Vault>, clock: Arc<dyn Clock>) -> Self {
        Self { vault, clock }
    }

    /// Current time according to the store's clock.
    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Persist a full pair plus standalone copies of each token.
    pub fn store_tokens(&self, tokens: &TokenPair) -> TokenResult<()> {
        self.vault
            .set_object(StorageKeys::AUTH_TOKENS, tokens, StoreOptions::default())?;
        self.vault.set_item(
            StorageKeys::ACCESS_TOKEN,
            &tokens.access_token,
            StoreOptions::default(),
        )?;
        self.vault.set_item(
            StorageKeys::REFRESH_TOKEN,
            &tokens.refresh_token,
            StoreOptions::authenticated(),
        )?;

        info!(expires_at = tokens.expires_at, "Stored auth tokens");
        Ok(())
    }

    pub fn get_tokens(&self) -> TokenResult<Option<TokenPair>> {
        Ok(self.vault.get_object(StorageKeys::AUTH_TOKENS)?)
    }

    pub fn get_access_token(&self) -> TokenResult<Option<String>> {
        Ok(self.vault.get_item(StorageKeys::ACCESS_TOKEN)?)
    }

    pub fn get_refresh_token(&self) -> TokenResult<Option<String>> {
        Ok(self.vault.get_item(StorageKeys::REFRESH_TOKEN)?)
    }

    /// Replace the access token and its expiry, keeping the refresh token.
    ///
    /// Fails with [`TokenError::NoExistingSession`] when no pair is stored;
    /// storage is left untouched in that case.
    pub fn update_access_token(&self, access_token: &str, expires_at: i64) -> TokenResult<()> {
        let current = self.get_tokens()?.ok_or(TokenError::NoExistingSession)?;

        let updated = TokenPair {
            access_token: access_token.to_string(),
            expires_at,
            ..current
        };

        self.vault
            .set_object(StorageKeys::AUTH_TOKENS, &updated, StoreOptions::default())?;
        self.vault
            .set_item(StorageKeys::ACCESS_TOKEN, access_token, StoreOptions::default())?;

        debug!(expires_at = expires_at, "Updated access token");
        Ok(())
    }

    /// Remove every token entry. Safe to call when nothing is stored.
    pub fn clear_tokens(&self) -> TokenResult<()> {
        self.vault.remove_item(StorageKeys::AUTH_TOKENS)?;
        self.vault.remove_item(StorageKeys::ACCESS_TOKEN)?;
        self.vault.remove_item(StorageKeys::REFRESH_TOKEN)?;
        info!("Cleared auth tokens");
        Ok(())
    }

    /// True only if the stored pair is more than five minutes from expiry.
    pub fn has_valid_tokens(&self) -> TokenResult<bool> {
        let now = self.now_millis();
        Ok(self
            .get_tokens()?
            .is_some_and(|t| t.expires_at > now + TOKEN_EXPIRY_BUFFER_MS))
    }

    /// True when no pair is stored or its expiry has passed.
    pub fn is_token_expired(&self) -> TokenResult<bool> {
        let now = self.now_millis();
        Ok(self.get_tokens()?.map_or(true, |t| t.expires_at <= now))
    }

    pub fn token_expiration_time(&self) -> TokenResult<Option<i64>> {
        Ok(self.get_tokens()?.map(|t| t.expires_at))
    }

    pub fn has_refresh_token(&self) -> TokenResult<bool> {
        Ok(self
            .get_refresh_token()?
            .is_some_and(|token| !token.is_empty()))
    }
}
