//! Request engine configuration.

use client_config_and_utils::{Config, CoreResult};
use std::collections::BTreeMap;
use std::time::Duration;

/// Request engine settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, e.g. `https://api.example.com/v1`.
    pub base_url: String,
    /// Default per-attempt timeout.
    pub timeout: Duration,
    /// Retry budget for transport failures and for queued replays.
    pub max_retries: u32,
    /// Base delay for exponential backoff.
    pub retry_delay: Duration,
    pub enable_offline_queue: bool,
    /// Headers sent with every request, after the JSON defaults.
    pub default_headers: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://dev-api.example.com/v1".to_string(),
            timeout: Duration::from_millis(30_000),
            max_retries: 3,
            retry_delay: Duration::from_millis(1_000),
            enable_offline_queue: true,
            default_headers: BTreeMap::new(),
        }
    }
}

impl ClientConfig {
    /// Derive engine settings from the application configuration.
    pub fn from_config(config: &Config) -> CoreResult<Self> {
        let base_url = config.api_url()?.as_str().trim_end_matches('/').to_string();
        Ok(Self {
            base_url,
            timeout: config.api_timeout(),
            max_retries: config.max_retries,
            retry_delay: config.retry_delay(),
            enable_offline_queue: config.enable_offline_queue,
            default_headers: config.default_headers.clone(),
        })
    }

    /// Backoff before retry `attempt` (0-indexed): `retry_delay * 2^attempt`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.retry_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Absolute URL for `path`. Absolute `http(s)://` inputs pass through.
    pub fn resolve_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }
}
