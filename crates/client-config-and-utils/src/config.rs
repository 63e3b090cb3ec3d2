//! Configuration management for the client.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

const DEFAULT_API_VERSION: &str = "v1";
const DEFAULT_API_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;

const ENV_ENVIRONMENT: &str = "RESILIENT_CLIENT_ENV";
const ENV_LOG_LEVEL: &str = "RESILIENT_CLIENT_LOG_LEVEL";
const ENV_API_BASE_URL: &str = "RESILIENT_CLIENT_API_BASE_URL";

/// Deployment environment the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Parse an environment name. Accepts short forms (`dev`, `prod`).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Some(Self::Development),
            "staging" => Some(Self::Staging),
            "prod" | "production" => Some(Self::Production),
            _ => None,
        }
    }

    /// API host for this environment.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Development => "https://dev-api.example.com",
            Self::Staging => "https://staging-api.example.com",
            Self::Production => "https://api.example.com",
        }
    }
}

/// Main client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Target environment; selects the default API host.
    #[serde(default)]
    pub environment: Environment,
    /// Explicit API host, overriding the environment default.
    #[serde(default)]
    pub api_base_url: Option<String>,
    /// API version path segment appended to the host.
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_api_timeout_ms")]
    pub api_timeout_ms: u64,
    /// Retry budget for transient transport failures and queued replays.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay for exponential backoff in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Whether requests issued while offline are queued for replay.
    #[serde(default = "default_true")]
    pub enable_offline_queue: bool,
    /// Extra headers sent with every request.
    #[serde(default)]
    pub default_headers: BTreeMap<String, String>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_api_timeout_ms() -> u64 {
    DEFAULT_API_TIMEOUT_MS
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_retry_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY_MS
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            environment: Environment::default(),
            api_base_url: None,
            api_version: default_api_version(),
            api_timeout_ms: DEFAULT_API_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            enable_offline_queue: true,
            default_headers: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from a file, falling back to defaults.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    fn load_from_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from a variable lookup.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).and_then(non_empty);

        if let Some(raw) = lookup(ENV_ENVIRONMENT) {
            match Environment::parse(&raw) {
                Some(environment) => self.environment = environment,
                None => tracing::warn!(value = %raw, "Ignoring unknown environment override"),
            }
        }
        if let Some(log_level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = log_level;
        }
        if let Some(base_url) = lookup(ENV_API_BASE_URL) {
            self.api_base_url = Some(base_url);
        }
    }

    /// The API host in effect (explicit override or environment default).
    pub fn api_base_url(&self) -> &str {
        self.api_base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.default_base_url())
    }

    /// Full API root: `<host>/<version>`.
    pub fn api_url(&self) -> CoreResult<Url> {
        let base = self.api_base_url().trim_end_matches('/');
        let version = self.api_version.trim_matches('/');
        let joined = if version.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, version)
        };
        Url::parse(&joined).map_err(CoreError::from)
    }

    /// Per-request timeout as a Duration.
    pub fn api_timeout(&self) -> Duration {
        Duration::from_millis(self.api_timeout_ms)
    }

    /// Base retry delay as a Duration.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
