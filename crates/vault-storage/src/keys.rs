//! Storage key constants.

/// Keys used in the credential vault.
pub struct StorageKeys;

impl StorageKeys {
    /// Integrity key for every other record (stored raw, ungated)
    pub const ENCRYPTION_KEY: &'static str = "encryption_key";

    /// Full token pair as JSON
    pub const AUTH_TOKENS: &'static str = "auth_tokens";

    /// Standalone access token
    pub const ACCESS_TOKEN: &'static str = "access_token";

    /// Standalone refresh token (presence-gated)
    pub const REFRESH_TOKEN: &'static str = "refresh_token";

    /// Biometric settings snapshot
    pub const BIOMETRIC_CONFIG: &'static str = "biometric_config";

    /// Cached login credential released by biometrics (presence-gated)
    pub const BIOMETRIC_CREDENTIALS: &'static str = "biometric_credentials";

    /// Durable offline request queue
    pub const OFFLINE_QUEUE: &'static str = "offline_queue";

    /// UI theme preference
    pub const THEME_MODE: &'static str = "theme_mode";
}
