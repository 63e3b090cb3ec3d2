//! Biometric data types.

use serde::{Deserialize, Serialize};

/// Biometric modality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiometricType {
    Fingerprint,
    Face,
    Iris,
    #[default]
    None,
}

impl BiometricType {
    /// Prompt shown when the caller does not provide one.
    pub fn default_prompt(&self) -> &'static str {
        match self {
            BiometricType::Face => "Use face recognition to authenticate",
            BiometricType::Fingerprint => "Use fingerprint to authenticate",
            BiometricType::Iris => "Use iris scan to authenticate",
            BiometricType::None => "Use biometric authentication",
        }
    }
}

/// Biometric settings. Only `is_enabled` is authoritative when read back;
/// the other fields are refreshed from the device.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiometricAuthConfig {
    pub is_enabled: bool,
    #[serde(rename = "type")]
    pub biometric_type: BiometricType,
    pub is_enrolled: bool,
}

impl BiometricAuthConfig {
    /// The disabled configuration written on opt-out or invalidation.
    pub fn disabled() -> Self {
        Self::default()
    }
}

/// Login credential released after a successful challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiometricCredential {
    pub email: String,
    pub access_token: String,
}

/// Caller-supplied prompt options; unset fields take defaults.
#[derive(Debug, Clone, Default)]
pub struct PromptOptions {
    pub prompt_message: Option<String>,
    pub cancel_label: Option<String>,
    pub fallback_label: Option<String>,
    pub disable_device_fallback: bool,
}

impl PromptOptions {
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            prompt_message: Some(message.into()),
            ..Self::default()
        }
    }
}

/// Fully resolved prompt handed to the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub prompt_message: String,
    pub cancel_label: String,
    pub fallback_label: String,
    pub disable_device_fallback: bool,
}

impl PromptRequest {
    pub fn resolve(options: PromptOptions, biometric_type: BiometricType) -> Self {
        Self {
            prompt_message: options
                .prompt_message
                .unwrap_or_else(|| biometric_type.default_prompt().to_string()),
            cancel_label: options.cancel_label.unwrap_or_else(|| "Cancel".to_string()),
            fallback_label: options
                .fallback_label
                .unwrap_or_else(|| "Use Passcode".to_string()),
            disable_device_fallback: options.disable_device_fallback,
        }
    }
}
