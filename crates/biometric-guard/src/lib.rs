//! Biometric gate for a cached login credential.
//!
//! The guard stores `{email, accessToken}` behind a presence-gated vault
//! entry and only releases it after a fresh biometric challenge. If the
//! device's enrollment changes after the credential was saved, the guard
//! disables itself and drops the credential.

mod authenticator;
mod error;
mod guard;
mod types;

pub use authenticator::{BiometricAuthenticator, SimulatedAuthenticator, UnavailableAuthenticator};
pub use error::{BiometricError, BiometricResult};
pub use guard::BiometricGuard;
pub use types::{BiometricAuthConfig, BiometricCredential, BiometricType, PromptOptions, PromptRequest};
