//! Auth session service tests.
//!
//! - `harness.rs`    - scripted transport and service fixture
//! - `lifecycle.rs`  - initialize, login, register, logout, refresh
//! - `account.rs`    - password reset/change, MFA, permissions
//! - `biometrics.rs` - biometric opt-in and sign-in

pub(crate) mod harness;
mod account;
mod lifecycle;
