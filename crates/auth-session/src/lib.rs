//! Authentication session management.
//!
//! This crate provides:
//! - An explicit FSM for the session lifecycle (restore, login, MFA, logout)
//! - `AuthService`, which drives the auth endpoints through the resilient
//!   request engine and keeps the biometric credential cache in step

mod error;
mod service;
mod session_fsm;
mod types;

pub use error::{AuthError, AuthResult};
pub use service::{AuthService, SessionStateCallback};
pub use session_fsm::session_machine;
pub use session_fsm::{
    SessionMachine, SessionMachineInput, SessionMachineState, SessionState, SessionStateChanged,
};
pub use types::{
    ChangePasswordRequest, LoginCredentials, LoginOutcome, MfaSetup, MfaVerification, Permission,
    RegisterData, ResetPasswordConfirm, Role, User,
};

#[cfg(test)]
mod tests;
