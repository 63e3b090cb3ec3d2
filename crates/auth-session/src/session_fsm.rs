//! Session state machine using rust-fsm.
//!
//! ## State Diagram
//!
//! ```text
//! ┌─────────────────┐
//! │  Uninitialized  │ (initial)
//! └────────┬────────┘
//!          │ Initialize
//!          ▼
//! ┌─────────────────┐  NoSession   ┌─────────────────┐
//! │  Initializing   │ ───────────► │ Unauthenticated │ ◄──────────────┐
//! └────────┬────────┘              └────────┬────────┘                │
//!          │ SessionRestored                │ LoginAttempt            │
//!          │                                ▼                         │
//!          │                       ┌─────────────────┐  LoginFailed   │
//!          │                       │ Authenticating  │ ───────────────┤
//!          │                       └───┬─────────┬───┘                │
//!          │         LoginSucceeded    │         │ MfaRequired        │
//!          ▼                           ▼         ▼                    │
//! ┌─────────────────┐  MfaVerified  ┌─────────────────┐              │
//! │  Authenticated  │ ◄──────────── │   MfaPending    │              │
//! └────────┬────────┘               └─────────────────┘              │
//!          │ LogoutRequested                  SessionExpired ────────┤
//!          ▼                                                          │
//! ┌─────────────────┐  LogoutComplete                                 │
//! │   LoggingOut    │ ────────────────────────────────────────────────┘
//! └─────────────────┘
//! ```

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Uninitialized)

    Uninitialized => {
        Initialize => Initializing,
        LoginAttempt => Authenticating
    },
    Initializing => {
        SessionRestored => Authenticated,
        NoSession => Unauthenticated
    },
    Unauthenticated => {
        Initialize => Initializing,
        LoginAttempt => Authenticating
    },
    Authenticating => {
        LoginSucceeded => Authenticated,
        MfaRequired => MfaPending,
        LoginFailed => Unauthenticated
    },
    MfaPending => {
        MfaVerified => Authenticated,
        LoginAttempt => Authenticating,
        LogoutRequested => LoggingOut
    },
    Authenticated => {
        // Enabling MFA from an active session
        MfaVerified => Authenticated,
        // Switching accounts
        LoginAttempt => Authenticating,
        SessionExpired => Unauthenticated,
        LogoutRequested => LoggingOut
    },
    LoggingOut => {
        LogoutComplete => Unauthenticated
    }
}

pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Session state for callers and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// `initialize` has not run yet.
    Uninitialized,
    /// Restoring a stored session.
    Initializing,
    Authenticated,
    Unauthenticated,
    /// Password accepted, second factor outstanding.
    MfaPending,
    /// A credential exchange is in flight.
    Authenticating,
    LoggingOut,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated)
    }

    /// Returns true while an operation is in progress.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SessionState::Initializing | SessionState::Authenticating | SessionState::LoggingOut
        )
    }
}

impl From<&SessionMachineState> for SessionState {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::Uninitialized => SessionState::Uninitialized,
            SessionMachineState::Initializing => SessionState::Initializing,
            SessionMachineState::Authenticated => SessionState::Authenticated,
            SessionMachineState::Unauthenticated => SessionState::Unauthenticated,
            SessionMachineState::MfaPending => SessionState::MfaPending,
            SessionMachineState::Authenticating => SessionState::Authenticating,
            SessionMachineState::LoggingOut => SessionState::LoggingOut,
        }
    }
}

/// Payload for session state change notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStateChanged {
    pub state: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}
