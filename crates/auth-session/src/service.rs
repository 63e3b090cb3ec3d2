//! Authentication session service over the request engine.
//!
//! `AuthService` owns the session FSM and the signed-in user. Tokens live in
//! the engine's token store; the biometric guard caches a login credential
//! for device-unlock sign-in.

use crate::session_fsm::{SessionMachine, SessionMachineInput, SessionState, SessionStateChanged};
use crate::types::{
    AuthResponse, ChangePasswordRequest, LoginCredentials, LoginOutcome, MfaSetup,
    MfaVerification, RegisterData, ResetPasswordConfirm, User,
};
use crate::{AuthError, AuthResult};
use biometric_guard::{BiometricAuthConfig, BiometricCredential, BiometricGuard};
use parking_lot::{Mutex, RwLock};
use resilient_client::{ApiClient, ClientError, RequestOptions};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use token_store::TokenPair;
use tracing::{debug, info, warn};

const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";
const LOGOUT_PATH: &str = "/auth/logout";
const RESET_PASSWORD_PATH: &str = "/auth/reset-password";
const CONFIRM_RESET_PATH: &str = "/auth/confirm-reset-password";
const CHANGE_PASSWORD_PATH: &str = "/auth/change-password";
const PROFILE_PATH: &str = "/auth/profile";
const MFA_SETUP_PATH: &str = "/auth/mfa/setup";
const MFA_VERIFY_PATH: &str = "/auth/mfa/verify";
const MFA_DISABLE_PATH: &str = "/auth/mfa/disable";

/// Callback type for session state change notifications.
pub type SessionStateCallback = Box<dyn Fn(SessionStateChanged) + Send + Sync>;

/// Options for credential exchanges: no bearer, no refresh, never queued.
fn credential_exchange() -> RequestOptions {
    RequestOptions::unauthenticated().without_queue()
}

/// Options for calls made on behalf of the signed-in user.
fn session_call() -> RequestOptions {
    RequestOptions::default().without_queue()
}

/// Map a rejected credential exchange to `InvalidCredentials`.
fn rejected(err: ClientError) -> AuthError {
    match err {
        ClientError::Http {
            status: 400 | 401 | 403,
            message,
            ..
        } => AuthError::InvalidCredentials(message),
        other => AuthError::Client(other),
    }
}

pub struct AuthService {
    client: ApiClient,
    biometrics: Arc<BiometricGuard>,
    fsm: Mutex<SessionMachine>,
    user: RwLock<Option<User>>,
    biometric_config: RwLock<BiometricAuthConfig>,
    mfa_required: AtomicBool,
    state_callback: Mutex<Option<SessionStateCallback>>,
}

impl AuthService {
    pub fn new(client: ApiClient, biometrics: Arc<BiometricGuard>) -> Self {
        Self {
            client,
            biometrics,
            fsm: Mutex::new(SessionMachine::new()),
            user: RwLock::new(None),
            biometric_config: RwLock::new(BiometricAuthConfig::default()),
            mfa_required: AtomicBool::new(false),
            state_callback: Mutex::new(None),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Set a callback to be notified of session state changes.
    pub fn set_state_callback(&self, callback: SessionStateCallback) {
        *self.state_callback.lock() = Some(callback);
    }

    pub fn state(&self) -> SessionState {
        SessionState::from(self.fsm.lock().state())
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    pub fn current_user(&self) -> Option<User> {
        self.user.read().clone()
    }

    pub fn mfa_required(&self) -> bool {
        self.mfa_required.load(Ordering::SeqCst)
    }

    /// Biometric settings as of the last load.
    pub fn biometric_config(&self) -> BiometricAuthConfig {
        self.biometric_config.read().clone()
    }

    pub fn has_permission(&self, resource: &str, action: &str) -> bool {
        self.user
            .read()
            .as_ref()
            .is_some_and(|u| u.has_permission(resource, action))
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.user.read().as_ref().is_some_and(|u| u.has_role(name))
    }

    /// Transition the FSM and notify the callback if the state changed.
    fn transition(&self, input: &SessionMachineInput) -> AuthResult<SessionState> {
        let mut fsm = self.fsm.lock();
        let old_state = SessionState::from(fsm.state());

        fsm.consume(input).map_err(|_| {
            AuthError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input, old_state
            ))
        })?;

        let new_state = SessionState::from(fsm.state());
        drop(fsm);

        if old_state != new_state {
            debug!(
                old_state = ?old_state,
                new_state = ?new_state,
                "Session state transition"
            );
            self.notify_state_change(new_state);
        }

        Ok(new_state)
    }

    fn notify_state_change(&self, state: SessionState) {
        let cb = self.state_callback.lock();
        if let Some(callback) = cb.as_ref() {
            callback(SessionStateChanged {
                state,
                user_id: self.user.read().as_ref().map(|u| u.id.clone()),
            });
        }
    }

    fn fail_login(&self) {
        if let Err(e) = self.transition(&SessionMachineInput::LoginFailed) {
            warn!(error = %e, "Could not record failed login");
        }
    }

    /// Drop the in-memory session after the engine gave up on refreshing.
    fn expire_session(&self) {
        *self.user.write() = None;
        if self.state() == SessionState::Authenticated {
            if let Err(e) = self.transition(&SessionMachineInput::SessionExpired) {
                warn!(error = %e, "Could not record session expiry");
            }
        }
    }

    /// Map an error from a call made with the session's token.
    fn session_error(&self, err: ClientError) -> AuthError {
        match err {
            ClientError::AuthenticationFailed(reason) => {
                warn!(reason = %reason, "Session expired");
                self.expire_session();
                AuthError::SessionExpired
            }
            other => AuthError::Client(other),
        }
    }

    async fn reload_biometric_config(&self) {
        match self.biometrics.biometric_config().await {
            Ok(config) => *self.biometric_config.write() = config,
            Err(e) => warn!(error = %e, "Failed to load biometric config"),
        }
    }

    async fn exchange<B: Serialize>(&self, path: &str, body: &B) -> AuthResult<AuthResponse> {
        let body = serde_json::to_value(body)?;
        let response = self
            .client
            .post::<AuthResponse>(path, Some(body), credential_exchange())
            .await
            .map_err(rejected)?;
        Ok(response.data)
    }

    /// Persist the issued session and remember the user.
    fn establish(&self, response: AuthResponse) -> AuthResult<(User, TokenPair)> {
        let (Some(user), Some(tokens)) = (response.user, response.tokens) else {
            return Err(AuthError::InvalidResponse(
                "expected user and tokens".to_string(),
            ));
        };

        self.client.store_session(&tokens)?;
        *self.user.write() = Some(user.clone());
        self.mfa_required.store(false, Ordering::SeqCst);
        Ok((user, tokens))
    }

    /// Credential exchange that always yields a session (no MFA step).
    async fn sign_in<B: Serialize>(&self, path: &str, body: &B) -> AuthResult<User> {
        self.transition(&SessionMachineInput::LoginAttempt)?;

        let result = async {
            let response = self.exchange(path, body).await?;
            self.establish(response)
        }
        .await;

        match result {
            Ok((user, _)) => {
                self.transition(&SessionMachineInput::LoginSucceeded)?;
                info!(user_id = %user.id, path = %path, "Signed in");
                Ok(user)
            }
            Err(e) => {
                self.fail_login();
                Err(e)
            }
        }
    }

    /// Restore the stored session, if any.
    ///
    /// Loads biometric settings (disabling them if enrollment changed),
    /// refreshes an expired access token, then fetches the profile.
    pub async fn initialize(&self) -> AuthResult<SessionState> {
        self.transition(&SessionMachineInput::Initialize)?;

        match self.biometrics.check_biometric_changes().await {
            Ok(true) => info!("Biometric enrollment changed, biometric sign-in disabled"),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "Biometric change check failed"),
        }
        self.reload_biometric_config().await;

        match self.restore_session().await {
            Ok(Some(user)) => {
                info!(user_id = %user.id, "Session restored");
                *self.user.write() = Some(user);
                self.transition(&SessionMachineInput::SessionRestored)
            }
            Ok(None) => self.transition(&SessionMachineInput::NoSession),
            Err(e) => {
                warn!(error = %e, "Session restore failed");
                self.transition(&SessionMachineInput::NoSession)?;
                Err(e)
            }
        }
    }

    async fn restore_session(&self) -> AuthResult<Option<User>> {
        let tokens = self.client.token_store();
        if tokens.get_tokens()?.is_none() {
            debug!("No stored session");
            return Ok(None);
        }

        if !tokens.has_valid_tokens()? {
            debug!("Stored access token expired or expiring, refreshing");
            if let Err(e) = self.client.refresh_access_token().await {
                warn!(error = %e, "Stored session could not be refreshed");
                return Ok(None);
            }
        }

        match self.client.get::<User>(PROFILE_PATH, session_call()).await {
            Ok(profile) => Ok(Some(profile.data)),
            Err(ClientError::AuthenticationFailed(reason)) => {
                warn!(reason = %reason, "Stored session rejected");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Password login.
    ///
    /// When the account has a second factor the session moves to
    /// `MfaPending` and nothing is stored until [`AuthService::verify_mfa`].
    pub async fn login(&self, credentials: &LoginCredentials) -> AuthResult<LoginOutcome> {
        self.transition(&SessionMachineInput::LoginAttempt)?;
        debug!(email = %credentials.email, "Attempting password login");

        let response = match self.exchange(LOGIN_PATH, credentials).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Login failed");
                self.fail_login();
                return Err(e);
            }
        };

        if response.mfa_required {
            self.mfa_required.store(true, Ordering::SeqCst);
            self.transition(&SessionMachineInput::MfaRequired)?;
            info!(email = %credentials.email, "Second factor required");
            return Ok(LoginOutcome::MfaRequired);
        }

        let (user, tokens) = match self.establish(response) {
            Ok(session) => session,
            Err(e) => {
                self.fail_login();
                return Err(e);
            }
        };

        let biometrics_enabled = self.biometric_config.read().is_enabled;
        if credentials.remember_me && biometrics_enabled {
            let credential = BiometricCredential {
                email: credentials.email.clone(),
                access_token: tokens.access_token.clone(),
            };
            if let Err(e) = self.biometrics.update_biometric_credentials(&credential).await {
                warn!(error = %e, "Failed to update biometric credentials");
            }
        }

        self.transition(&SessionMachineInput::LoginSucceeded)?;
        info!(user_id = %user.id, "Login successful");
        Ok(LoginOutcome::Authenticated(user))
    }

    pub async fn register(&self, data: &RegisterData) -> AuthResult<User> {
        self.sign_in(REGISTER_PATH, data).await
    }

    /// Sign out. The server call is best-effort; local state is always cleared.
    pub async fn logout(&self) -> AuthResult<()> {
        if let Err(e) = self.transition(&SessionMachineInput::LogoutRequested) {
            debug!(error = %e, "Logout outside an active session");
        }

        if let Err(e) = self
            .client
            .post::<Value>(
                LOGOUT_PATH,
                None,
                RequestOptions::without_refresh().without_queue(),
            )
            .await
        {
            warn!(error = %e, "Logout request failed");
        }

        let cleared = self.client.clear_session();
        *self.user.write() = None;
        self.mfa_required.store(false, Ordering::SeqCst);

        if self.state() == SessionState::LoggingOut {
            self.transition(&SessionMachineInput::LogoutComplete)?;
        }
        cleared?;

        info!("Logged out");
        Ok(())
    }

    /// Refresh the access token through the engine's shared refresh.
    pub async fn refresh_auth(&self) -> AuthResult<()> {
        self.client
            .refresh_access_token()
            .await
            .map_err(|e| self.session_error(e))?;
        Ok(())
    }

    /// Request a password reset email.
    pub async fn reset_password(&self, email: &str) -> AuthResult<()> {
        self.client
            .post::<Value>(
                RESET_PASSWORD_PATH,
                Some(json!({ "email": email })),
                credential_exchange(),
            )
            .await?;
        info!(email = %email, "Password reset requested");
        Ok(())
    }

    /// Complete a reset with the emailed token. Signs the user in.
    pub async fn confirm_reset_password(&self, confirm: &ResetPasswordConfirm) -> AuthResult<User> {
        self.sign_in(CONFIRM_RESET_PATH, confirm).await
    }

    pub async fn change_password(&self, request: &ChangePasswordRequest) -> AuthResult<()> {
        let body = serde_json::to_value(request)?;
        self.client
            .post::<Value>(CHANGE_PASSWORD_PATH, Some(body), session_call())
            .await
            .map_err(|e| self.session_error(e))?;
        info!("Password changed");
        Ok(())
    }

    pub async fn setup_mfa(&self) -> AuthResult<MfaSetup> {
        if !self.is_authenticated() {
            return Err(AuthError::NotLoggedIn);
        }
        let response = self
            .client
            .post::<MfaSetup>(MFA_SETUP_PATH, None, session_call())
            .await
            .map_err(|e| self.session_error(e))?;
        Ok(response.data)
    }

    /// Submit a second-factor code, either to finish a pending login or to
    /// confirm enrollment from an active session.
    pub async fn verify_mfa(&self, verification: &MfaVerification) -> AuthResult<User> {
        let options = match self.state() {
            SessionState::MfaPending => RequestOptions::without_refresh().without_queue(),
            SessionState::Authenticated => session_call(),
            other => {
                return Err(AuthError::InvalidStateTransition(format!(
                    "Cannot verify MFA in state {:?}",
                    other
                )))
            }
        };

        let body = serde_json::to_value(verification)?;
        let response = self
            .client
            .post::<AuthResponse>(MFA_VERIFY_PATH, Some(body), options)
            .await
            .map_err(rejected)?;

        let (user, _) = self.establish(response.data)?;
        self.transition(&SessionMachineInput::MfaVerified)?;
        info!(user_id = %user.id, "Second factor verified");
        Ok(user)
    }

    /// Remove the second factor and return the updated profile.
    pub async fn disable_mfa(&self, code: &str) -> AuthResult<User> {
        self.client
            .post::<Value>(MFA_DISABLE_PATH, Some(json!({ "code": code })), session_call())
            .await
            .map_err(|e| self.session_error(e))?;

        let profile = self
            .client
            .get::<User>(PROFILE_PATH, session_call())
            .await
            .map_err(|e| self.session_error(e))?;
        *self.user.write() = Some(profile.data.clone());
        info!("Second factor disabled");
        Ok(profile.data)
    }

    /// Cache the current session's credential behind a biometric gate.
    pub async fn enable_biometric_auth(&self) -> AuthResult<BiometricAuthConfig> {
        let email = self
            .current_user()
            .map(|u| u.email)
            .ok_or(AuthError::NotLoggedIn)?;
        let access_token = self
            .client
            .token_store()
            .get_access_token()?
            .ok_or(AuthError::NotLoggedIn)?;

        self.biometrics
            .enable_biometric_auth(&BiometricCredential {
                email,
                access_token,
            })
            .await?;
        self.reload_biometric_config().await;
        Ok(self.biometric_config())
    }

    pub async fn disable_biometric_auth(&self) -> AuthResult<BiometricAuthConfig> {
        self.biometrics.disable_biometric_auth().await?;
        self.reload_biometric_config().await;
        Ok(self.biometric_config())
    }

    /// Sign in with the biometric-gated credential.
    pub async fn authenticate_with_biometrics(&self) -> AuthResult<User> {
        self.transition(&SessionMachineInput::LoginAttempt)?;

        let result = async {
            let credential = self
                .biometrics
                .biometric_credentials()
                .await?
                .ok_or(AuthError::BiometricFailed)?;

            let options = credential_exchange()
                .with_header("Authorization", format!("Bearer {}", credential.access_token));
            let profile = self
                .client
                .get::<User>(PROFILE_PATH, options)
                .await
                .map_err(rejected)?;
            Ok::<_, AuthError>(profile.data)
        }
        .await;

        match result {
            Ok(user) => {
                *self.user.write() = Some(user.clone());
                self.transition(&SessionMachineInput::LoginSucceeded)?;
                info!(user_id = %user.id, "Biometric sign-in successful");
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "Biometric sign-in failed");
                self.fail_login();
                Err(e)
            }
        }
    }
}
