//! Authentication commands.

use crate::app::ClientApp;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use auth_session::{LoginCredentials, LoginOutcome, MfaVerification, SessionState};
use serde_json::json;
use std::io::{self, Write};
use tracing::warn;

/// Restore any stored session; failures leave the service unauthenticated.
async fn restore(app: &ClientApp) -> SessionState {
    match app.auth.initialize().await {
        Ok(state) => state,
        Err(e) => {
            warn!(error = %e, "Could not restore session");
            app.auth.state()
        }
    }
}

fn prompt_line(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Login with email and password.
pub async fn login(
    app: &ClientApp,
    email: &str,
    password: Option<String>,
    mfa_code: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => rpassword::prompt_password("Password: ")?,
    };
    if password.is_empty() {
        anyhow::bail!("Password is required");
    }

    restore(app).await;

    let user = match app
        .auth
        .login(&LoginCredentials::new(email, password))
        .await?
    {
        LoginOutcome::Authenticated(user) => user,
        LoginOutcome::MfaRequired => {
            let code = match mfa_code {
                Some(code) => code,
                None => prompt_line("Verification code")?,
            };
            if code.is_empty() {
                anyhow::bail!("Verification code is required");
            }
            app.auth
                .verify_mfa(&MfaVerification {
                    code,
                    backup_code: None,
                })
                .await?
        }
    };

    output::print_success(&format!("Logged in as {}", user.email), format);
    Ok(())
}

/// Logout and clear the stored session.
pub async fn logout(app: &ClientApp, format: &OutputFormat) -> Result<()> {
    restore(app).await;
    app.auth.logout().await?;
    output::print_success("Logged out", format);
    Ok(())
}

/// Show the restored session state.
pub async fn status(app: &ClientApp, format: &OutputFormat) -> Result<()> {
    let state = restore(app).await;
    let user = app.auth.current_user();

    match format {
        OutputFormat::Json => output::print_json(&json!({
            "state": state,
            "authenticated": state.is_authenticated(),
            "user": user,
            "queued": app.client.offline_queue_len(),
        })),
        OutputFormat::Text => {
            output::print_heading("Session");
            output::print_row("State", &format!("{:?}", state));
            if let Some(user) = &user {
                output::print_row("User", &format!("{} {}", user.first_name, user.last_name));
                output::print_row("Email", &user.email);
                output::print_row("Role", &user.role.name);
            }
            output::print_row("Queued", &app.client.offline_queue_len().to_string());
        }
    }
    Ok(())
}
