//! Stored token inspection.

use crate::app::ClientApp;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct TokenStatus {
    has_session: bool,
    valid: bool,
    expired: bool,
    has_refresh_token: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<i64>,
}

pub fn tokens_status(app: &ClientApp, format: &OutputFormat) -> Result<()> {
    let store = app.client.token_store();
    let status = TokenStatus {
        has_session: store.get_tokens()?.is_some(),
        valid: store.has_valid_tokens()?,
        expired: store.is_token_expired()?,
        has_refresh_token: store.has_refresh_token()?,
        expires_at: store.token_expiration_time()?,
    };

    match format {
        OutputFormat::Json => output::print_json(&status),
        OutputFormat::Text => {
            output::print_heading("Tokens");
            output::print_row("Session", if status.has_session { "yes" } else { "no" });
            output::print_row("Valid", if status.valid { "yes" } else { "no" });
            output::print_row("Expired", if status.expired { "yes" } else { "no" });
            output::print_row(
                "Refresh token",
                if status.has_refresh_token { "yes" } else { "no" },
            );
            if let Some(expires_at) = status.expires_at {
                output::print_row("Expires at", &output::format_millis(expires_at));
            }
        }
    }
    Ok(())
}

pub fn tokens_clear(app: &ClientApp, format: &OutputFormat) -> Result<()> {
    app.client.clear_session()?;
    output::print_success("Tokens cleared", format);
    Ok(())
}
