//! Raw API request.

use crate::app::ClientApp;
use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use resilient_client::{ClientError, HttpMethod, RequestOptions};
use serde_json::Value;

/// Send one request through the engine and print the response data.
pub async fn request(
    app: &ClientApp,
    method: &str,
    path: &str,
    body: Option<&str>,
    skip_auth: bool,
    format: &OutputFormat,
) -> Result<()> {
    let Some(method) = HttpMethod::parse(method) else {
        anyhow::bail!("Unsupported method '{}'", method);
    };
    let body: Option<Value> = body
        .map(serde_json::from_str)
        .transpose()
        .context("--body must be valid JSON")?;

    let options = RequestOptions {
        skip_auth,
        ..RequestOptions::default()
    };

    match app.client.request::<Value>(method, path, body, options).await {
        Ok(response) => {
            match format {
                OutputFormat::Json => output::print_json(&response),
                OutputFormat::Text => output::print_json(&response.data),
            }
            Ok(())
        }
        Err(ClientError::Queued) => {
            output::print_success(
                &format!(
                    "Offline: {} {} queued ({} pending)",
                    method,
                    path,
                    app.client.offline_queue_len()
                ),
                format,
            );
            Ok(())
        }
        Err(ClientError::Http { status, body, .. }) => {
            output::print_error(&format!("HTTP {}", status), format);
            output::print_json(&body);
            anyhow::bail!("Request failed with status {}", status)
        }
        Err(e) => Err(e.into()),
    }
}
