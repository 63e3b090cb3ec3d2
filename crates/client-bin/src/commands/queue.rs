//! Offline queue management.

use crate::app::ClientApp;
use crate::output::{self, OutputFormat};
use anyhow::Result;

pub fn queue_status(app: &ClientApp, format: &OutputFormat) -> Result<()> {
    let items = app.client.offline_queue();

    match format {
        OutputFormat::Json => output::print_json(&items),
        OutputFormat::Text => {
            output::print_heading(&format!("Offline queue ({} pending)", items.len()));
            for item in &items {
                println!(
                    "  {}  {:<6} {}  retries {}/{}  queued {}",
                    item.id,
                    item.method,
                    item.url,
                    item.retry_count,
                    item.max_retries,
                    output::format_millis(item.enqueued_at)
                );
            }
        }
    }
    Ok(())
}

pub async fn queue_drain(app: &ClientApp, format: &OutputFormat) -> Result<()> {
    if !app.client.network_state().is_connected {
        anyhow::bail!("Cannot drain the offline queue while offline");
    }

    let report = app.client.drain_offline_queue().await?;
    match format {
        OutputFormat::Json => output::print_json(&report),
        OutputFormat::Text => {
            output::print_heading("Offline queue drained");
            output::print_row("Succeeded", &report.succeeded.to_string());
            output::print_row("Requeued", &report.requeued.to_string());
            output::print_row("Dropped", &report.dropped.to_string());
            output::print_row("Remaining", &app.client.offline_queue_len().to_string());
        }
    }
    Ok(())
}

pub fn queue_clear(app: &ClientApp, format: &OutputFormat) -> Result<()> {
    let count = app.client.offline_queue_len();
    app.client.clear_offline_queue()?;
    output::print_success(&format!("Discarded {} queued request(s)", count), format);
    Ok(())
}
