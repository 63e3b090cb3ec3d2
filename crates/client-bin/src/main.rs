//! Resilient client CLI - issue API requests and manage the local session.

mod app;
mod commands;
mod output;

use std::path::PathBuf;

use app::ClientApp;
use clap::{Parser, Subcommand};
use client_config_and_utils::{init_logging_with_path, Config, Paths};

/// Resilient API client command-line interface.
#[derive(Parser)]
#[command(name = "resilient-client")]
#[command(about = "Resilient API client with offline queueing and token refresh")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Base directory for runtime files (config, vault, logs). Defaults to ~/.resilient-client
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send an API request
    Request {
        /// HTTP method (GET, POST, PUT, PATCH, DELETE)
        method: String,
        /// Path relative to the API base URL, or an absolute URL
        path: String,
        /// JSON request body
        #[arg(short, long)]
        body: Option<String>,
        /// Do not attach the bearer token
        #[arg(long)]
        skip_auth: bool,
        /// Treat the device as offline and queue the request
        #[arg(long)]
        offline: bool,
    },
    /// Login with email and password
    Login {
        #[arg(short, long)]
        email: String,
        /// Prompted for when omitted
        #[arg(short, long, env = "RESILIENT_CLIENT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Second-factor code, prompted for when required and omitted
        #[arg(long)]
        mfa_code: Option<String>,
    },
    /// Logout and clear the stored session
    Logout,
    /// Show session state
    Status,
    /// Inspect or clear stored tokens
    Tokens {
        #[command(subcommand)]
        command: TokenCommands,
    },
    /// Manage the offline request queue
    Queue {
        #[command(subcommand)]
        command: QueueCommands,
    },
}

#[derive(Subcommand)]
enum TokenCommands {
    /// Show token presence and expiry
    Status,
    /// Delete stored tokens
    Clear,
}

#[derive(Subcommand)]
enum QueueCommands {
    /// List queued requests
    Status,
    /// Replay queued requests now
    Drain,
    /// Discard all queued requests
    Clear,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    paths.ensure_dirs()?;
    let config = Config::load(&paths)?;

    let level = cli.log_level.unwrap_or_else(|| config.log_level.clone());
    init_logging_with_path(&level, &paths.log_file(), false)?;

    let offline = matches!(cli.command, Commands::Request { offline: true, .. });
    let app = ClientApp::open(&paths, &config, offline)?;
    let format = cli.format;

    let result = match cli.command {
        Commands::Request {
            method,
            path,
            body,
            skip_auth,
            ..
        } => commands::request(&app, &method, &path, body.as_deref(), skip_auth, &format).await,
        Commands::Login {
            email,
            password,
            mfa_code,
        } => commands::login(&app, &email, password, mfa_code, &format).await,
        Commands::Logout => commands::logout(&app, &format).await,
        Commands::Status => commands::status(&app, &format).await,
        Commands::Tokens { command } => match command {
            TokenCommands::Status => commands::tokens_status(&app, &format),
            TokenCommands::Clear => commands::tokens_clear(&app, &format),
        },
        Commands::Queue { command } => match command {
            QueueCommands::Status => commands::queue_status(&app, &format),
            QueueCommands::Drain => commands::queue_drain(&app, &format).await,
            QueueCommands::Clear => commands::queue_clear(&app, &format),
        },
    };

    if let Err(e) = result {
        output::print_error(&format!("{:#}", e), &format);
        std::process::exit(1);
    }

    Ok(())
}
