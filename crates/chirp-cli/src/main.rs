//! chirp - a command-line client for the Design Twitter API.
//!
//! Logs in or signs up, keeps the session between runs, and prints
//! profile, feed and search results from the backend.

mod cli;
mod commands;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use chirp_core::{ApiClient, Config, SessionManager, StorageKind};

use cli::Cli;
use commands::CommandContext;

/// Log file name prefix inside the cache directory
const LOG_FILE_PREFIX: &str = "chirp.log";

/// Initialize the tracing subscriber for logging.
/// Returns the guard that flushes the file writer on drop.
fn init_tracing(log_dir: &Path) -> WorkerGuard {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let cache_dir = Config::cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
    if let Err(e) = std::fs::create_dir_all(&cache_dir) {
        eprintln!("Warning: could not create {}: {}", cache_dir.display(), e);
    }
    let _log_guard = init_tracing(&cache_dir);
    debug!(?cache_dir, "Cache directory configured");

    let mut config = match Config::load_file() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };
    config.apply_overrides(|name| cli.config_override(name));
    debug!(base_url = %config.base_url, storage = ?config.storage, "Config loaded");

    let passphrase = read_passphrase(config.storage, cli.passphrase.clone())?;
    let store = config.open_store(&cache_dir, passphrase.as_deref())?;

    let session = Arc::new(SessionManager::new(store));
    let restored = session.load();
    debug!(restored, "Session loaded");

    let api = ApiClient::new(&config, session).context("Failed to create API client")?;
    info!(base_url = %api.base_url(), "chirp starting");

    commands::run(
        cli.command,
        CommandContext {
            api: &api,
            config: &config,
            json: cli.json,
            password: cli.password,
        },
    )
    .await
}

/// Passphrase for the encrypted store: `--passphrase`/`CHIRP_PASSPHRASE` or a prompt
fn read_passphrase(storage: StorageKind, given: Option<String>) -> Result<Option<String>> {
    if storage != StorageKind::Encrypted {
        return Ok(None);
    }
    if given.is_some() {
        return Ok(given);
    }
    let passphrase = rpassword::prompt_password("Session passphrase: ")
        .context("Failed to read passphrase")?;
    Ok(Some(passphrase))
}
