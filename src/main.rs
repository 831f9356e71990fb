// Firepower Tracker - session and event tracking for the Firepower landing page
//
// Each invocation is one page interaction. Tracker state (session id,
// timeline, pending retry queue, behavioral profile) persists in a JSON
// state file between invocations, the way the browser keeps it in
// localStorage, and events are delivered to a remote webhook collector.
//
// Architecture:
// - Store: Key-value session storage (JSON file or in-memory)
// - Collector: HTTP delivery to /webhook, /session_replay, /session_profile
// - Tracker: Session, timeline, replay, retry queue, profile, scroll, unload
// - CLI (clap): One subcommand per page interaction

mod cli;
mod collector;
mod config;
mod store;
mod tracker;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use collector::HttpCollector;
use config::{Config, LogRotation, LoggingConfig};
use std::sync::Arc;
use std::time::Duration;
use store::{FileStore, MemoryStore, SessionStore};
use tracker::Tracker;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config commands don't need a tracker
    if let Commands::Config { show, reset, path } = cli.command {
        cli::handle_config(show, reset, path);
        return Ok(());
    }

    // Ensure config file exists (creates default on first run)
    Config::ensure_config_exists();

    let config = Config::from_env();

    // The guard must be kept alive for the duration of the program to ensure logs flush
    let _file_guard = init_logging(&config.logging);

    let store: Arc<dyn SessionStore> = if cli.ephemeral {
        tracing::debug!("Using in-memory state");
        Arc::new(MemoryStore::new())
    } else {
        let store = FileStore::open(&config.state_path).with_context(|| {
            format!("Failed to open state file {}", config.state_path.display())
        })?;
        tracing::debug!("State file: {}", store.path().display());
        Arc::new(store)
    };

    let collector = Arc::new(
        HttpCollector::new(&config.collector).context("Failed to build collector client")?,
    );

    let tracker = Tracker::new(
        store,
        collector.clone(),
        config.page.to_context(cli.url),
        config.tracker.settings(),
    );

    cli::run(cli.command, &tracker).await?;

    // Profile, replay and drain tasks plus unload beacons are not awaited by
    // the commands, but the process must outlive them
    let grace = Duration::from_secs(config.collector.beacon_wait_secs);
    tracker.wait_for_background(grace).await;
    let outstanding = collector.wait_for_beacons(grace).await;
    tracing::debug!("Flushed {} beacon(s) before exit", outstanding);

    Ok(())
}

/// Initialize tracing: stderr output plus optional rotating JSON log files
///
/// Precedence: RUST_LOG env var > config file > default "info".
/// Logs go to stderr so command output on stdout stays clean.
fn init_logging(logging: &LoggingConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let default_filter = format!("firepower_tracker={}", logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if !logging.file_enabled {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .init();
        return None;
    }

    // Create log directory if it doesn't exist
    if let Err(e) = std::fs::create_dir_all(&logging.file_dir) {
        eprintln!(
            "Warning: Could not create log directory {:?}: {}",
            logging.file_dir, e
        );
        // Fall back to stderr-only logging
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .init();
        return None;
    }

    let file_appender = match logging.file_rotation {
        LogRotation::Hourly => {
            tracing_appender::rolling::hourly(&logging.file_dir, &logging.file_prefix)
        }
        LogRotation::Daily => {
            tracing_appender::rolling::daily(&logging.file_dir, &logging.file_prefix)
        }
        LogRotation::Never => {
            tracing_appender::rolling::never(&logging.file_dir, &logging.file_prefix)
        }
    };

    // Wrap in non-blocking writer (writes happen in background thread)
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // File layer uses JSON format for structured log parsing
    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .init();

    Some(guard)
}
