// CLI module - command-line argument parsing and handlers
//
// Each tracking subcommand is one page interaction: it runs against the
// persisted state file, talks to the collector, and exits. Sequencing
// several invocations reproduces a visit:
//
//   firepower-tracker --url 'https://site/?utm_source=fb' page-load
//   firepower-tracker scroll 900 900 3600
//   firepower-tracker purchase premium buy-premium "Quero agora"
//   firepower-tracker unload
//
// The config subcommand manages the config file:
// - config --show: Display effective configuration
// - config --reset: Regenerate config file with defaults
// - config --path: Show config file path

use crate::collector::{Delivered, DeliveryError};
use crate::config::{Config, VERSION};
use crate::tracker::events;
use crate::tracker::scroll::ScrollPosition;
use crate::tracker::Tracker;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use std::io::Write;

/// Firepower tracker - session and event tracking for the landing page
#[derive(Parser)]
#[command(name = "firepower-tracker")]
#[command(version = VERSION)]
#[command(about = "Session and event tracker for the Firepower landing page", long_about = None)]
pub struct Cli {
    /// Page URL for this interaction (its query supplies UTM parameters)
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Keep state in memory only; nothing is read from or written to disk
    #[arg(long, global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Page load: record a page view and retry queued events
    PageLoad,

    /// Record an arbitrary event
    Event {
        /// Event name, e.g. click_cta or view_offer_section
        name: String,

        /// Attribute as key=value; values that parse as JSON are kept typed
        #[arg(long = "attr", value_parser = parse_attr)]
        attrs: Vec<(String, Value)>,
    },

    /// Record a click on an interactive element
    Click {
        /// Element id
        id: String,
        /// Visible label
        text: String,
    },

    /// Record a purchase click for a pricing plan
    Purchase {
        plan: String,
        button_id: String,
        button_text: String,
    },

    /// Report a scroll position (pixels)
    Scroll {
        scroll_y: f64,
        viewport_height: f64,
        document_height: f64,
    },

    /// Page teardown: flush the session summary
    Unload,

    /// Retry queued events
    Flush,

    /// Send the session replay now, if it has not gone out yet
    Replay,

    /// Print stored tracker state as JSON
    Status,

    /// Clear all tracker state; the next event starts a new session
    Reset,

    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Reset config file to defaults
        #[arg(long)]
        reset: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

/// Parse `key=value`, keeping JSON-typed values (numbers, bools, objects)
fn parse_attr(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {:?}", raw))?;
    if key.is_empty() {
        return Err("attribute key cannot be empty".to_string());
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// Run a tracking command against the tracker
pub async fn run(command: Commands, tracker: &Tracker) -> Result<()> {
    match command {
        Commands::PageLoad => report(events::PAGE_VIEW, tracker.initialize().await),
        Commands::Event { name, attrs } => {
            let attributes: Map<String, Value> = attrs.into_iter().collect();
            report(&name, tracker.record_event(&name, attributes).await);
        }
        Commands::Click { id, text } => report(
            events::LAST_BUTTON_CLICKED,
            tracker.track_last_button_clicked(&id, &text).await,
        ),
        Commands::Purchase {
            plan,
            button_id,
            button_text,
        } => report(
            events::PURCHASE_CLICK,
            tracker
                .track_purchase_click(&plan, &button_id, &button_text)
                .await,
        ),
        Commands::Scroll {
            scroll_y,
            viewport_height,
            document_height,
        } => {
            let crossed = tracker
                .on_scroll(ScrollPosition {
                    scroll_y,
                    viewport_height,
                    document_height,
                })
                .await;
            if crossed.is_empty() {
                println!("no new scroll thresholds");
            } else {
                println!("reached: {:?}", crossed);
            }
        }
        Commands::Unload => match tracker.on_unload().await {
            Some(summary) => println!(
                "session lasted {} ({} beacon(s) queued)",
                summary.duration_formatted, summary.beacons_queued
            ),
            None => println!("no session to close"),
        },
        Commands::Flush => {
            let drain = tracker.send_pending_events().await;
            println!(
                "pending: {} delivered, {} remaining",
                drain.delivered, drain.remaining
            );
        }
        Commands::Replay => match tracker.send_session_replay().await {
            Some(outcome) => report("session replay", outcome),
            None => println!("session replay: nothing to send"),
        },
        Commands::Status => {
            let snapshot = tracker.snapshot();
            let json =
                serde_json::to_string_pretty(&snapshot).context("Failed to encode state")?;
            println!("{}", json);
        }
        Commands::Reset => {
            tracker.reset().context("Failed to clear tracker state")?;
            println!("tracker state cleared");
        }
        Commands::Config { show, reset, path } => handle_config(show, reset, path),
    }
    Ok(())
}

fn report(what: &str, outcome: Result<Delivered, DeliveryError>) {
    match outcome {
        Ok(delivered) => println!("{}: delivered (HTTP {})", what, delivered.status),
        Err(e) => println!("{}: queued for retry ({})", what, e),
    }
}

/// Handle `config` flags
pub fn handle_config(show: bool, reset: bool, path: bool) {
    if path {
        handle_config_path();
    } else if show {
        handle_config_show();
    } else if reset {
        handle_config_reset();
    } else {
        // No flag provided, show help
        println!("Usage: firepower-tracker config [--show|--reset|--path]");
        println!();
        println!("Options:");
        println!("  --show    Display effective configuration");
        println!("  --reset   Reset config file to defaults");
        println!("  --path    Show config file path");
    }
}

fn handle_config_path() {
    match Config::config_path() {
        Some(path) => println!("{}", path.display()),
        None => {
            eprintln!("Error: Could not determine config path");
            std::process::exit(1);
        }
    }
}

fn handle_config_show() {
    let config = Config::from_env();

    println!("# Effective configuration (env > file > defaults)");
    println!();
    print!("{}", config.to_toml());

    // Show source info
    println!();
    if let Some(path) = Config::config_path() {
        if path.exists() {
            println!("# Source: {}", path.display());
        } else {
            println!("# Source: defaults (no config file)");
        }
    }
}

fn handle_config_reset() {
    let Some(path) = Config::config_path() else {
        eprintln!("Error: Could not determine config path");
        std::process::exit(1);
    };

    // Confirm if file exists
    if path.exists() {
        eprint!(
            "Config file exists at {}. Overwrite? [y/N] ",
            path.display()
        );
        let _ = std::io::stderr().flush();

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input).is_err()
            || !input.trim().eq_ignore_ascii_case("y")
        {
            println!("Aborted.");
            return;
        }
    }

    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!("Error creating directory: {}", e);
            std::process::exit(1);
        }
    }

    // Write the default config (using Config's single source of truth)
    if let Err(e) = std::fs::write(&path, Config::default().to_toml()) {
        eprintln!("Error writing config: {}", e);
        std::process::exit(1);
    }

    println!("Config reset to defaults: {}", path.display());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_attr_typed_and_plain() {
        assert_eq!(
            parse_attr("plan=premium").unwrap(),
            ("plan".to_string(), Value::String("premium".to_string()))
        );
        assert_eq!(
            parse_attr("depth=75").unwrap(),
            ("depth".to_string(), Value::from(75))
        );
        assert_eq!(
            parse_attr("note=a=b").unwrap(),
            ("note".to_string(), Value::String("a=b".to_string()))
        );
        assert!(parse_attr("novalue").is_err());
        assert!(parse_attr("=x").is_err());
    }

    #[test]
    fn test_cli_parses_event_with_attrs() {
        let cli = Cli::try_parse_from([
            "firepower-tracker",
            "--url",
            "https://site.example/?utm_source=fb",
            "event",
            "view_offer_section",
            "--attr",
            "section=pricing",
            "--attr",
            "visible=true",
        ])
        .unwrap();

        assert_eq!(cli.url.as_deref(), Some("https://site.example/?utm_source=fb"));
        match cli.command {
            Commands::Event { name, attrs } => {
                assert_eq!(name, "view_offer_section");
                assert_eq!(attrs.len(), 2);
                assert_eq!(attrs[1], ("visible".to_string(), Value::Bool(true)));
            }
            _ => panic!("Expected Event command"),
        }
    }

    #[test]
    fn test_cli_parses_scroll() {
        let cli =
            Cli::try_parse_from(["firepower-tracker", "--ephemeral", "scroll", "0", "800", "3200"])
                .unwrap();
        assert!(cli.ephemeral);
        assert!(matches!(
            cli.command,
            Commands::Scroll {
                document_height, ..
            } if document_height == 3200.0
        ));
    }
}
