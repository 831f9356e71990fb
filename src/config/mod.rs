//! Configuration for the tracker
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority)
//! 2. Config file (~/.config/firepower/config.toml)
//! 3. Built-in defaults (lowest priority)

use serde::Deserialize;
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Submodules
// ─────────────────────────────────────────────────────────────────────────────

mod logging;
mod sections;
mod serialization;

#[cfg(test)]
mod tests;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports
// ─────────────────────────────────────────────────────────────────────────────

pub use logging::{FileLogging, LogRotation, LoggingConfig};
pub use sections::{
    CollectorConfig, FileCollector, FilePage, FileTracker, PageConfig, TrackerConfig,
    DEFAULT_COLLECTOR_URL,
};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Where tracker state is persisted between invocations
    pub state_path: PathBuf,

    /// Remote collector settings
    pub collector: CollectorConfig,

    /// Replay and profile tunables
    pub tracker: TrackerConfig,

    /// Page and browser context reported with events
    pub page: PageConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_path: Self::default_state_path(),
            collector: CollectorConfig::default(),
            tracker: TrackerConfig::default(),
            page: PageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Configuration (deserialization layer)
// ─────────────────────────────────────────────────────────────────────────────

/// Config file structure
#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileConfig {
    pub state_path: Option<String>,

    /// Optional [collector] section
    pub collector: Option<FileCollector>,

    /// Optional [tracker] section
    pub tracker: Option<FileTracker>,

    /// Optional [page] section
    pub page: Option<FilePage>,

    /// Optional [logging] section
    pub logging: Option<FileLogging>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Loading
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Get the config file path: ~/.config/firepower/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("firepower").join("config.toml"))
    }

    /// Default state file: next to the config file, or the working
    /// directory when there is no home directory
    fn default_state_path() -> PathBuf {
        dirs::home_dir()
            .map(|p| p.join(".config").join("firepower").join("state.json"))
            .unwrap_or_else(|| PathBuf::from("./firepower-state.json"))
    }

    /// Create config file with defaults if it doesn't exist
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };

        // Don't overwrite existing config
        if path.exists() {
            return;
        }

        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return; // Silently fail - config is optional
            }
        }

        // Write config (ignore errors - config is optional)
        let _ = std::fs::write(&path, Self::default().to_toml());
    }

    /// Load file config if it exists
    ///
    /// # Panics
    /// Exits the process if the config file exists but cannot be read or
    /// parsed. A broken config should fail fast, not silently fall back to
    /// defaults.
    fn load_file_config() -> FileConfig {
        let Some(path) = Self::config_path() else {
            return FileConfig::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("\nCONFIG ERROR - Failed to parse configuration file\n");
                    eprintln!("  File: {}\n", path.display());
                    eprintln!("  Error: {}\n", e);
                    eprintln!("  To reset, run: firepower-tracker config --reset\n");
                    std::process::exit(1);
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FileConfig::default(),
            Err(e) => {
                eprintln!("\nCONFIG ERROR - Cannot read configuration file\n");
                eprintln!("  File: {}\n", path.display());
                eprintln!("  Error: {}\n", e);
                std::process::exit(1);
            }
        }
    }

    /// Load configuration: env vars -> file -> defaults
    pub fn from_env() -> Self {
        let file = Self::load_file_config();
        Self::resolve(file, |name| std::env::var(name).ok())
    }

    /// Merge a parsed config file with environment overrides
    pub(crate) fn resolve(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        // State path: env > file > default
        let state_path = env("FIREPOWER_STATE_PATH")
            .or(file.state_path)
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_state_path);

        let mut collector = CollectorConfig::from_file(file.collector);
        if let Some(url) = env("FIREPOWER_COLLECTOR_URL") {
            collector.base_url = url;
        }

        let mut page = PageConfig::from_file(file.page);
        if let Some(url) = env("FIREPOWER_PAGE_URL") {
            page.url = url;
        }

        Self {
            state_path,
            collector,
            tracker: TrackerConfig::from_file(file.tracker),
            page,
            logging: LoggingConfig::from_file(file.logging),
        }
    }
}
