//! Tracker configuration sections: collector, tracker, page

use crate::tracker::context::{BrowserContext, PageContext};
use crate::tracker::TrackerSettings;
use serde::Deserialize;

use super::VERSION;

/// Collector base URL used when nothing else is configured
pub const DEFAULT_COLLECTOR_URL: &str = "https://webhook-xls-production.up.railway.app/fire/power";

// ─────────────────────────────────────────────────────────────────────────────
// Collector
// ─────────────────────────────────────────────────────────────────────────────

/// Remote collector settings
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Base URL; endpoint paths are appended to it
    pub base_url: String,
    /// Per-request timeout in seconds (0 = none)
    pub timeout_secs: u64,
    /// How long to wait for background deliveries and unload beacons before exiting
    pub beacon_wait_secs: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_COLLECTOR_URL.to_string(),
            timeout_secs: 0,
            beacon_wait_secs: 5,
        }
    }
}

/// Collector settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FileCollector {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub beacon_wait_secs: Option<u64>,
}

impl CollectorConfig {
    /// Create from file config with defaults
    pub fn from_file(file: Option<FileCollector>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            base_url: file.base_url.unwrap_or(defaults.base_url),
            timeout_secs: file.timeout_secs.unwrap_or(defaults.timeout_secs),
            beacon_wait_secs: file.beacon_wait_secs.unwrap_or(defaults.beacon_wait_secs),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tracker
// ─────────────────────────────────────────────────────────────────────────────

/// Replay and profile tunables
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Timeline length that triggers the one-shot session replay
    pub replay_threshold: usize,
    /// Minimum seconds between profile pushes
    pub profile_cooldown_secs: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        let settings = TrackerSettings::default();
        Self {
            replay_threshold: settings.replay_threshold,
            profile_cooldown_secs: settings.profile_cooldown.num_seconds().unsigned_abs(),
        }
    }
}

/// Tracker settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FileTracker {
    pub replay_threshold: Option<usize>,
    pub profile_cooldown_secs: Option<u64>,
}

impl TrackerConfig {
    /// Create from file config with defaults
    pub fn from_file(file: Option<FileTracker>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            // A zero threshold would replay an empty timeline; clamp to 1
            replay_threshold: file
                .replay_threshold
                .unwrap_or(defaults.replay_threshold)
                .max(1),
            profile_cooldown_secs: file
                .profile_cooldown_secs
                .unwrap_or(defaults.profile_cooldown_secs),
        }
    }

    pub fn settings(&self) -> TrackerSettings {
        TrackerSettings {
            replay_threshold: self.replay_threshold,
            profile_cooldown: chrono::Duration::seconds(
                self.profile_cooldown_secs.min(u64::from(u32::MAX)) as i64,
            ),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Page
// ─────────────────────────────────────────────────────────────────────────────

/// Page and browser context reported with every event
#[derive(Debug, Clone)]
pub struct PageConfig {
    /// Page URL; its query string supplies UTM attribution
    pub url: String,
    pub user_agent: String,
    pub language: String,
    pub platform: String,
    pub screen_width: u32,
    pub screen_height: u32,
    /// Effective network type, e.g. "4g"
    pub connection_type: Option<String>,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000/".to_string(),
            user_agent: format!("firepower-tracker/{}", VERSION),
            language: "en-US".to_string(),
            platform: std::env::consts::OS.to_string(),
            screen_width: 1920,
            screen_height: 1080,
            connection_type: None,
        }
    }
}

/// Page settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FilePage {
    pub url: Option<String>,
    pub user_agent: Option<String>,
    pub language: Option<String>,
    pub platform: Option<String>,
    pub screen_width: Option<u32>,
    pub screen_height: Option<u32>,
    pub connection_type: Option<String>,
}

impl PageConfig {
    /// Create from file config with defaults
    pub fn from_file(file: Option<FilePage>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            url: file.url.unwrap_or(defaults.url),
            user_agent: file.user_agent.unwrap_or(defaults.user_agent),
            language: file.language.unwrap_or(defaults.language),
            platform: file.platform.unwrap_or(defaults.platform),
            screen_width: file.screen_width.unwrap_or(defaults.screen_width),
            screen_height: file.screen_height.unwrap_or(defaults.screen_height),
            connection_type: file.connection_type.or(defaults.connection_type),
        }
    }

    /// Build the page context, optionally for a different URL
    pub fn to_context(&self, url_override: Option<String>) -> PageContext {
        PageContext {
            url: url_override.unwrap_or_else(|| self.url.clone()),
            browser: BrowserContext {
                user_agent: self.user_agent.clone(),
                language: self.language.clone(),
                screen_width: self.screen_width,
                screen_height: self.screen_height,
                platform: self.platform.clone(),
                connection_type: self.connection_type.clone(),
            },
        }
    }
}
