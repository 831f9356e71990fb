//! Config serialization to TOML
//!
//! Single source of truth for config file format.

use super::{Config, DEFAULT_COLLECTOR_URL};

impl Config {
    /// Render the config as a commented TOML file
    pub fn to_toml(&self) -> String {
        let mut out = String::new();

        out.push_str("# firepower-tracker configuration\n");
        out.push_str("# Environment variables override these values:\n");
        out.push_str("#   FIREPOWER_STATE_PATH, FIREPOWER_COLLECTOR_URL, FIREPOWER_PAGE_URL\n\n");

        out.push_str("# Where session state is kept between runs\n");
        out.push_str(&format!(
            "state_path = {}\n\n",
            quote(&self.state_path.display().to_string())
        ));

        out.push_str(&self.collector_to_toml());
        out.push_str(&self.tracker_to_toml());
        out.push_str(&self.page_to_toml());
        out.push_str(&self.logging_to_toml());
        out
    }

    fn collector_to_toml(&self) -> String {
        let c = &self.collector;
        let mut out = String::from("[collector]\n");
        out.push_str(&format!(
            "# Endpoints /webhook, /session_replay and /session_profile live under this URL\n# (default: {})\n",
            DEFAULT_COLLECTOR_URL
        ));
        out.push_str(&format!("base_url = {}\n", quote(&c.base_url)));
        out.push_str("# Request timeout in seconds, 0 = wait indefinitely\n");
        out.push_str(&format!("timeout_secs = {}\n", c.timeout_secs));
        out.push_str("# Grace period for background deliveries and unload beacons before exit\n");
        out.push_str(&format!("beacon_wait_secs = {}\n\n", c.beacon_wait_secs));
        out
    }

    fn tracker_to_toml(&self) -> String {
        let t = &self.tracker;
        let mut out = String::from("[tracker]\n");
        out.push_str("# Timeline length that triggers the one-shot session replay\n");
        out.push_str(&format!("replay_threshold = {}\n", t.replay_threshold));
        out.push_str("# Minimum seconds between profile pushes\n");
        out.push_str(&format!(
            "profile_cooldown_secs = {}\n\n",
            t.profile_cooldown_secs
        ));
        out
    }

    fn page_to_toml(&self) -> String {
        let p = &self.page;
        let mut out = String::from("[page]\n");
        out.push_str("# Page URL; utm_source, utm_campaign and fbclid come from its query\n");
        out.push_str(&format!("url = {}\n", quote(&p.url)));
        out.push_str(&format!("user_agent = {}\n", quote(&p.user_agent)));
        out.push_str(&format!("language = {}\n", quote(&p.language)));
        out.push_str(&format!("platform = {}\n", quote(&p.platform)));
        out.push_str(&format!("screen_width = {}\n", p.screen_width));
        out.push_str(&format!("screen_height = {}\n", p.screen_height));
        match &p.connection_type {
            Some(connection) => {
                out.push_str(&format!("connection_type = {}\n\n", quote(connection)))
            }
            None => out.push_str("# connection_type = \"4g\"\n\n"),
        }
        out
    }

    fn logging_to_toml(&self) -> String {
        let l = &self.logging;
        let mut out = String::from("[logging]\n");
        out.push_str("# RUST_LOG overrides this level\n");
        out.push_str(&format!("level = {}\n", quote(&l.level)));
        out.push_str(&format!("file_enabled = {}\n", l.file_enabled));
        out.push_str(&format!(
            "file_dir = {}\n",
            quote(&l.file_dir.display().to_string())
        ));
        out.push_str("# hourly, daily or never\n");
        out.push_str(&format!(
            "file_rotation = {}\n",
            quote(l.file_rotation.as_str())
        ));
        out.push_str(&format!("file_prefix = {}\n", quote(&l.file_prefix)));
        out
    }
}

/// TOML basic string with escapes
fn quote(value: &str) -> String {
    toml::Value::String(value.to_string()).to_string()
}
