//! Configuration tests
//!
//! Guard the file format: every field written by `to_toml()` must parse back
//! into the same value, and env overrides must beat the file.

use super::*;
use std::collections::HashMap;

fn parse(toml_str: &str) -> FileConfig {
    toml::from_str(toml_str).unwrap_or_else(|e| panic!("TOML:\n{}\nError: {:?}", toml_str, e))
}

fn no_env(_: &str) -> Option<String> {
    None
}

// ─────────────────────────────────────────────────────────────────────────────
// Round-trip tests
// ─────────────────────────────────────────────────────────────────────────────

/// Verify that the default template parses and resolves to the defaults
#[test]
fn test_config_roundtrip_default() {
    let config = Config::default();
    let resolved = Config::resolve(parse(&config.to_toml()), no_env);

    assert_eq!(resolved.state_path, config.state_path);
    assert_eq!(resolved.collector.base_url, DEFAULT_COLLECTOR_URL);
    assert_eq!(resolved.tracker.replay_threshold, 10);
    assert_eq!(resolved.tracker.profile_cooldown_secs, 30);
    assert_eq!(resolved.page.connection_type, None);
    assert_eq!(resolved.logging.file_rotation, LogRotation::Daily);
}

/// Every non-default value survives serialization
#[test]
fn test_config_roundtrip_customized() {
    let mut config = Config::default();
    config.state_path = PathBuf::from("/tmp/state \"quoted\".json");
    config.collector.base_url = "https://collector.example/api".to_string();
    config.collector.timeout_secs = 10;
    config.collector.beacon_wait_secs = 2;
    config.tracker.replay_threshold = 25;
    config.tracker.profile_cooldown_secs = 120;
    config.page.url = "https://shop.example/?utm_source=ig".to_string();
    config.page.language = "pt-BR".to_string();
    config.page.screen_width = 390;
    config.page.screen_height = 844;
    config.page.connection_type = Some("3g".to_string());
    config.logging.level = "debug".to_string();
    config.logging.file_enabled = true;
    config.logging.file_rotation = LogRotation::Hourly;

    let resolved = Config::resolve(parse(&config.to_toml()), no_env);

    assert_eq!(resolved.state_path, config.state_path);
    assert_eq!(resolved.collector.base_url, "https://collector.example/api");
    assert_eq!(resolved.collector.timeout_secs, 10);
    assert_eq!(resolved.collector.beacon_wait_secs, 2);
    assert_eq!(resolved.tracker.replay_threshold, 25);
    assert_eq!(resolved.tracker.profile_cooldown_secs, 120);
    assert_eq!(resolved.page.url, config.page.url);
    assert_eq!(resolved.page.language, "pt-BR");
    assert_eq!(resolved.page.screen_width, 390);
    assert_eq!(resolved.page.screen_height, 844);
    assert_eq!(resolved.page.connection_type.as_deref(), Some("3g"));
    assert_eq!(resolved.logging.level, "debug");
    assert!(resolved.logging.file_enabled);
    assert_eq!(resolved.logging.file_rotation, LogRotation::Hourly);
}

// ─────────────────────────────────────────────────────────────────────────────
// Precedence
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_env_overrides_file() {
    let file = parse(
        r#"
state_path = "/from/file.json"

[collector]
base_url = "https://file.example"

[page]
url = "https://file.example/page"
"#,
    );
    let env: HashMap<&str, &str> = [
        ("FIREPOWER_STATE_PATH", "/from/env.json"),
        ("FIREPOWER_COLLECTOR_URL", "https://env.example"),
        ("FIREPOWER_PAGE_URL", "https://env.example/?fbclid=abc"),
    ]
    .into_iter()
    .collect();

    let config = Config::resolve(file, |name| env.get(name).map(|v| v.to_string()));

    assert_eq!(config.state_path, PathBuf::from("/from/env.json"));
    assert_eq!(config.collector.base_url, "https://env.example");
    assert_eq!(config.page.url, "https://env.example/?fbclid=abc");
}

#[test]
fn test_partial_sections_keep_defaults() {
    let config = Config::resolve(
        parse(
            r#"
[tracker]
profile_cooldown_secs = 5

[logging]
file_rotation = "weekly"
"#,
        ),
        no_env,
    );

    assert_eq!(config.tracker.profile_cooldown_secs, 5);
    assert_eq!(config.tracker.replay_threshold, 10);
    assert_eq!(config.collector.beacon_wait_secs, 5);
    // Unknown rotation falls back to daily
    assert_eq!(config.logging.file_rotation, LogRotation::Daily);
    assert_eq!(
        config.tracker.settings().profile_cooldown,
        chrono::Duration::seconds(5)
    );
}

#[test]
fn test_zero_replay_threshold_clamped() {
    let config = Config::resolve(parse("[tracker]\nreplay_threshold = 0\n"), no_env);
    assert_eq!(config.tracker.replay_threshold, 1);
}

#[test]
fn test_page_context_override() {
    let page = PageConfig::default();

    let context = page.to_context(None);
    assert_eq!(context.url, page.url);
    assert_eq!(context.browser.user_agent, page.user_agent);

    let context = page.to_context(Some("https://other.example/".to_string()));
    assert_eq!(context.url, "https://other.example/");
}

#[test]
fn test_unknown_keys_ignored() {
    // Unknown keys are ignored rather than fatal
    let file: Result<FileConfig, _> = toml::from_str("mystery = 1\n[collector]\nextra = true\n");
    assert!(file.is_ok());
}
