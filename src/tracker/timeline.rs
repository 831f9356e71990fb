use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One recorded event in the session timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub event_name: String,
    pub timestamp: DateTime<Utc>,
    /// The full event payload as sent to the collector
    #[serde(default)]
    pub data: Value,
}

/// Body sent to the session replay endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayPayload<'a> {
    pub session_id: &'a str,
    pub timestamp: DateTime<Utc>,
    pub timeline: &'a [TimelineEntry],
}
