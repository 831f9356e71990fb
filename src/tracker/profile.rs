//! Behavioral profile
//!
//! A coarse read on visitor intent, derived from how many of a handful of
//! key events have happened, how far down the page the visitor got, and how
//! long they have been on the site.
//!
//! Classification is recomputed from the counters on every update. The rules
//! are checked in order and the first match wins:
//!
//! | Label        | Condition                                                        |
//! |--------------|------------------------------------------------------------------|
//! | `impulsive`  | CTA clicked, scrolled ≤ 25%, on site < 30s                       |
//! | `analytical` | scrolled ≥ 75%, and a testimonial click or on site > 60s         |
//! | `indecisive` | offer section viewed, no purchase click, on site > 45s           |
//!
//! When nothing matches, the previous label stays.

use super::context::UtmParams;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Visitor classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileType {
    Impulsive,
    Analytical,
    Indecisive,
    #[default]
    Unknown,
}

impl std::fmt::Display for ProfileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Impulsive => write!(f, "impulsive"),
            Self::Analytical => write!(f, "analytical"),
            Self::Indecisive => write!(f, "indecisive"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Counters for the events the profile cares about
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventCounts {
    pub page_view: u32,
    pub scroll_depth_25: u32,
    pub scroll_depth_50: u32,
    pub scroll_depth_75: u32,
    pub scroll_depth_100: u32,
    pub click_cta: u32,
    pub click_compra: u32,
    pub view_offer_section: u32,
    pub testimonial_image_click: u32,
}

impl EventCounts {
    /// Bump the counter for `event_name`. Returns false for events that are
    /// not counted.
    pub fn increment(&mut self, event_name: &str) -> bool {
        let counter = match event_name {
            "page_view" => &mut self.page_view,
            "scroll_depth_25" => &mut self.scroll_depth_25,
            "scroll_depth_50" => &mut self.scroll_depth_50,
            "scroll_depth_75" => &mut self.scroll_depth_75,
            "scroll_depth_100" => &mut self.scroll_depth_100,
            "click_cta" => &mut self.click_cta,
            "click_compra" => &mut self.click_compra,
            "view_offer_section" => &mut self.view_offer_section,
            "testimonial_image_click" => &mut self.testimonial_image_click,
            _ => return false,
        };
        *counter = counter.saturating_add(1);
        true
    }
}

/// Accumulated behavior for the visitor, as stored and as sent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehavioralProfile {
    pub session_id: String,
    pub first_visit: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
    pub profile_type: ProfileType,
    pub event_counts: EventCounts,
    /// Seconds since the session started, as of `last_update`
    pub time_on_site: f64,
    /// Deepest scroll threshold seen, in percent
    pub max_scroll_depth: u32,
    #[serde(rename = "utm_source", default)]
    pub utm_source: String,
    #[serde(rename = "utm_campaign", default)]
    pub utm_campaign: String,
    #[serde(rename = "fbclid", default)]
    pub fbclid: String,
}

impl BehavioralProfile {
    /// Fresh profile; attribution is whatever the first event carried
    pub fn new(session_id: String, utm: UtmParams, now: DateTime<Utc>) -> Self {
        Self {
            session_id,
            first_visit: now,
            last_update: now,
            profile_type: ProfileType::Unknown,
            event_counts: EventCounts::default(),
            time_on_site: 0.0,
            max_scroll_depth: 0,
            utm_source: utm.utm_source,
            utm_campaign: utm.utm_campaign,
            fbclid: utm.fbclid,
        }
    }

    /// Fold one event into the profile and reclassify
    pub fn observe(&mut self, event_name: &str, time_on_site: f64, now: DateTime<Utc>) {
        self.event_counts.increment(event_name);

        if let Some(depth) = scroll_depth_of(event_name) {
            self.max_scroll_depth = self.max_scroll_depth.max(depth);
        }

        self.time_on_site = time_on_site;
        self.last_update = now;

        if let Some(profile_type) =
            classify(&self.event_counts, self.max_scroll_depth, self.time_on_site)
        {
            self.profile_type = profile_type;
        }
    }
}

/// Threshold carried by a `scroll_depth_<n>` event name
pub fn scroll_depth_of(event_name: &str) -> Option<u32> {
    event_name.strip_prefix("scroll_depth_")?.parse().ok()
}

/// Apply the classification rules. `None` means no rule matched and the
/// caller keeps its current label.
pub fn classify(
    counts: &EventCounts,
    max_scroll_depth: u32,
    time_on_site: f64,
) -> Option<ProfileType> {
    if counts.click_cta > 0 && max_scroll_depth <= 25 && time_on_site < 30.0 {
        Some(ProfileType::Impulsive)
    } else if max_scroll_depth >= 75
        && (counts.testimonial_image_click > 0 || time_on_site > 60.0)
    {
        Some(ProfileType::Analytical)
    } else if counts.view_offer_section > 0 && counts.click_compra == 0 && time_on_site > 45.0 {
        Some(ProfileType::Indecisive)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(events: &[&str]) -> EventCounts {
        let mut counts = EventCounts::default();
        for event in events {
            counts.increment(event);
        }
        counts
    }

    #[test]
    fn test_impulsive() {
        let c = counts(&["click_cta"]);
        assert_eq!(classify(&c, 20, 10.0), Some(ProfileType::Impulsive));
        // Too slow or scrolled too far
        assert_eq!(classify(&c, 20, 30.0), None);
        assert_eq!(classify(&c, 50, 10.0), None);
    }

    #[test]
    fn test_analytical() {
        let c = counts(&["testimonial_image_click"]);
        assert_eq!(classify(&c, 80, 5.0), Some(ProfileType::Analytical));

        let c = counts(&[]);
        assert_eq!(classify(&c, 75, 61.0), Some(ProfileType::Analytical));
        assert_eq!(classify(&c, 75, 60.0), None);
    }

    #[test]
    fn test_indecisive() {
        let c = counts(&["view_offer_section"]);
        assert_eq!(classify(&c, 50, 46.0), Some(ProfileType::Indecisive));

        let c = counts(&["view_offer_section", "click_compra"]);
        assert_eq!(classify(&c, 50, 46.0), None);
    }

    #[test]
    fn test_first_rule_wins() {
        // Meets both the analytical and indecisive rules
        let c = counts(&["view_offer_section", "testimonial_image_click"]);
        assert_eq!(classify(&c, 100, 90.0), Some(ProfileType::Analytical));
    }

    #[test]
    fn test_observe_keeps_label_when_nothing_matches() {
        let now = Utc::now();
        let mut profile = BehavioralProfile::new("s".into(), UtmParams::default(), now);

        profile.observe("click_cta", 5.0, now);
        assert_eq!(profile.profile_type, ProfileType::Impulsive);

        // Deeper scroll breaks the impulsive rule but matches nothing else
        profile.observe("scroll_depth_50", 12.0, now);
        assert_eq!(profile.max_scroll_depth, 50);
        assert_eq!(profile.profile_type, ProfileType::Impulsive);
    }

    #[test]
    fn test_observe_counts_and_scroll_depth() {
        let now = Utc::now();
        let mut profile = BehavioralProfile::new("s".into(), UtmParams::default(), now);

        profile.observe("scroll_depth_75", 1.0, now);
        profile.observe("scroll_depth_25", 2.0, now);
        profile.observe("some_custom_event", 3.0, now);

        assert_eq!(profile.max_scroll_depth, 75);
        assert_eq!(profile.event_counts.scroll_depth_75, 1);
        assert_eq!(profile.event_counts.scroll_depth_25, 1);
        assert_eq!(profile.time_on_site, 3.0);
    }

    #[test]
    fn test_scroll_depth_of() {
        assert_eq!(scroll_depth_of("scroll_depth_100"), Some(100));
        assert_eq!(scroll_depth_of("scroll_depth_"), None);
        assert_eq!(scroll_depth_of("click_cta"), None);
    }

    #[test]
    fn test_profile_wire_format() {
        let now = Utc::now();
        let utm = UtmParams {
            utm_source: "fb".into(),
            ..UtmParams::default()
        };
        let profile = BehavioralProfile::new("abc".into(), utm, now);
        let json = serde_json::to_value(&profile).unwrap();

        assert_eq!(json["sessionId"], "abc");
        assert_eq!(json["profileType"], "unknown");
        assert_eq!(json["utm_source"], "fb");
        assert_eq!(json["eventCounts"]["click_compra"], 0);
        assert_eq!(json["maxScrollDepth"], 0);
    }
}
