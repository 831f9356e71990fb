//! Page and browser context attached to every event

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Client environment reported with each event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserContext {
    pub user_agent: String,
    pub language: String,
    pub screen_width: u32,
    pub screen_height: u32,
    pub platform: String,
    /// Effective network type, when the client knows it
    pub connection_type: Option<String>,
}

impl BrowserContext {
    /// Add the context fields to an event payload
    pub(crate) fn write_into(&self, payload: &mut Map<String, Value>) {
        payload.insert("userAgent".into(), self.user_agent.clone().into());
        payload.insert("language".into(), self.language.clone().into());
        payload.insert("screenWidth".into(), self.screen_width.into());
        payload.insert("screenHeight".into(), self.screen_height.into());
        payload.insert("platform".into(), self.platform.clone().into());
        payload.insert(
            "connectionType".into(),
            self.connection_type
                .clone()
                .unwrap_or_else(|| "unknown".to_string())
                .into(),
        );
    }
}

/// Where the tracked page lives and who is looking at it
#[derive(Debug, Clone, PartialEq)]
pub struct PageContext {
    /// Full page URL, query string included
    pub url: String,
    pub browser: BrowserContext,
}

impl PageContext {
    pub fn utm(&self) -> UtmParams {
        UtmParams::from_url(&self.url)
    }
}

/// Campaign attribution parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtmParams {
    pub utm_source: String,
    pub utm_campaign: String,
    pub fbclid: String,
}

impl UtmParams {
    /// Extract attribution from a page URL's query string
    ///
    /// Missing parameters, and URLs that fail to parse, yield empty strings.
    /// Values are taken as-is; nothing is validated.
    pub fn from_url(url: &str) -> Self {
        let Ok(parsed) = reqwest::Url::parse(url) else {
            tracing::debug!("Page URL does not parse, no attribution: {}", url);
            return Self::default();
        };

        let first = |name: &str| {
            parsed
                .query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
                .unwrap_or_default()
        };
        // First occurrence wins, even when it is empty
        Self {
            utm_source: first("utm_source"),
            utm_campaign: first("utm_campaign"),
            fbclid: first("fbclid"),
        }
    }

    /// Read attribution back out of an assembled event payload
    pub fn from_payload(payload: &Value) -> Self {
        let field = |name: &str| {
            payload
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            utm_source: field("utm_source"),
            utm_campaign: field("utm_campaign"),
            fbclid: field("fbclid"),
        }
    }

    pub(crate) fn write_into(&self, payload: &mut Map<String, Value>) {
        payload.insert("utm_source".into(), self.utm_source.clone().into());
        payload.insert("utm_campaign".into(), self.utm_campaign.clone().into());
        payload.insert("fbclid".into(), self.fbclid.clone().into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_utm_from_url() {
        let utm = UtmParams::from_url(
            "https://example.com/landing?utm_source=fb&utm_campaign=black%20friday&fbclid=IwAR1&x=1",
        );
        assert_eq!(utm.utm_source, "fb");
        assert_eq!(utm.utm_campaign, "black friday");
        assert_eq!(utm.fbclid, "IwAR1");
    }

    #[test]
    fn test_utm_missing_and_unparseable() {
        let utm = UtmParams::from_url("https://example.com/?utm_source=ig");
        assert_eq!(utm.utm_source, "ig");
        assert_eq!(utm.utm_campaign, "");
        assert_eq!(utm.fbclid, "");

        assert_eq!(UtmParams::from_url("not a url"), UtmParams::default());
    }

    #[test]
    fn test_utm_first_occurrence_wins_even_when_empty() {
        let utm = UtmParams::from_url(
            "https://example.com/?utm_source=&utm_source=fb&fbclid=one&fbclid=two",
        );
        assert_eq!(utm.utm_source, "");
        assert_eq!(utm.fbclid, "one");
    }

    #[test]
    fn test_utm_from_payload() {
        let utm = UtmParams::from_payload(&json!({"utm_source": "tiktok", "fbclid": 7}));
        assert_eq!(utm.utm_source, "tiktok");
        assert_eq!(utm.utm_campaign, "");
        // Non-string values are not attribution
        assert_eq!(utm.fbclid, "");
    }

    #[test]
    fn test_browser_context_defaults_connection_type() {
        let browser = BrowserContext {
            user_agent: "ua".into(),
            language: "pt-BR".into(),
            screen_width: 390,
            screen_height: 844,
            platform: "iPhone".into(),
            connection_type: None,
        };
        let mut payload = Map::new();
        browser.write_into(&mut payload);

        assert_eq!(payload["connectionType"], "unknown");
        assert_eq!(payload["screenWidth"], 390);
        assert_eq!(payload["language"], "pt-BR");
    }
}
