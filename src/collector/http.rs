//! reqwest-backed collector
//!
//! Awaited posts are plain JSON POSTs. Beacons are spawned onto the current
//! tokio runtime and their handles kept, so the shell can give them a bounded
//! amount of time to finish before the process exits.

use super::{Collector, Delivered, DeliveryError, Endpoint};
use crate::config::CollectorConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Collector speaking JSON over HTTP(S)
pub struct HttpCollector {
    client: reqwest::Client,
    base_url: String,
    beacons: Mutex<Vec<JoinHandle<()>>>,
}

impl HttpCollector {
    pub fn new(config: &CollectorConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            beacons: Mutex::new(Vec::new()),
        })
    }

    /// Full URL for an endpoint
    pub fn url_for(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.base_url, endpoint.path())
    }

    /// Wait for queued beacons, giving up after `timeout`
    ///
    /// Returns the number of beacons that were outstanding.
    pub async fn wait_for_beacons(&self, timeout: Duration) -> usize {
        let handles: Vec<_> = {
            let mut beacons = self.beacons.lock().unwrap_or_else(PoisonError::into_inner);
            beacons.drain(..).collect()
        };
        let outstanding = handles.len();
        if outstanding == 0 {
            return 0;
        }

        tracing::debug!("Waiting for {} beacon(s)", outstanding);
        if tokio::time::timeout(timeout, futures::future::join_all(handles))
            .await
            .is_err()
        {
            tracing::warn!(
                "Gave up on {} beacon(s) after {:?}",
                outstanding,
                timeout
            );
        }
        outstanding
    }

    async fn send(
        client: &reqwest::Client,
        url: &str,
        body: &Value,
    ) -> Result<Delivered, DeliveryError> {
        let response = client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(Delivered {
                status: status.as_u16(),
            })
        } else {
            Err(DeliveryError::Status {
                status: status.as_u16(),
            })
        }
    }
}

#[async_trait]
impl Collector for HttpCollector {
    async fn post(&self, endpoint: Endpoint, body: &Value) -> Result<Delivered, DeliveryError> {
        let url = self.url_for(endpoint);
        tracing::debug!("POST {}", url);
        Self::send(&self.client, &url, body).await
    }

    fn beacon(&self, endpoint: Endpoint, body: Value) -> bool {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::error!("Cannot send beacon to {}: no async runtime", endpoint);
            return false;
        };

        let client = self.client.clone();
        let url = self.url_for(endpoint);
        let handle = runtime.spawn(async move {
            if let Err(e) = Self::send(&client, &url, &body).await {
                tracing::debug!("Beacon to {} failed: {}", url, e);
            }
        });

        let mut beacons = self.beacons.lock().unwrap_or_else(PoisonError::into_inner);
        beacons.push(handle);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn collector_for(server: &MockServer) -> HttpCollector {
        HttpCollector::new(&CollectorConfig {
            base_url: format!("{}/fire/power/", server.uri()),
            ..CollectorConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_post_success() {
        let server = MockServer::start().await;
        let payload = json!({"eventName": "page_view"});

        Mock::given(method("POST"))
            .and(path("/fire/power/webhook"))
            .and(body_json(&payload))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let collector = collector_for(&server);
        let delivered = collector.post(Endpoint::Webhook, &payload).await.unwrap();
        assert_eq!(delivered.status, 200);
    }

    #[tokio::test]
    async fn test_post_non_success_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/fire/power/session_profile"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let collector = collector_for(&server);
        let err = collector
            .post(Endpoint::SessionProfile, &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Status { status: 503 }));
    }

    #[tokio::test]
    async fn test_post_transport_error() {
        // Nothing listens on port 9 (discard) in the test environment
        let collector = HttpCollector::new(&CollectorConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 5,
            ..CollectorConfig::default()
        })
        .unwrap();

        let err = collector
            .post(Endpoint::Webhook, &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Transport(_)));
    }

    #[tokio::test]
    async fn test_beacons_complete_before_wait_returns() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/fire/power/session_replay"))
            .respond_with(ResponseTemplate::new(204))
            .expect(2)
            .mount(&server)
            .await;

        let collector = collector_for(&server);
        assert!(collector.beacon(Endpoint::SessionReplay, json!({"n": 1})));
        assert!(collector.beacon(Endpoint::SessionReplay, json!({"n": 2})));

        let outstanding = collector.wait_for_beacons(Duration::from_secs(5)).await;
        assert_eq!(outstanding, 2);
        assert_eq!(server.received_requests().await.unwrap().len(), 2);

        // Handles were drained
        assert_eq!(collector.wait_for_beacons(Duration::from_secs(1)).await, 0);
    }
}
