//! Collector delivery
//!
//! The collector is a remote HTTP service that ingests three kinds of JSON
//! payload, one per endpoint. Delivery outcomes are explicit: every send
//! returns `Result<Delivered, DeliveryError>` and callers decide whether a
//! failure means "queue for retry" or "wait for the next trigger".
//!
//! Besides awaited sends there is `beacon`, a fire-and-forget send used at
//! teardown. A beacon reports only whether it was queued, never whether it
//! arrived.

use async_trait::async_trait;
use serde_json::Value;

mod http;

pub use http::HttpCollector;

/// Collector paths, relative to the configured base URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Single event payloads
    Webhook,
    /// Bulk timeline transmission
    SessionReplay,
    /// Behavioral profile snapshots
    SessionProfile,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Webhook => "webhook",
            Self::SessionReplay => "session_replay",
            Self::SessionProfile => "session_profile",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}", self.path())
    }
}

/// Successful delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivered {
    /// HTTP status returned by the collector
    pub status: u16,
}

/// Failed delivery
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// Collector answered with a non-success status
    #[error("collector returned HTTP {status}")]
    Status { status: u16 },

    /// Request never completed (DNS, connect, TLS, reset, timeout)
    #[error("transport error: {0}")]
    Transport(String),

    /// Payload could not be turned into JSON
    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Destination for tracker payloads
#[async_trait]
pub trait Collector: Send + Sync {
    /// POST `body` to `endpoint` and report the outcome
    async fn post(&self, endpoint: Endpoint, body: &Value) -> Result<Delivered, DeliveryError>;

    /// Queue a send that must not be tied to the caller's lifetime
    ///
    /// Returns `true` if the send was handed off.
    fn beacon(&self, endpoint: Endpoint, body: Value) -> bool;
}
