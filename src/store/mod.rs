//! Session state storage
//!
//! The tracker keeps all of its state in a small string key-value store,
//! the same shape as a browser's local storage. Values that carry structure
//! (timeline, pending queue, profile) are stored as JSON strings.
//!
//! Two backends:
//! - `FileStore`: one JSON object on disk, written through on every change
//! - `MemoryStore`: process-local map (tests, `--ephemeral` runs)
//!
//! Missing or malformed values are never fatal. The `JsonStore` helpers log
//! the problem and hand back the default so tracking carries on.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Storage key names
pub mod keys {
    pub const SESSION_ID: &str = "firepower_session_id";
    pub const SESSION_START: &str = "firepower_session_start";
    pub const SESSION_TIMELINE: &str = "firepower_session_timeline";
    pub const REPLAY_SENT: &str = "firepower_replay_sent";
    pub const PENDING_EVENTS: &str = "firepower_pending_events";
    pub const USER_PROFILE: &str = "firepower_user_profile";
    pub const PROFILE_LAST_SENT: &str = "firepower_profile_last_sent";
    pub const LAST_BUTTON: &str = "firepower_last_button";
    pub const SCROLL_THRESHOLDS: &str = "firepower_scroll_thresholds";
    pub const EVENT_SEQUENCE: &str = "firepower_event_sequence";
}

/// Errors raised by a storage backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read state file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write state file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode value for key {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// String key-value store backing a tracker
///
/// Implementations use interior mutability so a single store can be shared
/// behind an `Arc` by every clone of the tracker.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Drop every key (the equivalent of clearing site data)
    fn clear(&self) -> Result<(), StoreError>;
}

/// Typed JSON access layered over any `SessionStore`
pub trait JsonStore {
    /// Read and decode a value. Absent, unreadable and malformed values all
    /// come back as `None`; the latter two are logged.
    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T>;

    /// Read and decode a value, falling back to `T::default()`
    fn read_json_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.read_json(key).unwrap_or_default()
    }

    /// Encode and store a value
    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError>;
}

impl<S: SessionStore + ?Sized> JsonStore for S {
    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring malformed value under {}: {}", key, e);
                None
            }
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(value).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.set(key, &encoded)
    }
}
