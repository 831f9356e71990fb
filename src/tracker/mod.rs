//! Session and event tracker
//!
//! Records visitor interactions against a `SessionStore` and forwards them to
//! a `Collector`. Every operation updates local state first and only then
//! talks to the network, so a dead collector never costs a recorded event.
//!
//! # Flow
//!
//! ```text
//! record_event(name, attrs)
//!     │
//!     ├──→ build payload (session, sequence, UTM, browser, attrs)
//!     ├──→ append to timeline
//!     ├──→ update profile ──────→ [task] push at most every 30s
//!     ├──→ 10+ entries ─────────→ [task] replay once
//!     └──→ deliver to /webhook
//!             ├── ok:  [task] drain pending queue
//!             └── err: append to pending queue
//! ```
//!
//! `[task]` work runs on its own tokio task, so a hung profile, replay or
//! drain request never holds up the next event. Each of the three is
//! single-flight per tracker; the claim is released when its task ends or is
//! dropped. `wait_for_background` joins outstanding tasks before exit.
//!
//! Replay and profile pushes are not queued on failure. They are simply
//! attempted again the next time their trigger fires.

use crate::collector::{Collector, Delivered, DeliveryError, Endpoint};
use crate::store::{keys, JsonStore, SessionStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

pub mod context;
pub mod profile;
pub mod scroll;
pub mod timeline;


use context::{PageContext, UtmParams};
use profile::BehavioralProfile;
use scroll::ScrollPosition;
use timeline::{ReplayPayload, TimelineEntry};

/// Event names emitted by the tracker itself
pub mod events {
    pub const PAGE_VIEW: &str = "page_view";
    pub const PURCHASE_CLICK: &str = "click_compra";
    pub const LAST_BUTTON_CLICKED: &str = "modal_inatividade_botao_clicado";
    pub const LAST_BUTTON_BEFORE_UNLOAD: &str = "last_button_before_unload";
    pub const SESSION_DURATION: &str = "session_duration";
}

/// Tunables for replay and profile delivery
#[derive(Debug, Clone, Copy)]
pub struct TrackerSettings {
    /// Timeline length that triggers the one-shot replay
    pub replay_threshold: usize,
    /// Minimum gap between successful profile pushes
    pub profile_cooldown: chrono::Duration,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            replay_threshold: 10,
            profile_cooldown: chrono::Duration::seconds(30),
        }
    }
}

/// Most recently clicked interactive element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastButton {
    pub id: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Outcome of one pending-queue drain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub delivered: usize,
    pub remaining: usize,
}

/// Outcome of the unload handler
#[derive(Debug, Clone, PartialEq)]
pub struct UnloadSummary {
    pub duration_seconds: i64,
    pub duration_formatted: String,
    /// Beacons handed off (replay, profile)
    pub beacons_queued: usize,
}

/// Read-only view of the stored state
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerSnapshot {
    pub session_id: Option<String>,
    pub session_start: Option<DateTime<Utc>>,
    pub timeline_len: usize,
    pub replay_sent: bool,
    pub pending_events: usize,
    pub reached_scroll_thresholds: Vec<u32>,
    pub last_button: Option<LastButton>,
    pub profile: Option<BehavioralProfile>,
}

/// Claim on a single-flight operation, released on drop
///
/// Dropping covers cancellation too: a drain abandoned mid-way by a timeout
/// or an aborted task frees the slot for the next one.
struct InFlight(Arc<AtomicBool>);

impl InFlight {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        (!flag.swap(true, Ordering::AcqRel)).then(|| Self(flag.clone()))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Session and event tracker
///
/// Cheap to clone; clones share the store, collector, in-flight claims and
/// background tasks.
#[derive(Clone)]
pub struct Tracker {
    store: Arc<dyn SessionStore>,
    collector: Arc<dyn Collector>,
    page: Arc<PageContext>,
    settings: TrackerSettings,
    draining: Arc<AtomicBool>,
    replaying: Arc<AtomicBool>,
    pushing_profile: Arc<AtomicBool>,
    background: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl Tracker {
    pub fn new(
        store: Arc<dyn SessionStore>,
        collector: Arc<dyn Collector>,
        page: PageContext,
        settings: TrackerSettings,
    ) -> Self {
        Self {
            store,
            collector,
            page: Arc::new(page),
            settings,
            draining: Arc::new(AtomicBool::new(false)),
            replaying: Arc::new(AtomicBool::new(false)),
            pushing_profile: Arc::new(AtomicBool::new(false)),
            background: Arc::new(Mutex::new(Vec::new())),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Session
    // ─────────────────────────────────────────────────────────────────────

    /// Current session id, starting a session if storage has none
    pub fn session_id(&self) -> String {
        match self.store.get(keys::SESSION_ID) {
            Ok(Some(id)) if !id.is_empty() => id,
            Ok(_) => self.start_session(),
            Err(e) => {
                tracing::warn!("Failed to read session id, starting a new session: {}", e);
                self.start_session()
            }
        }
    }

    fn start_session(&self) -> String {
        let session_id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        self.put_raw(keys::SESSION_ID, &session_id);
        self.put_raw(keys::SESSION_START, &now.to_rfc3339());
        self.remove(keys::REPLAY_SENT);
        self.remove(keys::EVENT_SEQUENCE);
        self.remove(keys::SCROLL_THRESHOLDS);
        self.put(keys::SESSION_TIMELINE, &Vec::<TimelineEntry>::new());

        tracing::info!("Started session {}", session_id);
        session_id
    }

    fn session_start(&self) -> Option<DateTime<Utc>> {
        let raw = self.get_raw(keys::SESSION_START)?;
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(start) => Some(start.with_timezone(&Utc)),
            Err(e) => {
                tracing::warn!("Ignoring malformed session start {:?}: {}", raw, e);
                None
            }
        }
    }

    /// Seconds between session start and `now`; zero without a start
    fn time_on_site(&self, now: DateTime<Utc>) -> f64 {
        self.session_start()
            .map(|start| (now - start).num_milliseconds() as f64 / 1000.0)
            .unwrap_or(0.0)
    }

    fn next_sequence(&self) -> u64 {
        let next = self
            .store
            .read_json::<u64>(keys::EVENT_SEQUENCE)
            .unwrap_or(0)
            + 1;
        self.put(keys::EVENT_SEQUENCE, &next);
        next
    }

    // ─────────────────────────────────────────────────────────────────────
    // Events
    // ─────────────────────────────────────────────────────────────────────

    /// Record an event and try to deliver it
    ///
    /// Timeline and profile are stored before any network activity. Only the
    /// webhook delivery is awaited; profile and replay pushes go out on
    /// background tasks. The returned outcome is informational: on failure
    /// the event is already sitting in the pending queue.
    pub async fn record_event(
        &self,
        name: &str,
        attributes: Map<String, Value>,
    ) -> Result<Delivered, DeliveryError> {
        let payload = self.build_payload(name, attributes);

        let timeline_len = self.append_to_timeline(name, &payload);
        self.update_profile(name, &payload);

        if timeline_len >= self.settings.replay_threshold && !self.replay_sent() {
            self.spawn_replay();
        }

        self.deliver_event(payload).await
    }

    fn build_payload(&self, name: &str, attributes: Map<String, Value>) -> Value {
        let session_id = self.session_id();
        let sequence = self.next_sequence();

        let mut payload = Map::new();
        payload.insert("eventName".into(), name.into());
        payload.insert("sessionId".into(), session_id.into());
        payload.insert("sequence".into(), sequence.into());
        payload.insert("timestamp".into(), Utc::now().to_rfc3339().into());
        self.page.utm().write_into(&mut payload);
        payload.insert("url".into(), self.page.url.clone().into());
        self.page.browser.write_into(&mut payload);

        // Caller attributes win on collision
        payload.extend(attributes);

        Value::Object(payload)
    }

    /// Append to the timeline, returning its new length
    fn append_to_timeline(&self, name: &str, payload: &Value) -> usize {
        let mut timeline: Vec<TimelineEntry> =
            self.store.read_json_or_default(keys::SESSION_TIMELINE);
        timeline.push(TimelineEntry {
            event_name: name.to_string(),
            timestamp: Utc::now(),
            data: payload.clone(),
        });
        self.put(keys::SESSION_TIMELINE, &timeline);
        timeline.len()
    }

    /// POST an event to the webhook; queue it on failure, drain on success
    ///
    /// The drain runs in the background and is not awaited here.
    pub async fn deliver_event(&self, payload: Value) -> Result<Delivered, DeliveryError> {
        match self.collector.post(Endpoint::Webhook, &payload).await {
            Ok(delivered) => {
                self.spawn_drain();
                Ok(delivered)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to deliver {}: {}",
                    payload["eventName"].as_str().unwrap_or("event"),
                    e
                );
                self.enqueue_pending(payload);
                Err(e)
            }
        }
    }

    fn enqueue_pending(&self, payload: Value) {
        let mut pending: Vec<Value> = self.store.read_json_or_default(keys::PENDING_EVENTS);
        pending.push(payload);
        self.put(keys::PENDING_EVENTS, &pending);
    }

    /// Retry queued events, one at a time, in queue order
    ///
    /// Delivered events leave the queue. Failures stay in their original
    /// relative order, ahead of anything queued while the drain was running.
    /// A drain already in progress on this tracker makes this a no-op.
    pub async fn send_pending_events(&self) -> DrainReport {
        let Some(_claim) = InFlight::acquire(&self.draining) else {
            tracing::debug!("Pending drain already running");
            return DrainReport::default();
        };
        self.drain_pending().await
    }

    fn spawn_drain(&self) {
        let Some(claim) = InFlight::acquire(&self.draining) else {
            tracing::debug!("Pending drain already running");
            return;
        };
        let tracker = self.clone();
        self.spawn_background(async move {
            let _claim = claim;
            tracker.drain_pending().await;
        });
    }

    async fn drain_pending(&self) -> DrainReport {
        let pending: Vec<Value> = self.store.read_json_or_default(keys::PENDING_EVENTS);
        if pending.is_empty() {
            return DrainReport::default();
        }

        let snapshot_len = pending.len();
        let mut remaining = Vec::new();
        let mut delivered = 0;

        for event in pending {
            match self.collector.post(Endpoint::Webhook, &event).await {
                Ok(_) => delivered += 1,
                Err(e) => {
                    tracing::debug!("Pending event still failing: {}", e);
                    remaining.push(event);
                }
            }
        }

        // Keep anything that failed and was queued behind the snapshot
        let current: Vec<Value> = self.store.read_json_or_default(keys::PENDING_EVENTS);
        remaining.extend(current.into_iter().skip(snapshot_len));
        self.put(keys::PENDING_EVENTS, &remaining);

        tracing::debug!(
            "Pending drain: {} delivered, {} remaining",
            delivered,
            remaining.len()
        );
        DrainReport {
            delivered,
            remaining: remaining.len(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Replay
    // ─────────────────────────────────────────────────────────────────────

    fn replay_sent(&self) -> bool {
        self.get_raw(keys::REPLAY_SENT).is_some()
    }

    /// Send the whole timeline once per session
    ///
    /// Returns `None` when there is nothing to do (empty timeline, the
    /// replay already went out, or another replay is in flight). The sent
    /// marker is only set on success.
    pub async fn send_session_replay(&self) -> Option<Result<Delivered, DeliveryError>> {
        let _claim = InFlight::acquire(&self.replaying)?;
        self.replay_now().await
    }

    fn spawn_replay(&self) {
        let Some(claim) = InFlight::acquire(&self.replaying) else {
            tracing::debug!("Session replay already in flight");
            return;
        };
        let tracker = self.clone();
        self.spawn_background(async move {
            let _claim = claim;
            let _ = tracker.replay_now().await;
        });
    }

    async fn replay_now(&self) -> Option<Result<Delivered, DeliveryError>> {
        let session_id = self.session_id();
        let timeline: Vec<TimelineEntry> = self.store.read_json_or_default(keys::SESSION_TIMELINE);
        if timeline.is_empty() || self.replay_sent() {
            return None;
        }

        let body = match serde_json::to_value(ReplayPayload {
            session_id: &session_id,
            timestamp: Utc::now(),
            timeline: &timeline,
        }) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("Failed to encode session replay: {}", e);
                return Some(Err(e.into()));
            }
        };

        let outcome = self.collector.post(Endpoint::SessionReplay, &body).await;
        match &outcome {
            Ok(_) => {
                self.put_raw(keys::REPLAY_SENT, "true");
                tracing::info!(
                    "Session replay sent ({} events)",
                    timeline.len()
                );
            }
            Err(e) => tracing::warn!("Failed to send session replay: {}", e),
        }
        Some(outcome)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Profile
    // ─────────────────────────────────────────────────────────────────────

    /// Fold an event into the behavioral profile and push it if due
    ///
    /// Non-blocking: the stored profile is updated in place and the push, if
    /// any, runs on a background task carrying this snapshot.
    pub fn update_profile(&self, event_name: &str, payload: &Value) -> BehavioralProfile {
        let profile = self.apply_profile(event_name, payload);
        if self.profile_send_due(Utc::now()) {
            self.spawn_profile_push(profile.clone());
        }
        profile
    }

    fn spawn_profile_push(&self, profile: BehavioralProfile) {
        let Some(claim) = InFlight::acquire(&self.pushing_profile) else {
            tracing::debug!("Profile push already in flight");
            return;
        };
        let tracker = self.clone();
        self.spawn_background(async move {
            let _claim = claim;
            let _ = tracker.send_user_profile(&profile).await;
        });
    }

    fn apply_profile(&self, event_name: &str, payload: &Value) -> BehavioralProfile {
        let now = Utc::now();
        let time_on_site = self.time_on_site(now);

        let mut profile = self
            .store
            .read_json::<BehavioralProfile>(keys::USER_PROFILE)
            .unwrap_or_else(|| {
                BehavioralProfile::new(self.session_id(), UtmParams::from_payload(payload), now)
            });
        profile.observe(event_name, time_on_site, now);
        self.put(keys::USER_PROFILE, &profile);
        profile
    }

    fn profile_send_due(&self, now: DateTime<Utc>) -> bool {
        let Some(raw) = self.get_raw(keys::PROFILE_LAST_SENT) else {
            return true;
        };
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(last) => now - last.with_timezone(&Utc) >= self.settings.profile_cooldown,
            Err(e) => {
                tracing::warn!("Ignoring malformed profile send time {:?}: {}", raw, e);
                true
            }
        }
    }

    /// Push the profile; records the send time on success
    pub async fn send_user_profile(
        &self,
        profile: &BehavioralProfile,
    ) -> Result<Delivered, DeliveryError> {
        let body = serde_json::to_value(profile)?;

        let outcome = self.collector.post(Endpoint::SessionProfile, &body).await;
        match &outcome {
            Ok(_) => {
                self.put_raw(keys::PROFILE_LAST_SENT, &Utc::now().to_rfc3339());
                tracing::info!("Profile sent ({})", profile.profile_type);
            }
            Err(e) => tracing::warn!("Failed to send profile: {}", e),
        }
        outcome
    }

    // ─────────────────────────────────────────────────────────────────────
    // Clicks
    // ─────────────────────────────────────────────────────────────────────

    /// Remember the last clicked element and emit it as an event
    pub async fn track_last_button_clicked(
        &self,
        button_id: &str,
        button_text: &str,
    ) -> Result<Delivered, DeliveryError> {
        let last = LastButton {
            id: button_id.to_string(),
            text: button_text.to_string(),
            timestamp: Utc::now(),
        };
        self.put(keys::LAST_BUTTON, &last);

        self.record_event(events::LAST_BUTTON_CLICKED, object_of(&last))
            .await
    }

    /// Emit a purchase-intent event for `plan`, then remember the button
    pub async fn track_purchase_click(
        &self,
        plan: &str,
        button_id: &str,
        button_text: &str,
    ) -> Result<Delivered, DeliveryError> {
        let mut attributes = Map::new();
        attributes.insert("plano".into(), plan.into());
        attributes.insert("buttonId".into(), button_id.into());
        attributes.insert("buttonText".into(), button_text.into());

        let outcome = self
            .record_event(events::PURCHASE_CLICK, attributes)
            .await;
        let _ = self.track_last_button_clicked(button_id, button_text).await;
        outcome
    }

    // ─────────────────────────────────────────────────────────────────────
    // Page lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Page load: emit `page_view` and retry anything left from last time
    pub async fn initialize(&self) -> Result<Delivered, DeliveryError> {
        let outcome = self.record_event(events::PAGE_VIEW, Map::new()).await;
        self.send_pending_events().await;
        outcome
    }

    /// Scroll observer: emit each newly reached depth threshold once
    ///
    /// Returns the thresholds emitted by this call.
    pub async fn on_scroll(&self, position: ScrollPosition) -> Vec<u32> {
        let Some(percentage) = position.percentage() else {
            tracing::debug!("Ignoring scroll on empty document");
            return Vec::new();
        };

        let mut reached: Vec<u32> = self.store.read_json_or_default(keys::SCROLL_THRESHOLDS);
        let crossed = scroll::newly_reached(percentage, &reached);

        for threshold in &crossed {
            reached.push(*threshold);
            self.put(keys::SCROLL_THRESHOLDS, &reached);

            let mut attributes = Map::new();
            attributes.insert("scrollPercentage".into(), percentage.into());
            attributes.insert("scrollPosition".into(), position.bottom().into());
            attributes.insert("totalHeight".into(), position.document_height.into());

            let _ = self
                .record_event(&format!("scroll_depth_{threshold}"), attributes)
                .await;
        }
        crossed
    }

    /// Teardown: beacon the session summary and emit the closing events
    ///
    /// Does nothing without a recorded session start.
    pub async fn on_unload(&self) -> Option<UnloadSummary> {
        let start = self.session_start()?;
        let duration_seconds = (Utc::now() - start).num_seconds().max(0);
        let duration_formatted = format_duration(duration_seconds);

        let session_id = self.session_id();
        let timeline: Vec<TimelineEntry> = self.store.read_json_or_default(keys::SESSION_TIMELINE);
        let profile: Value = self
            .store
            .read_json(keys::USER_PROFILE)
            .unwrap_or_else(|| Value::Object(Map::new()));

        let mut beacons_queued = 0;
        match serde_json::to_value(ReplayPayload {
            session_id: &session_id,
            timestamp: Utc::now(),
            timeline: &timeline,
        }) {
            Ok(replay) => {
                if self.collector.beacon(Endpoint::SessionReplay, replay) {
                    beacons_queued += 1;
                }
            }
            Err(e) => tracing::error!("Failed to encode unload replay: {}", e),
        }
        if self.collector.beacon(Endpoint::SessionProfile, profile) {
            beacons_queued += 1;
        }

        let mut attributes = Map::new();
        attributes.insert("duration_seconds".into(), duration_seconds.into());
        attributes.insert(
            "duration_formatted".into(),
            duration_formatted.clone().into(),
        );
        let _ = self
            .record_event(events::SESSION_DURATION, attributes)
            .await;

        if let Some(last) = self.store.read_json::<LastButton>(keys::LAST_BUTTON) {
            let _ = self
                .record_event(events::LAST_BUTTON_BEFORE_UNLOAD, object_of(&last))
                .await;
        }

        Some(UnloadSummary {
            duration_seconds,
            duration_formatted,
            beacons_queued,
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Background tasks
    // ─────────────────────────────────────────────────────────────────────

    fn spawn_background<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No async runtime, background delivery dropped");
            return;
        };
        let handle = runtime.spawn(task);

        let mut tasks = self
            .background
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|running| !running.is_finished());
        tasks.push(handle);
    }

    /// Wait for background deliveries, giving up after `timeout`
    ///
    /// Returns the number of tasks still unfinished when the wait ended.
    pub async fn wait_for_background(&self, timeout: Duration) -> usize {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let mut tasks: Vec<JoinHandle<()>> = {
                let mut background = self
                    .background
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                background.drain(..).collect()
            };
            if tasks.is_empty() {
                return 0;
            }

            tracing::debug!("Waiting for {} background task(s)", tasks.len());
            let joined =
                tokio::time::timeout_at(deadline, futures::future::join_all(tasks.iter_mut()))
                    .await;
            match joined {
                Ok(results) => {
                    for result in results {
                        if let Err(e) = result {
                            tracing::warn!("Background task failed: {}", e);
                        }
                    }
                }
                Err(_) => {
                    let unfinished = tasks.iter().filter(|task| !task.is_finished()).count();
                    tracing::warn!(
                        "Gave up on {} background task(s) after {:?}",
                        unfinished,
                        timeout
                    );
                    return unfinished;
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // State inspection
    // ─────────────────────────────────────────────────────────────────────

    /// Current stored state, without starting a session
    pub fn snapshot(&self) -> TrackerSnapshot {
        let timeline: Vec<TimelineEntry> = self.store.read_json_or_default(keys::SESSION_TIMELINE);
        let pending: Vec<Value> = self.store.read_json_or_default(keys::PENDING_EVENTS);

        TrackerSnapshot {
            session_id: self.get_raw(keys::SESSION_ID),
            session_start: self.session_start(),
            timeline_len: timeline.len(),
            replay_sent: self.replay_sent(),
            pending_events: pending.len(),
            reached_scroll_thresholds: self.store.read_json_or_default(keys::SCROLL_THRESHOLDS),
            last_button: self.store.read_json(keys::LAST_BUTTON),
            profile: self.store.read_json(keys::USER_PROFILE),
        }
    }

    /// Forget everything; the next event starts a new session
    pub fn reset(&self) -> Result<(), crate::store::StoreError> {
        self.store.clear()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Storage helpers (failures are logged, never raised)
    // ─────────────────────────────────────────────────────────────────────

    fn get_raw(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", key, e);
                None
            }
        }
    }

    fn put_raw(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            tracing::warn!("Failed to persist {}: {}", key, e);
        }
    }

    fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(e) = self.store.write_json(key, value) {
            tracing::warn!("Failed to persist {}: {}", key, e);
        }
    }

    fn remove(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            tracing::warn!("Failed to remove {}: {}", key, e);
        }
    }
}

/// `"<h>h <m>m <s>s"`
pub fn format_duration(total_seconds: i64) -> String {
    format!(
        "{}h {}m {}s",
        total_seconds / 3600,
        (total_seconds % 3600) / 60,
        total_seconds % 60
    )
}

/// Serialize a struct into event attributes
fn object_of<T: Serialize>(value: &T) -> Map<String, Value> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}
