//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the central publish/subscribe hub for [`PlatformEvent`]s.
//! It is designed to be shared via `Arc<EventBus>` across the application.

use chrono::{DateTime, Utc};
use plantops_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Event names
// ---------------------------------------------------------------------------

pub const EVENT_MEASUREMENT_RECORDED: &str = "runtime.measurement_recorded";
pub const EVENT_WORK_ORDER_GENERATED: &str = "work_order.generated";
pub const EVENT_WORK_ORDER_REQUESTED: &str = "work_order.requested";
pub const EVENT_WORK_ORDER_STATUS_CHANGED: &str = "work_order.status_changed";
pub const EVENT_FORM_PUBLISHED: &str = "form.published";
pub const EVENT_FORM_VERSION_DEACTIVATED: &str = "form.version_deactivated";
pub const EVENT_EXECUTION_STARTED: &str = "form_execution.started";
pub const EVENT_EXECUTION_COMPLETED: &str = "form_execution.completed";
pub const EVENT_EXECUTION_CANCELLED: &str = "form_execution.cancelled";

// ---------------------------------------------------------------------------
// PlatformEvent
// ---------------------------------------------------------------------------

/// An audit event that occurred on the platform.
///
/// Constructed via [`PlatformEvent::new`] and enriched with the builder
/// methods [`with_subject`](PlatformEvent::with_subject),
/// [`with_actor`](PlatformEvent::with_actor),
/// [`with_transition`](PlatformEvent::with_transition), and
/// [`with_payload`](PlatformEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEvent {
    /// Dot-separated event name, e.g. `"work_order.generated"`.
    pub event_type: String,

    /// Optional subject entity kind (e.g. `"work_order"`, `"form"`).
    pub subject_type: Option<String>,

    /// Optional subject entity database id.
    pub subject_id: Option<DbId>,

    /// Optional id of the user that triggered the event.
    pub actor_id: Option<DbId>,

    /// Status name before a lifecycle transition.
    pub before_state: Option<String>,

    /// Status name after a lifecycle transition.
    pub after_state: Option<String>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl PlatformEvent {
    /// Create a new event with only the required `event_type`.
    ///
    /// All optional fields default to `None` / empty object.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            subject_type: None,
            subject_id: None,
            actor_id: None,
            before_state: None,
            after_state: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Attach a subject entity to the event.
    pub fn with_subject(mut self, subject_type: impl Into<String>, subject_id: DbId) -> Self {
        self.subject_type = Some(subject_type.into());
        self.subject_id = Some(subject_id);
        self
    }

    /// Attach the acting user to the event.
    pub fn with_actor(mut self, actor_id: DbId) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    /// Record a lifecycle transition's before/after state names.
    pub fn with_transition(
        mut self,
        before: impl Into<String>,
        after: impl Into<String>,
    ) -> Self {
        self.before_state = Some(before.into());
        self.after_state = Some(after.into());
        self
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`PlatformEvent`].
pub struct EventBus {
    sender: broadcast::Sender<PlatformEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    /// The persistence layer (when subscribed) ensures database capture.
    pub fn publish(&self, event: PlatformEvent) {
        // Ignore the SendError — it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
