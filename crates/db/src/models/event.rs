//! Audit event entity model (PRD-09).
//!
//! The `events` table is the append-only audit sink: state transitions carry
//! their before/after status names, everything else goes in the payload.
//! No `updated_at` field (immutable records).

use plantops_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A single audit event row. Immutable once created.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Event {
    pub id: DbId,
    /// Dot-separated event name, e.g. `"work_order.status_changed"`.
    pub event_type: String,
    pub subject_type: Option<String>,
    pub subject_id: Option<DbId>,
    pub actor_id: Option<DbId>,
    pub before_state: Option<String>,
    pub after_state: Option<String>,
    pub payload: serde_json::Value,
    pub created_at: Timestamp,
}

/// Filter parameters for querying events.
#[derive(Debug, Clone, Deserialize)]
pub struct EventQuery {
    pub event_type: Option<String>,
    pub subject_type: Option<String>,
    pub subject_id: Option<DbId>,
    pub actor_id: Option<DbId>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
