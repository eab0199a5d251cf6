//! Form execution, task response, and attachment models (PRD-12).

use plantops_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::status::StatusId;

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// A row from the `form_executions` table: one run of a published version.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FormExecution {
    pub id: DbId,
    pub form_version_id: DbId,
    pub work_order_id: Option<DbId>,
    pub status_id: StatusId,
    /// Denormalized copy of the version snapshot, taken at creation, so
    /// responses stay correlated even if the version is later deactivated.
    pub form_snapshot: serde_json::Value,
    pub started_by: Option<DbId>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub cancelled_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new execution.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFormExecution {
    pub form_version_id: DbId,
    pub work_order_id: Option<DbId>,
    pub form_snapshot: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Task responses
// ---------------------------------------------------------------------------

/// A row from the `task_responses` table.
///
/// `task_snapshot_id` references a task inside the execution's frozen
/// snapshot — deliberately a plain BIGINT, not a live foreign key.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TaskResponse {
    pub id: DbId,
    pub form_execution_id: DbId,
    pub task_snapshot_id: DbId,
    /// Serialized `plantops_core::execution::ResponsePayload`.
    pub payload: serde_json::Value,
    /// Measurement fell outside configured bounds (quality signal).
    pub outside_range: bool,
    pub is_completed: bool,
    pub responded_by: Option<DbId>,
    pub responded_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for recording (upserting) a task response.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordTaskResponse {
    pub form_execution_id: DbId,
    pub task_snapshot_id: DbId,
    pub payload: serde_json::Value,
    pub outside_range: bool,
    pub responded_by: Option<DbId>,
}

// ---------------------------------------------------------------------------
// Attachments
// ---------------------------------------------------------------------------

/// A row from the `response_attachments` table. Append-only.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ResponseAttachment {
    pub id: DbId,
    pub task_response_id: DbId,
    /// Opaque storage path; file bytes are never interpreted here.
    pub file_path: String,
    pub created_at: Timestamp,
}
