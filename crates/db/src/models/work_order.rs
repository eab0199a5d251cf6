//! Work order entity model and DTOs (PRD-07).

use plantops_core::types::{DbId, Timestamp};
use plantops_core::work_order::WorkOrderSource;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::status::StatusId;

/// A row from the `work_orders` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkOrder {
    pub id: DbId,
    pub asset_id: DbId,
    pub source_type: String,
    pub source_ref: DbId,
    pub work_order_type_id: Option<DbId>,
    pub status_id: StatusId,
    pub priority: i32,
    pub discipline: String,
    pub category: String,
    pub title: String,
    pub description: Option<String>,
    /// Frozen form content attached at creation; never a live relation.
    pub form_snapshot: Option<serde_json::Value>,
    // -- Lifecycle actors/timestamps --
    pub requested_by: Option<DbId>,
    pub requested_at: Timestamp,
    pub approved_by: Option<DbId>,
    pub approved_at: Option<Timestamp>,
    pub executed_by: Option<DbId>,
    pub executed_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub cancelled_at: Option<Timestamp>,
    // -- Timestamps --
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl WorkOrder {
    /// The `(source_type, source_ref)` column pair as the typed union.
    pub fn source(&self) -> Result<WorkOrderSource, String> {
        WorkOrderSource::from_columns(&self.source_type, self.source_ref)
    }
}

/// DTO for creating a new work order.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkOrder {
    pub asset_id: DbId,
    pub source: WorkOrderSource,
    pub work_order_type_id: Option<DbId>,
    /// Defaults to 1 (Requested) if omitted.
    pub status_id: Option<StatusId>,
    /// Defaults to 0 (normal) if omitted.
    pub priority: Option<i32>,
    pub discipline: String,
    pub category: String,
    pub title: String,
    pub description: Option<String>,
    pub form_snapshot: Option<serde_json::Value>,
    pub requested_by: Option<DbId>,
}

/// DTO for updating descriptive fields of a work order.
///
/// Status moves through the guarded transition path, never through here.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateWorkOrder {
    pub priority: Option<i32>,
    pub title: Option<String>,
    pub description: Option<String>,
}
