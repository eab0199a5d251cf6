//! Maintenance routine entity model and DTOs (PRD-04).

use plantops_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `routines` table.
///
/// `advance_window` shares its unit with the trigger: runtime hours for
/// `runtime_hours` routines, days for `calendar_days` routines.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Routine {
    pub id: DbId,
    pub asset_id: DbId,
    pub name: String,
    pub trigger_type: String,
    pub trigger_runtime_hours: Option<f64>,
    pub trigger_calendar_days: Option<i32>,
    pub advance_window: f64,
    pub execution_mode: String,
    pub is_active: bool,
    pub auto_approve_work_orders: bool,
    pub default_priority: i32,
    pub discipline: String,
    pub category: String,
    pub work_order_type_id: Option<DbId>,
    pub form_id: Option<DbId>,
    pub active_form_version_id: Option<DbId>,
    // -- Generation / completion bookkeeping --
    pub last_execution_runtime_hours: Option<f64>,
    pub last_execution_completed_at: Option<Timestamp>,
    pub last_generated_at: Option<Timestamp>,
    // -- Timestamps --
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new routine.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoutine {
    pub asset_id: DbId,
    pub name: String,
    pub trigger_type: String,
    pub trigger_runtime_hours: Option<f64>,
    pub trigger_calendar_days: Option<i32>,
    pub advance_window: f64,
    /// Defaults to `manual` if omitted.
    pub execution_mode: Option<String>,
    /// Defaults to true if omitted.
    pub is_active: Option<bool>,
    /// Defaults to false if omitted.
    pub auto_approve_work_orders: Option<bool>,
    /// Defaults to 0 (normal) if omitted.
    pub default_priority: Option<i32>,
    pub discipline: String,
    pub category: String,
    pub work_order_type_id: Option<DbId>,
    pub form_id: Option<DbId>,
}

/// DTO for updating an existing routine. All fields are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRoutine {
    pub name: Option<String>,
    pub trigger_runtime_hours: Option<f64>,
    pub trigger_calendar_days: Option<i32>,
    pub advance_window: Option<f64>,
    pub execution_mode: Option<String>,
    pub is_active: Option<bool>,
    pub auto_approve_work_orders: Option<bool>,
    pub default_priority: Option<i32>,
    pub work_order_type_id: Option<DbId>,
}
