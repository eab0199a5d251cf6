//! Runtime measurement entity model (PRD-03).
//!
//! Measurements are append-only: no update DTO and no `updated_at` column.
//! The "current runtime" of an asset is the row with the latest
//! `measured_at`, not the latest insert.

use plantops_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `runtime_measurements` table. Immutable once created.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RuntimeMeasurement {
    pub id: DbId,
    pub asset_id: DbId,
    /// Hour-meter reading; monotonic non-decreasing by convention.
    pub reported_hours: f64,
    /// When the reading was taken.
    pub measured_at: Timestamp,
    /// Where the reading came from (gauge, SCADA export, operator entry).
    pub source: Option<String>,
    pub recorded_by: Option<DbId>,
    pub created_at: Timestamp,
}

/// DTO for recording a new measurement.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRuntimeMeasurement {
    pub asset_id: DbId,
    pub reported_hours: f64,
    pub measured_at: Timestamp,
    pub source: Option<String>,
    pub recorded_by: Option<DbId>,
}
