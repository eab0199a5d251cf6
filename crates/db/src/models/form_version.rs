//! Form version entity model and DTOs (PRD-11).
//!
//! A version is immutable once published: its `snapshot` column holds the
//! frozen task list. Deactivation (`is_active = false`) is the only allowed
//! mutation and is guarded at the engine layer.

use plantops_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `form_versions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FormVersion {
    pub id: DbId,
    pub form_id: DbId,
    pub version_number: i32,
    /// Serialized `plantops_core::form::FormSnapshot`.
    pub snapshot: serde_json::Value,
    pub is_active: bool,
    pub published_by: Option<DbId>,
    pub published_at: Timestamp,
}

/// DTO for inserting a new version row (used inside the publish transaction).
///
/// `version_number` is assigned by the publish flow via
/// `FormVersionRepo::next_version_number` so the frozen snapshot can carry
/// the same number it is stored under.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFormVersion {
    pub form_id: DbId,
    pub version_number: i32,
    pub snapshot: serde_json::Value,
    pub published_by: Option<DbId>,
}
