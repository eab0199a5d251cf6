//! Asset entity model and DTOs.

use plantops_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `assets` table.
///
/// Hierarchy placement is the plant/area/sector triple.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Asset {
    pub id: DbId,
    pub name: String,
    pub code: String,
    pub plant: String,
    pub area: Option<String>,
    pub sector: Option<String>,
    pub is_active: bool,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new asset.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAsset {
    pub name: String,
    /// Unique tag code, e.g. `PMP-00413`.
    pub code: String,
    pub plant: String,
    pub area: Option<String>,
    pub sector: Option<String>,
    /// Defaults to true if omitted.
    pub is_active: Option<bool>,
}

/// DTO for updating an existing asset. All fields are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAsset {
    pub name: Option<String>,
    pub plant: Option<String>,
    pub area: Option<String>,
    pub sector: Option<String>,
    pub is_active: Option<bool>,
}
