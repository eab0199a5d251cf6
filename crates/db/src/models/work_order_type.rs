//! Work order type entity model and DTOs.

use plantops_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `work_order_types` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkOrderType {
    pub id: DbId,
    pub name: String,
    /// One of the category constants in `plantops_core::work_order`.
    pub category: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new work order type.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkOrderType {
    pub name: String,
    pub category: String,
    pub description: Option<String>,
}
