//! Repository for the `work_order_types` table.

use plantops_core::types::DbId;
use sqlx::PgPool;

use crate::models::work_order_type::{CreateWorkOrderType, WorkOrderType};

/// Column list for work_order_types queries.
const COLUMNS: &str = "id, name, category, description, created_at, updated_at";

/// Provides CRUD operations for work order types.
pub struct WorkOrderTypeRepo;

impl WorkOrderTypeRepo {
    /// Insert a new work order type, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateWorkOrderType,
    ) -> Result<WorkOrderType, sqlx::Error> {
        let query = format!(
            "INSERT INTO work_order_types (name, category, description)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkOrderType>(&query)
            .bind(&input.name)
            .bind(&input.category)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    /// Find a work order type by its primary key.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<WorkOrderType>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM work_order_types WHERE id = $1");
        sqlx::query_as::<_, WorkOrderType>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all work order types, ordered by name ascending.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<WorkOrderType>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM work_order_types ORDER BY name ASC");
        sqlx::query_as::<_, WorkOrderType>(&query)
            .fetch_all(pool)
            .await
    }
}
