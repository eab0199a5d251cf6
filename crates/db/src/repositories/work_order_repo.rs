//! Repository for the `work_orders` table (PRD-07).

use plantops_core::types::DbId;
use plantops_core::work_order::state_machine::OPEN_STATUSES;
use sqlx::PgPool;

use crate::models::status::StatusId;
use crate::models::work_order::{CreateWorkOrder, UpdateWorkOrder, WorkOrder};

/// Column list for work_orders queries.
const COLUMNS: &str = "id, asset_id, source_type, source_ref, work_order_type_id, \
    status_id, priority, discipline, category, title, description, form_snapshot, \
    requested_by, requested_at, approved_by, approved_at, executed_by, executed_at, \
    completed_at, cancelled_at, deleted_at, created_at, updated_at";

/// Provides CRUD and lifecycle operations for work orders.
pub struct WorkOrderRepo;

impl WorkOrderRepo {
    /// Insert a new work order, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateWorkOrder) -> Result<WorkOrder, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let order = Self::create_in_tx(&mut tx, input).await?;
        tx.commit().await?;
        Ok(order)
    }

    /// Insert a new work order inside the caller's transaction.
    ///
    /// Used by the generation engine so the insert commits or rolls back
    /// together with the routine bookkeeping update.
    pub async fn create_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        input: &CreateWorkOrder,
    ) -> Result<WorkOrder, sqlx::Error> {
        let query = format!(
            "INSERT INTO work_orders
                (asset_id, source_type, source_ref, work_order_type_id, status_id,
                 priority, discipline, category, title, description, form_snapshot,
                 requested_by)
             VALUES ($1, $2, $3, $4, COALESCE($5, 1), COALESCE($6, 0),
                     $7, $8, $9, $10, $11, $12)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkOrder>(&query)
            .bind(input.asset_id)
            .bind(input.source.source_type())
            .bind(input.source.source_ref())
            .bind(input.work_order_type_id)
            .bind(input.status_id)
            .bind(input.priority)
            .bind(&input.discipline)
            .bind(&input.category)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.form_snapshot)
            .bind(input.requested_by)
            .fetch_one(&mut **tx)
            .await
    }

    /// Find a work order by its primary key. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<WorkOrder>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM work_orders WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, WorkOrder>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the open (requested/approved/executing) work order generated
    /// from a routine, if any. This is the generation dedup check.
    pub async fn find_open_for_routine(
        pool: &PgPool,
        routine_id: DbId,
    ) -> Result<Option<WorkOrder>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM work_orders
             WHERE source_type = 'routine'
               AND source_ref = $1
               AND status_id = ANY($2)
               AND deleted_at IS NULL
             ORDER BY id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, WorkOrder>(&query)
            .bind(routine_id)
            .bind(OPEN_STATUSES)
            .fetch_optional(pool)
            .await
    }

    /// List work orders for an asset, newest first. Excludes soft-deleted rows.
    pub async fn list_for_asset(
        pool: &PgPool,
        asset_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<WorkOrder>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM work_orders
             WHERE asset_id = $1 AND deleted_at IS NULL
             ORDER BY requested_at DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, WorkOrder>(&query)
            .bind(asset_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// List work orders in a status, highest priority first.
    pub async fn list_by_status(
        pool: &PgPool,
        status_id: StatusId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<WorkOrder>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM work_orders
             WHERE status_id = $1 AND deleted_at IS NULL
             ORDER BY priority DESC, requested_at ASC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, WorkOrder>(&query)
            .bind(status_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Compare-and-set status transition, stamping the lifecycle columns
    /// that belong to the target status.
    ///
    /// The `WHERE status_id = $2` guard makes the edge check race-safe:
    /// `None` means the row was not in `expected_from` anymore (or does not
    /// exist), and nothing was mutated. Edge legality is validated by the
    /// caller against the core state machine before reaching here.
    pub async fn transition(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
        expected_from: StatusId,
        to: StatusId,
        actor: Option<DbId>,
    ) -> Result<Option<WorkOrder>, sqlx::Error> {
        // Status ids: 2=Approved, 3=Executing, 4=Completed, 6=Cancelled.
        let query = format!(
            "UPDATE work_orders SET
                status_id = $3,
                approved_by = CASE WHEN $3 = 2 THEN $4 ELSE approved_by END,
                approved_at = CASE WHEN $3 = 2 THEN NOW() ELSE approved_at END,
                executed_by = CASE WHEN $3 = 3 THEN $4 ELSE executed_by END,
                executed_at = CASE WHEN $3 = 3 THEN NOW() ELSE executed_at END,
                completed_at = CASE WHEN $3 = 4 THEN NOW() ELSE completed_at END,
                cancelled_at = CASE WHEN $3 = 6 THEN NOW() ELSE cancelled_at END,
                updated_at = NOW()
             WHERE id = $1 AND status_id = $2 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkOrder>(&query)
            .bind(id)
            .bind(expected_from)
            .bind(to)
            .bind(actor)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Update descriptive fields. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateWorkOrder,
    ) -> Result<Option<WorkOrder>, sqlx::Error> {
        let query = format!(
            "UPDATE work_orders SET
                priority = COALESCE($2, priority),
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                updated_at = NOW()
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkOrder>(&query)
            .bind(id)
            .bind(input.priority)
            .bind(&input.title)
            .bind(&input.description)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a work order by ID. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE work_orders SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
