//! Repository for the `routines` table (PRD-04).

use plantops_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::routine::{CreateRoutine, Routine, UpdateRoutine};

/// Column list for routines queries.
const COLUMNS: &str = "id, asset_id, name, trigger_type, trigger_runtime_hours, \
    trigger_calendar_days, advance_window, execution_mode, is_active, \
    auto_approve_work_orders, default_priority, discipline, category, \
    work_order_type_id, form_id, active_form_version_id, \
    last_execution_runtime_hours, last_execution_completed_at, last_generated_at, \
    deleted_at, created_at, updated_at";

/// Provides CRUD and bookkeeping operations for maintenance routines.
pub struct RoutineRepo;

impl RoutineRepo {
    /// Insert a new routine, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateRoutine) -> Result<Routine, sqlx::Error> {
        let query = format!(
            "INSERT INTO routines
                (asset_id, name, trigger_type, trigger_runtime_hours,
                 trigger_calendar_days, advance_window, execution_mode, is_active,
                 auto_approve_work_orders, default_priority, discipline, category,
                 work_order_type_id, form_id)
             VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, 'manual'),
                     COALESCE($8, true), COALESCE($9, false), COALESCE($10, 0),
                     $11, $12, $13, $14)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Routine>(&query)
            .bind(input.asset_id)
            .bind(&input.name)
            .bind(&input.trigger_type)
            .bind(input.trigger_runtime_hours)
            .bind(input.trigger_calendar_days)
            .bind(input.advance_window)
            .bind(&input.execution_mode)
            .bind(input.is_active)
            .bind(input.auto_approve_work_orders)
            .bind(input.default_priority)
            .bind(&input.discipline)
            .bind(&input.category)
            .bind(input.work_order_type_id)
            .bind(input.form_id)
            .fetch_one(pool)
            .await
    }

    /// Find a routine by its primary key. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Routine>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM routines WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Routine>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List the routines the scheduled scan considers: active, automatic,
    /// not soft-deleted. Ordered by id for stable scan output.
    pub async fn list_active_automatic(pool: &PgPool) -> Result<Vec<Routine>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM routines
             WHERE is_active = true
               AND execution_mode = 'automatic'
               AND deleted_at IS NULL
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, Routine>(&query).fetch_all(pool).await
    }

    /// List routines attached to an asset. Excludes soft-deleted rows.
    pub async fn list_for_asset(pool: &PgPool, asset_id: DbId) -> Result<Vec<Routine>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM routines
             WHERE asset_id = $1 AND deleted_at IS NULL
             ORDER BY name ASC"
        );
        sqlx::query_as::<_, Routine>(&query)
            .bind(asset_id)
            .fetch_all(pool)
            .await
    }

    /// List routines referencing a form. Excludes soft-deleted rows.
    pub async fn list_for_form(pool: &PgPool, form_id: DbId) -> Result<Vec<Routine>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM routines
             WHERE form_id = $1 AND deleted_at IS NULL
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, Routine>(&query)
            .bind(form_id)
            .fetch_all(pool)
            .await
    }

    /// Update a routine's configuration. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateRoutine,
    ) -> Result<Option<Routine>, sqlx::Error> {
        let query = format!(
            "UPDATE routines SET
                name = COALESCE($2, name),
                trigger_runtime_hours = COALESCE($3, trigger_runtime_hours),
                trigger_calendar_days = COALESCE($4, trigger_calendar_days),
                advance_window = COALESCE($5, advance_window),
                execution_mode = COALESCE($6, execution_mode),
                is_active = COALESCE($7, is_active),
                auto_approve_work_orders = COALESCE($8, auto_approve_work_orders),
                default_priority = COALESCE($9, default_priority),
                work_order_type_id = COALESCE($10, work_order_type_id),
                updated_at = NOW()
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Routine>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(input.trigger_runtime_hours)
            .bind(input.trigger_calendar_days)
            .bind(input.advance_window)
            .bind(&input.execution_mode)
            .bind(input.is_active)
            .bind(input.auto_approve_work_orders)
            .bind(input.default_priority)
            .bind(input.work_order_type_id)
            .fetch_optional(pool)
            .await
    }

    /// Stamp the generation bookkeeping after a work order was created.
    ///
    /// Runs against the caller's transaction so it commits or rolls back
    /// together with the work order insert.
    pub async fn mark_generated(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
        generated_at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE routines SET last_generated_at = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(generated_at)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Record an execution baseline after a routine-sourced work order
    /// completed. Part of the completion transaction.
    pub async fn record_completion(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
        runtime_hours: Option<f64>,
        completed_at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE routines SET
                last_execution_runtime_hours = COALESCE($2, last_execution_runtime_hours),
                last_execution_completed_at = $3,
                updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(runtime_hours)
        .bind(completed_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Point every routine referencing a form at a newly published version.
    /// Part of the publish transaction; affects future generations only.
    pub async fn set_active_form_version_for_form(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        form_id: DbId,
        version_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE routines SET active_form_version_id = $2, updated_at = NOW()
             WHERE form_id = $1 AND deleted_at IS NULL",
        )
        .bind(form_id)
        .bind(version_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }

    /// Soft-delete a routine, refused while work orders still reference it.
    ///
    /// Returns `Ok(false)` when the routine has referencing work orders or
    /// does not exist (nothing deleted).
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE routines SET deleted_at = NOW()
             WHERE id = $1
               AND deleted_at IS NULL
               AND NOT EXISTS (
                   SELECT 1 FROM work_orders w
                   WHERE w.source_type = 'routine'
                     AND w.source_ref = $1
                     AND w.deleted_at IS NULL
               )",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
