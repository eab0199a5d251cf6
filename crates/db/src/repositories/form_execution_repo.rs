//! Repository for the `form_executions`, `task_responses`, and
//! `response_attachments` tables (PRD-12).

use plantops_core::types::DbId;
use sqlx::PgPool;

use crate::models::form_execution::{
    CreateFormExecution, FormExecution, RecordTaskResponse, ResponseAttachment, TaskResponse,
};
use crate::models::status::StatusId;

/// Column list for form_executions queries.
const EXECUTION_COLUMNS: &str = "id, form_version_id, work_order_id, status_id, form_snapshot, \
    started_by, started_at, completed_at, cancelled_at, created_at, updated_at";

/// Column list for task_responses queries.
const RESPONSE_COLUMNS: &str = "id, form_execution_id, task_snapshot_id, payload, outside_range, \
    is_completed, responded_by, responded_at, created_at, updated_at";

/// Column list for response_attachments queries.
const ATTACHMENT_COLUMNS: &str = "id, task_response_id, file_path, created_at";

/// Provides lifecycle and response operations for form executions.
pub struct FormExecutionRepo;

impl FormExecutionRepo {
    // ── Executions ───────────────────────────────────────────────────

    /// Insert a new execution in `pending` status with its frozen snapshot.
    pub async fn create(
        pool: &PgPool,
        input: &CreateFormExecution,
    ) -> Result<FormExecution, sqlx::Error> {
        let query = format!(
            "INSERT INTO form_executions (form_version_id, work_order_id, form_snapshot)
             VALUES ($1, $2, $3)
             RETURNING {EXECUTION_COLUMNS}"
        );
        sqlx::query_as::<_, FormExecution>(&query)
            .bind(input.form_version_id)
            .bind(input.work_order_id)
            .bind(&input.form_snapshot)
            .fetch_one(pool)
            .await
    }

    /// Find an execution by its primary key.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<FormExecution>, sqlx::Error> {
        let query = format!("SELECT {EXECUTION_COLUMNS} FROM form_executions WHERE id = $1");
        sqlx::query_as::<_, FormExecution>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List executions of a version, newest first.
    pub async fn list_for_version(
        pool: &PgPool,
        form_version_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FormExecution>, sqlx::Error> {
        let query = format!(
            "SELECT {EXECUTION_COLUMNS} FROM form_executions
             WHERE form_version_id = $1
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, FormExecution>(&query)
            .bind(form_version_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Compare-and-set status transition, stamping the lifecycle columns
    /// that belong to the target status.
    ///
    /// `None` means the row was not in `expected_from` anymore; nothing was
    /// mutated. Edge legality is the caller's job (core state machine).
    pub async fn transition(
        pool: &PgPool,
        id: DbId,
        expected_from: StatusId,
        to: StatusId,
        actor: Option<DbId>,
    ) -> Result<Option<FormExecution>, sqlx::Error> {
        // Status ids: 2=InProgress, 3=Completed, 4=Cancelled.
        let query = format!(
            "UPDATE form_executions SET
                status_id = $3,
                started_by = CASE WHEN $3 = 2 THEN $4 ELSE started_by END,
                started_at = CASE WHEN $3 = 2 THEN NOW() ELSE started_at END,
                completed_at = CASE WHEN $3 = 3 THEN NOW() ELSE completed_at END,
                cancelled_at = CASE WHEN $3 = 4 THEN NOW() ELSE cancelled_at END,
                updated_at = NOW()
             WHERE id = $1 AND status_id = $2
             RETURNING {EXECUTION_COLUMNS}"
        );
        sqlx::query_as::<_, FormExecution>(&query)
            .bind(id)
            .bind(expected_from)
            .bind(to)
            .bind(actor)
            .fetch_optional(pool)
            .await
    }

    // ── Task responses ───────────────────────────────────────────────

    /// Record a response, updating in place when one already exists for the
    /// task (upsert on the `(execution, task_snapshot_id)` unique key).
    pub async fn upsert_response(
        pool: &PgPool,
        input: &RecordTaskResponse,
    ) -> Result<TaskResponse, sqlx::Error> {
        let query = format!(
            "INSERT INTO task_responses
                (form_execution_id, task_snapshot_id, payload, outside_range,
                 is_completed, responded_by, responded_at)
             VALUES ($1, $2, $3, $4, true, $5, NOW())
             ON CONFLICT (form_execution_id, task_snapshot_id) DO UPDATE SET
                payload = EXCLUDED.payload,
                outside_range = EXCLUDED.outside_range,
                responded_by = EXCLUDED.responded_by,
                responded_at = NOW(),
                updated_at = NOW()
             RETURNING {RESPONSE_COLUMNS}"
        );
        sqlx::query_as::<_, TaskResponse>(&query)
            .bind(input.form_execution_id)
            .bind(input.task_snapshot_id)
            .bind(&input.payload)
            .bind(input.outside_range)
            .bind(input.responded_by)
            .fetch_one(pool)
            .await
    }

    /// List an execution's responses ordered by task snapshot id.
    pub async fn list_responses(
        pool: &PgPool,
        form_execution_id: DbId,
    ) -> Result<Vec<TaskResponse>, sqlx::Error> {
        let query = format!(
            "SELECT {RESPONSE_COLUMNS} FROM task_responses
             WHERE form_execution_id = $1
             ORDER BY task_snapshot_id ASC"
        );
        sqlx::query_as::<_, TaskResponse>(&query)
            .bind(form_execution_id)
            .fetch_all(pool)
            .await
    }

    /// Snapshot task ids with a completed response for an execution.
    pub async fn completed_task_ids(
        pool: &PgPool,
        form_execution_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT task_snapshot_id FROM task_responses
             WHERE form_execution_id = $1 AND is_completed = true
             ORDER BY task_snapshot_id ASC",
        )
        .bind(form_execution_id)
        .fetch_all(pool)
        .await
    }

    // ── Attachments ──────────────────────────────────────────────────

    /// Append an attachment path to a response.
    pub async fn add_attachment(
        pool: &PgPool,
        task_response_id: DbId,
        file_path: &str,
    ) -> Result<ResponseAttachment, sqlx::Error> {
        let query = format!(
            "INSERT INTO response_attachments (task_response_id, file_path)
             VALUES ($1, $2)
             RETURNING {ATTACHMENT_COLUMNS}"
        );
        sqlx::query_as::<_, ResponseAttachment>(&query)
            .bind(task_response_id)
            .bind(file_path)
            .fetch_one(pool)
            .await
    }

    /// Replace a response's attachment set with the given paths.
    ///
    /// Runs in a transaction: re-recording an upload response swaps the
    /// whole set rather than appending duplicates.
    pub async fn replace_attachments(
        pool: &PgPool,
        task_response_id: DbId,
        file_paths: &[String],
    ) -> Result<Vec<ResponseAttachment>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM response_attachments WHERE task_response_id = $1")
            .bind(task_response_id)
            .execute(&mut *tx)
            .await?;
        let query = format!(
            "INSERT INTO response_attachments (task_response_id, file_path)
             VALUES ($1, $2)
             RETURNING {ATTACHMENT_COLUMNS}"
        );
        let mut attachments = Vec::with_capacity(file_paths.len());
        for path in file_paths {
            let attachment = sqlx::query_as::<_, ResponseAttachment>(&query)
                .bind(task_response_id)
                .bind(path)
                .fetch_one(&mut *tx)
                .await?;
            attachments.push(attachment);
        }
        tx.commit().await?;
        Ok(attachments)
    }

    /// List attachments for a response, oldest first.
    pub async fn list_attachments(
        pool: &PgPool,
        task_response_id: DbId,
    ) -> Result<Vec<ResponseAttachment>, sqlx::Error> {
        let query = format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM response_attachments
             WHERE task_response_id = $1
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, ResponseAttachment>(&query)
            .bind(task_response_id)
            .fetch_all(pool)
            .await
    }
}
