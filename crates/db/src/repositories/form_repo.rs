//! Repository for the `forms`, `form_tasks`, and `form_task_instructions`
//! tables (PRD-11).
//!
//! Only the mutable draft side of the form aggregate lives here; published
//! content goes through `FormVersionRepo`.

use plantops_core::types::DbId;
use sqlx::PgPool;

use crate::models::form::{
    CreateForm, CreateFormTask, CreateFormTaskInstruction, Form, FormTask, FormTaskInstruction,
    UpdateForm, UpdateFormTask, UpdateFormTaskInstruction,
};

/// Column list for forms queries.
const FORM_COLUMNS: &str = "id, name, description, current_version_id, is_active, \
    deleted_at, created_at, updated_at";

/// Column list for form_tasks queries.
const TASK_COLUMNS: &str =
    "id, form_id, task_type, description, is_required, position, config, created_at, updated_at";

/// Column list for form_task_instructions queries.
const INSTRUCTION_COLUMNS: &str =
    "id, form_task_id, position, title, body, media_path, created_at, updated_at";

/// Provides CRUD operations for forms and their draft tasks.
pub struct FormRepo;

impl FormRepo {
    // ── Forms ────────────────────────────────────────────────────────

    /// Insert a new form, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateForm) -> Result<Form, sqlx::Error> {
        let query = format!(
            "INSERT INTO forms (name, description)
             VALUES ($1, $2)
             RETURNING {FORM_COLUMNS}"
        );
        sqlx::query_as::<_, Form>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    /// Find a form by its primary key. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Form>, sqlx::Error> {
        let query = format!("SELECT {FORM_COLUMNS} FROM forms WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Form>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List forms, ordered by name. Excludes soft-deleted rows.
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Form>, sqlx::Error> {
        let query = format!(
            "SELECT {FORM_COLUMNS} FROM forms
             WHERE deleted_at IS NULL
             ORDER BY name ASC
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Form>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Update a form's descriptive fields.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateForm,
    ) -> Result<Option<Form>, sqlx::Error> {
        let query = format!(
            "UPDATE forms SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                is_active = COALESCE($4, is_active),
                updated_at = NOW()
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {FORM_COLUMNS}"
        );
        sqlx::query_as::<_, Form>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Point the form at a newly published version. Part of the publish
    /// transaction.
    pub async fn set_current_version(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
        version_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE forms SET current_version_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(version_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Soft-delete a form by ID. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE forms SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // ── Draft tasks ──────────────────────────────────────────────────

    /// Insert a draft task, appending after the current last position when
    /// none is given.
    pub async fn create_task(
        pool: &PgPool,
        input: &CreateFormTask,
    ) -> Result<FormTask, sqlx::Error> {
        let query = format!(
            "INSERT INTO form_tasks (form_id, task_type, description, is_required, position, config)
             VALUES (
                 $1, $2, $3, COALESCE($4, false),
                 COALESCE(
                     $5,
                     (SELECT COALESCE(MAX(position), 0) + 1 FROM form_tasks WHERE form_id = $1)
                 ),
                 $6
             )
             RETURNING {TASK_COLUMNS}"
        );
        sqlx::query_as::<_, FormTask>(&query)
            .bind(input.form_id)
            .bind(&input.task_type)
            .bind(&input.description)
            .bind(input.is_required)
            .bind(input.position)
            .bind(&input.config)
            .fetch_one(pool)
            .await
    }

    /// List a form's draft tasks ordered by position.
    pub async fn list_tasks(pool: &PgPool, form_id: DbId) -> Result<Vec<FormTask>, sqlx::Error> {
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM form_tasks
             WHERE form_id = $1
             ORDER BY position ASC, id ASC"
        );
        sqlx::query_as::<_, FormTask>(&query)
            .bind(form_id)
            .fetch_all(pool)
            .await
    }

    /// Update a draft task. Only non-`None` fields in `input` are applied.
    pub async fn update_task(
        pool: &PgPool,
        id: DbId,
        input: &UpdateFormTask,
    ) -> Result<Option<FormTask>, sqlx::Error> {
        let query = format!(
            "UPDATE form_tasks SET
                description = COALESCE($2, description),
                is_required = COALESCE($3, is_required),
                config = COALESCE($4, config),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {TASK_COLUMNS}"
        );
        sqlx::query_as::<_, FormTask>(&query)
            .bind(id)
            .bind(&input.description)
            .bind(input.is_required)
            .bind(&input.config)
            .fetch_optional(pool)
            .await
    }

    /// Delete a draft task. Returns `true` if a row was removed.
    ///
    /// Hard delete: drafts are working state, not history. Published copies
    /// live in version snapshots and are unaffected.
    pub async fn delete_task(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM form_tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Reorder a form's draft tasks to match `ordered_task_ids`.
    ///
    /// Runs in a transaction; positions are renumbered 1-based in the order
    /// given. Task ids not belonging to the form are ignored by the UPDATE.
    pub async fn reorder_tasks(
        pool: &PgPool,
        form_id: DbId,
        ordered_task_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        for (index, task_id) in ordered_task_ids.iter().enumerate() {
            sqlx::query(
                "UPDATE form_tasks SET position = $3, updated_at = NOW()
                 WHERE id = $1 AND form_id = $2",
            )
            .bind(task_id)
            .bind(form_id)
            .bind((index + 1) as i32)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    // ── Draft task instructions ──────────────────────────────────────

    /// Insert an instruction on a draft task.
    pub async fn create_instruction(
        pool: &PgPool,
        input: &CreateFormTaskInstruction,
    ) -> Result<FormTaskInstruction, sqlx::Error> {
        let query = format!(
            "INSERT INTO form_task_instructions (form_task_id, position, title, body, media_path)
             VALUES (
                 $1,
                 COALESCE(
                     $2,
                     (SELECT COALESCE(MAX(position), 0) + 1
                      FROM form_task_instructions WHERE form_task_id = $1)
                 ),
                 $3, $4, $5
             )
             RETURNING {INSTRUCTION_COLUMNS}"
        );
        sqlx::query_as::<_, FormTaskInstruction>(&query)
            .bind(input.form_task_id)
            .bind(input.position)
            .bind(&input.title)
            .bind(&input.body)
            .bind(&input.media_path)
            .fetch_one(pool)
            .await
    }

    /// List instructions for a draft task ordered by position.
    pub async fn list_instructions(
        pool: &PgPool,
        form_task_id: DbId,
    ) -> Result<Vec<FormTaskInstruction>, sqlx::Error> {
        let query = format!(
            "SELECT {INSTRUCTION_COLUMNS} FROM form_task_instructions
             WHERE form_task_id = $1
             ORDER BY position ASC, id ASC"
        );
        sqlx::query_as::<_, FormTaskInstruction>(&query)
            .bind(form_task_id)
            .fetch_all(pool)
            .await
    }

    /// Update an instruction. Only non-`None` fields in `input` are applied.
    pub async fn update_instruction(
        pool: &PgPool,
        id: DbId,
        input: &UpdateFormTaskInstruction,
    ) -> Result<Option<FormTaskInstruction>, sqlx::Error> {
        let query = format!(
            "UPDATE form_task_instructions SET
                title = COALESCE($2, title),
                body = COALESCE($3, body),
                media_path = COALESCE($4, media_path),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {INSTRUCTION_COLUMNS}"
        );
        sqlx::query_as::<_, FormTaskInstruction>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.body)
            .bind(&input.media_path)
            .fetch_optional(pool)
            .await
    }

    /// Delete an instruction. Returns `true` if a row was removed.
    pub async fn delete_instruction(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM form_task_instructions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
