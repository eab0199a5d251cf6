//! Repository for the `form_versions` table (PRD-11).

use plantops_core::types::DbId;
use sqlx::PgPool;

use crate::models::form_version::{CreateFormVersion, FormVersion};

/// Column list for form_versions queries.
const COLUMNS: &str =
    "id, form_id, version_number, snapshot, is_active, published_by, published_at";

/// Provides insert/read operations for published form versions.
pub struct FormVersionRepo;

impl FormVersionRepo {
    /// Next version number for a form: `MAX(version_number) + 1`, starting
    /// at 1. Read inside the publish transaction so concurrent publishes
    /// serialize on the `(form_id, version_number)` unique constraint.
    pub async fn next_version_number(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        form_id: DbId,
    ) -> Result<i32, sqlx::Error> {
        let next: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(version_number), 0) + 1 FROM form_versions WHERE form_id = $1",
        )
        .bind(form_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(next)
    }

    /// Insert a new version inside the caller's publish transaction.
    pub async fn create_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        input: &CreateFormVersion,
    ) -> Result<FormVersion, sqlx::Error> {
        let query = format!(
            "INSERT INTO form_versions (form_id, version_number, snapshot, published_by)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FormVersion>(&query)
            .bind(input.form_id)
            .bind(input.version_number)
            .bind(&input.snapshot)
            .bind(input.published_by)
            .fetch_one(&mut **tx)
            .await
    }

    /// Find a version by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<FormVersion>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM form_versions WHERE id = $1");
        sqlx::query_as::<_, FormVersion>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a specific version by form ID and version number.
    pub async fn find_by_version(
        pool: &PgPool,
        form_id: DbId,
        version_number: i32,
    ) -> Result<Option<FormVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM form_versions
             WHERE form_id = $1 AND version_number = $2"
        );
        sqlx::query_as::<_, FormVersion>(&query)
            .bind(form_id)
            .bind(version_number)
            .fetch_optional(pool)
            .await
    }

    /// List versions for a form, newest first.
    pub async fn list_for_form(
        pool: &PgPool,
        form_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FormVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM form_versions
             WHERE form_id = $1
             ORDER BY version_number DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, FormVersion>(&query)
            .bind(form_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count executions referencing a version (deactivation guard input).
    pub async fn count_executions(pool: &PgPool, version_id: DbId) -> Result<i64, sqlx::Error> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM form_executions WHERE form_version_id = $1")
                .bind(version_id)
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }

    /// Mark a version inactive. Guards run at the engine layer; this is the
    /// raw flip. Returns `true` if a row changed.
    pub async fn deactivate(pool: &PgPool, version_id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE form_versions SET is_active = false WHERE id = $1 AND is_active")
                .bind(version_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
