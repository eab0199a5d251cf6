//! Repository for the `assets` table.

use plantops_core::types::DbId;
use sqlx::PgPool;

use crate::models::asset::{Asset, CreateAsset, UpdateAsset};

/// Column list for assets queries.
const COLUMNS: &str = "id, name, code, plant, area, sector, is_active, \
    deleted_at, created_at, updated_at";

/// Provides CRUD operations for assets.
pub struct AssetRepo;

impl AssetRepo {
    /// Insert a new asset, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateAsset) -> Result<Asset, sqlx::Error> {
        let query = format!(
            "INSERT INTO assets (name, code, plant, area, sector, is_active)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, true))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Asset>(&query)
            .bind(&input.name)
            .bind(&input.code)
            .bind(&input.plant)
            .bind(&input.area)
            .bind(&input.sector)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    /// Find an asset by its primary key. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Asset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM assets WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Asset>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an asset by its unique tag code. Excludes soft-deleted rows.
    pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<Asset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM assets WHERE code = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Asset>(&query)
            .bind(code)
            .fetch_optional(pool)
            .await
    }

    /// List assets within a plant, ordered by code. Excludes soft-deleted rows.
    pub async fn list_by_plant(
        pool: &PgPool,
        plant: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Asset>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM assets
             WHERE plant = $1 AND deleted_at IS NULL
             ORDER BY code ASC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Asset>(&query)
            .bind(plant)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Update an asset. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists (or is soft-deleted).
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateAsset,
    ) -> Result<Option<Asset>, sqlx::Error> {
        let query = format!(
            "UPDATE assets SET
                name = COALESCE($2, name),
                plant = COALESCE($3, plant),
                area = COALESCE($4, area),
                sector = COALESCE($5, sector),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Asset>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.plant)
            .bind(&input.area)
            .bind(&input.sector)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete an asset by ID. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE assets SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Restore a soft-deleted asset. Returns `true` if a row was restored.
    pub async fn restore(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE assets SET deleted_at = NULL WHERE id = $1 AND deleted_at IS NOT NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
