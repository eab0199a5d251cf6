//! Repository for the `runtime_measurements` table (PRD-03).
//!
//! Append-only: no update or delete operations exist for measurements.

use plantops_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::runtime_measurement::{CreateRuntimeMeasurement, RuntimeMeasurement};

/// Column list for runtime_measurements queries.
const COLUMNS: &str = "id, asset_id, reported_hours, measured_at, source, recorded_by, created_at";

/// Provides append/read operations for runtime measurements.
pub struct RuntimeMeasurementRepo;

impl RuntimeMeasurementRepo {
    /// Append a new measurement, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateRuntimeMeasurement,
    ) -> Result<RuntimeMeasurement, sqlx::Error> {
        let query = format!(
            "INSERT INTO runtime_measurements
                (asset_id, reported_hours, measured_at, source, recorded_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RuntimeMeasurement>(&query)
            .bind(input.asset_id)
            .bind(input.reported_hours)
            .bind(input.measured_at)
            .bind(&input.source)
            .bind(input.recorded_by)
            .fetch_one(pool)
            .await
    }

    /// The measurement with the latest reading timestamp for an asset.
    pub async fn latest_for_asset(
        pool: &PgPool,
        asset_id: DbId,
    ) -> Result<Option<RuntimeMeasurement>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM runtime_measurements
             WHERE asset_id = $1
             ORDER BY measured_at DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, RuntimeMeasurement>(&query)
            .bind(asset_id)
            .fetch_optional(pool)
            .await
    }

    /// Current runtime hours for an asset, or `None` without measurements.
    pub async fn current_runtime_hours(
        pool: &PgPool,
        asset_id: DbId,
    ) -> Result<Option<f64>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT reported_hours FROM runtime_measurements
             WHERE asset_id = $1
             ORDER BY measured_at DESC
             LIMIT 1",
        )
        .bind(asset_id)
        .fetch_optional(pool)
        .await
    }

    /// List measurements for an asset, newest reading first.
    pub async fn list_for_asset(
        pool: &PgPool,
        asset_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<RuntimeMeasurement>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM runtime_measurements
             WHERE asset_id = $1
             ORDER BY measured_at DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, RuntimeMeasurement>(&query)
            .bind(asset_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// List measurements for an asset taken after `since`, oldest first.
    pub async fn list_since(
        pool: &PgPool,
        asset_id: DbId,
        since: Timestamp,
    ) -> Result<Vec<RuntimeMeasurement>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM runtime_measurements
             WHERE asset_id = $1 AND measured_at > $2
             ORDER BY measured_at ASC"
        );
        sqlx::query_as::<_, RuntimeMeasurement>(&query)
            .bind(asset_id)
            .bind(since)
            .fetch_all(pool)
            .await
    }
}
