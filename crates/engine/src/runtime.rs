//! Asset runtime tracking service (PRD-03).

use plantops_core::runtime::validate_reported_hours;
use plantops_core::types::DbId;
use plantops_db::models::runtime_measurement::{CreateRuntimeMeasurement, RuntimeMeasurement};
use plantops_db::repositories::{AssetRepo, RuntimeMeasurementRepo};
use plantops_events::bus::EVENT_MEASUREMENT_RECORDED;
use plantops_events::{EventBus, PlatformEvent};
use serde_json::json;
use sqlx::PgPool;

use crate::error::{EngineError, EngineResult};

/// Record a runtime measurement for an asset.
///
/// Validates the reported hours (negative or non-finite values are a
/// validation failure with no state change), verifies the asset exists,
/// appends the immutable row, and emits `runtime.measurement_recorded`.
pub async fn record_measurement(
    pool: &PgPool,
    bus: &EventBus,
    input: &CreateRuntimeMeasurement,
) -> EngineResult<RuntimeMeasurement> {
    validate_reported_hours(input.reported_hours).map_err(EngineError::validation)?;

    if AssetRepo::find_by_id(pool, input.asset_id).await?.is_none() {
        return Err(EngineError::not_found("asset", input.asset_id));
    }

    let measurement = RuntimeMeasurementRepo::create(pool, input).await?;

    let mut event = PlatformEvent::new(EVENT_MEASUREMENT_RECORDED)
        .with_subject("asset", measurement.asset_id)
        .with_payload(json!({
            "measurement_id": measurement.id,
            "reported_hours": measurement.reported_hours,
            "source": measurement.source,
        }));
    if let Some(actor) = measurement.recorded_by {
        event = event.with_actor(actor);
    }
    bus.publish(event);

    tracing::debug!(
        asset_id = measurement.asset_id,
        reported_hours = measurement.reported_hours,
        "Runtime measurement recorded"
    );
    Ok(measurement)
}

/// Current runtime hours for an asset: the latest reading, or `None` when
/// no measurements exist yet.
pub async fn current_runtime(pool: &PgPool, asset_id: DbId) -> EngineResult<Option<f64>> {
    Ok(RuntimeMeasurementRepo::current_runtime_hours(pool, asset_id).await?)
}
