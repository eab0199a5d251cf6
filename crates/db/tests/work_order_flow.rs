//! Integration tests for the asset/routine/work-order repositories.
//!
//! Exercises the repository layer against a real database:
//! - Runtime measurement ordering by reading timestamp
//! - The open-order dedup query behind generation
//! - Compare-and-set status transitions
//! - Routine soft-delete guard while work orders reference it

use plantops_core::runtime::{runtime_delta_since, MeasurementView};
use plantops_core::work_order::WorkOrderSource;
use plantops_db::models::asset::CreateAsset;
use plantops_db::models::routine::CreateRoutine;
use plantops_db::models::runtime_measurement::CreateRuntimeMeasurement;
use plantops_db::models::status::WorkOrderStatus;
use plantops_db::models::work_order::CreateWorkOrder;
use plantops_db::repositories::{
    AssetRepo, RoutineRepo, RuntimeMeasurementRepo, WorkOrderRepo,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_asset(code: &str) -> CreateAsset {
    CreateAsset {
        name: format!("Pump {code}"),
        code: code.to_string(),
        plant: "north".to_string(),
        area: Some("compressors".to_string()),
        sector: None,
        is_active: None,
    }
}

fn new_routine(asset_id: i64, name: &str) -> CreateRoutine {
    CreateRoutine {
        asset_id,
        name: name.to_string(),
        trigger_type: "runtime_hours".to_string(),
        trigger_runtime_hours: Some(500.0),
        trigger_calendar_days: None,
        advance_window: 50.0,
        execution_mode: Some("automatic".to_string()),
        is_active: None,
        auto_approve_work_orders: None,
        default_priority: None,
        discipline: "maintenance".to_string(),
        category: "preventive".to_string(),
        work_order_type_id: None,
        form_id: None,
    }
}

fn new_work_order(asset_id: i64, routine_id: i64) -> CreateWorkOrder {
    CreateWorkOrder {
        asset_id,
        source: WorkOrderSource::Routine { routine_id },
        work_order_type_id: None,
        status_id: None,
        priority: None,
        discipline: "maintenance".to_string(),
        category: "preventive".to_string(),
        title: "500h service".to_string(),
        description: None,
        form_snapshot: None,
        requested_by: None,
    }
}

fn measurement(asset_id: i64, hours: f64, offset_days: i64) -> CreateRuntimeMeasurement {
    CreateRuntimeMeasurement {
        asset_id,
        reported_hours: hours,
        measured_at: chrono::Utc::now() - chrono::Duration::days(offset_days),
        source: Some("test".to_string()),
        recorded_by: None,
    }
}

async fn transition(
    pool: &PgPool,
    id: i64,
    from: WorkOrderStatus,
    to: WorkOrderStatus,
) -> Option<plantops_db::models::work_order::WorkOrder> {
    let mut tx = pool.begin().await.unwrap();
    let result = WorkOrderRepo::transition(&mut tx, id, from.id(), to.id(), Some(1))
        .await
        .unwrap();
    tx.commit().await.unwrap();
    result
}

// ---------------------------------------------------------------------------
// Runtime measurements
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn current_runtime_follows_reading_timestamp(pool: PgPool) {
    let asset = AssetRepo::create(&pool, &new_asset("PMP-001")).await.unwrap();

    // Insert out of chronological order; the newest reading must win.
    RuntimeMeasurementRepo::create(&pool, &measurement(asset.id, 900.0, 1))
        .await
        .unwrap();
    RuntimeMeasurementRepo::create(&pool, &measurement(asset.id, 500.0, 10))
        .await
        .unwrap();

    let current = RuntimeMeasurementRepo::current_runtime_hours(&pool, asset.id)
        .await
        .unwrap();
    assert_eq!(current, Some(900.0));

    let latest = RuntimeMeasurementRepo::latest_for_asset(&pool, asset.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.reported_hours, 900.0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn asset_without_measurements_has_no_runtime(pool: PgPool) {
    let asset = AssetRepo::create(&pool, &new_asset("PMP-002")).await.unwrap();
    let current = RuntimeMeasurementRepo::current_runtime_hours(&pool, asset.id)
        .await
        .unwrap();
    assert_eq!(current, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn negative_hours_rejected_by_check_constraint(pool: PgPool) {
    let asset = AssetRepo::create(&pool, &new_asset("PMP-003")).await.unwrap();
    let result = RuntimeMeasurementRepo::create(&pool, &measurement(asset.id, -5.0, 0)).await;
    assert!(result.is_err());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn runtime_delta_computed_over_listed_history(pool: PgPool) {
    let asset = AssetRepo::create(&pool, &new_asset("PMP-004")).await.unwrap();
    for (hours, offset_days) in [(100.0, 20), (250.0, 10), (400.0, 1)] {
        RuntimeMeasurementRepo::create(&pool, &measurement(asset.id, hours, offset_days))
            .await
            .unwrap();
    }

    let cutoff = chrono::Utc::now() - chrono::Duration::days(15);
    let recent = RuntimeMeasurementRepo::list_since(&pool, asset.id, cutoff)
        .await
        .unwrap();
    assert_eq!(recent.len(), 2);

    // Full history feeds the pure delta math.
    let views: Vec<MeasurementView> = RuntimeMeasurementRepo::list_for_asset(&pool, asset.id, 100, 0)
        .await
        .unwrap()
        .iter()
        .map(|m| MeasurementView {
            reported_hours: m.reported_hours,
            measured_at: m.measured_at,
        })
        .collect();
    assert_eq!(runtime_delta_since(&views, cutoff), Some(300.0));
}

// ---------------------------------------------------------------------------
// Open-order dedup query
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn open_order_found_until_terminal(pool: PgPool) {
    let asset = AssetRepo::create(&pool, &new_asset("PMP-010")).await.unwrap();
    let routine = RoutineRepo::create(&pool, &new_routine(asset.id, "500h service"))
        .await
        .unwrap();

    assert!(WorkOrderRepo::find_open_for_routine(&pool, routine.id)
        .await
        .unwrap()
        .is_none());

    let order = WorkOrderRepo::create(&pool, &new_work_order(asset.id, routine.id))
        .await
        .unwrap();
    assert_eq!(order.status_id, WorkOrderStatus::Requested.id());

    // Requested, approved, and executing all count as open.
    assert!(WorkOrderRepo::find_open_for_routine(&pool, routine.id)
        .await
        .unwrap()
        .is_some());
    transition(&pool, order.id, WorkOrderStatus::Requested, WorkOrderStatus::Approved)
        .await
        .unwrap();
    transition(&pool, order.id, WorkOrderStatus::Approved, WorkOrderStatus::Executing)
        .await
        .unwrap();
    assert!(WorkOrderRepo::find_open_for_routine(&pool, routine.id)
        .await
        .unwrap()
        .is_some());

    // Completed no longer blocks the next cycle.
    transition(&pool, order.id, WorkOrderStatus::Executing, WorkOrderStatus::Completed)
        .await
        .unwrap();
    assert!(WorkOrderRepo::find_open_for_routine(&pool, routine.id)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn manual_orders_do_not_block_routine_generation(pool: PgPool) {
    let asset = AssetRepo::create(&pool, &new_asset("PMP-011")).await.unwrap();
    let routine = RoutineRepo::create(&pool, &new_routine(asset.id, "500h service"))
        .await
        .unwrap();

    let mut input = new_work_order(asset.id, routine.id);
    input.source = WorkOrderSource::Manual { requested_by: 1 };
    WorkOrderRepo::create(&pool, &input).await.unwrap();

    assert!(WorkOrderRepo::find_open_for_routine(&pool, routine.id)
        .await
        .unwrap()
        .is_none());
}

// ---------------------------------------------------------------------------
// Compare-and-set transitions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn transition_stamps_lifecycle_columns(pool: PgPool) {
    let asset = AssetRepo::create(&pool, &new_asset("PMP-020")).await.unwrap();
    let routine = RoutineRepo::create(&pool, &new_routine(asset.id, "500h service"))
        .await
        .unwrap();
    let order = WorkOrderRepo::create(&pool, &new_work_order(asset.id, routine.id))
        .await
        .unwrap();

    let approved = transition(&pool, order.id, WorkOrderStatus::Requested, WorkOrderStatus::Approved)
        .await
        .unwrap();
    assert_eq!(approved.status_id, WorkOrderStatus::Approved.id());
    assert_eq!(approved.approved_by, Some(1));
    assert!(approved.approved_at.is_some());
    assert!(approved.executed_at.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn stale_expected_status_does_not_mutate(pool: PgPool) {
    let asset = AssetRepo::create(&pool, &new_asset("PMP-021")).await.unwrap();
    let routine = RoutineRepo::create(&pool, &new_routine(asset.id, "500h service"))
        .await
        .unwrap();
    let order = WorkOrderRepo::create(&pool, &new_work_order(asset.id, routine.id))
        .await
        .unwrap();

    // The row is Requested; claiming it is Executing must not change it.
    let result = transition(&pool, order.id, WorkOrderStatus::Executing, WorkOrderStatus::Completed).await;
    assert!(result.is_none());

    let unchanged = WorkOrderRepo::find_by_id(&pool, order.id).await.unwrap().unwrap();
    assert_eq!(unchanged.status_id, WorkOrderStatus::Requested.id());
    assert!(unchanged.completed_at.is_none());
}

// ---------------------------------------------------------------------------
// Routine soft-delete guard
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn routine_with_work_orders_cannot_be_deleted(pool: PgPool) {
    let asset = AssetRepo::create(&pool, &new_asset("PMP-030")).await.unwrap();
    let routine = RoutineRepo::create(&pool, &new_routine(asset.id, "500h service"))
        .await
        .unwrap();
    WorkOrderRepo::create(&pool, &new_work_order(asset.id, routine.id))
        .await
        .unwrap();

    assert!(!RoutineRepo::soft_delete(&pool, routine.id).await.unwrap());
    assert!(RoutineRepo::find_by_id(&pool, routine.id).await.unwrap().is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn routine_without_work_orders_deletes(pool: PgPool) {
    let asset = AssetRepo::create(&pool, &new_asset("PMP-031")).await.unwrap();
    let routine = RoutineRepo::create(&pool, &new_routine(asset.id, "500h service"))
        .await
        .unwrap();

    assert!(RoutineRepo::soft_delete(&pool, routine.id).await.unwrap());
    assert!(RoutineRepo::find_by_id(&pool, routine.id).await.unwrap().is_none());
}
