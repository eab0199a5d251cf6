//! Integration tests for the work order generation engine.
//!
//! Covers the central correctness property (idempotent generation), the
//! never-executed policy, advance-window pre-generation, auto-approval with
//! a frozen form snapshot, and the completion observer feeding the next
//! cycle's baseline.

use plantops_core::generation::SkipReason;
use plantops_core::work_order::WorkOrderSource;
use plantops_db::models::asset::CreateAsset;
use plantops_db::models::form::{CreateForm, CreateFormTask};
use plantops_db::models::routine::CreateRoutine;
use plantops_db::models::runtime_measurement::CreateRuntimeMeasurement;
use plantops_db::models::status::WorkOrderStatus;
use plantops_db::repositories::{AssetRepo, EventRepo, FormRepo, RoutineRepo, RuntimeMeasurementRepo};
use plantops_engine::generation::{generate_due_work_orders, generate_for_routine, GenerationOutcome};
use plantops_engine::EngineError;
use plantops_events::{EventBus, EventPersistence};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_asset(code: &str) -> CreateAsset {
    CreateAsset {
        name: format!("Compressor {code}"),
        code: code.to_string(),
        plant: "north".to_string(),
        area: None,
        sector: None,
        is_active: None,
    }
}

fn runtime_routine(asset_id: i64) -> CreateRoutine {
    CreateRoutine {
        asset_id,
        name: "100h service".to_string(),
        trigger_type: "runtime_hours".to_string(),
        trigger_runtime_hours: Some(100.0),
        trigger_calendar_days: None,
        advance_window: 10.0,
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

async fn record_hours(pool: &PgPool, asset_id: i64, hours: f64) {
    RuntimeMeasurementRepo::create(
        pool,
        &CreateRuntimeMeasurement {
            asset_id,
            reported_hours: hours,
            measured_at: chrono::Utc::now(),
            source: Some("test".to_string()),
            recorded_by: None,
        },
    )
    .await
    .unwrap();
}

async fn set_baseline(pool: &PgPool, routine_id: i64, hours: f64) {
    sqlx::query("UPDATE routines SET last_execution_runtime_hours = $2 WHERE id = $1")
        .bind(routine_id)
        .bind(hours)
        .execute(pool)
        .await
        .unwrap();
}

// ---------------------------------------------------------------------------
// Idempotent generation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn scan_is_idempotent(pool: PgPool) {
    let bus = EventBus::default();
    let asset = AssetRepo::create(&pool, &new_asset("CMP-001")).await.unwrap();
    let routine = RoutineRepo::create(&pool, &runtime_routine(asset.id)).await.unwrap();
    set_baseline(&pool, routine.id, 80.0).await;
    record_hours(&pool, asset.id, 190.0).await;

    let first = generate_due_work_orders(&pool, &bus).await.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].asset_id, asset.id);
    assert_eq!(
        first[0].source().unwrap(),
        WorkOrderSource::Routine { routine_id: routine.id }
    );

    // Second scan at the same instant: the open order covers the cycle.
    let second = generate_due_work_orders(&pool, &bus).await.unwrap();
    assert!(second.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn generated_events_reach_the_audit_table(pool: PgPool) {
    let bus = EventBus::default();
    let sink = tokio::spawn(EventPersistence::run(pool.clone(), bus.subscribe()));

    let asset = AssetRepo::create(&pool, &new_asset("CMP-050")).await.unwrap();
    RoutineRepo::create(&pool, &runtime_routine(asset.id)).await.unwrap();
    let created = generate_due_work_orders(&pool, &bus).await.unwrap();
    let order_id = created[0].id;

    // Closing the bus drains the sink before it exits.
    drop(bus);
    sink.await.unwrap();

    let events = EventRepo::list_for_subject(&pool, "work_order", order_id)
        .await
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "work_order.generated");
    assert_eq!(events[0].payload["auto_approved"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn routine_not_due_generates_nothing(pool: PgPool) {
    let bus = EventBus::default();
    let asset = AssetRepo::create(&pool, &new_asset("CMP-002")).await.unwrap();
    let routine = RoutineRepo::create(&pool, &runtime_routine(asset.id)).await.unwrap();
    set_baseline(&pool, routine.id, 80.0).await;
    // 50 hours elapsed, 50 until due, outside the 10-hour window.
    record_hours(&pool, asset.id, 130.0).await;

    let created = generate_due_work_orders(&pool, &bus).await.unwrap();
    assert!(created.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn never_executed_routine_is_immediately_due(pool: PgPool) {
    let bus = EventBus::default();
    let asset = AssetRepo::create(&pool, &new_asset("CMP-003")).await.unwrap();
    // No baseline, no measurements at all.
    RoutineRepo::create(&pool, &runtime_routine(asset.id)).await.unwrap();

    let created = generate_due_work_orders(&pool, &bus).await.unwrap();
    assert_eq!(created.len(), 1);

    // Still exactly one after another pass.
    let again = generate_due_work_orders(&pool, &bus).await.unwrap();
    assert!(again.is_empty());
}

// ---------------------------------------------------------------------------
// Auto-approval and snapshot attachment (end-to-end scenario)
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn due_routine_generates_approved_order_with_snapshot(pool: PgPool) {
    let bus = EventBus::default();
    let asset = AssetRepo::create(&pool, &new_asset("CMP-010")).await.unwrap();

    let form = FormRepo::create(
        &pool,
        &CreateForm {
            name: "Service checklist".to_string(),
            description: None,
        },
    )
    .await
    .unwrap();
    FormRepo::create_task(
        &pool,
        &CreateFormTask {
            form_id: form.id,
            task_type: "question".to_string(),
            description: "Check oil level".to_string(),
            is_required: Some(true),
            position: None,
            config: None,
        },
    )
    .await
    .unwrap();

    let mut input = runtime_routine(asset.id);
    input.form_id = Some(form.id);
    input.auto_approve_work_orders = Some(true);
    let routine = RoutineRepo::create(&pool, &input).await.unwrap();

    // Publishing points the routine at the new version.
    plantops_engine::versioning::publish_form(&pool, &bus, form.id, Some(1))
        .await
        .unwrap();
    let routine = RoutineRepo::find_by_id(&pool, routine.id).await.unwrap().unwrap();
    assert!(routine.active_form_version_id.is_some());

    set_baseline(&pool, routine.id, 80.0).await;
    record_hours(&pool, asset.id, 190.0).await;

    let created = generate_due_work_orders(&pool, &bus).await.unwrap();
    assert_eq!(created.len(), 1);
    let order = &created[0];
    assert_eq!(order.status_id, WorkOrderStatus::Approved.id());
    assert!(order.approved_at.is_some());
    let snapshot = order.form_snapshot.as_ref().expect("snapshot attached");
    assert_eq!(snapshot["tasks"][0]["description"], "Check oil level");
}

// ---------------------------------------------------------------------------
// Manual routines
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn manual_routine_ignored_by_scan_but_generates_explicitly(pool: PgPool) {
    let bus = EventBus::default();
    let asset = AssetRepo::create(&pool, &new_asset("CMP-020")).await.unwrap();
    let mut input = runtime_routine(asset.id);
    input.execution_mode = Some("manual".to_string());
    let routine = RoutineRepo::create(&pool, &input).await.unwrap();

    assert!(generate_due_work_orders(&pool, &bus).await.unwrap().is_empty());

    let outcome = generate_for_routine(&pool, &bus, routine.id, Some(7)).await.unwrap();
    let order = match outcome {
        GenerationOutcome::Created(order) => order,
        GenerationOutcome::Skipped(reason) => panic!("expected creation, got skip: {reason:?}"),
    };
    assert_eq!(order.requested_by, Some(7));

    // The duplicate guard applies to explicit generation too.
    let outcome = generate_for_routine(&pool, &bus, routine.id, Some(7)).await.unwrap();
    assert!(matches!(
        outcome,
        GenerationOutcome::Skipped(SkipReason::DuplicateOpen)
    ));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn explicit_generation_for_missing_routine_fails(pool: PgPool) {
    let bus = EventBus::default();
    let result = generate_for_routine(&pool, &bus, 9999, None).await;
    assert!(matches!(result, Err(EngineError::Core(_))));
}

// ---------------------------------------------------------------------------
// Lifecycle and the completion observer
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn illegal_transition_rejected_without_mutation(pool: PgPool) {
    let bus = EventBus::default();
    let asset = AssetRepo::create(&pool, &new_asset("CMP-030")).await.unwrap();
    RoutineRepo::create(&pool, &runtime_routine(asset.id)).await.unwrap();
    let created = generate_due_work_orders(&pool, &bus).await.unwrap();
    let order = &created[0];

    plantops_engine::work_order::transition(&pool, &bus, order.id, WorkOrderStatus::Approved, Some(1))
        .await
        .unwrap();

    // approved -> closed is not an edge.
    let result =
        plantops_engine::work_order::transition(&pool, &bus, order.id, WorkOrderStatus::Closed, Some(1))
            .await;
    assert!(matches!(result, Err(EngineError::Core(_))));

    let unchanged = plantops_db::repositories::WorkOrderRepo::find_by_id(&pool, order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.status_id, WorkOrderStatus::Approved.id());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn completing_order_records_routine_baseline(pool: PgPool) {
    let bus = EventBus::default();
    let asset = AssetRepo::create(&pool, &new_asset("CMP-031")).await.unwrap();
    let routine = RoutineRepo::create(&pool, &runtime_routine(asset.id)).await.unwrap();
    record_hours(&pool, asset.id, 250.0).await;

    let created = generate_due_work_orders(&pool, &bus).await.unwrap();
    let order = &created[0];
    for status in [
        WorkOrderStatus::Approved,
        WorkOrderStatus::Executing,
        WorkOrderStatus::Completed,
    ] {
        plantops_engine::work_order::transition(&pool, &bus, order.id, status, Some(1))
            .await
            .unwrap();
    }

    let routine = RoutineRepo::find_by_id(&pool, routine.id).await.unwrap().unwrap();
    assert_eq!(routine.last_execution_runtime_hours, Some(250.0));
    assert!(routine.last_execution_completed_at.is_some());

    // With the baseline at 250 and no new hours, the routine is not due.
    let after = generate_due_work_orders(&pool, &bus).await.unwrap();
    assert!(after.is_empty());
}
