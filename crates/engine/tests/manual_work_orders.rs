//! Integration tests for manual work order creation.
//!
//! Covers the creation-time discipline/category gate, the work order type
//! category check, and the requested-state defaults.

use plantops_db::models::asset::CreateAsset;
use plantops_db::models::status::WorkOrderStatus;
use plantops_db::models::work_order_type::CreateWorkOrderType;
use plantops_db::repositories::{AssetRepo, WorkOrderRepo, WorkOrderTypeRepo};
use plantops_engine::work_order::{create_manual, ManualWorkOrderRequest};
use plantops_engine::EngineError;
use plantops_events::EventBus;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_asset(pool: &PgPool, code: &str) -> i64 {
    AssetRepo::create(
        pool,
        &CreateAsset {
            name: format!("Conveyor {code}"),
            code: code.to_string(),
            plant: "south".to_string(),
            area: None,
            sector: None,
            is_active: None,
        },
    )
    .await
    .unwrap()
    .id
}

fn request(asset_id: i64, discipline: &str, category: &str) -> ManualWorkOrderRequest {
    ManualWorkOrderRequest {
        asset_id,
        requested_by: 3,
        work_order_type_id: None,
        priority: None,
        discipline: discipline.to_string(),
        category: category.to_string(),
        title: "Belt replacement".to_string(),
        description: None,
    }
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn manual_order_starts_requested(pool: PgPool) {
    let bus = EventBus::default();
    let asset_id = new_asset(&pool, "CNV-001").await;

    let order = create_manual(&pool, &bus, &request(asset_id, "maintenance", "corrective"))
        .await
        .unwrap();
    assert_eq!(order.status_id, WorkOrderStatus::Requested.id());
    assert_eq!(order.requested_by, Some(3));
    assert_eq!(order.source_type, "manual");
    assert_eq!(order.source_ref, 3);

    // A manual order never carries a form snapshot at creation.
    assert!(order.form_snapshot.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn incompatible_category_fails_before_any_write(pool: PgPool) {
    let bus = EventBus::default();
    let asset_id = new_asset(&pool, "CNV-002").await;

    // Calibration belongs to the quality discipline.
    let result = create_manual(&pool, &bus, &request(asset_id, "maintenance", "calibration")).await;
    assert!(matches!(result, Err(EngineError::Core(_))));

    let orders = WorkOrderRepo::list_for_asset(&pool, asset_id, 10, 0).await.unwrap();
    assert!(orders.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn type_category_checked_against_discipline(pool: PgPool) {
    let bus = EventBus::default();
    let asset_id = new_asset(&pool, "CNV-003").await;
    let wo_type = WorkOrderTypeRepo::create(
        &pool,
        &CreateWorkOrderType {
            name: "Instrument calibration".to_string(),
            category: "calibration".to_string(),
            description: None,
        },
    )
    .await
    .unwrap();

    // The order's own pair is fine, but the type is quality-side.
    let mut input = request(asset_id, "maintenance", "preventive");
    input.work_order_type_id = Some(wo_type.id);
    let result = create_manual(&pool, &bus, &input).await;
    assert!(matches!(result, Err(EngineError::Core(_))));

    // Under the quality discipline the same type is accepted.
    let mut input = request(asset_id, "quality", "calibration");
    input.work_order_type_id = Some(wo_type.id);
    let order = create_manual(&pool, &bus, &input).await.unwrap();
    assert_eq!(order.work_order_type_id, Some(wo_type.id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_asset_rejected(pool: PgPool) {
    let bus = EventBus::default();
    let result = create_manual(&pool, &bus, &request(9999, "maintenance", "corrective")).await;
    assert!(matches!(result, Err(EngineError::Core(_))));
}
