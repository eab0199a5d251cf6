//! Work order lifecycle service (PRD-07).

use chrono::Utc;
use plantops_core::types::DbId;
use plantops_core::work_order::{
    state_machine, validate_category_for_discipline, WorkOrderSource,
};
use plantops_db::models::status::{StatusId, WorkOrderStatus};
use plantops_db::models::work_order::{CreateWorkOrder, WorkOrder};
use plantops_db::repositories::{AssetRepo, RoutineRepo, WorkOrderRepo, WorkOrderTypeRepo};
use plantops_events::bus::{EVENT_WORK_ORDER_REQUESTED, EVENT_WORK_ORDER_STATUS_CHANGED};
use plantops_events::{EventBus, PlatformEvent};
use serde_json::json;
use sqlx::PgPool;

use crate::error::{EngineError, EngineResult};

/// Input for a manually requested work order.
#[derive(Debug, Clone)]
pub struct ManualWorkOrderRequest {
    pub asset_id: DbId,
    pub requested_by: DbId,
    pub work_order_type_id: Option<DbId>,
    pub priority: Option<i32>,
    pub discipline: String,
    pub category: String,
    pub title: String,
    pub description: Option<String>,
}

/// Create a manually requested work order.
///
/// Creation-time validation fails fast, before any write: the
/// discipline/category pair must be compatible, and when a work order type
/// is given its category must also be legal for the discipline.
pub async fn create_manual(
    pool: &PgPool,
    bus: &EventBus,
    request: &ManualWorkOrderRequest,
) -> EngineResult<WorkOrder> {
    validate_category_for_discipline(&request.discipline, &request.category)
        .map_err(EngineError::validation)?;

    if let Some(type_id) = request.work_order_type_id {
        let wo_type = WorkOrderTypeRepo::find_by_id(pool, type_id)
            .await?
            .ok_or_else(|| EngineError::not_found("work_order_type", type_id))?;
        validate_category_for_discipline(&request.discipline, &wo_type.category)
            .map_err(EngineError::validation)?;
    }

    if AssetRepo::find_by_id(pool, request.asset_id).await?.is_none() {
        return Err(EngineError::not_found("asset", request.asset_id));
    }

    let order = WorkOrderRepo::create(
        pool,
        &CreateWorkOrder {
            asset_id: request.asset_id,
            source: WorkOrderSource::Manual {
                requested_by: request.requested_by,
            },
            work_order_type_id: request.work_order_type_id,
            status_id: None,
            priority: request.priority,
            discipline: request.discipline.clone(),
            category: request.category.clone(),
            title: request.title.clone(),
            description: request.description.clone(),
            form_snapshot: None,
            requested_by: Some(request.requested_by),
        },
    )
    .await?;

    bus.publish(
        PlatformEvent::new(EVENT_WORK_ORDER_REQUESTED)
            .with_subject("work_order", order.id)
            .with_actor(request.requested_by)
            .with_payload(json!({
                "asset_id": order.asset_id,
                "discipline": order.discipline,
                "category": order.category,
            })),
    );

    Ok(order)
}

/// Move a work order to a new status.
///
/// The edge is validated against the fixed adjacency table; an illegal edge
/// is a state conflict and the row is left untouched. Legal edges stamp the
/// matching actor/timestamp columns through a compare-and-set update, so a
/// concurrent transition also surfaces as a conflict rather than a silent
/// double-apply. Completing a routine-sourced order records the routine's
/// execution baseline in the same transaction.
pub async fn transition(
    pool: &PgPool,
    bus: &EventBus,
    work_order_id: DbId,
    to: WorkOrderStatus,
    actor: Option<DbId>,
) -> EngineResult<WorkOrder> {
    let order = WorkOrderRepo::find_by_id(pool, work_order_id)
        .await?
        .ok_or_else(|| EngineError::not_found("work_order", work_order_id))?;

    let from: StatusId = order.status_id;
    state_machine::validate_transition(from, to.id()).map_err(EngineError::state_conflict)?;

    let mut tx = pool.begin().await?;
    let updated = WorkOrderRepo::transition(&mut tx, work_order_id, from, to.id(), actor)
        .await?
        .ok_or_else(|| {
            EngineError::state_conflict(format!(
                "Work order {work_order_id} is no longer in status {}",
                state_machine::status_name(from)
            ))
        })?;

    if to == WorkOrderStatus::Completed {
        if let Ok(WorkOrderSource::Routine { routine_id }) = updated.source() {
            let runtime = plantops_db::repositories::RuntimeMeasurementRepo::current_runtime_hours(
                pool,
                updated.asset_id,
            )
            .await?;
            RoutineRepo::record_completion(&mut tx, routine_id, runtime, Utc::now()).await?;
        }
    }
    tx.commit().await?;

    let mut event = PlatformEvent::new(EVENT_WORK_ORDER_STATUS_CHANGED)
        .with_subject("work_order", updated.id)
        .with_transition(
            state_machine::status_name(from),
            state_machine::status_name(updated.status_id),
        );
    if let Some(actor) = actor {
        event = event.with_actor(actor);
    }
    bus.publish(event);

    tracing::info!(
        work_order_id = updated.id,
        from = state_machine::status_name(from),
        to = state_machine::status_name(updated.status_id),
        "Work order transitioned"
    );
    Ok(updated)
}
