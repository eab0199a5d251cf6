//! Work order generation engine (PRD-08).
//!
//! The scheduled scan walks every active automatic routine, decides due-ness
//! through the pure planner in `plantops_core::generation`, and creates each
//! work order in one transaction together with the routine's bookkeeping
//! update. Routines already covered by an open order are skipped and logged;
//! re-running the scan never double-generates.

use chrono::Utc;
use plantops_core::generation::{plan_generation, GenerationDecision, RoutineView, SkipReason};
use plantops_core::routine::{ExecutionMode, TriggerType};
use plantops_core::types::DbId;
use plantops_core::work_order::{state_machine, WorkOrderSource};
use plantops_db::models::routine::Routine;
use plantops_db::models::status::WorkOrderStatus;
use plantops_db::models::work_order::{CreateWorkOrder, WorkOrder};
use plantops_db::repositories::{
    FormVersionRepo, RoutineRepo, RuntimeMeasurementRepo, WorkOrderRepo,
};
use plantops_events::bus::EVENT_WORK_ORDER_GENERATED;
use plantops_events::{EventBus, PlatformEvent};
use serde_json::json;
use sqlx::PgPool;

use crate::error::{EngineError, EngineResult};

/// Outcome of an explicit per-routine generation request.
#[derive(Debug)]
pub enum GenerationOutcome {
    Created(WorkOrder),
    Skipped(SkipReason),
}

/// Build the planner's view of a routine row.
///
/// Fails with a validation error when the stored trigger type or execution
/// mode string is unknown (misconfigured row).
fn routine_view(routine: &Routine) -> EngineResult<RoutineView> {
    Ok(RoutineView {
        routine_id: routine.id,
        asset_id: routine.asset_id,
        is_active: routine.is_active,
        execution_mode: ExecutionMode::from_str_value(&routine.execution_mode)
            .map_err(EngineError::validation)?,
        trigger_type: TriggerType::from_str_value(&routine.trigger_type)
            .map_err(EngineError::validation)?,
        trigger_runtime_hours: routine.trigger_runtime_hours,
        trigger_calendar_days: routine.trigger_calendar_days,
        advance_window: routine.advance_window,
        last_execution_runtime_hours: routine.last_execution_runtime_hours,
        last_execution_completed_at: routine.last_execution_completed_at,
    })
}

/// Scan all active automatic routines and create work orders for the due
/// ones. Returns the created orders; an empty list when nothing is due.
///
/// Safe to invoke repeatedly: a routine with an open generated order is
/// skipped (logged at info), so a second scan at the same instant creates
/// nothing. Misconfigured routines are logged and skipped rather than
/// aborting the scan; database failures abort and surface to the caller,
/// which retries on its next interval.
pub async fn generate_due_work_orders(
    pool: &PgPool,
    bus: &EventBus,
) -> EngineResult<Vec<WorkOrder>> {
    let routines = RoutineRepo::list_active_automatic(pool).await?;
    tracing::debug!(count = routines.len(), "Generation scan started");

    let mut created = Vec::new();
    for routine in &routines {
        match evaluate_routine(pool, routine, true).await {
            Ok(GenerationDecision::Generate) => {
                let order = create_for_routine(pool, bus, routine, None).await?;
                tracing::info!(
                    routine_id = routine.id,
                    work_order_id = order.id,
                    "Work order generated"
                );
                created.push(order);
            }
            Ok(GenerationDecision::Skip(SkipReason::DuplicateOpen)) => {
                tracing::info!(
                    routine_id = routine.id,
                    "Skipping routine: open work order already covers this cycle"
                );
            }
            Ok(GenerationDecision::Skip(reason)) => {
                tracing::debug!(routine_id = routine.id, ?reason, "Skipping routine");
            }
            Err(EngineError::Core(e)) => {
                tracing::warn!(routine_id = routine.id, error = %e, "Skipping misconfigured routine");
            }
            Err(e) => return Err(e),
        }
    }

    tracing::debug!(created = created.len(), "Generation scan finished");
    Ok(created)
}

/// Explicitly generate a work order for one routine.
///
/// The same primitive the scan uses, minus the automatic-mode restriction:
/// manual routines generate here, on user request. The duplicate guard
/// still applies.
pub async fn generate_for_routine(
    pool: &PgPool,
    bus: &EventBus,
    routine_id: DbId,
    actor: Option<DbId>,
) -> EngineResult<GenerationOutcome> {
    let routine = RoutineRepo::find_by_id(pool, routine_id)
        .await?
        .ok_or_else(|| EngineError::not_found("routine", routine_id))?;

    match evaluate_routine(pool, &routine, false).await? {
        GenerationDecision::Generate => {
            let order = create_for_routine(pool, bus, &routine, actor).await?;
            Ok(GenerationOutcome::Created(order))
        }
        GenerationDecision::Skip(reason) => {
            tracing::info!(routine_id, ?reason, "Explicit generation skipped");
            Ok(GenerationOutcome::Skipped(reason))
        }
    }
}

/// Load the planner inputs for a routine and run the pure decision.
async fn evaluate_routine(
    pool: &PgPool,
    routine: &Routine,
    scheduled_scan: bool,
) -> EngineResult<GenerationDecision> {
    let view = routine_view(routine)?;
    let current_runtime =
        RuntimeMeasurementRepo::current_runtime_hours(pool, routine.asset_id).await?;
    let has_open_order = WorkOrderRepo::find_open_for_routine(pool, routine.id)
        .await?
        .is_some();

    plan_generation(
        &view,
        current_runtime,
        has_open_order,
        Utc::now(),
        scheduled_scan,
    )
    .map_err(EngineError::validation)
}

/// Create the work order for a due routine in one transaction.
///
/// Copies priority/discipline/category defaults from the routine, attaches
/// the active form version's frozen snapshot when present, auto-approves
/// when the routine says so, and stamps the routine's generation
/// bookkeeping. Commits atomically, then emits `work_order.generated`.
async fn create_for_routine(
    pool: &PgPool,
    bus: &EventBus,
    routine: &Routine,
    actor: Option<DbId>,
) -> EngineResult<WorkOrder> {
    let form_snapshot = match routine.active_form_version_id {
        Some(version_id) => FormVersionRepo::find_by_id(pool, version_id)
            .await?
            .map(|v| v.snapshot),
        None => None,
    };

    let input = CreateWorkOrder {
        asset_id: routine.asset_id,
        source: WorkOrderSource::Routine {
            routine_id: routine.id,
        },
        work_order_type_id: routine.work_order_type_id,
        status_id: None,
        priority: Some(routine.default_priority),
        discipline: routine.discipline.clone(),
        category: routine.category.clone(),
        title: routine.name.clone(),
        description: None,
        form_snapshot,
        requested_by: actor,
    };

    let mut tx = pool.begin().await?;
    let mut order = WorkOrderRepo::create_in_tx(&mut tx, &input).await?;
    if routine.auto_approve_work_orders {
        order = WorkOrderRepo::transition(
            &mut tx,
            order.id,
            WorkOrderStatus::Requested.id(),
            WorkOrderStatus::Approved.id(),
            actor,
        )
        .await?
        .ok_or_else(|| {
            EngineError::state_conflict(format!(
                "Work order {} changed status during auto-approval",
                order.id
            ))
        })?;
    }
    RoutineRepo::mark_generated(&mut tx, routine.id, Utc::now()).await?;
    tx.commit().await?;

    let mut event = PlatformEvent::new(EVENT_WORK_ORDER_GENERATED)
        .with_subject("work_order", order.id)
        .with_payload(json!({
            "routine_id": routine.id,
            "asset_id": routine.asset_id,
            "auto_approved": routine.auto_approve_work_orders,
            "status": state_machine::status_name(order.status_id),
        }));
    if let Some(actor) = actor {
        event = event.with_actor(actor);
    }
    bus.publish(event);

    Ok(order)
}
