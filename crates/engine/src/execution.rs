//! Form execution service (PRD-12).
//!
//! Drives one run of a published version: start, per-task response
//! recording (upsert), explicit completion, and the auto-complete path when
//! the last task is answered. Both completion paths share the required-task
//! predicate in `plantops_core::execution`.

use std::collections::HashSet;

use plantops_core::execution::{
    all_tasks_completed, missing_required_task_ids, state_machine, validate_response,
    ResponsePayload,
};
use plantops_core::form::FormSnapshot;
use plantops_core::types::DbId;
use plantops_db::models::form_execution::{
    CreateFormExecution, FormExecution, RecordTaskResponse, TaskResponse,
};
use plantops_db::models::status::FormExecutionStatus;
use plantops_db::repositories::{FormExecutionRepo, FormVersionRepo};
use plantops_events::bus::{
    EVENT_EXECUTION_CANCELLED, EVENT_EXECUTION_COMPLETED, EVENT_EXECUTION_STARTED,
};
use plantops_events::{EventBus, PlatformEvent};
use serde_json::json;
use sqlx::PgPool;

use crate::error::{EngineError, EngineResult};

/// Result of recording a response.
#[derive(Debug)]
pub struct ResponseRecorded {
    pub response: TaskResponse,
    /// Recording the last open task auto-completes the execution.
    pub auto_completed: bool,
}

/// Create a pending execution of a published version.
///
/// The execution takes its own denormalized copy of the version snapshot so
/// responses stay correlated even if the form later moves on. Deactivated
/// versions cannot start new executions.
pub async fn create_execution(
    pool: &PgPool,
    form_version_id: DbId,
    work_order_id: Option<DbId>,
) -> EngineResult<FormExecution> {
    let version = FormVersionRepo::find_by_id(pool, form_version_id)
        .await?
        .ok_or_else(|| EngineError::not_found("form_version", form_version_id))?;
    if !version.is_active {
        return Err(EngineError::state_conflict(format!(
            "Form version {form_version_id} is deactivated"
        )));
    }

    Ok(FormExecutionRepo::create(
        pool,
        &CreateFormExecution {
            form_version_id,
            work_order_id,
            form_snapshot: version.snapshot,
        },
    )
    .await?)
}

/// Start a pending execution.
pub async fn start(
    pool: &PgPool,
    bus: &EventBus,
    execution_id: DbId,
    actor: Option<DbId>,
) -> EngineResult<FormExecution> {
    let execution = load(pool, execution_id).await?;
    state_machine::validate_transition(execution.status_id, FormExecutionStatus::InProgress.id())
        .map_err(EngineError::state_conflict)?;

    let updated = FormExecutionRepo::transition(
        pool,
        execution_id,
        execution.status_id,
        FormExecutionStatus::InProgress.id(),
        actor,
    )
    .await?
    .ok_or_else(|| concurrent_change(execution_id, execution.status_id))?;

    publish_transition(bus, EVENT_EXECUTION_STARTED, &execution, &updated, actor);
    Ok(updated)
}

/// Record (or re-record) a response against a task in the execution's
/// frozen snapshot.
///
/// The execution must be in progress. The payload is validated against the
/// snapshot task's type; an out-of-range measurement is stored with the
/// `outside_range` flag rather than rejected. When every task in the
/// snapshot has a completed response afterwards, the execution completes
/// implicitly through the same required-task check as explicit completion.
pub async fn record_response(
    pool: &PgPool,
    bus: &EventBus,
    execution_id: DbId,
    task_snapshot_id: DbId,
    payload: &ResponsePayload,
    actor: Option<DbId>,
) -> EngineResult<ResponseRecorded> {
    let execution = load(pool, execution_id).await?;
    if execution.status_id != FormExecutionStatus::InProgress.id() {
        return Err(EngineError::state_conflict(format!(
            "Execution {execution_id} is {}, responses require InProgress",
            state_machine::status_name(execution.status_id)
        )));
    }

    let snapshot = parse_snapshot(&execution)?;
    let task = snapshot
        .task(task_snapshot_id)
        .ok_or_else(|| EngineError::not_found("task_snapshot", task_snapshot_id))?;

    let check = validate_response(task, payload).map_err(EngineError::validation)?;
    if check.outside_range {
        tracing::warn!(
            execution_id,
            task_snapshot_id,
            "Measurement response outside configured range"
        );
    }

    let payload_json = serde_json::to_value(payload)
        .map_err(|e| EngineError::validation(format!("Payload serialization failed: {e}")))?;
    let response = FormExecutionRepo::upsert_response(
        pool,
        &RecordTaskResponse {
            form_execution_id: execution_id,
            task_snapshot_id,
            payload: payload_json,
            outside_range: check.outside_range,
            responded_by: actor,
        },
    )
    .await?;

    // Upload responses keep their paths as attachment rows too; re-recording
    // replaces the set.
    if let ResponsePayload::Attachments { paths } = payload {
        FormExecutionRepo::replace_attachments(pool, response.id, paths).await?;
    }

    // Implicit completion: every snapshot task answered, and the shared
    // required-task predicate agrees.
    let completed: HashSet<DbId> = FormExecutionRepo::completed_task_ids(pool, execution_id)
        .await?
        .into_iter()
        .collect();
    let mut auto_completed = false;
    if all_tasks_completed(&snapshot, &completed)
        && missing_required_task_ids(&snapshot, &completed).is_empty()
    {
        let updated = FormExecutionRepo::transition(
            pool,
            execution_id,
            FormExecutionStatus::InProgress.id(),
            FormExecutionStatus::Completed.id(),
            actor,
        )
        .await?;
        if let Some(updated) = updated {
            publish_transition(bus, EVENT_EXECUTION_COMPLETED, &execution, &updated, actor);
            auto_completed = true;
        }
    }

    Ok(ResponseRecorded {
        response,
        auto_completed,
    })
}

/// Explicitly complete an in-progress execution.
///
/// Fails when required tasks are still unanswered, returning the missing
/// snapshot task ids so the caller can present them.
pub async fn complete(
    pool: &PgPool,
    bus: &EventBus,
    execution_id: DbId,
    actor: Option<DbId>,
) -> EngineResult<FormExecution> {
    let execution = load(pool, execution_id).await?;
    state_machine::validate_transition(execution.status_id, FormExecutionStatus::Completed.id())
        .map_err(EngineError::state_conflict)?;

    let snapshot = parse_snapshot(&execution)?;
    let completed: HashSet<DbId> = FormExecutionRepo::completed_task_ids(pool, execution_id)
        .await?
        .into_iter()
        .collect();
    let missing = missing_required_task_ids(&snapshot, &completed);
    if !missing.is_empty() {
        return Err(EngineError::MissingRequiredTasks {
            execution_id,
            missing,
        });
    }

    let updated = FormExecutionRepo::transition(
        pool,
        execution_id,
        execution.status_id,
        FormExecutionStatus::Completed.id(),
        actor,
    )
    .await?
    .ok_or_else(|| concurrent_change(execution_id, execution.status_id))?;

    publish_transition(bus, EVENT_EXECUTION_COMPLETED, &execution, &updated, actor);
    Ok(updated)
}

/// Cancel a pending or in-progress execution.
pub async fn cancel(
    pool: &PgPool,
    bus: &EventBus,
    execution_id: DbId,
    actor: Option<DbId>,
) -> EngineResult<FormExecution> {
    let execution = load(pool, execution_id).await?;
    state_machine::validate_transition(execution.status_id, FormExecutionStatus::Cancelled.id())
        .map_err(EngineError::state_conflict)?;

    let updated = FormExecutionRepo::transition(
        pool,
        execution_id,
        execution.status_id,
        FormExecutionStatus::Cancelled.id(),
        actor,
    )
    .await?
    .ok_or_else(|| concurrent_change(execution_id, execution.status_id))?;

    publish_transition(bus, EVENT_EXECUTION_CANCELLED, &execution, &updated, actor);
    Ok(updated)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn load(pool: &PgPool, execution_id: DbId) -> EngineResult<FormExecution> {
    FormExecutionRepo::find_by_id(pool, execution_id)
        .await?
        .ok_or_else(|| EngineError::not_found("form_execution", execution_id))
}

fn parse_snapshot(execution: &FormExecution) -> EngineResult<FormSnapshot> {
    serde_json::from_value(execution.form_snapshot.clone()).map_err(|e| {
        EngineError::Core(plantops_core::error::CoreError::Internal(format!(
            "Execution {} has a corrupt form snapshot: {e}",
            execution.id
        )))
    })
}

fn concurrent_change(execution_id: DbId, expected: i16) -> EngineError {
    EngineError::state_conflict(format!(
        "Execution {execution_id} is no longer in status {}",
        state_machine::status_name(expected)
    ))
}

fn publish_transition(
    bus: &EventBus,
    event_type: &str,
    before: &FormExecution,
    after: &FormExecution,
    actor: Option<DbId>,
) {
    let mut event = PlatformEvent::new(event_type)
        .with_subject("form_execution", after.id)
        .with_transition(
            state_machine::status_name(before.status_id),
            state_machine::status_name(after.status_id),
        )
        .with_payload(json!({ "form_version_id": after.form_version_id }));
    if let Some(actor) = actor {
        event = event.with_actor(actor);
    }
    bus.publish(event);
}
