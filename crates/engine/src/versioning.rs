//! Form versioning service (PRD-11).
//!
//! Publishing freezes the form's draft tasks into an immutable version
//! snapshot; every step of the publish runs inside one transaction so a
//! failure leaves neither a dangling version nor a stale pointer.

use plantops_core::form::{
    parse_task_config, validate_publish_tasks, FormSnapshot, InstructionSnapshot, TaskSnapshot,
    TaskType,
};
use plantops_core::types::DbId;
use plantops_db::models::form_version::{CreateFormVersion, FormVersion};
use plantops_db::repositories::{FormRepo, FormVersionRepo, RoutineRepo};
use plantops_events::bus::{EVENT_FORM_PUBLISHED, EVENT_FORM_VERSION_DEACTIVATED};
use plantops_events::{EventBus, PlatformEvent};
use serde_json::json;
use sqlx::PgPool;

use crate::error::{EngineError, EngineResult};

/// Publish a form: freeze its draft tasks into a new version.
///
/// Fails with a state conflict when the form has no draft tasks, and with a
/// validation error when any draft fails the content gate (blank
/// description, inverted measurement range, choice task without options).
/// On success the new version becomes the form's current version and every
/// routine referencing the form points at it — affecting future generations
/// only; existing executions keep their own snapshots.
pub async fn publish_form(
    pool: &PgPool,
    bus: &EventBus,
    form_id: DbId,
    actor: Option<DbId>,
) -> EngineResult<FormVersion> {
    let form = FormRepo::find_by_id(pool, form_id)
        .await?
        .ok_or_else(|| EngineError::not_found("form", form_id))?;

    let drafts = FormRepo::list_tasks(pool, form_id).await?;
    if drafts.is_empty() {
        return Err(EngineError::state_conflict(format!(
            "Form {form_id} has no draft tasks to publish"
        )));
    }

    let mut tasks = Vec::with_capacity(drafts.len());
    for draft in &drafts {
        let task_type =
            TaskType::from_str_value(&draft.task_type).map_err(EngineError::validation)?;
        let (measurement, options) =
            parse_task_config(task_type, draft.config.as_ref()).map_err(EngineError::validation)?;
        let instructions = FormRepo::list_instructions(pool, draft.id)
            .await?
            .into_iter()
            .map(|i| InstructionSnapshot {
                position: i.position,
                title: i.title,
                body: i.body,
                media_path: i.media_path,
            })
            .collect();
        tasks.push(TaskSnapshot {
            id: draft.id,
            task_type,
            description: draft.description.clone(),
            is_required: draft.is_required,
            position: draft.position,
            measurement,
            options,
            instructions,
        });
    }
    validate_publish_tasks(&tasks).map_err(EngineError::validation)?;

    let mut tx = pool.begin().await?;
    let version_number = FormVersionRepo::next_version_number(&mut tx, form_id).await?;
    let snapshot = FormSnapshot {
        form_id,
        form_name: form.name.clone(),
        version_number,
        tasks,
    };
    let snapshot_json = serde_json::to_value(&snapshot)
        .map_err(|e| EngineError::validation(format!("Snapshot serialization failed: {e}")))?;

    let version = FormVersionRepo::create_in_tx(
        &mut tx,
        &CreateFormVersion {
            form_id,
            version_number,
            snapshot: snapshot_json,
            published_by: actor,
        },
    )
    .await?;
    FormRepo::set_current_version(&mut tx, form_id, version.id).await?;
    let routines_updated =
        RoutineRepo::set_active_form_version_for_form(&mut tx, form_id, version.id).await?;
    tx.commit().await?;

    let mut event = PlatformEvent::new(EVENT_FORM_PUBLISHED)
        .with_subject("form", form_id)
        .with_payload(json!({
            "version_id": version.id,
            "version_number": version.version_number,
            "task_count": snapshot.tasks.len(),
            "routines_updated": routines_updated,
        }));
    if let Some(actor) = actor {
        event = event.with_actor(actor);
    }
    bus.publish(event);

    tracing::info!(
        form_id,
        version_number = version.version_number,
        routines_updated,
        "Form published"
    );
    Ok(version)
}

/// Soft-disable a published version from future use.
///
/// Fails with a state conflict when the version is its form's current
/// version, or when executions already reference it (orphaning guard).
pub async fn deactivate_version(
    pool: &PgPool,
    bus: &EventBus,
    version_id: DbId,
    actor: Option<DbId>,
) -> EngineResult<()> {
    let version = FormVersionRepo::find_by_id(pool, version_id)
        .await?
        .ok_or_else(|| EngineError::not_found("form_version", version_id))?;

    let form = FormRepo::find_by_id(pool, version.form_id)
        .await?
        .ok_or_else(|| EngineError::not_found("form", version.form_id))?;
    if form.current_version_id == Some(version_id) {
        return Err(EngineError::state_conflict(format!(
            "Version {version_id} is the current version of form {} and cannot be deactivated",
            form.id
        )));
    }

    let executions = FormVersionRepo::count_executions(pool, version_id).await?;
    if executions > 0 {
        return Err(EngineError::state_conflict(format!(
            "Version {version_id} is referenced by {executions} execution(s) and cannot be deactivated"
        )));
    }

    FormVersionRepo::deactivate(pool, version_id).await?;

    let mut event = PlatformEvent::new(EVENT_FORM_VERSION_DEACTIVATED)
        .with_subject("form_version", version_id)
        .with_payload(json!({ "form_id": version.form_id }));
    if let Some(actor) = actor {
        event = event.with_actor(actor);
    }
    bus.publish(event);
    Ok(())
}
