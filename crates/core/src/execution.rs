//! Form execution state machine and response validation (PRD-12).
//!
//! An execution is one run of a published form version against that
//! version's frozen snapshot. Responses are validated here against the
//! snapshot task they answer; completion is gated on the single
//! [`missing_required_task_ids`] predicate, used by both the explicit
//! completion call and the auto-complete-on-last-response path.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::form::{FormSnapshot, TaskSnapshot, TaskType};
use crate::types::DbId;

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Execution status IDs matching `form_execution_statuses` seed data
/// (1-based SMALLSERIAL).
///
/// The state machine is intentionally duplicated from the `db` crate's
/// `FormExecutionStatus` enum because `core` must have zero internal deps.
pub mod state_machine {
    /// Returns the set of valid target status IDs reachable from `from_status`.
    ///
    /// Terminal states (Completed=3, Cancelled=4) return an empty slice.
    pub fn valid_transitions(from_status: i16) -> &'static [i16] {
        match from_status {
            // Pending -> InProgress, Cancelled
            1 => &[2, 4],
            // InProgress -> Completed, Cancelled
            2 => &[3, 4],
            // Terminal states: Completed, Cancelled
            3 | 4 => &[],
            _ => &[],
        }
    }

    /// Check whether a transition from `from` to `to` is valid.
    pub fn can_transition(from: i16, to: i16) -> bool {
        valid_transitions(from).contains(&to)
    }

    /// Validate a state transition, returning an error message for invalid ones.
    pub fn validate_transition(from: i16, to: i16) -> Result<(), String> {
        if can_transition(from, to) {
            Ok(())
        } else {
            let from_name = status_name(from);
            let to_name = status_name(to);
            Err(format!(
                "Invalid transition: {from_name} ({from}) -> {to_name} ({to})"
            ))
        }
    }

    /// Human-readable name for a status ID (for error messages).
    pub fn status_name(id: i16) -> &'static str {
        match id {
            1 => "Pending",
            2 => "InProgress",
            3 => "Completed",
            4 => "Cancelled",
            _ => "Unknown",
        }
    }
}

// ---------------------------------------------------------------------------
// Completion predicate
// ---------------------------------------------------------------------------

/// Required tasks in the snapshot with no completed response yet.
///
/// This is the single completion predicate: explicit completion requires it
/// to return an empty list, and the auto-complete path funnels through the
/// same check. Returned ids are in snapshot (position) order.
pub fn missing_required_task_ids(
    snapshot: &FormSnapshot,
    completed_task_ids: &HashSet<DbId>,
) -> Vec<DbId> {
    snapshot
        .tasks
        .iter()
        .filter(|t| t.is_required && !completed_task_ids.contains(&t.id))
        .map(|t| t.id)
        .collect()
}

/// Whether every task in the snapshot (optional ones included) has a
/// completed response. Gates the implicit completion after a recording.
pub fn all_tasks_completed(snapshot: &FormSnapshot, completed_task_ids: &HashSet<DbId>) -> bool {
    snapshot
        .tasks
        .iter()
        .all(|t| completed_task_ids.contains(&t.id))
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// A task response payload; shape depends on the answered task's type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsePayload {
    /// Free text: `question` and `code_reader` tasks.
    Text { value: String },
    /// One or more configured option values: choice tasks.
    Choice { selected: Vec<String> },
    /// Numeric reading: `measurement` tasks.
    Measurement { value: f64 },
    /// Opaque storage paths: `photo` and `file_upload` tasks.
    Attachments { paths: Vec<String> },
}

/// Validation outcome for an accepted response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseCheck {
    /// Measurement value fell outside the configured min/max bounds.
    /// A quality signal, not a rejection.
    pub outside_range: bool,
}

/// Validate a response payload against the snapshot task it answers.
///
/// Shape mismatches and unknown option values are errors; an out-of-range
/// measurement is accepted and flagged via [`ResponseCheck::outside_range`].
pub fn validate_response(
    task: &TaskSnapshot,
    payload: &ResponsePayload,
) -> Result<ResponseCheck, String> {
    match (task.task_type, payload) {
        (TaskType::Question | TaskType::CodeReader, ResponsePayload::Text { .. }) => {
            Ok(ResponseCheck {
                outside_range: false,
            })
        }
        (TaskType::MultipleChoice, ResponsePayload::Choice { selected }) => {
            if selected.len() != 1 {
                return Err(format!(
                    "multiple_choice task {} requires exactly one selected option, got {}",
                    task.id,
                    selected.len()
                ));
            }
            check_options(task, selected)?;
            Ok(ResponseCheck {
                outside_range: false,
            })
        }
        (TaskType::MultipleSelect, ResponsePayload::Choice { selected }) => {
            if selected.is_empty() {
                return Err(format!(
                    "multiple_select task {} requires at least one selected option",
                    task.id
                ));
            }
            check_options(task, selected)?;
            Ok(ResponseCheck {
                outside_range: false,
            })
        }
        (TaskType::Measurement, ResponsePayload::Measurement { value }) => {
            if !value.is_finite() {
                return Err(format!(
                    "measurement task {} requires a finite value, got {value}",
                    task.id
                ));
            }
            let outside_range = task
                .measurement
                .as_ref()
                .map(|m| {
                    m.min.is_some_and(|min| *value < min) || m.max.is_some_and(|max| *value > max)
                })
                .unwrap_or(false);
            Ok(ResponseCheck { outside_range })
        }
        (TaskType::Photo | TaskType::FileUpload, ResponsePayload::Attachments { .. }) => {
            Ok(ResponseCheck {
                outside_range: false,
            })
        }
        (task_type, _) => Err(format!(
            "Response payload shape does not match {} task {}",
            task_type.as_str(),
            task.id
        )),
    }
}

fn check_options(task: &TaskSnapshot, selected: &[String]) -> Result<(), String> {
    for value in selected {
        if !task.options.iter().any(|o| o == value) {
            return Err(format!(
                "Option '{value}' is not configured on task {}. Must be one of: {}",
                task.id,
                task.options.join(", ")
            ));
        }
    }
    Ok(())
}
