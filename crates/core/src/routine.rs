//! Maintenance routine due-calculation (PRD-04).
//!
//! A routine is a recurring maintenance policy attached to an asset. It is
//! due either by accumulated runtime hours or by elapsed calendar days, and
//! work orders are generated ahead of the due point by the routine's advance
//! window. All functions here are pure; the caller pre-loads the routine and
//! the asset's current runtime.

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Trigger type
// ---------------------------------------------------------------------------

/// Routine triggers on accumulated runtime hours.
pub const TRIGGER_RUNTIME_HOURS: &str = "runtime_hours";

/// Routine triggers on elapsed calendar days.
pub const TRIGGER_CALENDAR_DAYS: &str = "calendar_days";

/// All valid trigger type values.
pub const VALID_TRIGGER_TYPES: &[&str] = &[TRIGGER_RUNTIME_HOURS, TRIGGER_CALENDAR_DAYS];

/// How a routine decides it is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerType {
    RuntimeHours,
    CalendarDays,
}

impl TriggerType {
    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            TRIGGER_RUNTIME_HOURS => Ok(Self::RuntimeHours),
            TRIGGER_CALENDAR_DAYS => Ok(Self::CalendarDays),
            _ => Err(format!(
                "Invalid trigger type '{s}'. Must be one of: {}",
                VALID_TRIGGER_TYPES.join(", ")
            )),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RuntimeHours => TRIGGER_RUNTIME_HOURS,
            Self::CalendarDays => TRIGGER_CALENDAR_DAYS,
        }
    }
}

// ---------------------------------------------------------------------------
// Execution mode
// ---------------------------------------------------------------------------

/// Work orders are generated only on explicit user request.
pub const EXECUTION_MANUAL: &str = "manual";

/// Work orders are generated by the scheduled scan.
pub const EXECUTION_AUTOMATIC: &str = "automatic";

/// All valid execution mode values.
pub const VALID_EXECUTION_MODES: &[&str] = &[EXECUTION_MANUAL, EXECUTION_AUTOMATIC];

/// Whether the scheduled scan may generate for this routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Manual,
    Automatic,
}

impl ExecutionMode {
    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            EXECUTION_MANUAL => Ok(Self::Manual),
            EXECUTION_AUTOMATIC => Ok(Self::Automatic),
            _ => Err(format!(
                "Invalid execution mode '{s}'. Must be one of: {}",
                VALID_EXECUTION_MODES.join(", ")
            )),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => EXECUTION_MANUAL,
            Self::Automatic => EXECUTION_AUTOMATIC,
        }
    }
}

// ---------------------------------------------------------------------------
// Due-calculation
// ---------------------------------------------------------------------------

/// Runtime hours remaining until a runtime-triggered routine is due.
///
/// Clamped at zero once due. A routine with no execution baseline or no
/// runtime measurement yet is treated as immediately due (never-executed
/// policy).
pub fn hours_until_due(
    trigger_runtime_hours: f64,
    last_execution_runtime_hours: Option<f64>,
    current_runtime_hours: Option<f64>,
) -> f64 {
    let (Some(last), Some(current)) = (last_execution_runtime_hours, current_runtime_hours) else {
        return 0.0;
    };
    (trigger_runtime_hours - (current - last)).max(0.0)
}

/// Calendar days remaining until a calendar-triggered routine is due.
///
/// Clamped at zero once due. A routine that has never completed an execution
/// is immediately due.
pub fn days_until_due(
    trigger_calendar_days: f64,
    last_execution_completed_at: Option<Timestamp>,
    now: Timestamp,
) -> f64 {
    let Some(last) = last_execution_completed_at else {
        return 0.0;
    };
    let elapsed_days = (now - last).num_seconds() as f64 / 86_400.0;
    (trigger_calendar_days - elapsed_days).max(0.0)
}

/// Distance until due in the routine's own trigger unit.
///
/// Returns an error when the trigger threshold column for the routine's
/// trigger type is missing (misconfigured row).
pub fn distance_until_due(
    trigger_type: TriggerType,
    trigger_runtime_hours: Option<f64>,
    trigger_calendar_days: Option<i32>,
    last_execution_runtime_hours: Option<f64>,
    last_execution_completed_at: Option<Timestamp>,
    current_runtime_hours: Option<f64>,
    now: Timestamp,
) -> Result<f64, String> {
    match trigger_type {
        TriggerType::RuntimeHours => {
            let trigger = trigger_runtime_hours
                .ok_or_else(|| "runtime_hours routine has no trigger_runtime_hours".to_string())?;
            Ok(hours_until_due(
                trigger,
                last_execution_runtime_hours,
                current_runtime_hours,
            ))
        }
        TriggerType::CalendarDays => {
            let trigger = trigger_calendar_days
                .ok_or_else(|| "calendar_days routine has no trigger_calendar_days".to_string())?;
            Ok(days_until_due(
                trigger as f64,
                last_execution_completed_at,
                now,
            ))
        }
    }
}

/// Whether the routine is due right now (distance reached zero).
pub fn is_due(distance_until_due: f64) -> bool {
    distance_until_due <= 0.0
}

/// Whether a work order should be generated for the routine.
///
/// True when the routine is active and its distance until due is within the
/// advance window. The advance window shares the trigger's unit: runtime
/// hours for `runtime_hours` routines, days for `calendar_days` routines.
/// Execution mode is not consulted here; the scheduled scan restricts itself
/// to automatic routines before calling this.
pub fn should_generate(is_active: bool, distance_until_due: f64, advance_window: f64) -> bool {
    is_active && distance_until_due <= advance_window.max(0.0)
}
