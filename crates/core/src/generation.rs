//! Work order generation planning (PRD-08).
//!
//! The scheduled scan and the explicit per-routine call both funnel through
//! [`plan_generation`], a pure decision over pre-loaded data. The engine
//! crate executes `Generate` decisions transactionally; `Skip` outcomes are
//! logged, never errors — repeated scans must stay idempotent.

use crate::routine::{self, ExecutionMode, TriggerType};
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// The slice of a routine row that the generation decision needs.
#[derive(Debug, Clone)]
pub struct RoutineView {
    pub routine_id: DbId,
    pub asset_id: DbId,
    pub is_active: bool,
    pub execution_mode: ExecutionMode,
    pub trigger_type: TriggerType,
    pub trigger_runtime_hours: Option<f64>,
    pub trigger_calendar_days: Option<i32>,
    /// Unit follows `trigger_type`: hours for runtime, days for calendar.
    pub advance_window: f64,
    pub last_execution_runtime_hours: Option<f64>,
    pub last_execution_completed_at: Option<Timestamp>,
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Why a routine was passed over by a generation pass.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// Routine is deactivated.
    Inactive,
    /// Routine is manual and the caller is the scheduled scan.
    ManualMode,
    /// Not yet inside the advance window; distance in trigger units.
    NotDue { distance: f64 },
    /// An open work order already covers the current due cycle.
    DuplicateOpen,
}

/// Outcome of planning one routine.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationDecision {
    Skip(SkipReason),
    Generate,
}

/// Decide whether a work order should be generated for `routine`.
///
/// `scheduled_scan` is true when invoked from the periodic scan, which only
/// generates for automatic routines; the explicit user-triggered call passes
/// false and may generate for manual routines too. The duplicate check is
/// evaluated last so a skip for dedup is only reported when the routine was
/// otherwise due.
///
/// Returns an error only for misconfigured rows (missing trigger threshold).
pub fn plan_generation(
    routine: &RoutineView,
    current_runtime_hours: Option<f64>,
    has_open_order: bool,
    now: Timestamp,
    scheduled_scan: bool,
) -> Result<GenerationDecision, String> {
    if !routine.is_active {
        return Ok(GenerationDecision::Skip(SkipReason::Inactive));
    }
    if scheduled_scan && routine.execution_mode == ExecutionMode::Manual {
        return Ok(GenerationDecision::Skip(SkipReason::ManualMode));
    }

    let distance = routine::distance_until_due(
        routine.trigger_type,
        routine.trigger_runtime_hours,
        routine.trigger_calendar_days,
        routine.last_execution_runtime_hours,
        routine.last_execution_completed_at,
        current_runtime_hours,
        now,
    )?;

    if !routine::should_generate(routine.is_active, distance, routine.advance_window) {
        return Ok(GenerationDecision::Skip(SkipReason::NotDue { distance }));
    }
    if has_open_order {
        return Ok(GenerationDecision::Skip(SkipReason::DuplicateOpen));
    }
    Ok(GenerationDecision::Generate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone, Utc};

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2025, 6, 15, 8, 0, 0).unwrap()
    }

    fn runtime_routine() -> RoutineView {
        RoutineView {
            routine_id: 1,
            asset_id: 10,
            is_active: true,
            execution_mode: ExecutionMode::Automatic,
            trigger_type: TriggerType::RuntimeHours,
            trigger_runtime_hours: Some(100.0),
            trigger_calendar_days: None,
            advance_window: 10.0,
            last_execution_runtime_hours: Some(80.0),
            last_execution_completed_at: None,
        }
    }

    #[test]
    fn overdue_runtime_routine_generates() {
        // trigger 100, advance 10, last 80, current 190: 110 elapsed, due.
        let decision =
            plan_generation(&runtime_routine(), Some(190.0), false, now(), true).unwrap();
        assert_eq!(decision, GenerationDecision::Generate);
    }

    #[test]
    fn routine_inside_advance_window_generates() {
        // 95 elapsed: 5 hours until due, within the 10-hour window.
        let decision =
            plan_generation(&runtime_routine(), Some(175.0), false, now(), true).unwrap();
        assert_eq!(decision, GenerationDecision::Generate);
    }

    #[test]
    fn routine_outside_advance_window_skips() {
        // 50 elapsed: 50 hours until due.
        let decision =
            plan_generation(&runtime_routine(), Some(130.0), false, now(), true).unwrap();
        assert_matches!(
            decision,
            GenerationDecision::Skip(SkipReason::NotDue { distance }) if distance == 50.0
        );
    }

    #[test]
    fn open_order_dedups() {
        let decision =
            plan_generation(&runtime_routine(), Some(190.0), true, now(), true).unwrap();
        assert_eq!(decision, GenerationDecision::Skip(SkipReason::DuplicateOpen));
    }

    #[test]
    fn dedup_not_reported_when_not_due() {
        // An open order exists but the routine is not due anyway.
        let decision =
            plan_generation(&runtime_routine(), Some(130.0), true, now(), true).unwrap();
        assert_matches!(decision, GenerationDecision::Skip(SkipReason::NotDue { .. }));
    }

    #[test]
    fn inactive_routine_skips() {
        let mut r = runtime_routine();
        r.is_active = false;
        let decision = plan_generation(&r, Some(190.0), false, now(), true).unwrap();
        assert_eq!(decision, GenerationDecision::Skip(SkipReason::Inactive));
    }

    #[test]
    fn manual_routine_skipped_by_scan_but_not_by_explicit_call() {
        let mut r = runtime_routine();
        r.execution_mode = ExecutionMode::Manual;
        let scan = plan_generation(&r, Some(190.0), false, now(), true).unwrap();
        assert_eq!(scan, GenerationDecision::Skip(SkipReason::ManualMode));
        let explicit = plan_generation(&r, Some(190.0), false, now(), false).unwrap();
        assert_eq!(explicit, GenerationDecision::Generate);
    }

    #[test]
    fn never_executed_routine_generates_immediately() {
        let mut r = runtime_routine();
        r.last_execution_runtime_hours = None;
        let decision = plan_generation(&r, None, false, now(), true).unwrap();
        assert_eq!(decision, GenerationDecision::Generate);
    }

    #[test]
    fn never_executed_routine_with_open_order_still_dedups() {
        // The never-executed policy must not bypass the duplicate guard.
        let mut r = runtime_routine();
        r.last_execution_runtime_hours = None;
        let decision = plan_generation(&r, None, true, now(), true).unwrap();
        assert_eq!(decision, GenerationDecision::Skip(SkipReason::DuplicateOpen));
    }

    #[test]
    fn calendar_routine_due_generates() {
        let r = RoutineView {
            routine_id: 2,
            asset_id: 10,
            is_active: true,
            execution_mode: ExecutionMode::Automatic,
            trigger_type: TriggerType::CalendarDays,
            trigger_runtime_hours: None,
            trigger_calendar_days: Some(30),
            advance_window: 3.0,
            last_execution_runtime_hours: None,
            last_execution_completed_at: Some(now() - Duration::days(28)),
        };
        // 2 days until due, within the 3-day window.
        let decision = plan_generation(&r, None, false, now(), true).unwrap();
        assert_eq!(decision, GenerationDecision::Generate);
    }

    #[test]
    fn misconfigured_routine_is_an_error() {
        let mut r = runtime_routine();
        r.trigger_runtime_hours = None;
        assert!(plan_generation(&r, Some(190.0), false, now(), true).is_err());
    }
}
