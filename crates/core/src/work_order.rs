//! Work order constants and state machine (PRD-07).
//!
//! This module lives in `core` (zero internal deps) so it can be used by
//! both the repository layer and the worker without pulling in sqlx.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

// ---------------------------------------------------------------------------
// Priority constants
// ---------------------------------------------------------------------------

/// Priority value for urgent work orders. Scheduled before all others.
pub const PRIORITY_URGENT: i32 = 10;

/// Priority value for normal work orders. Default.
pub const PRIORITY_NORMAL: i32 = 0;

/// Priority value for low-priority work orders. Scheduled last.
pub const PRIORITY_LOW: i32 = -10;

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// Source type value for routine-generated orders.
pub const SOURCE_ROUTINE: &str = "routine";

/// Source type value for manually requested orders.
pub const SOURCE_MANUAL: &str = "manual";

/// Where a work order came from.
///
/// Stored as `(source_type, source_ref)` columns; modeled here as a tagged
/// union so callers cannot pair a routine source with a user reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkOrderSource {
    /// Generated from a maintenance routine.
    Routine { routine_id: DbId },
    /// Requested by a user outside any routine.
    Manual { requested_by: DbId },
}

impl WorkOrderSource {
    /// The `source_type` column value.
    pub fn source_type(&self) -> &'static str {
        match self {
            Self::Routine { .. } => SOURCE_ROUTINE,
            Self::Manual { .. } => SOURCE_MANUAL,
        }
    }

    /// The `source_ref` column value (routine id or requesting user id).
    pub fn source_ref(&self) -> DbId {
        match self {
            Self::Routine { routine_id } => *routine_id,
            Self::Manual { requested_by } => *requested_by,
        }
    }

    /// Reassemble from the stored column pair.
    pub fn from_columns(source_type: &str, source_ref: DbId) -> Result<Self, String> {
        match source_type {
            SOURCE_ROUTINE => Ok(Self::Routine {
                routine_id: source_ref,
            }),
            SOURCE_MANUAL => Ok(Self::Manual {
                requested_by: source_ref,
            }),
            _ => Err(format!(
                "Invalid work order source type '{source_type}'. Must be one of: {SOURCE_ROUTINE}, {SOURCE_MANUAL}"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Discipline / category compatibility
// ---------------------------------------------------------------------------

/// Maintenance discipline values.
pub const DISCIPLINE_MAINTENANCE: &str = "maintenance";
pub const DISCIPLINE_QUALITY: &str = "quality";
pub const DISCIPLINE_SAFETY: &str = "safety";

/// All valid discipline values.
pub const VALID_DISCIPLINES: &[&str] =
    &[DISCIPLINE_MAINTENANCE, DISCIPLINE_QUALITY, DISCIPLINE_SAFETY];

/// Work order category values.
pub const CATEGORY_PREVENTIVE: &str = "preventive";
pub const CATEGORY_CORRECTIVE: &str = "corrective";
pub const CATEGORY_INSPECTION: &str = "inspection";
pub const CATEGORY_CALIBRATION: &str = "calibration";
pub const CATEGORY_AUDIT: &str = "audit";

/// All valid category values.
pub const VALID_CATEGORIES: &[&str] = &[
    CATEGORY_PREVENTIVE,
    CATEGORY_CORRECTIVE,
    CATEGORY_INSPECTION,
    CATEGORY_CALIBRATION,
    CATEGORY_AUDIT,
];

/// Categories legal for a given discipline.
///
/// A maintenance order cannot carry a quality-side category (calibration,
/// audit) and vice versa; inspection is shared.
pub fn categories_for_discipline(discipline: &str) -> &'static [&'static str] {
    match discipline {
        DISCIPLINE_MAINTENANCE => &[CATEGORY_PREVENTIVE, CATEGORY_CORRECTIVE, CATEGORY_INSPECTION],
        DISCIPLINE_QUALITY => &[CATEGORY_CALIBRATION, CATEGORY_AUDIT, CATEGORY_INSPECTION],
        DISCIPLINE_SAFETY => &[CATEGORY_INSPECTION, CATEGORY_AUDIT],
        _ => &[],
    }
}

/// Validate a discipline/category pair at creation time.
pub fn validate_category_for_discipline(discipline: &str, category: &str) -> Result<(), String> {
    if !VALID_DISCIPLINES.contains(&discipline) {
        return Err(format!(
            "Invalid discipline '{discipline}'. Must be one of: {}",
            VALID_DISCIPLINES.join(", ")
        ));
    }
    let legal = categories_for_discipline(discipline);
    if legal.contains(&category) {
        Ok(())
    } else {
        Err(format!(
            "Category '{category}' is not valid for discipline '{discipline}'. Must be one of: {}",
            legal.join(", ")
        ))
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Work order status IDs matching `work_order_statuses` seed data (1-based
/// SMALLSERIAL).
///
/// The state machine is intentionally duplicated from the `db` crate's
/// `WorkOrderStatus` enum because `core` must have zero internal deps.
pub mod state_machine {
    /// Statuses that block duplicate generation for the same routine cycle.
    pub const OPEN_STATUSES: &[i16] = &[1, 2, 3];

    /// Returns the set of valid target status IDs reachable from `from_status`.
    ///
    /// Terminal states (Cancelled=6, Closed=7) return an empty slice because
    /// no further transitions are allowed.
    pub fn valid_transitions(from_status: i16) -> &'static [i16] {
        match from_status {
            // Requested -> Approved, Rejected, Cancelled
            1 => &[2, 5, 6],
            // Approved -> Executing, Cancelled
            2 => &[3, 6],
            // Executing -> Completed, Cancelled
            3 => &[4, 6],
            // Completed -> Closed
            4 => &[7],
            // Rejected -> Requested (resubmission)
            5 => &[1],
            // Terminal states: Cancelled, Closed
            6 | 7 => &[],
            // Unknown status: no transitions allowed
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

    /// Whether a status counts as open (non-terminal work still outstanding).
    pub fn is_open(status: i16) -> bool {
        OPEN_STATUSES.contains(&status)
    }

    /// Human-readable name for a status ID (for error messages).
    pub fn status_name(id: i16) -> &'static str {
        match id {
            1 => "Requested",
            2 => "Approved",
            3 => "Executing",
            4 => "Completed",
            5 => "Rejected",
            6 => "Cancelled",
            7 => "Closed",
            _ => "Unknown",
        }
    }
}
