//! Asset runtime tracking math (PRD-03).
//!
//! Measurements are append-only; the "current runtime" of an asset is the
//! measurement with the latest reading timestamp. Evaluation here is done
//! against pre-loaded measurement views passed in by the caller.

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Measurement view
// ---------------------------------------------------------------------------

/// The slice of a runtime measurement row that due-calculation needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementView {
    /// Hour-meter reading reported by the source.
    pub reported_hours: f64,
    /// When the reading was taken (not when it was recorded).
    pub measured_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a reported hour-meter value before recording it.
///
/// Negative and non-finite values are rejected. Monotonicity against prior
/// readings is a convention, not enforced here.
pub fn validate_reported_hours(hours: f64) -> Result<(), String> {
    if !hours.is_finite() {
        return Err(format!("reported_hours must be a finite number, got {hours}"));
    }
    if hours < 0.0 {
        return Err(format!("reported_hours must not be negative, got {hours}"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Current runtime in hours: the reading with the latest `measured_at`.
///
/// Returns `None` when the asset has no measurements.
pub fn latest_runtime_hours(measurements: &[MeasurementView]) -> Option<f64> {
    measurements
        .iter()
        .max_by_key(|m| m.measured_at)
        .map(|m| m.reported_hours)
}

/// Runtime accumulated since `since`: latest reading minus the latest
/// reading taken at or before `since`.
///
/// Returns `None` when there is no reading after `since` to compare against.
/// When no baseline reading exists at or before `since`, the full latest
/// reading is returned (the meter is assumed to start at zero).
pub fn runtime_delta_since(measurements: &[MeasurementView], since: Timestamp) -> Option<f64> {
    let latest = measurements.iter().max_by_key(|m| m.measured_at)?;
    if latest.measured_at <= since {
        return None;
    }
    let baseline = measurements
        .iter()
        .filter(|m| m.measured_at <= since)
        .max_by_key(|m| m.measured_at)
        .map(|m| m.reported_hours)
        .unwrap_or(0.0);
    Some(latest.reported_hours - baseline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(day: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2025, 6, day, 12, 0, 0).unwrap()
    }

    fn m(hours: f64, day: u32) -> MeasurementView {
        MeasurementView {
            reported_hours: hours,
            measured_at: at(day),
        }
    }

    // -----------------------------------------------------------------------
    // validate_reported_hours
    // -----------------------------------------------------------------------

    #[test]
    fn zero_hours_valid() {
        assert!(validate_reported_hours(0.0).is_ok());
    }

    #[test]
    fn positive_hours_valid() {
        assert!(validate_reported_hours(1234.5).is_ok());
    }

    #[test]
    fn negative_hours_rejected() {
        let err = validate_reported_hours(-1.0).unwrap_err();
        assert!(err.contains("negative"));
    }

    #[test]
    fn nan_rejected() {
        assert!(validate_reported_hours(f64::NAN).is_err());
    }

    #[test]
    fn infinity_rejected() {
        assert!(validate_reported_hours(f64::INFINITY).is_err());
    }

    // -----------------------------------------------------------------------
    // latest_runtime_hours
    // -----------------------------------------------------------------------

    #[test]
    fn no_measurements_returns_none() {
        assert_eq!(latest_runtime_hours(&[]), None);
    }

    #[test]
    fn latest_by_measured_at_wins() {
        // Out of insertion order on purpose.
        let ms = vec![m(500.0, 10), m(900.0, 20), m(700.0, 15)];
        assert_eq!(latest_runtime_hours(&ms), Some(900.0));
    }

    #[test]
    fn single_measurement() {
        assert_eq!(latest_runtime_hours(&[m(42.0, 1)]), Some(42.0));
    }

    // -----------------------------------------------------------------------
    // runtime_delta_since
    // -----------------------------------------------------------------------

    #[test]
    fn delta_between_readings() {
        let ms = vec![m(100.0, 5), m(250.0, 10)];
        assert_eq!(runtime_delta_since(&ms, at(5)), Some(150.0));
    }

    #[test]
    fn delta_with_no_baseline_uses_zero() {
        let ms = vec![m(250.0, 10)];
        assert_eq!(runtime_delta_since(&ms, at(5)), Some(250.0));
    }

    #[test]
    fn no_reading_after_cutoff_returns_none() {
        let ms = vec![m(100.0, 5)];
        assert_eq!(runtime_delta_since(&ms, at(10)), None);
    }

    #[test]
    fn empty_returns_none() {
        assert_eq!(runtime_delta_since(&[], at(1)), None);
    }
}
