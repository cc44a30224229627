//! Physical plausibility checks for station readings.
//!
//! Each rule contributes its own issue, so a reading with both a broken
//! thermometer and a broken hygrometer reports two issues.

use crate::types::{Measurement, Reading, ValidationResult};

/// Absolute zero, rounded. Inclusive lower bound, no upper bound.
pub const TEMPERATURE_FLOOR_CELSIUS: f64 = -273.0;

pub const HUMIDITY_MIN_PERCENT: f64 = 0.0;
pub const HUMIDITY_MAX_PERCENT: f64 = 100.0;

/// Apply all plausibility rules to a reading.
pub fn validate(reading: &Reading) -> ValidationResult {
    let mut issues = Vec::new();

    if !temperature_plausible(&reading.temperature) {
        issues.push(format!("invalid temperature: {}", reading.temperature));
    }

    if !humidity_plausible(&reading.humidity) {
        issues.push(format!("invalid humidity: {}", reading.humidity));
    }

    ValidationResult::from_issues(issues)
}

fn temperature_plausible(value: &Measurement) -> bool {
    value
        .as_f64()
        .is_some_and(|t| t >= TEMPERATURE_FLOOR_CELSIUS)
}

fn humidity_plausible(value: &Measurement) -> bool {
    value
        .as_f64()
        .is_some_and(|h| (HUMIDITY_MIN_PERCENT..=HUMIDITY_MAX_PERCENT).contains(&h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Timestamp;

    fn reading(temperature: Measurement, humidity: Measurement) -> Reading {
        Reading {
            station_id: "WS-TEST".to_string(),
            temperature,
            humidity,
            timestamp: Timestamp::from("2024-05-01T12:00:00Z"),
        }
    }

    fn numeric(t: f64, h: f64) -> Reading {
        reading(t.into(), h.into())
    }

    #[test]
    fn test_temperature_valid_range() {
        let result = validate(&numeric(30.0, 45.5));
        assert!(result.valid);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_temperature_failure_case() {
        let result = validate(&numeric(-999.0, 45.5));
        assert!(!result.valid);
        assert_eq!(result.issues, vec!["invalid temperature: -999".to_string()]);
    }

    #[test]
    fn test_temperature_floor_is_inclusive() {
        assert!(validate(&numeric(-273.0, 50.0)).valid);
        assert!(!validate(&numeric(-273.01, 50.0)).valid);
    }

    #[test]
    fn test_temperature_has_no_upper_bound() {
        assert!(validate(&numeric(1.0e6, 50.0)).valid);
    }

    #[test]
    fn test_humidity_failure_case() {
        let result = validate(&numeric(20.0, 120.0));
        assert!(!result.valid);
        assert_eq!(result.issues, vec!["invalid humidity: 120".to_string()]);
    }

    #[test]
    fn test_humidity_bounds_inclusive() {
        assert!(validate(&numeric(20.0, 0.0)).valid);
        assert!(validate(&numeric(20.0, 100.0)).valid);
        assert!(!validate(&numeric(20.0, -0.1)).valid);
        assert!(!validate(&numeric(20.0, 100.1)).valid);
    }

    #[test]
    fn test_both_rules_fail_independently() {
        let result = validate(&numeric(-300.0, 150.0));
        assert!(!result.valid);
        assert_eq!(result.issues.len(), 2);
        assert!(result.issues[0].contains("-300"));
        assert!(result.issues[1].contains("150"));
    }

    #[test]
    fn test_non_numeric_values_are_invalid() {
        let result = validate(&reading(
            Measurement::NonNumeric(serde_json::json!("warm")),
            Measurement::NonNumeric(serde_json::Value::Null),
        ));
        assert!(!result.valid);
        assert_eq!(
            result.issues,
            vec![
                "invalid temperature: \"warm\"".to_string(),
                "invalid humidity: null".to_string(),
            ]
        );
    }

    #[test]
    fn test_validation_is_pure() {
        let r = numeric(-500.0, 50.0);
        assert_eq!(validate(&r), validate(&r));
    }

    #[test]
    fn test_temperature_sweep_matches_floor() {
        for tenth in -3000..=500 {
            let t = f64::from(tenth) / 10.0;
            let result = validate(&numeric(t, 50.0));
            assert_eq!(result.valid, t >= -273.0, "temperature {t}");
        }
    }

    #[test]
    fn test_humidity_sweep_matches_range() {
        for tenth in -100..=1100 {
            let h = f64::from(tenth) / 10.0;
            let result = validate(&numeric(20.0, h));
            assert_eq!(result.valid, (0.0..=100.0).contains(&h), "humidity {h}");
        }
    }
}
