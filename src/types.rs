//! Core data types for weather station telemetry.
//!
//! - [`Reading`]: one decoded sample, transient
//! - [`ValidationResult`]: plausibility verdict for a reading
//! - [`StationRecord`]: latest known state for a station, kept in the registry

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Measurement Values
// ============================================================================

/// A sensor value as it arrived on the wire.
///
/// Producers occasionally send strings or `null` where a number belongs.
/// Those values still decode; the validator flags them instead of the
/// decoder dropping the whole message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Measurement {
    Numeric(f64),
    NonNumeric(serde_json::Value),
}

impl Measurement {
    /// The numeric value, if the producer sent a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Measurement::Numeric(v) => Some(*v),
            Measurement::NonNumeric(_) => None,
        }
    }
}

impl From<f64> for Measurement {
    fn from(value: f64) -> Self {
        Measurement::Numeric(value)
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measurement::Numeric(v) => write!(f, "{v}"),
            Measurement::NonNumeric(v) => write!(f, "{v}"),
        }
    }
}

/// Producer-supplied time of a reading. Opaque: never parsed or checked for recency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Text(String),
    Epoch(serde_json::Number),
}

impl From<&str> for Timestamp {
    fn from(value: &str) -> Self {
        Timestamp::Text(value.to_string())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Text(s) => f.write_str(s),
            Timestamp::Epoch(n) => write!(f, "{n}"),
        }
    }
}

// ============================================================================
// Reading
// ============================================================================

/// One telemetry sample published by a station on the `weather` topic.
///
/// Wire format:
/// `{"stationId":"WS-01","temperature":22.5,"humidity":55,"timestamp":"2024-05-01T12:00:00Z"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub station_id: String,
    /// Degrees Celsius
    pub temperature: Measurement,
    /// Relative humidity, percent
    pub humidity: Measurement,
    pub timestamp: Timestamp,
}

// ============================================================================
// Validation
// ============================================================================

/// Plausibility verdict for a single reading.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    /// Human-readable issue descriptions, empty when `valid`
    pub issues: Vec<String>,
}

impl ValidationResult {
    /// Build a verdict from collected issues; valid iff there are none.
    pub fn from_issues(issues: Vec<String>) -> Self {
        Self {
            valid: issues.is_empty(),
            issues,
        }
    }
}

// ============================================================================
// Station Record
// ============================================================================

/// Latest known state of a station.
///
/// Always derived from exactly one reading; a newer reading replaces every field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    pub temperature: Measurement,
    pub humidity: Measurement,
    pub timestamp: Timestamp,
    pub valid: bool,
    pub issues: Vec<String>,
}

impl StationRecord {
    pub fn from_reading(reading: &Reading, validation: &ValidationResult) -> Self {
        Self {
            temperature: reading.temperature.clone(),
            humidity: reading.humidity.clone(),
            timestamp: reading.timestamp.clone(),
            valid: validation.valid,
            issues: validation.issues.clone(),
        }
    }
}

/// Point-in-time copy of the registry, in first-seen station order.
pub type Snapshot = Vec<(String, StationRecord)>;
