//! Navigation state fed from SignalK deltas.
//!
//! Keeps the latest value of every path the course engine needs and turns
//! it into a [`NavigationSnapshot`]. SignalK carries angles in radians and
//! speeds in m/s; they are converted to the degrees and knots the engine
//! works in as they arrive.

use chrono::{DateTime, Utc};
use course_core::{GeoPoint, NavError, NavigationSnapshot, MS_TO_KN};
use log::{debug, warn};
use serde_json::Value;
use thiserror::Error;

pub const SELF_CONTEXT: &str = "vessels.self";

const POSITION: &str = "navigation.position";
const NEXT_POINT: &str = "navigation.course.nextPoint";
const NEXT_POINT_POSITION: &str = "navigation.course.nextPoint.position";
const PREVIOUS_POINT: &str = "navigation.course.previousPoint";
const PREVIOUS_POINT_POSITION: &str = "navigation.course.previousPoint.position";
const MAGNETIC_VARIATION: &str = "navigation.magneticVariation";
const HEADING_TRUE: &str = "navigation.headingTrue";
const SPEED_OVER_GROUND: &str = "navigation.speedOverGround";
const DATETIME: &str = "navigation.datetime";
const ARRIVAL_CIRCLE: &str = "navigation.course.arrivalCircle";

#[derive(Error, Debug)]
pub enum DeltaError {
    #[error("Delta is not a JSON object")]
    NotAnObject,
    #[error("Delta has no updates array")]
    MissingUpdates,
}

/// What a delta changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeltaOutcome {
    /// Number of tracked path values applied
    pub applied: usize,
    /// Whether `navigation.position` was among them
    pub position_updated: bool,
}

/// Latest known navigation values
#[derive(Debug, Clone, Default)]
pub struct NavigationData {
    snapshot: NavigationSnapshot,
    /// Arrival circle radius in meters
    arrival_circle: Option<f64>,
}

impl NavigationData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply all values of a SignalK delta.
    ///
    /// Deltas for other vessels are ignored. Untracked paths are skipped.
    pub fn apply_delta(&mut self, delta: &Value) -> Result<DeltaOutcome, DeltaError> {
        let delta = delta.as_object().ok_or(DeltaError::NotAnObject)?;

        if let Some(context) = delta.get("context").and_then(Value::as_str) {
            if context != SELF_CONTEXT {
                debug!("Ignoring delta for context {}", context);
                return Ok(DeltaOutcome::default());
            }
        }

        let updates = delta
            .get("updates")
            .and_then(Value::as_array)
            .ok_or(DeltaError::MissingUpdates)?;

        let mut outcome = DeltaOutcome::default();
        for update in updates {
            let Some(values) = update.get("values").and_then(Value::as_array) else {
                continue;
            };
            for entry in values {
                let Some(path) = entry.get("path").and_then(Value::as_str) else {
                    continue;
                };
                let value = entry.get("value").unwrap_or(&Value::Null);
                if self.apply_value(path, value) {
                    outcome.applied += 1;
                    outcome.position_updated |= path == POSITION;
                }
            }
        }
        Ok(outcome)
    }

    /// Apply one path value. Returns false for untracked paths.
    pub fn apply_value(&mut self, path: &str, value: &Value) -> bool {
        let snapshot = &mut self.snapshot;
        match path {
            POSITION => snapshot.position = position_or_absent(path, value),
            NEXT_POINT | NEXT_POINT_POSITION => {
                snapshot.next_point = position_or_absent(path, waypoint_position(value))
            }
            PREVIOUS_POINT | PREVIOUS_POINT_POSITION => {
                snapshot.previous_point = position_or_absent(path, waypoint_position(value))
            }
            MAGNETIC_VARIATION => {
                snapshot.magnetic_variation = number(path, value).map(f64::to_degrees)
            }
            HEADING_TRUE => snapshot.heading_true = number(path, value).map(f64::to_degrees),
            SPEED_OVER_GROUND => {
                snapshot.speed_over_ground = number(path, value).map(|sog| sog * MS_TO_KN)
            }
            DATETIME => snapshot.timestamp = datetime(path, value),
            ARRIVAL_CIRCLE => self.arrival_circle = number(path, value),
            _ => return false,
        }
        true
    }

    /// Copy of the current values
    pub fn snapshot(&self) -> NavigationSnapshot {
        self.snapshot.clone()
    }

    /// Snapshot for one computation.
    ///
    /// A received `navigation.datetime` is used by one computation only, so
    /// a source that stops sending time falls back to the wall clock instead
    /// of a frozen timestamp.
    pub fn take_snapshot(&mut self) -> NavigationSnapshot {
        let snapshot = self.snapshot.clone();
        self.snapshot.timestamp = None;
        snapshot
    }

    pub fn arrival_circle(&self) -> Option<f64> {
        self.arrival_circle
    }
}

/// Parse a `{latitude, longitude}` object. `null` means absent.
pub fn parse_position(value: &Value) -> Result<Option<GeoPoint>, NavError> {
    if value.is_null() {
        return Ok(None);
    }
    let coordinate = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_f64)
            .ok_or_else(|| NavError::MalformedPosition(format!("missing numeric {}", key)))
    };
    GeoPoint::new(coordinate("latitude")?, coordinate("longitude")?).map(Some)
}

/// Course points come either as a bare position or wrapped in an object
/// with a `position` member
fn waypoint_position(value: &Value) -> &Value {
    value.get("position").unwrap_or(value)
}

fn position_or_absent(path: &str, value: &Value) -> Option<GeoPoint> {
    match parse_position(value) {
        Ok(position) => position,
        Err(e) => {
            warn!("Ignoring {}: {}", path, e);
            None
        }
    }
}

fn number(path: &str, value: &Value) -> Option<f64> {
    if value.is_null() {
        return None;
    }
    let number = value.as_f64().filter(|n| n.is_finite());
    if number.is_none() {
        warn!("Ignoring non-numeric {}: {}", path, value);
    }
    number
}

fn datetime(path: &str, value: &Value) -> Option<DateTime<Utc>> {
    let text = value.as_str()?;
    match DateTime::parse_from_rfc3339(text) {
        Ok(time) => Some(time.with_timezone(&Utc)),
        Err(e) => {
            warn!("Ignoring {} '{}': {}", path, text, e);
            None
        }
    }
}
