//! SignalK output deltas.
//!
//! Course values are published in SignalK units: angles in radians and
//! speeds in m/s. Missing values are published as `null` so that a cleared
//! course also clears the values downstream.

use course_core::{CourseResult, KN_TO_MS};
use serde::Serialize;
use serde_json::{json, Value};

pub const CALC_VALUES_PATH: &str = "navigation.course.calcValues";

/// One `{path, value}` pair of a delta
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathValue {
    pub path: String,
    pub value: Value,
}

impl PathValue {
    pub fn new(path: impl Into<String>, value: Value) -> Self {
        PathValue {
            path: path.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationState {
    Normal,
    Alert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationMethod {
    Visual,
    Sound,
}

/// Value of a `notifications.*` path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub state: NotificationState,
    pub method: Vec<NotificationMethod>,
    pub message: String,
}

impl Notification {
    pub fn new(state: NotificationState, message: impl Into<String>) -> Self {
        Notification {
            state,
            method: vec![NotificationMethod::Visual, NotificationMethod::Sound],
            message: message.into(),
        }
    }
}

/// calcValues leaves for one course result
pub fn path_values(result: &CourseResult) -> Vec<PathValue> {
    let radians = |degrees: Option<f64>| number(degrees.map(f64::to_radians));

    let leaves = [
        ("calcMethod", json!(result.calc_method.to_string())),
        ("bearingTrackTrue", radians(result.bearing_track_true)),
        ("bearingTrackMagnetic", radians(result.bearing_track_magnetic)),
        ("crossTrackError", number(result.cross_track_error)),
        ("distance", number(result.distance)),
        ("bearingTrue", radians(result.bearing_true)),
        ("bearingMagnetic", radians(result.bearing_magnetic)),
        (
            "velocityMadeGood",
            number(result.velocity_made_good.map(|vmg| vmg * KN_TO_MS)),
        ),
        ("timeToGo", number(result.time_to_go)),
        (
            "estimatedTimeOfArrival",
            result.eta_iso().map(Value::String).unwrap_or(Value::Null),
        ),
        ("previousPoint.distance", number(result.previous_point_distance)),
    ];

    leaves
        .into_iter()
        .map(|(leaf, value)| PathValue::new(format!("{}.{}", CALC_VALUES_PATH, leaf), value))
        .collect()
}

/// Wrap path values in a SignalK delta
pub fn delta(values: Vec<PathValue>) -> Value {
    json!({ "updates": [{ "values": values }] })
}

pub fn notification_delta(path: &str, notification: &Notification) -> Value {
    delta(vec![PathValue::new(path, json!(notification))])
}

// NaN and infinity have no JSON representation
fn number(value: Option<f64>) -> Value {
    value
        .filter(|v| v.is_finite())
        .map(Value::from)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use course_core::CalcMethod;

    fn value_of<'a>(values: &'a [PathValue], leaf: &str) -> &'a Value {
        let path = format!("{}.{}", CALC_VALUES_PATH, leaf);
        &values
            .iter()
            .find(|pv| pv.path == path)
            .unwrap_or_else(|| panic!("missing {}", path))
            .value
    }

    #[test]
    fn test_units_converted() {
        let mut result = CourseResult::empty(CalcMethod::Rhumbline);
        result.bearing_true = Some(90.0);
        result.bearing_magnetic = Some(180.0);
        result.velocity_made_good = Some(10.0);
        result.distance = Some(1852.0);
        result.cross_track_error = Some(-12.5);
        result.time_to_go = Some(360.0);
        result.estimated_time_of_arrival = Some(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());

        let values = path_values(&result);
        assert_eq!(values.len(), 11);

        assert_eq!(value_of(&values, "calcMethod"), &json!("Rhumbline"));
        let bearing = value_of(&values, "bearingTrue").as_f64().unwrap();
        assert!((bearing - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        let magnetic = value_of(&values, "bearingMagnetic").as_f64().unwrap();
        assert!((magnetic - std::f64::consts::PI).abs() < 1e-12);
        let vmg = value_of(&values, "velocityMadeGood").as_f64().unwrap();
        assert!((vmg - 5.14444).abs() < 1e-9);
        assert_eq!(value_of(&values, "distance"), &json!(1852.0));
        assert_eq!(value_of(&values, "crossTrackError"), &json!(-12.5));
        assert_eq!(value_of(&values, "timeToGo"), &json!(360.0));
        assert_eq!(
            value_of(&values, "estimatedTimeOfArrival"),
            &json!("2024-01-01T12:00:00.000Z")
        );
    }

    #[test]
    fn test_empty_result_publishes_nulls() {
        let values = path_values(&CourseResult::empty(CalcMethod::GreatCircle));
        assert_eq!(value_of(&values, "calcMethod"), &json!("GreatCircle"));
        assert!(values
            .iter()
            .filter(|pv| !pv.path.ends_with("calcMethod"))
            .all(|pv| pv.value.is_null()));
        assert!(value_of(&values, "previousPoint.distance").is_null());
    }

    #[test]
    fn test_delta_shape() {
        let d = delta(vec![PathValue::new("a.b", json!(1))]);
        assert_eq!(
            d,
            json!({ "updates": [{ "values": [{ "path": "a.b", "value": 1 }] }] })
        );
    }

    #[test]
    fn test_notification_delta() {
        let n = Notification::new(NotificationState::Alert, "Arrived");
        let d = notification_delta("notifications.navigation.arrivalCircleEntered", &n);
        assert_eq!(
            d["updates"][0]["values"][0]["value"],
            json!({ "state": "alert", "method": ["visual", "sound"], "message": "Arrived" })
        );
    }
}
