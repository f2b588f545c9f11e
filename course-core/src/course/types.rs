//! Course Result Types
//!
//! Output of the course engine, one result per calculation method.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Calculation method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalcMethod {
    /// Shortest path over the sphere
    GreatCircle,
    /// Constant compass bearing (loxodrome)
    Rhumbline,
}

impl Default for CalcMethod {
    fn default() -> Self {
        CalcMethod::GreatCircle
    }
}

impl std::fmt::Display for CalcMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GreatCircle => write!(f, "GreatCircle"),
            Self::Rhumbline => write!(f, "Rhumbline"),
        }
    }
}

/// Course values computed with one method.
///
/// Bearings are in degrees, distances in meters, velocity made good in
/// knots and time to go in seconds. Every field except the method is
/// independently optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseResult {
    /// Method used for this result
    pub calc_method: CalcMethod,
    /// True bearing of the track from start to destination
    pub bearing_track_true: Option<f64>,
    /// Magnetic bearing of the track from start to destination
    pub bearing_track_magnetic: Option<f64>,
    /// Signed distance from the track, positive when right of track
    pub cross_track_error: Option<f64>,
    /// Distance from vessel to destination
    pub distance: Option<f64>,
    /// True bearing from vessel to destination
    pub bearing_true: Option<f64>,
    /// Magnetic bearing from vessel to destination
    pub bearing_magnetic: Option<f64>,
    /// Speed component towards the destination
    pub velocity_made_good: Option<f64>,
    /// Seconds until arrival at the current velocity made good
    pub time_to_go: Option<f64>,
    /// Estimated time of arrival
    #[serde(with = "iso_millis")]
    pub estimated_time_of_arrival: Option<DateTime<Utc>>,
    /// Distance from vessel back to the start point
    pub previous_point_distance: Option<f64>,
}

impl CourseResult {
    /// All-null result for `calc_method`
    pub fn empty(calc_method: CalcMethod) -> Self {
        CourseResult {
            calc_method,
            bearing_track_true: None,
            bearing_track_magnetic: None,
            cross_track_error: None,
            distance: None,
            bearing_true: None,
            bearing_magnetic: None,
            velocity_made_good: None,
            time_to_go: None,
            estimated_time_of_arrival: None,
            previous_point_distance: None,
        }
    }

    /// Whether every value is absent
    pub fn is_empty(&self) -> bool {
        *self == CourseResult::empty(self.calc_method)
    }

    /// ETA as an ISO-8601 string with millisecond precision
    pub fn eta_iso(&self) -> Option<String> {
        self.estimated_time_of_arrival.map(iso_millis::format)
    }
}

/// Great-circle and rhumbline results computed from the same snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DualCourseResult {
    /// Great-circle result
    pub gc: CourseResult,
    /// Rhumbline result
    pub rl: CourseResult,
    /// Cross-track error shared by both branches
    pub cross_track_error: Option<f64>,
    /// Whether the vessel has crossed the destination perpendicular
    pub passed_perpendicular: bool,
}

impl DualCourseResult {
    /// The "no active destination" result
    pub fn empty() -> Self {
        DualCourseResult {
            gc: CourseResult::empty(CalcMethod::GreatCircle),
            rl: CourseResult::empty(CalcMethod::Rhumbline),
            cross_track_error: None,
            passed_perpendicular: false,
        }
    }

    /// Whether both branches are empty
    pub fn is_empty(&self) -> bool {
        self.gc.is_empty() && self.rl.is_empty()
    }

    /// Select the branch for `method`
    pub fn branch(&self, method: CalcMethod) -> &CourseResult {
        match method {
            CalcMethod::GreatCircle => &self.gc,
            CalcMethod::Rhumbline => &self.rl,
        }
    }
}

/// Optional timestamps as `2024-01-01T12:00:00.000Z`
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(time: DateTime<Utc>) -> String {
        time.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(time) => serializer.serialize_str(&format(*time)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: Option<String> = Option::deserialize(deserializer)?;
        value
            .map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
    }
}
