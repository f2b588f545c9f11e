//! Navigation Snapshot
//!
//! The immutable input to one course computation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// Navigation values at one instant.
///
/// Every field is optional; missing data is `None`, never a default number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationSnapshot {
    /// Vessel position
    pub position: Option<GeoPoint>,
    /// Destination (next point)
    pub next_point: Option<GeoPoint>,
    /// Route start (previous point)
    pub previous_point: Option<GeoPoint>,
    /// Magnetic variation in degrees, east positive
    pub magnetic_variation: Option<f64>,
    /// True heading in degrees
    pub heading_true: Option<f64>,
    /// Speed over ground in knots
    pub speed_over_ground: Option<f64>,
    /// Time of the snapshot; `Utc::now()` is used when absent
    pub timestamp: Option<DateTime<Utc>>,
}

impl NavigationSnapshot {
    /// Whether vessel position, destination and start point are all known
    pub fn has_course(&self) -> bool {
        self.position.is_some() && self.next_point.is_some() && self.previous_point.is_some()
    }

    /// Snapshot timestamp, or the current wall-clock time
    pub fn timestamp_or_now(&self) -> DateTime<Utc> {
        self.timestamp.unwrap_or_else(Utc::now)
    }
}
