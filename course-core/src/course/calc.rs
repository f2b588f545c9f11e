//! Course Calculation
//!
//! Builds both the great-circle and the rhumbline result from one snapshot.
//! Shared sub-results (cross-track error, passage flag, timestamp) are
//! computed once and handed to both branches.

use chrono::{DateTime, TimeDelta, Utc};
use nalgebra::Vector2;

use super::types::{CalcMethod, CourseResult, DualCourseResult};
use crate::geo::{GeoPoint, GeodesyOps, KN_TO_MS};
use crate::snapshot::NavigationSnapshot;

/// Angle above which the vessel is past the destination perpendicular
const PERPENDICULAR_ANGLE: f64 = 90.0;

/// Longitude beyond which antimeridian unwrapping is considered
const ANTIMERIDIAN_ZONE: f64 = 170.0;

/// Values shared by both branches of one calculation
struct SharedInputs<'a> {
    snapshot: &'a NavigationSnapshot,
    position: &'a GeoPoint,
    next_point: &'a GeoPoint,
    previous_point: &'a GeoPoint,
    cross_track_error: f64,
    now: DateTime<Utc>,
}

/// Calculate course values for both methods.
///
/// Returns [`DualCourseResult::empty`] when vessel position, destination or
/// start point is missing. Missing auxiliary inputs only null the values
/// derived from them.
pub fn calculate<G: GeodesyOps + ?Sized>(
    snapshot: &NavigationSnapshot,
    geodesy: &G,
) -> DualCourseResult {
    let (Some(position), Some(next_point), Some(previous_point)) = (
        snapshot.position.as_ref(),
        snapshot.next_point.as_ref(),
        snapshot.previous_point.as_ref(),
    ) else {
        return DualCourseResult::empty();
    };

    let shared = SharedInputs {
        snapshot,
        position,
        next_point,
        previous_point,
        cross_track_error: geodesy.cross_track_distance(position, previous_point, next_point),
        now: snapshot.timestamp_or_now(),
    };

    DualCourseResult {
        gc: branch(&shared, geodesy, CalcMethod::GreatCircle),
        rl: branch(&shared, geodesy, CalcMethod::Rhumbline),
        cross_track_error: Some(shared.cross_track_error),
        passed_perpendicular: passed_perpendicular(position, next_point, previous_point),
    }
}

fn branch<G: GeodesyOps + ?Sized>(
    shared: &SharedInputs<'_>,
    geodesy: &G,
    method: CalcMethod,
) -> CourseResult {
    let (bearing_track_true, bearing_true, distance, previous_point_distance) = match method {
        CalcMethod::GreatCircle => (
            geodesy.initial_bearing(shared.previous_point, shared.next_point),
            geodesy.initial_bearing(shared.position, shared.next_point),
            geodesy.distance(shared.position, shared.next_point),
            geodesy.distance(shared.position, shared.previous_point),
        ),
        CalcMethod::Rhumbline => (
            geodesy.rhumb_bearing(shared.previous_point, shared.next_point),
            geodesy.rhumb_bearing(shared.position, shared.next_point),
            geodesy.rhumb_distance(shared.position, shared.next_point),
            geodesy.rhumb_distance(shared.position, shared.previous_point),
        ),
    };

    let snapshot = shared.snapshot;
    let variation = snapshot.magnetic_variation;
    let velocity_made_good =
        velocity_made_good(bearing_true, snapshot.heading_true, snapshot.speed_over_ground);
    let time_to_go = time_to_go(Some(distance), velocity_made_good);

    CourseResult {
        calc_method: method,
        bearing_track_true: Some(bearing_track_true),
        bearing_track_magnetic: variation.map(|v| bearing_track_true - v),
        cross_track_error: Some(shared.cross_track_error),
        distance: Some(distance),
        bearing_true: Some(bearing_true),
        bearing_magnetic: variation.map(|v| bearing_true - v),
        velocity_made_good,
        time_to_go,
        estimated_time_of_arrival: time_to_go.and_then(|ttg| arrival_time(shared.now, ttg)),
        previous_point_distance: Some(previous_point_distance),
    }
}

/// Speed component towards the destination, in the unit of `sog`
pub fn velocity_made_good(bearing: f64, heading: Option<f64>, sog: Option<f64>) -> Option<f64> {
    let (heading, sog) = (heading?, sog?);
    Some((bearing - heading).to_radians().cos() * sog)
}

/// Seconds to cover `distance` meters at `vmg` knots.
///
/// A zero VMG is treated like a missing one.
// TODO: a stalled vessel (VMG == 0) reports "unknown" rather than "never";
// split the two once consumers can tell them apart.
pub fn time_to_go(distance: Option<f64>, vmg: Option<f64>) -> Option<f64> {
    let distance = distance.filter(|d| d.is_finite())?;
    let vmg = vmg.filter(|v| *v != 0.0 && !v.is_nan())?;
    Some(distance / (vmg * KN_TO_MS))
}

fn arrival_time(now: DateTime<Utc>, time_to_go: f64) -> Option<DateTime<Utc>> {
    let millis = (time_to_go * 1000.0).round();
    if !millis.is_finite() {
        return None;
    }
    let delta = TimeDelta::try_milliseconds(millis as i64)?;
    now.checked_add_signed(delta)
}

/// Whether the vessel has crossed the line through the destination
/// perpendicular to the track from the start point.
///
/// Works in a flat lat/lon plane without cos-latitude scaling. The angle
/// between destination→vessel and destination→start exceeds 90° once the
/// vessel is past the perpendicular.
pub fn passed_perpendicular(
    position: &GeoPoint,
    next_point: &GeoPoint,
    previous_point: &GeoPoint,
) -> bool {
    let to_vessel = plane_vector(next_point, position);
    let to_start = plane_vector(next_point, previous_point);

    if to_vessel.norm() == 0.0 || to_start.norm() == 0.0 {
        return false;
    }
    to_vessel.angle(&to_start).to_degrees() > PERPENDICULAR_ANGLE
}

/// Vector from `origin` to `target` as (Δlon, Δlat) in degrees
fn plane_vector(origin: &GeoPoint, target: &GeoPoint) -> Vector2<f64> {
    let (origin_lon, target_lon) = unwrap_longitudes(origin.longitude, target.longitude);
    Vector2::new(
        target_lon - origin_lon,
        target.latitude - origin.latitude,
    )
}

/// Move one of two longitudes by 360° when they straddle the antimeridian.
pub(crate) fn unwrap_longitudes(a: f64, b: f64) -> (f64, f64) {
    if a > ANTIMERIDIAN_ZONE && b < 0.0 {
        (a, b + 360.0)
    } else if b > ANTIMERIDIAN_ZONE && a < 0.0 {
        (a + 360.0, b)
    } else if a < -ANTIMERIDIAN_ZONE && b > 0.0 {
        (a, b - 360.0)
    } else if b < -ANTIMERIDIAN_ZONE && a > 0.0 {
        (a - 360.0, b)
    } else {
        (a, b)
    }
}
