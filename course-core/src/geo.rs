//! Spherical-Earth Geodesy
//!
//! Geographic point type and the distance/bearing primitives the course
//! engine is built on. Distances and bearings come from the `geo` crate's
//! haversine and rhumb-line metric spaces; only the signed cross-track
//! distance is derived here. Everything works on a sphere; ellipsoid
//! accuracy is not a goal.

use geo::{Bearing, Distance, Haversine, Point, Rhumb};
use serde::{Deserialize, Serialize};

use crate::error::NavError;

/// Mean earth radius in meters, the sphere `geo` measures on
pub const EARTH_RADIUS: f64 = 6_371_008.8;

/// Knots to meters per second
pub const KN_TO_MS: f64 = 0.514444;

/// Meters per second to knots
pub const MS_TO_KN: f64 = 1.0 / KN_TO_MS;

/// A geographic position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    /// Latitude in degrees, north positive
    pub latitude: f64,
    /// Longitude in degrees, east positive
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a validated point.
    ///
    /// Rejects non-finite values, latitude outside [-90, 90] and longitude
    /// outside [-180, 180].
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, NavError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(NavError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(NavError::InvalidLongitude(longitude));
        }
        Ok(GeoPoint {
            latitude,
            longitude,
        })
    }

    /// As a `geo` point (x = longitude, y = latitude)
    pub fn to_point(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

/// Geodesy primitives consumed by the course engine.
///
/// Bearings are returned in degrees within [0, 360), distances in meters.
pub trait GeodesyOps {
    /// Great-circle distance from `a` to `b`
    fn distance(&self, a: &GeoPoint, b: &GeoPoint) -> f64;

    /// Initial great-circle bearing from `a` towards `b`
    fn initial_bearing(&self, a: &GeoPoint, b: &GeoPoint) -> f64;

    /// Rhumb-line distance from `a` to `b`
    fn rhumb_distance(&self, a: &GeoPoint, b: &GeoPoint) -> f64;

    /// Constant rhumb-line bearing from `a` towards `b`
    fn rhumb_bearing(&self, a: &GeoPoint, b: &GeoPoint) -> f64;

    /// Signed distance of `point` from the great circle through `start` and
    /// `end`. Positive when `point` lies to the right of the track.
    fn cross_track_distance(&self, point: &GeoPoint, start: &GeoPoint, end: &GeoPoint) -> f64;
}

/// Spherical earth model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalEarth {
    /// Sphere radius in meters
    pub radius: f64,
}

impl SphericalEarth {
    /// Create a sphere with the given radius in meters
    pub fn new(radius: f64) -> Self {
        SphericalEarth { radius }
    }
}

impl Default for SphericalEarth {
    fn default() -> Self {
        SphericalEarth::new(EARTH_RADIUS)
    }
}

impl SphericalEarth {
    /// Scale a distance on geo's mean-radius sphere to this sphere
    fn scale(&self, meters: f64) -> f64 {
        meters * (self.radius / EARTH_RADIUS)
    }
}

impl GeodesyOps for SphericalEarth {
    fn distance(&self, a: &GeoPoint, b: &GeoPoint) -> f64 {
        self.scale(Haversine::distance(a.to_point(), b.to_point()))
    }

    fn initial_bearing(&self, a: &GeoPoint, b: &GeoPoint) -> f64 {
        normalize_bearing(Haversine::bearing(a.to_point(), b.to_point()))
    }

    fn rhumb_distance(&self, a: &GeoPoint, b: &GeoPoint) -> f64 {
        // geo 0.29 only uses the projected-latitude ratio for northbound
        // lines; the distance is symmetric, so measure southbound ones
        // from the other end
        let (from, to) = if b.latitude < a.latitude { (b, a) } else { (a, b) };
        self.scale(Rhumb::distance(from.to_point(), to.to_point()))
    }

    fn rhumb_bearing(&self, a: &GeoPoint, b: &GeoPoint) -> f64 {
        normalize_bearing(Rhumb::bearing(a.to_point(), b.to_point()))
    }

    fn cross_track_distance(&self, point: &GeoPoint, start: &GeoPoint, end: &GeoPoint) -> f64 {
        let (start, point_p, end) = (start.to_point(), point.to_point(), end.to_point());

        let delta_13 = Haversine::distance(start, point_p) / EARTH_RADIUS;
        let theta_13 = Haversine::bearing(start, point_p).to_radians();
        let theta_12 = Haversine::bearing(start, end).to_radians();

        let xt = (delta_13.sin() * (theta_13 - theta_12).sin()).asin();
        self.radius * xt
    }
}

/// Normalize bearing to 0-360 range
pub fn normalize_bearing(bearing: f64) -> f64 {
    let mut b = bearing % 360.0;
    if b < 0.0 {
        b += 360.0;
    }
    // -1e-15 % 360 + 360 rounds to exactly 360
    if b >= 360.0 {
        b -= 360.0;
    }
    b
}
