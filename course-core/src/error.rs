//! Error types for navigation input validation

use thiserror::Error;

/// Errors that can occur when building navigation inputs
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NavError {
    /// Latitude is not a finite value within [-90, 90] degrees
    #[error("Invalid latitude: {0} (expected -90..=90 degrees)")]
    InvalidLatitude(f64),

    /// Longitude is not a finite value within [-180, 180] degrees
    #[error("Invalid longitude: {0} (expected -180..=180 degrees)")]
    InvalidLongitude(f64),

    /// Position object is missing a coordinate or has a non-numeric one
    #[error("Malformed position: {0}")]
    MalformedPosition(String),
}
