//! Course Computation
//!
//! Turns a [`NavigationSnapshot`](crate::NavigationSnapshot) into
//! great-circle and rhumbline course values.
//!
//! # Usage
//!
//! ```rust
//! use course_core::{CourseEngine, GeoPoint, NavigationSnapshot};
//!
//! let snapshot = NavigationSnapshot {
//!     position: Some(GeoPoint::new(50.1, -4.0).unwrap()),
//!     next_point: Some(GeoPoint::new(50.4, -3.5).unwrap()),
//!     previous_point: Some(GeoPoint::new(50.0, -4.0).unwrap()),
//!     heading_true: Some(45.0),
//!     speed_over_ground: Some(6.0),
//!     ..Default::default()
//! };
//!
//! let mut engine = CourseEngine::default();
//! let result = engine.process(&snapshot).unwrap();
//! assert_eq!(result.gc.cross_track_error, result.rl.cross_track_error);
//! ```

mod calc;
mod engine;
mod types;

pub use calc::{calculate, passed_perpendicular, time_to_go, velocity_made_good};
pub use engine::{CourseEngine, DEFAULT_STALE_THRESHOLD};
pub use types::{CalcMethod, CourseResult, DualCourseResult};
