//! # Course Core
//!
//! Platform-independent course computation for vessel navigation.
//!
//! This crate contains the pure calculation logic with **zero I/O
//! dependencies**: no async runtime, no sockets, no logging backend. It can be
//! embedded in a SignalK plugin, a native server or a test harness alike.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  course-core (platform-independent, no tokio/async deps)    │
//! │  ├── geo/       (GeoPoint, GeodesyOps, SphericalEarth)      │
//! │  ├── snapshot/  (NavigationSnapshot input)                  │
//! │  ├── course/    (calculate, CourseEngine, results)          │
//! │  └── watcher/   (ThresholdWatcher hysteresis)               │
//! └─────────────────────────────────────────────────────────────┘
//!                               ▲
//!                  ┌────────────┴────────────┐
//!                  │  course-server          │
//!                  │  (SignalK deltas, tokio)│
//!                  └─────────────────────────┘
//! ```
//!
//! ## Key Modules
//!
//! - [`geo`] - Spherical-earth distance, bearing and cross-track primitives
//! - [`course`] - Dual great-circle/rhumbline course calculation
//! - [`watcher`] - Enter/exit detection for arrival circle and perpendicular passage
//!
//! ## Example: Arrival Detection
//!
//! ```rust
//! use course_core::{ThresholdWatcher, WatchEventKind};
//!
//! let mut arrival = ThresholdWatcher::arrival(100.0);
//! assert_eq!(arrival.observe(50.0).map(|e| e.kind), Some(WatchEventKind::Enter));
//! assert!(arrival.observe(60.0).is_none());
//! assert_eq!(arrival.observe(150.0).map(|e| e.kind), Some(WatchEventKind::Exit));
//! ```

pub mod course;
pub mod error;
pub mod geo;
pub mod snapshot;
pub mod watcher;

// Re-export commonly used types
pub use course::{
    calculate, CalcMethod, CourseEngine, CourseResult, DualCourseResult, DEFAULT_STALE_THRESHOLD,
};
pub use error::NavError;
pub use geo::{GeoPoint, GeodesyOps, SphericalEarth, KN_TO_MS, MS_TO_KN};
pub use snapshot::NavigationSnapshot;
pub use watcher::{passage_value, Membership, ThresholdWatcher, WatchEvent, WatchEventKind};
