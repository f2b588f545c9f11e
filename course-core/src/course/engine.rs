//! Course Engine
//!
//! Wraps [`calculate`] with the staleness debounce: once a destination has
//! been active, losing it only produces a single invalidating result after a
//! number of consecutive stale snapshots.

use super::calc::calculate;
use super::types::DualCourseResult;
use crate::geo::{GeodesyOps, SphericalEarth};
use crate::snapshot::NavigationSnapshot;

/// Consecutive stale snapshots before the empty result is emitted
pub const DEFAULT_STALE_THRESHOLD: u32 = 3;

/// Course computation context.
///
/// Owns the staleness counter, so each independent context (worker task,
/// test) needs its own engine.
#[derive(Debug, Clone)]
pub struct CourseEngine<G = SphericalEarth> {
    geodesy: G,
    /// Number of stale snapshots required to clear an active course
    stale_threshold: u32,
    /// Consecutive stale snapshots seen while active
    stale_count: u32,
    /// Whether the last emitted result was non-empty
    active: bool,
}

impl CourseEngine<SphericalEarth> {
    /// Create an engine on the default spherical earth
    pub fn new(stale_threshold: u32) -> Self {
        Self::with_geodesy(SphericalEarth::default(), stale_threshold)
    }
}

impl Default for CourseEngine<SphericalEarth> {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_THRESHOLD)
    }
}

impl<G: GeodesyOps> CourseEngine<G> {
    /// Create an engine with a custom geodesy implementation
    pub fn with_geodesy(geodesy: G, stale_threshold: u32) -> Self {
        CourseEngine {
            geodesy,
            stale_threshold: stale_threshold.max(1),
            stale_count: 0,
            active: false,
        }
    }

    /// Pure calculation, no staleness bookkeeping
    pub fn compute(&self, snapshot: &NavigationSnapshot) -> DualCourseResult {
        calculate(snapshot, &self.geodesy)
    }

    /// Calculate and apply the staleness debounce.
    ///
    /// Returns `None` when nothing should be published: stale snapshots
    /// before the threshold is reached, and any stale snapshot while no
    /// course is active.
    pub fn process(&mut self, snapshot: &NavigationSnapshot) -> Option<DualCourseResult> {
        if snapshot.has_course() {
            self.active = true;
            self.stale_count = 0;
            return Some(self.compute(snapshot));
        }

        if !self.active {
            return None;
        }

        self.stale_count += 1;
        if self.stale_count < self.stale_threshold {
            return None;
        }

        self.active = false;
        self.stale_count = 0;
        Some(DualCourseResult::empty())
    }

    /// Whether a course is currently active
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Stale snapshots seen since the course was last active
    pub fn stale_count(&self) -> u32 {
        self.stale_count
    }

    pub fn stale_threshold(&self) -> u32 {
        self.stale_threshold
    }

    pub fn geodesy(&self) -> &G {
        &self.geodesy
    }
}
