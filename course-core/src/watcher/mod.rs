//! Threshold Watcher
//!
//! Range-membership detector that turns a continuously varying value into
//! enter/exit events. Events fire only on a membership change, so a value
//! that keeps reporting from inside (or outside) the range stays quiet.
//!
//! Membership is half-open: a value is inside when
//! `range_min <= value < range_max`.

use serde::{Deserialize, Serialize};

/// Passage flag value when the perpendicular has been crossed
pub const PASSED: f64 = 1.0;

/// Passage flag value when the perpendicular has not been crossed
pub const NOT_PASSED: f64 = 0.0;

/// Current membership of the watched value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Membership {
    /// Value outside the range
    Outside,
    /// Value inside the range
    Inside,
}

impl Default for Membership {
    fn default() -> Self {
        Membership::Outside
    }
}

/// Kind of membership transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchEventKind {
    /// Outside to inside
    Enter,
    /// Inside to outside
    Exit,
}

/// Emitted on a membership transition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchEvent {
    pub kind: WatchEventKind,
    /// Value that caused the transition
    pub value: f64,
    pub range_min: f64,
    pub range_max: f64,
}

/// Hysteresis state for one watched value
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdWatcher {
    range_min: f64,
    range_max: f64,
    membership: Membership,
    last_value: Option<f64>,
}

impl ThresholdWatcher {
    /// Create a watcher for `[range_min, range_max)`, initially outside
    pub fn new(range_min: f64, range_max: f64) -> Self {
        ThresholdWatcher {
            range_min,
            range_max,
            membership: Membership::Outside,
            last_value: None,
        }
    }

    /// Watcher for distance to destination within the arrival circle
    pub fn arrival(arrival_circle: f64) -> Self {
        Self::new(0.0, arrival_circle)
    }

    /// Watcher for the perpendicular-passage flag.
    ///
    /// The range `[1, 2)` contains [`PASSED`] and excludes [`NOT_PASSED`].
    pub fn passage() -> Self {
        Self::new(PASSED, PASSED + 1.0)
    }

    /// Update the range. Takes effect on the next [`observe`](Self::observe).
    pub fn set_range(&mut self, range_min: f64, range_max: f64) {
        self.range_min = range_min;
        self.range_max = range_max;
    }

    /// Feed a new value; returns an event if membership changed
    pub fn observe(&mut self, value: f64) -> Option<WatchEvent> {
        self.last_value = Some(value);

        let membership = if self.contains(value) {
            Membership::Inside
        } else {
            Membership::Outside
        };

        if membership == self.membership {
            return None;
        }
        self.membership = membership;

        let kind = match membership {
            Membership::Inside => WatchEventKind::Enter,
            Membership::Outside => WatchEventKind::Exit,
        };
        Some(self.event(kind, value))
    }

    /// Force the watcher outside. Emits an exit event if it was inside.
    pub fn reset(&mut self) -> Option<WatchEvent> {
        let was_inside = self.is_inside();
        self.membership = Membership::Outside;

        let value = self.last_value.take().unwrap_or(f64::NAN);
        was_inside.then(|| self.event(WatchEventKind::Exit, value))
    }

    /// Whether `value` lies within the current range
    pub fn contains(&self, value: f64) -> bool {
        self.range_min <= value && value < self.range_max
    }

    pub fn membership(&self) -> Membership {
        self.membership
    }

    pub fn is_inside(&self) -> bool {
        self.membership == Membership::Inside
    }

    pub fn range(&self) -> (f64, f64) {
        (self.range_min, self.range_max)
    }

    pub fn last_value(&self) -> Option<f64> {
        self.last_value
    }

    fn event(&self, kind: WatchEventKind, value: f64) -> WatchEvent {
        WatchEvent {
            kind,
            value,
            range_min: self.range_min,
            range_max: self.range_max,
        }
    }
}

/// Encode the passage flag for [`ThresholdWatcher::passage`]
pub fn passage_value(passed: bool) -> f64 {
    if passed {
        PASSED
    } else {
        NOT_PASSED
    }
}
