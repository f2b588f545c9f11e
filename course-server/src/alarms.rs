//! Arrival and perpendicular passage alarms.
//!
//! Each alarm is a [`ThresholdWatcher`]; a notification is raised only when
//! the watcher changes state, so an alarm does not repeat while the vessel
//! stays inside the arrival circle or past the perpendicular.

use course_core::{
    passage_value, CalcMethod, DualCourseResult, ThresholdWatcher, WatchEvent, WatchEventKind,
};
use log::info;
use serde_json::Value;

use crate::config::NotificationSettings;
use crate::publish::{notification_delta, Notification, NotificationState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmKind {
    ArrivalCircle,
    PerpendicularPassed,
}

impl AlarmKind {
    pub fn path(&self) -> &'static str {
        match self {
            AlarmKind::ArrivalCircle => "notifications.navigation.arrivalCircleEntered",
            AlarmKind::PerpendicularPassed => "notifications.navigation.perpendicularPassed",
        }
    }

    fn message(&self, kind: WatchEventKind) -> &'static str {
        match (self, kind) {
            (AlarmKind::ArrivalCircle, WatchEventKind::Enter) => "Entered arrival circle",
            (AlarmKind::ArrivalCircle, WatchEventKind::Exit) => "Left arrival circle",
            (AlarmKind::PerpendicularPassed, WatchEventKind::Enter) => {
                "Passed the destination perpendicular"
            }
            (AlarmKind::PerpendicularPassed, WatchEventKind::Exit) => {
                "Perpendicular passage cleared"
            }
        }
    }
}

/// A watcher transition to be published
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlarmUpdate {
    pub alarm: AlarmKind,
    pub event: WatchEvent,
}

impl AlarmUpdate {
    pub fn notification(&self) -> Notification {
        let state = match self.event.kind {
            WatchEventKind::Enter => NotificationState::Alert,
            WatchEventKind::Exit => NotificationState::Normal,
        };
        Notification::new(state, self.alarm.message(self.event.kind))
    }

    pub fn to_delta(&self) -> Value {
        notification_delta(self.alarm.path(), &self.notification())
    }
}

#[derive(Debug, Clone)]
pub struct CourseAlarms {
    arrival: ThresholdWatcher,
    passage: ThresholdWatcher,
    settings: NotificationSettings,
}

impl CourseAlarms {
    pub fn new(settings: NotificationSettings) -> Self {
        CourseAlarms {
            arrival: ThresholdWatcher::arrival(0.0),
            passage: ThresholdWatcher::passage(),
            settings,
        }
    }

    /// Feed a published result to both watchers.
    ///
    /// Arrival is judged on the great-circle distance. An empty result
    /// resets both watchers, which closes any raised alarm.
    pub fn update(
        &mut self,
        result: &DualCourseResult,
        arrival_circle: Option<f64>,
    ) -> Vec<AlarmUpdate> {
        let mut updates = Vec::new();

        if result.is_empty() {
            if let Some(event) = self.arrival.reset() {
                updates.push(self.alarm(AlarmKind::ArrivalCircle, event));
            }
            if let Some(event) = self.passage.reset() {
                updates.push(self.alarm(AlarmKind::PerpendicularPassed, event));
            }
        } else {
            // Without a circle the range is empty and the watcher stays outside
            self.arrival.set_range(0.0, arrival_circle.unwrap_or(0.0));
            if let Some(distance) = result.branch(CalcMethod::GreatCircle).distance {
                if let Some(event) = self.arrival.observe(distance) {
                    updates.push(self.alarm(AlarmKind::ArrivalCircle, event));
                }
            }

            let passed = passage_value(result.passed_perpendicular);
            if let Some(event) = self.passage.observe(passed) {
                updates.push(self.alarm(AlarmKind::PerpendicularPassed, event));
            }
        }

        updates.retain(|update| self.enabled(update.alarm));
        updates
    }

    pub fn arrival(&self) -> &ThresholdWatcher {
        &self.arrival
    }

    pub fn passage(&self) -> &ThresholdWatcher {
        &self.passage
    }

    fn alarm(&self, alarm: AlarmKind, event: WatchEvent) -> AlarmUpdate {
        info!(
            "{:?} {:?} at {:.1} (range {}..{})",
            alarm, event.kind, event.value, event.range_min, event.range_max
        );
        AlarmUpdate { alarm, event }
    }

    fn enabled(&self, alarm: AlarmKind) -> bool {
        match alarm {
            AlarmKind::ArrivalCircle => self.settings.arrival_circle,
            AlarmKind::PerpendicularPassed => self.settings.perpendicular_passed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(distance: f64, passed: bool) -> DualCourseResult {
        let mut result = DualCourseResult::empty();
        result.gc.distance = Some(distance);
        result.rl.distance = Some(distance);
        result.passed_perpendicular = passed;
        result
    }

    fn kinds(updates: &[AlarmUpdate]) -> Vec<(AlarmKind, WatchEventKind)> {
        updates.iter().map(|u| (u.alarm, u.event.kind)).collect()
    }

    #[test]
    fn test_arrival_enter_and_exit() {
        let mut alarms = CourseAlarms::new(NotificationSettings::default());

        assert!(alarms.update(&result(500.0, false), Some(100.0)).is_empty());

        let updates = alarms.update(&result(50.0, false), Some(100.0));
        assert_eq!(
            kinds(&updates),
            vec![(AlarmKind::ArrivalCircle, WatchEventKind::Enter)]
        );
        assert_eq!(updates[0].event.value, 50.0);

        assert!(alarms.update(&result(40.0, false), Some(100.0)).is_empty());

        let updates = alarms.update(&result(150.0, false), Some(100.0));
        assert_eq!(
            kinds(&updates),
            vec![(AlarmKind::ArrivalCircle, WatchEventKind::Exit)]
        );
        assert_eq!(updates[0].event.value, 150.0);
    }

    #[test]
    fn test_no_arrival_circle_never_enters() {
        let mut alarms = CourseAlarms::new(NotificationSettings::default());
        assert!(alarms.update(&result(0.0, false), None).is_empty());
        assert!(!alarms.arrival().is_inside());
    }

    #[test]
    fn test_passage_fires_once() {
        let mut alarms = CourseAlarms::new(NotificationSettings::default());
        assert!(alarms.update(&result(5000.0, false), None).is_empty());

        let updates = alarms.update(&result(5000.0, true), None);
        assert_eq!(
            kinds(&updates),
            vec![(AlarmKind::PerpendicularPassed, WatchEventKind::Enter)]
        );
        assert_eq!(
            updates[0].to_delta()["updates"][0]["values"][0],
            json!({
                "path": "notifications.navigation.perpendicularPassed",
                "value": {
                    "state": "alert",
                    "method": ["visual", "sound"],
                    "message": "Passed the destination perpendicular"
                }
            })
        );

        assert!(alarms.update(&result(5100.0, true), None).is_empty());
    }

    #[test]
    fn test_cleared_course_resets_alarms() {
        let mut alarms = CourseAlarms::new(NotificationSettings::default());
        alarms.update(&result(10.0, true), Some(100.0));
        assert!(alarms.arrival().is_inside());
        assert!(alarms.passage().is_inside());

        let updates = alarms.update(&DualCourseResult::empty(), Some(100.0));
        assert_eq!(
            kinds(&updates),
            vec![
                (AlarmKind::ArrivalCircle, WatchEventKind::Exit),
                (AlarmKind::PerpendicularPassed, WatchEventKind::Exit),
            ]
        );
        assert!(updates
            .iter()
            .all(|u| u.notification().state == NotificationState::Normal));

        assert!(alarms.update(&DualCourseResult::empty(), Some(100.0)).is_empty());
    }

    #[test]
    fn test_disabled_notifications_filtered() {
        let mut alarms = CourseAlarms::new(NotificationSettings {
            arrival_circle: false,
            perpendicular_passed: true,
        });

        let updates = alarms.update(&result(10.0, true), Some(100.0));
        assert_eq!(
            kinds(&updates),
            vec![(AlarmKind::PerpendicularPassed, WatchEventKind::Enter)]
        );
        // Watcher state still tracks the arrival
        assert!(alarms.arrival().is_inside());
    }
}
