//! Pointer drag sessions over the scene view.

use shared::domain::{Point2, Point3, PointerButton};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub pointer_start: Point2,
    pub marker_start: Point3,
}

impl DragSession {
    pub fn pointer_delta(&self, pointer: Point2) -> Point2 {
        pointer - self.pointer_start
    }
}

/// Idle when no session is held, Dragging otherwise.
#[derive(Debug, Default)]
pub struct DragTracker {
    session: Option<DragSession>,
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session on a primary press. A press while already dragging
    /// replaces the session.
    pub fn begin(&mut self, pointer: Point2, marker: Point3, button: PointerButton) -> bool {
        if button != PointerButton::Primary {
            return false;
        }
        self.session = Some(DragSession {
            pointer_start: pointer,
            marker_start: marker,
        });
        true
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// Returns whether a session was actually ended.
    pub fn end(&mut self) -> bool {
        self.session.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_press_starts_session() {
        let mut tracker = DragTracker::new();
        assert!(tracker.begin(
            Point2::new(100.0, 100.0),
            Point3::new(0.0, 0.0, 50.0),
            PointerButton::Primary
        ));
        let session = tracker.session().expect("session");
        assert_eq!(session.pointer_start, Point2::new(100.0, 100.0));
        assert_eq!(session.marker_start, Point3::new(0.0, 0.0, 50.0));
        assert_eq!(
            session.pointer_delta(Point2::new(105.0, 98.0)),
            Point2::new(5.0, -2.0)
        );
    }

    #[test]
    fn secondary_press_is_ignored() {
        let mut tracker = DragTracker::new();
        assert!(!tracker.begin(
            Point2::default(),
            Point3::default(),
            PointerButton::Secondary
        ));
        assert!(!tracker.is_dragging());
    }

    #[test]
    fn release_without_session_is_noop() {
        let mut tracker = DragTracker::new();
        assert!(!tracker.end());
    }

    #[test]
    fn second_press_replaces_session() {
        let mut tracker = DragTracker::new();
        tracker.begin(Point2::new(1.0, 1.0), Point3::default(), PointerButton::Primary);
        tracker.begin(
            Point2::new(9.0, 9.0),
            Point3::new(5.0, 5.0, 5.0),
            PointerButton::Primary,
        );
        let session = tracker.session().expect("session");
        assert_eq!(session.pointer_start, Point2::new(9.0, 9.0));
        assert_eq!(session.marker_start, Point3::new(5.0, 5.0, 5.0));
        assert!(tracker.end());
        assert!(!tracker.is_dragging());
    }
}
