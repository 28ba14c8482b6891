//! Pointer-to-millimetre mapping with deadband and per-update step cap.

use shared::domain::{Point2, Point3, Vector3};

use crate::drag::DragSession;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepClamp {
    pub pixels_to_mm: f64,
    pub deadband_mm: f64,
    pub max_step_mm: f64,
}

impl Default for StepClamp {
    fn default() -> Self {
        Self {
            pixels_to_mm: 2.0,
            deadband_mm: 1.0,
            max_step_mm: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClampOutcome {
    /// Marker advances to `marker` by a step of `step_mm`.
    Stepped { marker: Point3, step_mm: f64 },
    /// The requested change is under the deadband.
    Deadband { distance_mm: f64 },
    /// The pointer mapped outside representable millimetres.
    NonFinite,
}

impl StepClamp {
    /// Scene "up" is pointer "down", so the vertical axis is inverted.
    pub fn pointer_to_mm(&self, delta: Point2) -> (f64, f64) {
        (delta.x * self.pixels_to_mm, -delta.y * self.pixels_to_mm)
    }

    pub fn provisional_target(
        &self,
        session: &DragSession,
        pointer: Point2,
        height: f64,
    ) -> Point3 {
        let (dx_mm, dy_mm) = self.pointer_to_mm(session.pointer_delta(pointer));
        Point3::new(
            session.marker_start.x + dx_mm,
            session.marker_start.y + dy_mm,
            height,
        )
    }

    pub fn limit_step(&self, delta: Vector3) -> Vector3 {
        delta.clamp_magnitude(self.max_step_mm)
    }

    /// Moves from `current` toward `target` by at most one capped step.
    pub fn step_toward(&self, current: Point3, target: Point3) -> ClampOutcome {
        let delta = target - current;
        if !delta.is_finite() {
            return ClampOutcome::NonFinite;
        }
        let distance_mm = delta.magnitude();
        if distance_mm < self.deadband_mm {
            return ClampOutcome::Deadband { distance_mm };
        }
        let step = self.limit_step(delta);
        ClampOutcome::Stepped {
            marker: current + step,
            step_mm: step.magnitude(),
        }
    }

    pub fn next_marker(
        &self,
        session: &DragSession,
        pointer: Point2,
        height: f64,
        current: Point3,
    ) -> ClampOutcome {
        let target = self.provisional_target(session, pointer, height);
        self.step_toward(current, target)
    }
}
