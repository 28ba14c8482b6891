//! Robot-relative step limiting and fire-and-forget linear moves.

use std::time::{Duration, Instant};

use robot_link::RobotHandle;
use shared::{
    domain::{Point3, Pose},
    error::RobotError,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Sent {
        pose: Pose,
        step_mm: f64,
        /// The breaker was tripped and this move closed it again.
        resumed: bool,
    },
    SkippedInvalidHandle,
    SkippedBreakerOpen,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("could not read robot pose before moving: {0}")]
    PoseRead(#[source] RobotError),
    #[error("refusing non-finite commanded position {position:?}")]
    NonFinite { position: Point3 },
    #[error("linear move failed ({consecutive_failures} in a row): {source}")]
    Move {
        #[source]
        source: RobotError,
        consecutive_failures: u32,
        breaker_tripped: bool,
    },
}

/// Suspends moves after `threshold` consecutive failures. Once `cooldown`
/// has passed a single attempt is let through; another failure re-arms it.
#[derive(Debug, Clone)]
pub struct MoveBreaker {
    threshold: u32,
    cooldown: Duration,
    consecutive_failures: u32,
    open_until: Option<Instant>,
    tripped: bool,
}

impl MoveBreaker {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            threshold: threshold.max(1),
            cooldown,
            consecutive_failures: 0,
            open_until: None,
            tripped: false,
        }
    }

    pub fn allows(&self, now: Instant) -> bool {
        self.open_until.map_or(true, |until| now >= until)
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Returns whether the breaker had been tripped.
    pub fn record_success(&mut self) -> bool {
        self.reset()
    }

    /// Returns whether this failure tripped the breaker.
    pub fn record_failure(&mut self, now: Instant) -> bool {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if self.consecutive_failures < self.threshold {
            return false;
        }
        self.open_until = Some(now + self.cooldown);
        let newly_tripped = !self.tripped;
        self.tripped = true;
        newly_tripped
    }

    pub fn reset(&mut self) -> bool {
        let was_tripped = self.tripped;
        self.consecutive_failures = 0;
        self.open_until = None;
        self.tripped = false;
        was_tripped
    }
}

#[derive(Debug, Clone)]
pub struct MotionDispatcher {
    max_step_mm: f64,
    breaker: MoveBreaker,
}

impl MotionDispatcher {
    pub fn new(max_step_mm: f64, breaker: MoveBreaker) -> Self {
        Self {
            max_step_mm,
            breaker,
        }
    }

    pub fn breaker(&self) -> &MoveBreaker {
        &self.breaker
    }

    pub fn breaker_mut(&mut self) -> &mut MoveBreaker {
        &mut self.breaker
    }

    /// Next commanded pose: at most one capped step from `current` toward
    /// `target`, orientation untouched.
    pub fn commanded_pose(&self, current: Pose, target: Point3) -> Pose {
        let step = (target - current.position).clamp_magnitude(self.max_step_mm);
        current.with_position(current.position + step)
    }

    pub fn dispatch(
        &mut self,
        robot: &dyn RobotHandle,
        target: Point3,
        now: Instant,
    ) -> Result<DispatchOutcome, DispatchError> {
        if !robot.is_valid() {
            return Ok(DispatchOutcome::SkippedInvalidHandle);
        }
        if !self.breaker.allows(now) {
            return Ok(DispatchOutcome::SkippedBreakerOpen);
        }

        let current = robot.current_pose().map_err(DispatchError::PoseRead)?;
        let pose = self.commanded_pose(current, target);
        if !pose.position.is_finite() {
            return Err(DispatchError::NonFinite {
                position: pose.position,
            });
        }
        let step_mm = (pose.position - current.position).magnitude();

        match robot.move_linear_to(pose) {
            Ok(()) => Ok(DispatchOutcome::Sent {
                pose,
                step_mm,
                resumed: self.breaker.record_success(),
            }),
            Err(source) => {
                let breaker_tripped = self.breaker.record_failure(now);
                Err(DispatchError::Move {
                    source,
                    consecutive_failures: self.breaker.consecutive_failures(),
                    breaker_tripped,
                })
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/dispatch_tests.rs"]
mod tests;
