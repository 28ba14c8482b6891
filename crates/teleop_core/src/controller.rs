//! The teleoperation controller: sole owner of marker, height and drag state.

use std::{sync::Arc, time::Instant};

use robot_link::{MissingRobot, RobotConnection, RobotHandle};
use shared::{
    domain::{ItemKind, Point2, Point3, PointerButton},
    error::RobotFault,
    protocol::{ConnectionStatus, ControllerEvent, ControllerUpdate, Readout},
};
use tracing::{debug, info, trace, warn};

use crate::{
    clamp::{ClampOutcome, StepClamp},
    dispatch::{DispatchError, DispatchOutcome, MotionDispatcher, MoveBreaker},
    drag::DragTracker,
    height::HeightOverride,
    sampler::PoseSampler,
    settings::TeleopSettings,
};

pub const STATUS_CONNECTED: &str = "Connected to robot station.";
pub const STATUS_ROBOT_NOT_FOUND: &str = "Robot not found in station.";

/// Connects and looks up the named robot. Never fails: an unreachable
/// station or unknown robot yields an invalid handle and a warning status.
pub fn connect_robot(
    connection: &dyn RobotConnection,
    robot_name: &str,
) -> (Arc<dyn RobotHandle>, ConnectionStatus) {
    match connection.connect() {
        Ok(station) => {
            let robot = station.find_item(robot_name, ItemKind::Robot);
            if robot.is_valid() {
                info!(robot = robot_name, "connected to robot station");
                (robot, ConnectionStatus::ok(STATUS_CONNECTED))
            } else {
                warn!(robot = robot_name, "robot not found in station");
                (robot, ConnectionStatus::warn(STATUS_ROBOT_NOT_FOUND))
            }
        }
        Err(err) => {
            warn!(robot = robot_name, "failed to connect to robot station: {err}");
            (
                Arc::new(MissingRobot::new(robot_name)),
                ConnectionStatus::warn(format!("Error connecting to robot station: {err}")),
            )
        }
    }
}

pub struct TeleopController {
    robot: Arc<dyn RobotHandle>,
    connection_status: ConnectionStatus,
    marker: Point3,
    height: HeightOverride,
    drag: DragTracker,
    clamp: StepClamp,
    dispatcher: MotionDispatcher,
    sampler: PoseSampler,
}

impl TeleopController {
    pub fn new(
        robot: Arc<dyn RobotHandle>,
        connection_status: ConnectionStatus,
        settings: &TeleopSettings,
    ) -> Self {
        let height = HeightOverride::new(0.0, settings.height_bounds());
        let mut controller = Self {
            robot,
            connection_status,
            marker: Point3::new(0.0, 0.0, height.value()),
            height,
            drag: DragTracker::new(),
            clamp: StepClamp {
                pixels_to_mm: settings.pixels_to_mm,
                deadband_mm: settings.deadband_mm,
                max_step_mm: settings.max_step_mm,
            },
            dispatcher: MotionDispatcher::new(
                settings.max_step_mm,
                MoveBreaker::new(settings.breaker_threshold, settings.breaker_cooldown()),
            ),
            sampler: PoseSampler::new(),
        };
        controller.sync();
        controller
    }

    pub fn connect(connection: &dyn RobotConnection, settings: &TeleopSettings) -> Self {
        let (robot, status) = connect_robot(connection, &settings.robot_name);
        Self::new(robot, status, settings)
    }

    pub fn marker(&self) -> Point3 {
        self.marker
    }

    pub fn height(&self) -> &HeightOverride {
        &self.height
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    pub fn latest_readout(&self) -> Option<&Readout> {
        self.sampler.latest()
    }

    pub fn robot(&self) -> &Arc<dyn RobotHandle> {
        &self.robot
    }

    pub fn dispatcher(&self) -> &MotionDispatcher {
        &self.dispatcher
    }

    pub fn status(&self) -> ConnectionStatus {
        if self.dispatcher.breaker().is_tripped() {
            ConnectionStatus::warn(format!(
                "Motion commands suspended after {} consecutive failures.",
                self.dispatcher.breaker().consecutive_failures()
            ))
        } else {
            self.connection_status.clone()
        }
    }

    /// Full state, for observers that attach late.
    pub fn snapshot(&self) -> Vec<ControllerUpdate> {
        let mut updates = vec![
            ControllerUpdate::StatusChanged(self.status()),
            ControllerUpdate::MarkerMoved {
                marker: self.marker,
            },
            self.height_update(),
            ControllerUpdate::DragStateChanged {
                dragging: self.drag.is_dragging(),
            },
        ];
        if let Some(readout) = self.sampler.latest() {
            updates.push(ControllerUpdate::ReadoutUpdated(readout.clone()));
        }
        updates
    }

    pub fn handle(&mut self, event: ControllerEvent, now: Instant) -> Vec<ControllerUpdate> {
        trace!(event = event.name(), "controller event");
        match event {
            ControllerEvent::Tick => self.tick(),
            ControllerEvent::PointerDown { position, button } => {
                self.pointer_down(position, button)
            }
            ControllerEvent::PointerMove { position } => self.pointer_move(position, now),
            ControllerEvent::PointerUp | ControllerEvent::CaptureLost => self.pointer_up(),
            ControllerEvent::HeightChanged { value } => self.set_height(value),
            ControllerEvent::SyncRequested => self.sync(),
            ControllerEvent::Shutdown => Vec::new(),
        }
    }

    pub fn tick(&mut self) -> Vec<ControllerUpdate> {
        self.sampler
            .sample(self.robot.as_ref())
            .map(ControllerUpdate::ReadoutUpdated)
            .into_iter()
            .collect()
    }

    pub fn pointer_down(
        &mut self,
        pointer: Point2,
        button: PointerButton,
    ) -> Vec<ControllerUpdate> {
        if !self.drag.begin(pointer, self.marker, button) {
            return Vec::new();
        }
        debug!(x = pointer.x, y = pointer.y, "drag started");
        vec![ControllerUpdate::DragStateChanged { dragging: true }]
    }

    pub fn pointer_move(&mut self, pointer: Point2, now: Instant) -> Vec<ControllerUpdate> {
        let Some(session) = self.drag.session().copied() else {
            return Vec::new();
        };

        let outcome = self
            .clamp
            .next_marker(&session, pointer, self.height.value(), self.marker);
        let (marker, step_mm) = match outcome {
            ClampOutcome::Deadband { distance_mm } => {
                trace!(distance_mm, "pointer move inside deadband");
                return Vec::new();
            }
            ClampOutcome::NonFinite => {
                warn!(x = pointer.x, y = pointer.y, "ignoring non-finite pointer target");
                return Vec::new();
            }
            ClampOutcome::Stepped { marker, step_mm } => (marker, step_mm),
        };

        trace!(step_mm, "marker stepped");
        self.marker = marker;
        let mut updates = vec![ControllerUpdate::MarkerMoved { marker }];
        self.dispatch_toward(marker, now, &mut updates);
        updates
    }

    pub fn pointer_up(&mut self) -> Vec<ControllerUpdate> {
        if !self.drag.end() {
            return Vec::new();
        }
        debug!("drag ended");
        vec![ControllerUpdate::DragStateChanged { dragging: false }]
    }

    pub fn set_height(&mut self, value: f64) -> Vec<ControllerUpdate> {
        let stored = self.height.set(value);
        self.marker = self.marker.with_z(stored);
        vec![
            self.height_update(),
            ControllerUpdate::MarkerMoved {
                marker: self.marker,
            },
        ]
    }

    /// Pulls the robot pose into marker and height. Never commands motion.
    pub fn sync(&mut self) -> Vec<ControllerUpdate> {
        if !self.robot.is_valid() {
            return Vec::new();
        }
        let pose = match self.robot.current_pose() {
            Ok(pose) => pose,
            Err(err) => {
                debug!(robot = self.robot.name(), "sync skipped, pose read failed: {err}");
                return Vec::new();
            }
        };

        if !pose.position.is_finite() {
            warn!(robot = self.robot.name(), "sync skipped, robot reported non-finite pose");
            return Vec::new();
        }
        let stored = self.height.set(pose.position.z);
        self.marker = pose.position.with_z(stored);
        info!(
            x = self.marker.x,
            y = self.marker.y,
            z = self.marker.z,
            "marker synced to robot"
        );

        let mut updates = vec![
            ControllerUpdate::MarkerMoved {
                marker: self.marker,
            },
            self.height_update(),
        ];
        if self.dispatcher.breaker_mut().reset() {
            info!("motion commands re-enabled by sync");
            updates.push(ControllerUpdate::StatusChanged(self.status()));
        }
        updates
    }

    fn height_update(&self) -> ControllerUpdate {
        ControllerUpdate::HeightUpdated {
            value: self.height.value(),
            label: self.height.label(),
        }
    }

    fn dispatch_toward(
        &mut self,
        target: Point3,
        now: Instant,
        updates: &mut Vec<ControllerUpdate>,
    ) {
        match self.dispatcher.dispatch(self.robot.as_ref(), target, now) {
            Ok(DispatchOutcome::Sent {
                pose,
                step_mm,
                resumed,
            }) => {
                trace!(step_mm, "linear move sent");
                updates.push(ControllerUpdate::MoveCommanded { pose });
                if resumed {
                    info!("motion commands resumed");
                    updates.push(ControllerUpdate::StatusChanged(self.status()));
                }
            }
            Ok(DispatchOutcome::SkippedInvalidHandle) => {
                trace!("robot handle invalid; marker moved without motion");
            }
            Ok(DispatchOutcome::SkippedBreakerOpen) => {
                debug!("motion suspended; marker moved without motion");
            }
            Err(DispatchError::PoseRead(err)) => {
                debug!("skipping motion step: {err}");
            }
            Err(err @ DispatchError::NonFinite { .. }) => {
                warn!("skipping motion step: {err}");
            }
            Err(DispatchError::Move {
                source,
                consecutive_failures,
                breaker_tripped,
            }) => {
                warn!(consecutive_failures, "linear move failed: {source}");
                updates.push(ControllerUpdate::MoveFailed {
                    fault: RobotFault::from(&source),
                    consecutive_failures,
                });
                if breaker_tripped {
                    warn!(consecutive_failures, "suspending motion commands");
                    updates.push(ControllerUpdate::StatusChanged(self.status()));
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
