//! In-memory robot station. Moves complete instantly; reads and moves can be
//! made to fail for a number of calls or until cleared.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use shared::{
    domain::{ItemKind, Pose},
    error::RobotError,
};
use tracing::debug;

use crate::{MissingRobot, PoseFeed, RobotConnection, RobotHandle, RobotStation};

#[derive(Debug)]
struct SimRobotState {
    pose: Pose,
    valid: bool,
    failing_reads: u32,
    failing_moves: u32,
    reject_all_moves: bool,
    readings: usize,
    moves: Vec<Pose>,
}

pub struct SimRobot {
    name: String,
    state: Mutex<SimRobotState>,
}

impl SimRobot {
    pub fn new(name: impl Into<String>, pose: Pose) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            state: Mutex::new(SimRobotState {
                pose,
                valid: true,
                failing_reads: 0,
                failing_moves: 0,
                reject_all_moves: false,
                readings: 0,
                moves: Vec::new(),
            }),
        })
    }

    fn state(&self) -> MutexGuard<'_, SimRobotState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn pose(&self) -> Pose {
        self.state().pose
    }

    /// Teleports the TCP without recording a move.
    pub fn set_pose(&self, pose: Pose) {
        self.state().pose = pose;
    }

    pub fn invalidate(&self) {
        self.state().valid = false;
    }

    pub fn fail_next_reads(&self, count: u32) {
        self.state().failing_reads = count;
    }

    pub fn fail_next_moves(&self, count: u32) {
        self.state().failing_moves = count;
    }

    pub fn reject_all_moves(&self, reject: bool) {
        self.state().reject_all_moves = reject;
    }

    pub fn moves(&self) -> Vec<Pose> {
        self.state().moves.clone()
    }

    pub fn readings(&self) -> usize {
        self.state().readings
    }
}

impl PoseFeed for SimRobot {
    fn current_pose(&self) -> Result<Pose, RobotError> {
        let mut state = self.state();
        if !state.valid {
            return Err(RobotError::InvalidHandle {
                name: self.name.clone(),
            });
        }
        if state.failing_reads > 0 {
            state.failing_reads -= 1;
            return Err(RobotError::PoseRead("simulated read fault".to_string()));
        }
        state.readings += 1;
        Ok(state.pose)
    }

    fn move_linear_to(&self, target: Pose) -> Result<(), RobotError> {
        let mut state = self.state();
        if !state.valid {
            return Err(RobotError::InvalidHandle {
                name: self.name.clone(),
            });
        }
        if state.reject_all_moves {
            return Err(RobotError::Move("simulated controller fault".to_string()));
        }
        if state.failing_moves > 0 {
            state.failing_moves -= 1;
            return Err(RobotError::Move("simulated controller fault".to_string()));
        }
        debug!(robot = %self.name, x = target.position.x, y = target.position.y, z = target.position.z, "sim move");
        state.pose = target;
        state.moves.push(target);
        Ok(())
    }
}

impl RobotHandle for SimRobot {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_valid(&self) -> bool {
        self.state().valid
    }
}

#[derive(Default)]
pub struct SimStation {
    robots: Mutex<HashMap<String, Arc<SimRobot>>>,
}

impl SimStation {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_robot(robot: Arc<SimRobot>) -> Arc<Self> {
        let station = Self::new();
        station.add_robot(robot);
        station
    }

    pub fn add_robot(&self, robot: Arc<SimRobot>) {
        self.robots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(robot.name.clone(), robot);
    }
}

impl RobotStation for SimStation {
    fn find_item(&self, name: &str, kind: ItemKind) -> Arc<dyn RobotHandle> {
        let robots = self
            .robots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match (kind, robots.get(name)) {
            (ItemKind::Robot, Some(robot)) => robot.clone() as Arc<dyn RobotHandle>,
            _ => Arc::new(MissingRobot::new(name)),
        }
    }
}

pub struct SimConnection {
    station: Arc<SimStation>,
}

impl SimConnection {
    pub fn new(station: Arc<SimStation>) -> Self {
        Self { station }
    }
}

impl RobotConnection for SimConnection {
    fn connect(&self) -> Result<Arc<dyn RobotStation>, RobotError> {
        Ok(self.station.clone())
    }
}
