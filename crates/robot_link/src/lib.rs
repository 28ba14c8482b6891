use std::sync::Arc;

use shared::{
    domain::{ItemKind, Pose},
    error::RobotError,
};

pub mod sim;

pub use sim::{SimConnection, SimRobot, SimStation};

/// Synchronous pose access for a single TCP.
pub trait PoseFeed: Send + Sync {
    fn current_pose(&self) -> Result<Pose, RobotError>;
    fn move_linear_to(&self, target: Pose) -> Result<(), RobotError>;
}

/// A robot item looked up in a station. Validity can drop at any time, so
/// callers check [`RobotHandle::is_valid`] before every use.
pub trait RobotHandle: PoseFeed {
    fn name(&self) -> &str;
    fn is_valid(&self) -> bool;
}

pub trait RobotStation: Send + Sync {
    fn find_item(&self, name: &str, kind: ItemKind) -> Arc<dyn RobotHandle>;
}

pub trait RobotConnection: Send + Sync {
    fn connect(&self) -> Result<Arc<dyn RobotStation>, RobotError>;
}

/// Permanently invalid handle returned when a lookup finds nothing.
pub struct MissingRobot {
    name: String,
}

impl MissingRobot {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl PoseFeed for MissingRobot {
    fn current_pose(&self) -> Result<Pose, RobotError> {
        Err(RobotError::InvalidHandle {
            name: self.name.clone(),
        })
    }

    fn move_linear_to(&self, _target: Pose) -> Result<(), RobotError> {
        Err(RobotError::InvalidHandle {
            name: self.name.clone(),
        })
    }
}

impl RobotHandle for MissingRobot {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_valid(&self) -> bool {
        false
    }
}

pub struct MissingRobotConnection;

impl RobotConnection for MissingRobotConnection {
    fn connect(&self) -> Result<Arc<dyn RobotStation>, RobotError> {
        Err(RobotError::Connection(
            "robot station is unavailable".to_string(),
        ))
    }
}
