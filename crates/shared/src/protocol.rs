use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{Point2, Point3, PointerButton, Pose},
    error::RobotFault,
};

/// Everything the controller reacts to, processed strictly in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ControllerEvent {
    Tick,
    PointerDown {
        position: Point2,
        #[serde(default)]
        button: PointerButton,
    },
    PointerMove {
        position: Point2,
    },
    PointerUp,
    CaptureLost,
    HeightChanged {
        value: f64,
    },
    SyncRequested,
    Shutdown,
}

impl ControllerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tick => "tick",
            Self::PointerDown { .. } => "pointer_down",
            Self::PointerMove { .. } => "pointer_move",
            Self::PointerUp => "pointer_up",
            Self::CaptureLost => "capture_lost",
            Self::HeightChanged { .. } => "height_changed",
            Self::SyncRequested => "sync_requested",
            Self::Shutdown => "shutdown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusSeverity {
    Ok,
    Warn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub message: String,
    pub severity: StatusSeverity,
}

impl ConnectionStatus {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: StatusSeverity::Ok,
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: StatusSeverity::Warn,
        }
    }
}

/// Live TCP position readout, one formatted string per axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Readout {
    pub x: String,
    pub y: String,
    pub z: String,
    pub position: Point3,
    pub sampled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ControllerUpdate {
    MarkerMoved {
        marker: Point3,
    },
    HeightUpdated {
        value: f64,
        label: String,
    },
    ReadoutUpdated(Readout),
    DragStateChanged {
        dragging: bool,
    },
    MoveCommanded {
        pose: Pose,
    },
    MoveFailed {
        fault: RobotFault,
        consecutive_failures: u32,
    },
    StatusChanged(ConnectionStatus),
}
