use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidHandle,
    PoseRead,
    Move,
    Connection,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RobotError {
    #[error("robot handle '{name}' is not valid")]
    InvalidHandle { name: String },
    #[error("failed to read robot pose: {0}")]
    PoseRead(String),
    #[error("linear move rejected: {0}")]
    Move(String),
    #[error("{0}")]
    Connection(String),
}

impl RobotError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidHandle { .. } => ErrorCode::InvalidHandle,
            Self::PoseRead(_) => ErrorCode::PoseRead,
            Self::Move(_) => ErrorCode::Move,
            Self::Connection(_) => ErrorCode::Connection,
        }
    }
}

/// Serializable form of a [`RobotError`] for update streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotFault {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&RobotError> for RobotFault {
    fn from(value: &RobotError) -> Self {
        Self {
            code: value.code(),
            message: value.to_string(),
        }
    }
}
