//! Incremental Cartesian tele-operation of a robot TCP from pointer drags.

pub mod clamp;
pub mod controller;
pub mod dispatch;
pub mod drag;
pub mod height;
pub mod runtime;
pub mod sampler;
pub mod settings;

pub use controller::{connect_robot, TeleopController};
pub use runtime::{ControllerHandle, ControllerRuntime, RuntimeError};
pub use settings::{load_settings, TeleopSettings};
