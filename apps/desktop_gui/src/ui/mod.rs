//! Operator surface: scene view, height slider and readouts.

pub mod app;
pub mod scene;

pub use app::TeleopApp;
