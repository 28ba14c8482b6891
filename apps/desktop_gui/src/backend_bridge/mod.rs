//! Bridge between the UI thread and the controller actor's runtime.

pub mod commands;
pub mod runtime;
