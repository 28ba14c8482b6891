//! Events delivered from the backend worker to the UI thread.

use shared::protocol::ControllerUpdate;

#[derive(Debug, Clone)]
pub enum UiEvent {
    Info(String),
    Controller(ControllerUpdate),
    BackendFailed(String),
}
