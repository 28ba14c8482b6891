//! Backend commands queued from UI to the controller actor.

use shared::{
    domain::{Point2, PointerButton},
    protocol::ControllerEvent,
};

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCommand {
    PointerDown {
        position: Point2,
        button: PointerButton,
    },
    PointerMove {
        position: Point2,
    },
    PointerUp,
    CaptureLost,
    SetHeight {
        value: f64,
    },
    Sync,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PointerDown { .. } => "pointer_down",
            Self::PointerMove { .. } => "pointer_move",
            Self::PointerUp => "pointer_up",
            Self::CaptureLost => "capture_lost",
            Self::SetHeight { .. } => "set_height",
            Self::Sync => "sync",
        }
    }

    pub fn into_event(self) -> ControllerEvent {
        match self {
            Self::PointerDown { position, button } => {
                ControllerEvent::PointerDown { position, button }
            }
            Self::PointerMove { position } => ControllerEvent::PointerMove { position },
            Self::PointerUp => ControllerEvent::PointerUp,
            Self::CaptureLost => ControllerEvent::CaptureLost,
            Self::SetHeight { value } => ControllerEvent::HeightChanged { value },
            Self::Sync => ControllerEvent::SyncRequested,
        }
    }
}
