//! Command orchestration helpers from UI actions to backend command queue.

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) {
    let cmd_name = cmd.name();
    match cmd_tx.try_send(cmd) {
        Ok(()) => tracing::trace!(command = cmd_name, "queued ui->backend command"),
        Err(TrySendError::Full(_)) => {
            tracing::debug!(command = cmd_name, "ui command queue full; input dropped");
            *status = "UI command queue is full; pointer input dropped".to_string();
        }
        Err(TrySendError::Disconnected(_)) => {
            *status = "Controller backend disconnected; restart the application".to_string();
        }
    }
}
