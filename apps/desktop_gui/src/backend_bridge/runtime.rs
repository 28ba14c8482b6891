//! Runtime bridge between UI command queue and the controller actor.

use std::thread;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use robot_link::RobotConnection;
use shared::protocol::ControllerUpdate;
use teleop_core::{ControllerRuntime, TeleopController, TeleopSettings};
use tokio::sync::broadcast::error::RecvError;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;

pub struct BackendConfig {
    pub settings: TeleopSettings,
    pub connection: Box<dyn RobotConnection>,
}

pub fn launch(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>, config: BackendConfig) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::BackendFailed(format!(
                    "backend worker startup failure: failed to build runtime: {err}"
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let BackendConfig {
                settings,
                connection,
            } = config;
            let controller = TeleopController::connect(connection.as_ref(), &settings);
            let teleop = ControllerRuntime::new(controller, settings.poll_interval());
            let mut updates = teleop.subscribe();
            let handle = teleop.spawn();

            let forward_tx = ui_tx.clone();
            let forwarder = tokio::spawn(async move {
                loop {
                    match updates.recv().await {
                        Ok(update) => {
                            if !forward_update(&forward_tx, update) {
                                break;
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "ui update forwarder fell behind");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            });

            let events = handle.sender();
            let intake = tokio::task::spawn_blocking(move || {
                while let Ok(cmd) = cmd_rx.recv() {
                    let cmd_name = cmd.name();
                    if events.blocking_send(cmd.into_event()).is_err() {
                        tracing::warn!(command = cmd_name, "controller actor stopped");
                        break;
                    }
                }
            });
            let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

            if intake.await.is_err() {
                tracing::error!("ui command intake panicked");
            }
            match handle.shutdown().await {
                Ok(controller) => {
                    let marker = controller.marker();
                    tracing::info!(x = marker.x, y = marker.y, z = marker.z, "backend stopped");
                }
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::BackendFailed(format!("{err:#}")));
                    tracing::error!("controller shutdown failed: {err:#}");
                }
            }
            let _ = forwarder.await;
        });
    });
}

/// Hands one controller update to the UI queue. Returns false once the UI
/// side has gone away. A full queue drops the update.
fn forward_update(ui_tx: &Sender<UiEvent>, update: ControllerUpdate) -> bool {
    match ui_tx.try_send(UiEvent::Controller(update)) {
        Ok(()) => true,
        Err(TrySendError::Full(event)) => {
            tracing::debug!(?event, "ui event queue full; controller update dropped");
            true
        }
        Err(TrySendError::Disconnected(_)) => false,
    }
}
