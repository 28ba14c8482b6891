//! Single-owner event loop around [`TeleopController`].
//!
//! Pointer, height and sync events arrive over an mpsc inbox, the pose poll
//! is an interval selected alongside it, and every resulting update is
//! broadcast. Only the actor task touches controller state.

use std::time::{Duration, Instant};

use anyhow::Context;
use shared::protocol::{ControllerEvent, ControllerUpdate};
use thiserror::Error;
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, info};

use crate::controller::TeleopController;

const INBOX_CAPACITY: usize = 256;
const UPDATE_CAPACITY: usize = 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("controller inbox is full")]
    InboxFull,
    #[error("controller actor has stopped")]
    Stopped,
}

pub struct ControllerRuntime {
    controller: TeleopController,
    poll_interval: Duration,
    updates: broadcast::Sender<ControllerUpdate>,
}

impl ControllerRuntime {
    pub fn new(controller: TeleopController, poll_interval: Duration) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CAPACITY);
        Self {
            controller,
            poll_interval,
            updates,
        }
    }

    /// Receivers taken before [`ControllerRuntime::spawn`] also see the
    /// initial state snapshot.
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerUpdate> {
        self.updates.subscribe()
    }

    pub fn spawn(self) -> ControllerHandle {
        let (events, inbox) = mpsc::channel(INBOX_CAPACITY);
        let updates = self.updates.clone();
        let task = tokio::spawn(run(self.controller, inbox, self.updates, self.poll_interval));
        ControllerHandle {
            events,
            updates,
            task,
        }
    }
}

pub struct ControllerHandle {
    events: mpsc::Sender<ControllerEvent>,
    updates: broadcast::Sender<ControllerUpdate>,
    task: JoinHandle<TeleopController>,
}

impl ControllerHandle {
    pub async fn send(&self, event: ControllerEvent) -> Result<(), RuntimeError> {
        self.events
            .send(event)
            .await
            .map_err(|_| RuntimeError::Stopped)
    }

    pub fn try_send(&self, event: ControllerEvent) -> Result<(), RuntimeError> {
        self.events.try_send(event).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => RuntimeError::InboxFull,
            mpsc::error::TrySendError::Closed(_) => RuntimeError::Stopped,
        })
    }

    pub fn sender(&self) -> mpsc::Sender<ControllerEvent> {
        self.events.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ControllerUpdate> {
        self.updates.subscribe()
    }

    /// Stops the actor after everything already queued and hands back the
    /// controller.
    pub async fn shutdown(self) -> anyhow::Result<TeleopController> {
        if self.events.send(ControllerEvent::Shutdown).await.is_err() {
            debug!("controller actor already stopped");
        }
        self.task.await.context("controller actor panicked")
    }
}

async fn run(
    mut controller: TeleopController,
    mut inbox: mpsc::Receiver<ControllerEvent>,
    updates: broadcast::Sender<ControllerUpdate>,
    poll_interval: Duration,
) -> TeleopController {
    let mut ticker = time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    publish(&updates, controller.snapshot());
    info!(
        poll_interval_ms = poll_interval.as_millis() as u64,
        "controller actor started"
    );

    loop {
        let event = tokio::select! {
            biased;
            received = inbox.recv() => match received {
                Some(event) => event,
                None => break,
            },
            _ = ticker.tick() => ControllerEvent::Tick,
        };
        if event == ControllerEvent::Shutdown {
            break;
        }
        let produced = controller.handle(event, Instant::now());
        publish(&updates, produced);
    }

    info!("controller actor stopped");
    controller
}

fn publish(updates: &broadcast::Sender<ControllerUpdate>, produced: Vec<ControllerUpdate>) {
    for update in produced {
        // No subscribers is fine; the controller keeps authoritative state.
        let _ = updates.send(update);
    }
}
