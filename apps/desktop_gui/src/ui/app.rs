use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::{
    domain::{HeightBounds, Point3, PointerButton, Pose},
    protocol::{ConnectionStatus, ControllerUpdate, Readout, StatusSeverity},
};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::controller::orchestration::dispatch_backend_command;
use crate::ui::scene::SceneView;

const REPAINT_INTERVAL: Duration = Duration::from_millis(50);
const MAX_EVENTS_PER_FRAME: usize = 512;

pub struct TeleopApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    view: SceneView,
    marker: Point3,
    readout: Option<Readout>,
    height: f64,
    height_label: String,
    height_bounds: HeightBounds,
    connection: Option<ConnectionStatus>,
    dragging: bool,
    last_commanded: Option<Pose>,
    last_failure: Option<String>,
    info: String,
}

impl TeleopApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        view: SceneView,
        height_bounds: HeightBounds,
    ) -> Self {
        let height = height_bounds.clamp(0.0);
        Self {
            cmd_tx,
            ui_rx,
            view,
            marker: Point3::new(0.0, 0.0, height),
            readout: None,
            height,
            height_label: format!("Z: {height:.1} mm"),
            height_bounds,
            connection: None,
            dragging: false,
            last_commanded: None,
            last_failure: None,
            info: String::new(),
        }
    }

    fn send(&mut self, cmd: BackendCommand) {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.info);
    }

    fn drain_events(&mut self) {
        let events: Vec<UiEvent> = self.ui_rx.try_iter().take(MAX_EVENTS_PER_FRAME).collect();
        for event in events {
            self.apply_event(event);
        }
    }

    fn apply_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Info(message) => self.info = message,
            UiEvent::BackendFailed(message) => {
                tracing::error!("{message}");
                self.info = message;
            }
            UiEvent::Controller(update) => self.apply_update(update),
        }
    }

    fn apply_update(&mut self, update: ControllerUpdate) {
        match update {
            ControllerUpdate::MarkerMoved { marker } => {
                self.view.anchor(marker);
                self.marker = marker;
            }
            ControllerUpdate::HeightUpdated { value, label } => {
                self.height = value;
                self.height_label = label;
            }
            ControllerUpdate::ReadoutUpdated(readout) => self.readout = Some(readout),
            ControllerUpdate::DragStateChanged { dragging } => self.dragging = dragging,
            ControllerUpdate::MoveCommanded { pose } => {
                self.last_commanded = Some(pose);
                self.last_failure = None;
            }
            ControllerUpdate::MoveFailed {
                fault,
                consecutive_failures,
            } => {
                self.last_failure = Some(format!(
                    "move failed ({consecutive_failures} in a row): {}",
                    fault.message
                ));
            }
            ControllerUpdate::StatusChanged(status) => self.connection = Some(status),
        }
    }

    fn controls_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("TCP teleoperation");
        ui.separator();

        match &self.connection {
            Some(status) => {
                let color = match status.severity {
                    StatusSeverity::Ok => egui::Color32::from_rgb(67, 181, 129),
                    StatusSeverity::Warn => egui::Color32::from_rgb(237, 66, 69),
                };
                ui.label(egui::RichText::new(&status.message).color(color));
            }
            None => {
                ui.label(egui::RichText::new("Connecting...").weak());
            }
        }

        ui.add_space(8.0);
        ui.label(egui::RichText::new("Robot position").strong());
        match &self.readout {
            Some(readout) => {
                ui.monospace(&readout.x);
                ui.monospace(&readout.y);
                ui.monospace(&readout.z);
            }
            None => {
                ui.label(egui::RichText::new("No pose sampled yet").weak());
            }
        }

        ui.add_space(8.0);
        ui.label(egui::RichText::new("Marker").strong());
        ui.monospace(format!(
            "({:.1}, {:.1}, {:.1})",
            self.marker.x, self.marker.y, self.marker.z
        ));

        ui.add_space(8.0);
        ui.label(egui::RichText::new("Height override").strong());
        let mut height = self.height;
        let slider = egui::Slider::new(
            &mut height,
            self.height_bounds.min..=self.height_bounds.max,
        )
        .fixed_decimals(1)
        .suffix(" mm");
        if ui.add(slider).changed() {
            self.height = height;
            self.send(BackendCommand::SetHeight { value: height });
        }
        ui.monospace(&self.height_label);

        ui.add_space(8.0);
        if ui
            .button("Sync to robot")
            .on_hover_text("Move the marker and height to the robot's current position")
            .clicked()
        {
            self.send(BackendCommand::Sync);
        }
        if ui.button("Recenter view").clicked() {
            self.view.recenter(self.marker);
        }

        ui.separator();
        if let Some(pose) = self.last_commanded {
            ui.label("Last commanded");
            ui.monospace(format!(
                "({:.1}, {:.1}, {:.1})",
                pose.position.x, pose.position.y, pose.position.z
            ));
        }
        if let Some(failure) = &self.last_failure {
            ui.label(egui::RichText::new(failure).color(egui::Color32::from_rgb(250, 166, 26)));
        }
        if !self.info.is_empty() {
            ui.label(egui::RichText::new(&self.info).small().weak());
        }
    }

    fn scene_panel(&mut self, ui: &mut egui::Ui) {
        let (rect, response) =
            ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());

        if response.drag_started_by(egui::PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                self.send(BackendCommand::PointerDown {
                    position: SceneView::to_local(rect, pos),
                    button: PointerButton::Primary,
                });
            }
        } else if response.dragged_by(egui::PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                self.send(BackendCommand::PointerMove {
                    position: SceneView::to_local(rect, pos),
                });
            }
        }
        if response.drag_stopped_by(egui::PointerButton::Primary) {
            self.send(BackendCommand::PointerUp);
        }

        let robot = self.readout.as_ref().map(|readout| readout.position);
        self.view
            .paint(&ui.painter_at(rect), rect, self.marker, robot, self.dragging);
    }
}

impl eframe::App for TeleopApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();

        if self.dragging && !ctx.input(|i| i.focused) {
            self.send(BackendCommand::CaptureLost);
            self.dragging = false;
        }

        egui::SidePanel::right("controls")
            .resizable(false)
            .default_width(240.0)
            .show(ctx, |ui| self.controls_panel(ui));
        egui::CentralPanel::default().show(ctx, |ui| self.scene_panel(ui));

        ctx.request_repaint_after(REPAINT_INTERVAL);
    }
}
