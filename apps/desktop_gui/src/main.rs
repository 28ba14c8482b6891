mod backend_bridge;
mod controller;
mod ui;

use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;
use robot_link::{MissingRobotConnection, RobotConnection, SimConnection, SimRobot, SimStation};
use shared::domain::{Orientation, Point3, Pose};
use teleop_core::load_settings;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::commands::BackendCommand;
use crate::backend_bridge::runtime::{self, BackendConfig};
use crate::controller::events::UiEvent;
use crate::ui::{scene::SceneView, TeleopApp};

const CONFIG_FILE_NAME: &str = "teleop.toml";

#[derive(Parser, Debug)]
struct Args {
    /// Settings file. Falls back to the user config dir, then ./teleop.toml.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    robot_name: Option<String>,
    /// Starting TCP position of the simulated robot as x,y,z in millimetres.
    #[arg(long, value_delimiter = ',', default_value = "400,0,300")]
    start: Vec<f64>,
    #[arg(long)]
    missing_robot: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let config_path = args.config.or_else(user_config_path);
    let mut settings = load_settings(config_path.as_deref())?;
    if let Some(name) = args.robot_name {
        settings.robot_name = name;
    }
    let start = match args.start.as_slice() {
        [x, y, z] => Point3::new(*x, *y, *z),
        other => bail!("--start needs exactly three values, got {}", other.len()),
    };

    let connection: Box<dyn RobotConnection> = if args.missing_robot {
        Box::new(MissingRobotConnection)
    } else {
        let robot = SimRobot::new(
            settings.robot_name.clone(),
            Pose::new(start, Orientation::new(180.0, 0.0, 0.0)),
        );
        Box::new(SimConnection::new(SimStation::with_robot(robot)))
    };

    let view = SceneView::new(settings.pixels_to_mm);
    let height_bounds = settings.height_bounds();

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    runtime::launch(
        cmd_rx,
        ui_tx,
        BackendConfig {
            settings,
            connection,
        },
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("TCP Teleoperation")
            .with_inner_size([1100.0, 720.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        "TCP Teleoperation",
        options,
        Box::new(move |_cc| Ok(Box::new(TeleopApp::new(cmd_tx, ui_rx, view, height_bounds)))),
    )
    .map_err(|err| anyhow!("desktop ui failed: {err}"))
}

fn user_config_path() -> Option<PathBuf> {
    let path = dirs::config_dir()?.join("teleop").join(CONFIG_FILE_NAME);
    path.is_file().then_some(path)
}
