use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use robot_link::{MissingRobotConnection, RobotConnection, SimConnection, SimRobot, SimStation};
use shared::{
    domain::{Orientation, Point2, Point3, PointerButton, Pose},
    protocol::{ControllerEvent, ControllerUpdate},
};
use teleop_core::{load_settings, ControllerRuntime, TeleopController};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing_subscriber::EnvFilter;

/// Replays pointer/height/sync events against a simulated robot and prints
/// every controller update as a JSON line.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSON-lines file of controller events. Defaults to a short drag.
    #[arg(long)]
    script: Option<PathBuf>,
    /// Starting TCP position as x,y,z in millimetres.
    #[arg(long, value_delimiter = ',', default_value = "400,0,300")]
    start: Vec<f64>,
    #[arg(long)]
    robot_name: Option<String>,
    /// Run without a station to exercise the disconnected path.
    #[arg(long)]
    missing_robot: bool,
    #[arg(long, default_value_t = 0)]
    step_delay_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(name) = args.robot_name {
        settings.robot_name = name;
    }
    let start = parse_start(&args.start)?;
    let events = match &args.script {
        Some(path) => read_script(path)?,
        None => demo_script(),
    };

    let sim_robot = SimRobot::new(
        settings.robot_name.clone(),
        Pose::new(start, Orientation::new(180.0, 0.0, 0.0)),
    );
    let connection: Box<dyn RobotConnection> = if args.missing_robot {
        Box::new(MissingRobotConnection)
    } else {
        Box::new(SimConnection::new(SimStation::with_robot(sim_robot.clone())))
    };

    let controller = TeleopController::connect(connection.as_ref(), &settings);
    let runtime = ControllerRuntime::new(controller, settings.poll_interval());
    let printer = tokio::spawn(print_updates(runtime.subscribe()));
    let handle = runtime.spawn();

    let step_delay = Duration::from_millis(args.step_delay_ms);
    for event in events {
        handle.send(event).await?;
        if !step_delay.is_zero() {
            tokio::time::sleep(step_delay).await;
        }
    }

    let controller = handle.shutdown().await?;
    printer.await.context("update printer panicked")??;

    let marker = controller.marker();
    tracing::info!(
        x = marker.x,
        y = marker.y,
        z = marker.z,
        moves = sim_robot.moves().len(),
        "replay finished"
    );
    Ok(())
}

async fn print_updates(mut updates: broadcast::Receiver<ControllerUpdate>) -> Result<()> {
    loop {
        match updates.recv().await {
            Ok(update) => println!("{}", serde_json::to_string(&update)?),
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "update printer fell behind");
            }
            Err(RecvError::Closed) => return Ok(()),
        }
    }
}

fn parse_start(values: &[f64]) -> Result<Point3> {
    match values {
        [x, y, z] => Ok(Point3::new(*x, *y, *z)),
        other => bail!("--start needs exactly three values, got {}", other.len()),
    }
}

fn read_script(path: &Path) -> Result<Vec<ControllerEvent>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read script '{}'", path.display()))?;
    parse_script(&raw).with_context(|| format!("invalid script '{}'", path.display()))
}

/// One JSON event per line; blank lines and `#` comments are skipped.
fn parse_script(raw: &str) -> Result<Vec<ControllerEvent>> {
    raw.lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line_no, line)| {
            serde_json::from_str::<ControllerEvent>(line)
                .with_context(|| format!("line {line_no}: {line}"))
        })
        .collect()
}

fn demo_script() -> Vec<ControllerEvent> {
    let origin = Point2::new(200.0, 200.0);
    let mut events = vec![
        ControllerEvent::Tick,
        ControllerEvent::PointerDown {
            position: origin,
            button: PointerButton::Primary,
        },
    ];
    events.extend((1..=12).map(|i| ControllerEvent::PointerMove {
        position: Point2::new(origin.x + 3.0 * i as f64, origin.y - 1.5 * i as f64),
    }));
    events.extend([
        ControllerEvent::PointerUp,
        ControllerEvent::HeightChanged { value: 250.0 },
        ControllerEvent::Tick,
        ControllerEvent::SyncRequested,
    ]);
    events
}
