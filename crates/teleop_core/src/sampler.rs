use chrono::Utc;
use robot_link::RobotHandle;
use shared::{domain::Point3, protocol::Readout};
use tracing::debug;

pub fn format_axis(axis: &str, value_mm: f64) -> String {
    format!("{axis}: {value_mm:.1} mm")
}

pub fn readout_for(position: Point3) -> Readout {
    Readout {
        x: format_axis("X", position.x),
        y: format_axis("Y", position.y),
        z: format_axis("Z", position.z),
        position,
        sampled_at: Utc::now(),
    }
}

/// Keeps the last good readout; a failed read leaves it in place.
#[derive(Debug, Default)]
pub struct PoseSampler {
    latest: Option<Readout>,
}

impl PoseSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<&Readout> {
        self.latest.as_ref()
    }

    /// Returns a fresh readout, or `None` when nothing new was read.
    pub fn sample(&mut self, robot: &dyn RobotHandle) -> Option<Readout> {
        if !robot.is_valid() {
            return None;
        }
        match robot.current_pose() {
            Ok(pose) => {
                let readout = readout_for(pose.position);
                self.latest = Some(readout.clone());
                Some(readout)
            }
            Err(err) => {
                debug!(robot = robot.name(), "pose poll failed; keeping stale readout: {err}");
                None
            }
        }
    }
}
