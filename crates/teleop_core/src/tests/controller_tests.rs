use super::*;

use std::time::Duration;

use robot_link::{MissingRobotConnection, SimConnection, SimRobot, SimStation};
use shared::{
    domain::{Orientation, Pose},
    error::ErrorCode,
    protocol::StatusSeverity,
};

const ROBOT: &str = "Fanuc ARC Mate 100iD";

fn wrist() -> Orientation {
    Orientation::new(-179.123_456_789, 0.5, 33.333_333_333)
}

fn sim_robot(position: Point3) -> Arc<SimRobot> {
    SimRobot::new(ROBOT, Pose::new(position, wrist()))
}

fn controller_for(robot: &Arc<SimRobot>) -> TeleopController {
    let settings = TeleopSettings::default();
    let connection = SimConnection::new(SimStation::with_robot(robot.clone()));
    TeleopController::connect(&connection, &settings)
}

fn missing_controller() -> TeleopController {
    TeleopController::connect(&MissingRobotConnection, &TeleopSettings::default())
}

fn moves_in(updates: &[ControllerUpdate]) -> Vec<Pose> {
    updates
        .iter()
        .filter_map(|update| match update {
            ControllerUpdate::MoveCommanded { pose } => Some(*pose),
            _ => None,
        })
        .collect()
}

#[test]
fn startup_seeds_marker_and_height_from_robot() {
    let robot = sim_robot(Point3::new(120.0, -40.0, 75.0));
    let controller = controller_for(&robot);

    assert_eq!(controller.marker(), Point3::new(120.0, -40.0, 75.0));
    assert_eq!(controller.height().value(), 75.0);
    assert_eq!(controller.status(), ConnectionStatus::ok(STATUS_CONNECTED));
    assert!(robot.moves().is_empty());
}

#[test]
fn startup_clamps_height_and_marker_follows() {
    let robot = sim_robot(Point3::new(0.0, 0.0, -25.0));
    let controller = controller_for(&robot);

    assert_eq!(controller.height().value(), 0.0);
    assert_eq!(controller.marker(), Point3::new(0.0, 0.0, 0.0));
}

#[test]
fn unknown_robot_reports_warning() {
    let robot = SimRobot::new("some other arm", Pose::default());
    let connection = SimConnection::new(SimStation::with_robot(robot));
    let controller = TeleopController::connect(&connection, &TeleopSettings::default());

    let status = controller.status();
    assert_eq!(status.severity, StatusSeverity::Warn);
    assert_eq!(status.message, STATUS_ROBOT_NOT_FOUND);
}

#[test]
fn connection_error_reports_warning_with_reason() {
    let controller = missing_controller();
    let status = controller.status();
    assert_eq!(status.severity, StatusSeverity::Warn);
    assert_eq!(
        status.message,
        "Error connecting to robot station: robot station is unavailable"
    );
    assert!(!controller.robot().is_valid());
}

#[test]
fn drag_step_moves_marker_and_robot_keeping_orientation() {
    let robot = sim_robot(Point3::new(0.0, 0.0, 50.0));
    let mut controller = controller_for(&robot);
    let now = Instant::now();

    let down = controller.pointer_down(Point2::new(100.0, 100.0), PointerButton::Primary);
    assert_eq!(down, vec![ControllerUpdate::DragStateChanged { dragging: true }]);

    let updates = controller.pointer_move(Point2::new(105.0, 100.0), now);
    assert_eq!(controller.marker(), Point3::new(10.0, 0.0, 50.0));
    assert_eq!(
        updates[0],
        ControllerUpdate::MarkerMoved {
            marker: Point3::new(10.0, 0.0, 50.0)
        }
    );

    let sent = robot.moves();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].position, Point3::new(10.0, 0.0, 50.0));
    assert_eq!(sent[0].orientation.roll.to_bits(), wrist().roll.to_bits());
    assert_eq!(sent[0].orientation.pitch.to_bits(), wrist().pitch.to_bits());
    assert_eq!(sent[0].orientation.yaw.to_bits(), wrist().yaw.to_bits());
    assert_eq!(moves_in(&updates), sent);
}

#[test]
fn deadband_move_changes_nothing() {
    let robot = sim_robot(Point3::new(0.0, 0.0, 50.0));
    let mut controller = controller_for(&robot);

    controller.pointer_down(Point2::new(100.0, 100.0), PointerButton::Primary);
    let updates = controller.pointer_move(Point2::new(100.0, 100.25), Instant::now());

    assert!(updates.is_empty());
    assert_eq!(controller.marker(), Point3::new(0.0, 0.0, 50.0));
    assert!(robot.moves().is_empty());
}

#[test]
fn large_pointer_jump_is_stepped_at_most_ten_mm() {
    let robot = sim_robot(Point3::new(0.0, 0.0, 50.0));
    let mut controller = controller_for(&robot);
    let now = Instant::now();

    controller.pointer_down(Point2::new(0.0, 0.0), PointerButton::Primary);
    for _ in 0..4 {
        let before = controller.marker();
        controller.pointer_move(Point2::new(100.0, 0.0), now);
        let step = (controller.marker() - before).magnitude();
        assert!((step - 10.0).abs() < 1e-9, "step was {step}");
    }
    assert!((controller.marker().x - 40.0).abs() < 1e-9);

    for pose in robot.moves().windows(2) {
        assert!((pose[1].position - pose[0].position).magnitude() <= 10.0 + 1e-9);
    }
}

fn assert_moves_bounded(robot: &SimRobot, start: Point3) {
    let mut previous = start;
    for pose in robot.moves() {
        assert!(pose.position.is_finite(), "non-finite move {pose:?}");
        assert!((pose.position - previous).magnitude() <= 10.0 + 1e-9);
        previous = pose.position;
    }
}

#[test]
fn extreme_pointer_jump_takes_one_full_step() {
    let start = Point3::new(0.0, 0.0, 50.0);
    let robot = sim_robot(start);
    let mut controller = controller_for(&robot);

    controller.pointer_down(Point2::new(0.0, 0.0), PointerButton::Primary);
    let updates = controller.pointer_move(Point2::new(1e160, 0.0), Instant::now());

    assert!((controller.marker() - Point3::new(10.0, 0.0, 50.0)).magnitude() < 1e-9);
    assert_eq!(moves_in(&updates).len(), 1);
    assert_eq!(robot.moves().len(), 1);
    assert_moves_bounded(&robot, start);
}

#[test]
fn overflowing_pointer_jump_is_ignored() {
    let start = Point3::new(0.0, 0.0, 50.0);
    let robot = sim_robot(start);
    let mut controller = controller_for(&robot);

    controller.pointer_down(Point2::new(0.0, 0.0), PointerButton::Primary);
    let updates = controller.pointer_move(Point2::new(1e308, 0.0), Instant::now());
    assert!(updates.is_empty());
    let updates = controller.pointer_move(Point2::new(f64::NAN, 0.0), Instant::now());
    assert!(updates.is_empty());

    assert_eq!(controller.marker(), start);
    assert!(robot.moves().is_empty());

    // The session survives and ordinary moves still work.
    controller.pointer_move(Point2::new(3.0, 0.0), Instant::now());
    assert_eq!(controller.marker(), Point3::new(6.0, 0.0, 50.0));
    assert_moves_bounded(&robot, start);
}

#[test]
fn robot_relative_clamp_holds_when_robot_lags() {
    let robot = sim_robot(Point3::new(0.0, 0.0, 50.0));
    let mut controller = controller_for(&robot);
    let now = Instant::now();

    controller.pointer_down(Point2::new(0.0, 0.0), PointerButton::Primary);
    robot.fail_next_moves(2);
    controller.pointer_move(Point2::new(100.0, 0.0), now);
    controller.pointer_move(Point2::new(100.0, 0.0), now);
    controller.pointer_move(Point2::new(100.0, 0.0), now);

    // Marker is 30 mm out but the robot still only steps 10 mm from where it is.
    assert!((controller.marker().x - 30.0).abs() < 1e-9);
    let sent = robot.moves();
    assert_eq!(sent.len(), 1);
    assert!((sent[0].position.x - 10.0).abs() < 1e-9);
}

#[test]
fn pointer_move_without_session_is_ignored() {
    let robot = sim_robot(Point3::new(0.0, 0.0, 50.0));
    let mut controller = controller_for(&robot);

    assert!(controller
        .pointer_move(Point2::new(500.0, 500.0), Instant::now())
        .is_empty());
    assert!(controller.pointer_up().is_empty());
    assert!(robot.moves().is_empty());
}

#[test]
fn release_ends_session_without_flushing() {
    let robot = sim_robot(Point3::new(0.0, 0.0, 50.0));
    let mut controller = controller_for(&robot);

    controller.pointer_down(Point2::new(0.0, 0.0), PointerButton::Primary);
    let updates = controller.handle(ControllerEvent::CaptureLost, Instant::now());
    assert_eq!(
        updates,
        vec![ControllerUpdate::DragStateChanged { dragging: false }]
    );
    assert!(!controller.is_dragging());
    assert!(controller
        .pointer_move(Point2::new(50.0, 0.0), Instant::now())
        .is_empty());
}

#[test]
fn height_change_moves_marker_z_only_and_sends_nothing() {
    let robot = sim_robot(Point3::new(10.0, 20.0, 50.0));
    let mut controller = controller_for(&robot);

    let updates = controller.set_height(80.0);
    assert_eq!(controller.marker(), Point3::new(10.0, 20.0, 80.0));
    assert_eq!(
        updates[0],
        ControllerUpdate::HeightUpdated {
            value: 80.0,
            label: "Z: 80.0 mm".to_string()
        }
    );
    assert!(robot.moves().is_empty());
}

#[test]
fn height_outside_bounds_is_clamped() {
    let robot = sim_robot(Point3::new(0.0, 0.0, 50.0));
    let mut controller = controller_for(&robot);

    controller.set_height(5000.0);
    assert_eq!(controller.height().value(), 1000.0);
    assert_eq!(controller.marker().z, 1000.0);

    controller.set_height(-1.0);
    assert_eq!(controller.height().value(), 0.0);
}

#[test]
fn non_finite_height_keeps_previous_value() {
    let start = Point3::new(0.0, 0.0, 50.0);
    let robot = sim_robot(start);
    let mut controller = controller_for(&robot);

    controller.set_height(f64::NAN);
    assert_eq!(controller.height().value(), 50.0);
    assert_eq!(controller.marker().z, 50.0);
    assert!(controller.height().bounds().contains(controller.height().value()));

    controller.pointer_down(Point2::new(0.0, 0.0), PointerButton::Primary);
    controller.pointer_move(Point2::new(3.0, 0.0), Instant::now());
    assert_eq!(robot.moves().len(), 1);
    assert_eq!(robot.moves()[0].position, Point3::new(6.0, 0.0, 50.0));
    assert_moves_bounded(&robot, start);
}

#[test]
fn height_during_drag_feeds_next_target() {
    let robot = sim_robot(Point3::new(0.0, 0.0, 50.0));
    let mut controller = controller_for(&robot);
    let now = Instant::now();

    controller.pointer_down(Point2::new(0.0, 0.0), PointerButton::Primary);
    controller.set_height(54.0);
    controller.pointer_move(Point2::new(0.0, 0.0), now);

    // Marker already sits at z 54, so the target equals the marker.
    assert_eq!(controller.marker(), Point3::new(0.0, 0.0, 54.0));
    assert!(robot.moves().is_empty());

    controller.pointer_move(Point2::new(3.0, 0.0), now);
    let sent = robot.moves();
    assert_eq!(sent.len(), 1);
    assert!((sent[0].position - Point3::new(6.0, 0.0, 54.0)).magnitude() < 1e-9);
}

#[test]
fn sync_pulls_robot_pose_without_commanding() {
    let robot = sim_robot(Point3::new(0.0, 0.0, 50.0));
    let mut controller = controller_for(&robot);
    controller.set_height(400.0);

    robot.set_pose(Pose::new(Point3::new(200.0, 5.0, 30.0), wrist()));
    let updates = controller.handle(ControllerEvent::SyncRequested, Instant::now());

    assert_eq!(controller.marker(), Point3::new(200.0, 5.0, 30.0));
    assert_eq!(controller.height().value(), 30.0);
    assert!(updates.contains(&ControllerUpdate::HeightUpdated {
        value: 30.0,
        label: "Z: 30.0 mm".to_string()
    }));
    assert!(robot.moves().is_empty());
}

#[test]
fn sync_clamps_height_to_bounds() {
    let robot = sim_robot(Point3::new(0.0, 0.0, 50.0));
    let mut controller = controller_for(&robot);

    robot.set_pose(Pose::new(Point3::new(200.0, 5.0, 1500.0), wrist()));
    controller.sync();
    assert_eq!(controller.height().value(), 1000.0);
    assert_eq!(controller.marker(), Point3::new(200.0, 5.0, 1000.0));
}

#[test]
fn sync_with_failed_read_keeps_state() {
    let robot = sim_robot(Point3::new(1.0, 2.0, 3.0));
    let mut controller = controller_for(&robot);

    robot.fail_next_reads(1);
    assert!(controller.sync().is_empty());
    assert_eq!(controller.marker(), Point3::new(1.0, 2.0, 3.0));
}

#[test]
fn tick_publishes_readout_and_never_touches_marker() {
    let robot = sim_robot(Point3::new(0.0, 0.0, 50.0));
    let mut controller = controller_for(&robot);
    controller.set_height(60.0);

    robot.set_pose(Pose::new(Point3::new(12.34, -5.0, 99.96), wrist()));
    let updates = controller.tick();
    let [ControllerUpdate::ReadoutUpdated(readout)] = updates.as_slice() else {
        panic!("expected a readout, got {updates:?}");
    };
    assert_eq!(readout.x, "X: 12.3 mm");
    assert_eq!(readout.y, "Y: -5.0 mm");
    assert_eq!(readout.z, "Z: 100.0 mm");
    assert_eq!(controller.marker(), Point3::new(0.0, 0.0, 60.0));
    assert_eq!(controller.height().value(), 60.0);
}

#[test]
fn failed_tick_keeps_stale_readout() {
    let robot = sim_robot(Point3::new(7.0, 8.0, 9.0));
    let mut controller = controller_for(&robot);
    controller.tick();

    robot.fail_next_reads(1);
    assert!(controller.tick().is_empty());
    let readout = controller.latest_readout().expect("stale readout");
    assert_eq!(readout.position, Point3::new(7.0, 8.0, 9.0));
}

#[test]
fn invalid_robot_only_moves_marker() {
    let mut controller = missing_controller();
    let now = Instant::now();

    assert!(controller.tick().is_empty());
    assert!(controller.sync().is_empty());

    controller.pointer_down(Point2::new(100.0, 100.0), PointerButton::Primary);
    let updates = controller.pointer_move(Point2::new(105.0, 100.0), now);
    assert_eq!(
        updates,
        vec![ControllerUpdate::MarkerMoved {
            marker: Point3::new(10.0, 0.0, 0.0)
        }]
    );
    controller.pointer_up();
    assert!(controller.latest_readout().is_none());
}

#[test]
fn robot_invalidated_mid_session_degrades_to_marker_only() {
    let robot = sim_robot(Point3::new(0.0, 0.0, 50.0));
    let mut controller = controller_for(&robot);
    let now = Instant::now();

    controller.pointer_down(Point2::new(0.0, 0.0), PointerButton::Primary);
    controller.pointer_move(Point2::new(2.0, 0.0), now);
    robot.invalidate();
    let updates = controller.pointer_move(Point2::new(4.0, 0.0), now);

    assert_eq!(robot.moves().len(), 1);
    assert!(moves_in(&updates).is_empty());
    assert!((controller.marker().x - 8.0).abs() < 1e-9);
}

#[test]
fn repeated_move_failures_suspend_until_sync() {
    let robot = sim_robot(Point3::new(0.0, 0.0, 50.0));
    let mut controller = controller_for(&robot);
    let now = Instant::now();
    robot.reject_all_moves(true);

    controller.pointer_down(Point2::new(0.0, 0.0), PointerButton::Primary);
    let mut status_changes = Vec::new();
    for i in 1..=6 {
        let updates = controller.pointer_move(Point2::new(i as f64 * 2.0, 0.0), now);
        for update in updates {
            match update {
                ControllerUpdate::StatusChanged(status) => status_changes.push(status),
                ControllerUpdate::MoveFailed { fault, .. } => assert_eq!(fault.code, ErrorCode::Move),
                _ => {}
            }
        }
    }
    assert_eq!(status_changes.len(), 1);
    assert_eq!(status_changes[0].severity, StatusSeverity::Warn);
    assert_eq!(controller.status().severity, StatusSeverity::Warn);
    assert!((controller.marker().x - 24.0).abs() < 1e-9);

    robot.reject_all_moves(false);
    let updates = controller.sync();
    assert!(updates.contains(&ControllerUpdate::StatusChanged(ConnectionStatus::ok(
        STATUS_CONNECTED
    ))));

    controller.pointer_down(Point2::new(0.0, 0.0), PointerButton::Primary);
    let later = now + Duration::from_millis(1);
    let updates = controller.pointer_move(Point2::new(2.0, 0.0), later);
    assert_eq!(moves_in(&updates).len(), 1);
}

#[test]
fn snapshot_reports_current_state() {
    let robot = sim_robot(Point3::new(1.0, 2.0, 3.0));
    let controller = controller_for(&robot);

    let snapshot = controller.snapshot();
    assert!(snapshot.contains(&ControllerUpdate::StatusChanged(ConnectionStatus::ok(
        STATUS_CONNECTED
    ))));
    assert!(snapshot.contains(&ControllerUpdate::MarkerMoved {
        marker: Point3::new(1.0, 2.0, 3.0)
    }));
    assert!(snapshot.contains(&ControllerUpdate::DragStateChanged { dragging: false }));
}
