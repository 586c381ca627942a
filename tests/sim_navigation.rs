use std::time::Duration;
use turtle_waypoint::control::{ControllerConfig, HeadingError, ARRIVAL_TOLERANCE};
use turtle_waypoint::node::{pose_channel, NodeConfig, RunOutcome, WaypointNode};
use turtle_waypoint::params::MemoryParameters;
use turtle_waypoint::sim::{SimConfig, TurtleSim};
use turtle_waypoint::{ControllerState, Waypoint, WaypointController, WaypointError};

async fn drive_to(controller: WaypointController) -> (RunOutcome, WaypointNode) {
    let (pose_tx, pose_rx) = pose_channel();
    let sim = TurtleSim::spawn(SimConfig::default(), pose_tx);
    let mut node = WaypointNode::new(controller, &NodeConfig::default());

    let outcome = tokio::time::timeout(
        Duration::from_secs(120),
        node.run(pose_rx, &sim.commands(), std::future::pending::<()>()),
    )
    .await
    .expect("turtle did not reach the waypoint in time")
    .unwrap();

    sim.shutdown().await.unwrap();
    (outcome, node)
}

fn assert_arrived(node: &WaypointNode) {
    let controller = node.controller();
    assert_eq!(controller.state(), ControllerState::Arrived);
    // The last pose is read one tick after arrival, while the turtle still coasts
    let pose = controller.pose().expect("pose received");
    assert!(controller.distance_to_waypoint(&pose) < ARRIVAL_TOLERANCE + 0.2);
}

#[tokio::test(start_paused = true)]
async fn test_reaches_waypoint_ahead() {
    let controller = WaypointController::new(Waypoint::new(8.0, 8.0));
    let (outcome, node) = drive_to(controller).await;

    assert_eq!(outcome, RunOutcome::Arrived);
    assert!(node.published() > 0);
    assert_arrived(&node);
}

#[tokio::test(start_paused = true)]
async fn test_reaches_waypoint_from_params() {
    let params = MemoryParameters::from_pairs([("default_x", 7.0), ("default_y", 3.0)]);
    let controller =
        WaypointController::from_sources(None, &params, ControllerConfig::default()).unwrap();
    let (outcome, node) = drive_to(controller).await;

    assert_eq!(outcome, RunOutcome::Arrived);
    assert_arrived(&node);
}

#[tokio::test(start_paused = true)]
async fn test_reaches_waypoint_behind_with_wrapped_heading() {
    let config = ControllerConfig {
        heading_error: HeadingError::Wrapped,
        ..ControllerConfig::default()
    };
    let controller = WaypointController::with_config(Waypoint::new(2.0, 5.0), config);
    let (outcome, node) = drive_to(controller).await;

    assert_eq!(outcome, RunOutcome::Arrived);
    assert_arrived(&node);
}

#[tokio::test(start_paused = true)]
async fn test_already_at_waypoint_publishes_nothing() {
    let controller = WaypointController::new(Waypoint::new(5.6, 5.5));
    let (outcome, node) = drive_to(controller).await;

    assert_eq!(outcome, RunOutcome::Arrived);
    assert_eq!(node.published(), 0);
}

#[test]
fn test_missing_waypoint_configuration() {
    let result = WaypointController::from_sources(
        None,
        &MemoryParameters::new(),
        ControllerConfig::default(),
    );
    assert!(matches!(
        result,
        Err(WaypointError::MissingWaypointConfiguration)
    ));
}
