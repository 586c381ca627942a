//! Periodic control loop tying the controller to a pose source and a command sink

use crate::common::{Pose, VelocityCommand};
use crate::control::{TickOutcome, WaypointController};
use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// Period between two control ticks
pub const TICK_PERIOD: Duration = Duration::from_millis(300);

/// Receiving end of the pose hand-off. Holds only the latest pose.
pub type PoseReceiver = watch::Receiver<Option<Pose>>;

/// Sending end of the pose hand-off
pub type PoseSender = watch::Sender<Option<Pose>>;

/// Create the single-slot pose channel shared by a pose source and the node
pub fn pose_channel() -> (PoseSender, PoseReceiver) {
    watch::channel(None)
}

/// Destination for velocity commands
pub trait CommandSink {
    fn publish(&self, cmd: &VelocityCommand) -> Result<()>;
}

impl CommandSink for mpsc::UnboundedSender<VelocityCommand> {
    fn publish(&self, cmd: &VelocityCommand) -> Result<()> {
        self.send(*cmd)
            .map_err(|_| anyhow::anyhow!("command receiver dropped"))
    }
}

/// Names and timing of the node
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub node_name: String,
    pub pose_topic: String,
    pub cmd_vel_topic: String,
    pub tick_period: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            node_name: "turtle_waypoint".to_string(),
            pose_topic: "/turtle1/pose".to_string(),
            cmd_vel_topic: "/turtle1/cmd_vel".to_string(),
            tick_period: TICK_PERIOD,
        }
    }
}

/// Why the run loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Waypoint reached
    Arrived,
    /// Shutdown requested before arrival
    Shutdown,
}

impl RunOutcome {
    /// Process exit status for this outcome
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::Arrived | RunOutcome::Shutdown => 0,
        }
    }
}

/// Drives a [`WaypointController`] at a fixed period
pub struct WaypointNode {
    controller: WaypointController,
    tick_period: Duration,
    published: u64,
}

impl WaypointNode {
    pub fn new(controller: WaypointController, config: &NodeConfig) -> Self {
        WaypointNode {
            controller,
            tick_period: config.tick_period,
            published: 0,
        }
    }

    pub fn controller(&self) -> &WaypointController {
        &self.controller
    }

    /// Number of commands published so far
    pub fn published(&self) -> u64 {
        self.published
    }

    /// Run until the waypoint is reached or `shutdown` resolves.
    ///
    /// A pose that arrived since the previous tick is applied before ticking.
    /// Sink errors end the loop and are returned to the caller.
    pub async fn run<S, F>(&mut self, mut poses: PoseReceiver, sink: &S, shutdown: F) -> Result<RunOutcome>
    where
        S: CommandSink + ?Sized,
        F: Future,
    {
        let mut ticker = interval(self.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("ROS shutdown");
                    return Ok(RunOutcome::Shutdown);
                }
                _ = ticker.tick() => {
                    if let Some(outcome) = self.step(&mut poses, sink)? {
                        return Ok(outcome);
                    }
                }
            }
        }
    }

    fn step<S: CommandSink + ?Sized>(
        &mut self,
        poses: &mut PoseReceiver,
        sink: &S,
    ) -> Result<Option<RunOutcome>> {
        // A closed pose source just means no new poses
        if poses.has_changed().unwrap_or(false) {
            if let Some(pose) = *poses.borrow_and_update() {
                self.controller.on_pose_update(pose);
            }
        }

        match self.controller.tick() {
            TickOutcome::WaitingForPose => debug!("Waiting for first pose"),
            TickOutcome::Command(cmd) => {
                sink.publish(&cmd)?;
                self.published += 1;
            }
            TickOutcome::Arrived => debug!("Within tolerance of waypoint"),
            TickOutcome::Finished => {
                info!("Congrats Waypoint reached and the turtle is at the goal");
                return Ok(Some(RunOutcome::Arrived));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Waypoint;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingSink {
        commands: RefCell<Vec<VelocityCommand>>,
    }

    impl CommandSink for RecordingSink {
        fn publish(&self, cmd: &VelocityCommand) -> Result<()> {
            self.commands.borrow_mut().push(*cmd);
            Ok(())
        }
    }

    struct FailingSink;

    impl CommandSink for FailingSink {
        fn publish(&self, _cmd: &VelocityCommand) -> Result<()> {
            anyhow::bail!("sink offline")
        }
    }

    fn node(waypoint: Waypoint) -> WaypointNode {
        WaypointNode::new(WaypointController::new(waypoint), &NodeConfig::default())
    }

    #[test]
    fn test_default_node_config() {
        let config = NodeConfig::default();
        assert_eq!(config.node_name, "turtle_waypoint");
        assert_eq!(config.pose_topic, "/turtle1/pose");
        assert_eq!(config.cmd_vel_topic, "/turtle1/cmd_vel");
        assert_eq!(config.tick_period, Duration::from_millis(300));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(RunOutcome::Arrived.exit_code(), 0);
        assert_eq!(RunOutcome::Shutdown.exit_code(), 0);
    }

    #[test]
    fn test_step_publishes_only_while_seeking() {
        let (tx, mut rx) = pose_channel();
        let sink = RecordingSink::default();
        let mut node = node(Waypoint::new(1.0, 1.0));

        assert_eq!(node.step(&mut rx, &sink).unwrap(), None);
        assert!(sink.commands.borrow().is_empty());

        tx.send(Some(Pose::new(0.0, 0.0, 0.0))).unwrap();
        assert_eq!(node.step(&mut rx, &sink).unwrap(), None);
        assert_eq!(sink.commands.borrow().len(), 1);

        tx.send(Some(Pose::new(1.0, 1.1, 0.0))).unwrap();
        assert_eq!(node.step(&mut rx, &sink).unwrap(), None);
        assert_eq!(node.step(&mut rx, &sink).unwrap(), Some(RunOutcome::Arrived));
        assert_eq!(sink.commands.borrow().len(), 1);
        assert_eq!(node.published(), 1);
    }

    #[test]
    fn test_step_uses_latest_pose_only() {
        let (tx, mut rx) = pose_channel();
        let sink = RecordingSink::default();
        let mut node = node(Waypoint::new(4.0, 0.0));

        tx.send(Some(Pose::new(0.0, 0.0, 0.0))).unwrap();
        tx.send(Some(Pose::new(2.0, 0.0, 0.0))).unwrap();
        assert_eq!(node.step(&mut rx, &sink).unwrap(), None);

        assert_eq!(node.controller().pose(), Some(Pose::new(2.0, 0.0, 0.0)));
        let commands = sink.commands.borrow();
        assert_eq!(commands.len(), 1);
        assert!((commands[0].linear - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_sink_error_propagates() {
        let (tx, mut rx) = pose_channel();
        tx.send(Some(Pose::new(0.0, 0.0, 0.0))).unwrap();
        let mut node = node(Waypoint::new(5.0, 5.0));
        assert!(node.step(&mut rx, &FailingSink).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_shutdown_without_pose() {
        let (_tx, rx) = pose_channel();
        let sink = RecordingSink::default();
        let mut node = node(Waypoint::new(1.0, 1.0));

        let outcome = node
            .run(rx, &sink, tokio::time::sleep(Duration::from_secs(5)))
            .await
            .unwrap();
        assert_eq!(outcome, RunOutcome::Shutdown);
        assert!(sink.commands.borrow().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_finishes_one_tick_after_arrival() {
        let (tx, rx) = pose_channel();
        tx.send(Some(Pose::new(1.0, 1.0, 0.0))).unwrap();
        let sink = RecordingSink::default();
        let mut node = node(Waypoint::new(1.0, 1.0));

        let start = tokio::time::Instant::now();
        let outcome = node
            .run(rx, &sink, std::future::pending::<()>())
            .await
            .unwrap();
        assert_eq!(outcome, RunOutcome::Arrived);
        // Arrival is detected on the first tick and reported on the second
        assert_eq!(start.elapsed(), TICK_PERIOD);
        assert!(sink.commands.borrow().is_empty());
    }
}
