//! Kinematic turtle simulator
//!
//! Stands in for turtlesim when no ROS graph is available. The turtle is a
//! unicycle inside a square arena; it integrates the last velocity command at a
//! fixed rate and publishes its pose after every step. A command is only held
//! for [`SimConfig::command_timeout`], after which the turtle stops.

use crate::common::{normalize_angle, Pose, VelocityCommand};
use crate::node::PoseSender;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, trace};

/// Simulator settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub spawn_x: f64,
    pub spawn_y: f64,
    pub spawn_theta: f64,
    /// Side length of the arena, lower-left corner at the origin
    pub arena_size: f64,
    #[serde(with = "millis")]
    pub step: Duration,
    #[serde(with = "millis")]
    pub command_timeout: Duration,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            spawn_x: 5.544445,
            spawn_y: 5.544445,
            spawn_theta: 0.0,
            arena_size: 11.088889,
            step: Duration::from_millis(16),
            command_timeout: Duration::from_secs(1),
        }
    }
}

impl SimConfig {
    /// Load settings from a YAML file; missing fields keep their defaults
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = serde_yaml::from_str::<Option<SimConfig>>(&text)?;
        Ok(config.unwrap_or_default())
    }

    pub fn spawn_pose(&self) -> Pose {
        Pose::new(self.spawn_x, self.spawn_y, normalize_angle(self.spawn_theta))
    }
}

mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

/// Unicycle model of the turtle
#[derive(Debug, Clone)]
pub struct Turtle {
    pose: Pose,
    velocity: VelocityCommand,
    arena_size: f64,
}

impl Turtle {
    pub fn new(pose: Pose, arena_size: f64) -> Self {
        Turtle {
            pose,
            velocity: VelocityCommand::default(),
            arena_size,
        }
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn velocity(&self) -> VelocityCommand {
        self.velocity
    }

    pub fn set_velocity(&mut self, cmd: VelocityCommand) {
        self.velocity = cmd;
    }

    pub fn stop(&mut self) {
        self.velocity = VelocityCommand::default();
    }

    /// Advance the turtle by `dt` seconds. Heading is updated before position.
    pub fn advance(&mut self, dt: f64) {
        let theta = normalize_angle(self.pose.theta + self.velocity.angular * dt);
        let x = self.pose.x + theta.cos() * self.velocity.linear * dt;
        let y = self.pose.y + theta.sin() * self.velocity.linear * dt;

        self.pose = Pose::new(
            x.clamp(0.0, self.arena_size),
            y.clamp(0.0, self.arena_size),
            theta,
        );
    }
}

/// Handle to a running simulator task
pub struct TurtleSim {
    commands: mpsc::UnboundedSender<VelocityCommand>,
    task: JoinHandle<Turtle>,
}

impl TurtleSim {
    /// Spawn the simulator on the current runtime, publishing poses into `poses`.
    /// The task ends once every command sender is dropped.
    pub fn spawn(config: SimConfig, poses: PoseSender) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(simulate(config, rx, poses));
        TurtleSim { commands, task }
    }

    /// Sender accepted by the node as a command sink
    pub fn commands(&self) -> mpsc::UnboundedSender<VelocityCommand> {
        self.commands.clone()
    }

    /// Drop the command side and wait for the final turtle state
    pub async fn shutdown(self) -> anyhow::Result<Turtle> {
        drop(self.commands);
        Ok(self.task.await?)
    }
}

async fn simulate(
    config: SimConfig,
    mut commands: mpsc::UnboundedReceiver<VelocityCommand>,
    poses: PoseSender,
) -> Turtle {
    let mut turtle = Turtle::new(config.spawn_pose(), config.arena_size);
    let mut last_command: Option<Instant> = None;
    let dt = config.step.as_secs_f64();

    let mut ticker = interval(config.step);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    debug!(pose = ?turtle.pose(), "Spawned turtle");
    poses.send_replace(Some(turtle.pose()));

    loop {
        tokio::select! {
            cmd = commands.recv() => match cmd {
                Some(cmd) => {
                    turtle.set_velocity(cmd);
                    last_command = Some(Instant::now());
                }
                None => break,
            },
            _ = ticker.tick() => {
                if last_command.is_some_and(|at| at.elapsed() > config.command_timeout) {
                    turtle.stop();
                    last_command = None;
                }
                turtle.advance(dt);
                trace!(pose = ?turtle.pose(), "Sim step");
                poses.send_replace(Some(turtle.pose()));
            }
        }
    }

    turtle
}
