//! Controllers for the turtle

use super::{ControllerConfig, HeadingError};
use crate::common::{normalize_angle, Pose, VelocityCommand, Waypoint};
use crate::error::WaypointError;
use crate::params::{resolve_waypoint, ParameterStore};
use tracing::{debug, info};

/// Distance below which the waypoint counts as reached
pub const ARRIVAL_TOLERANCE: f64 = 0.3;

/// Proportional gain on distance to the waypoint
pub const LINEAR_GAIN: f64 = 0.5;

/// Proportional gain on heading error
pub const ANGULAR_GAIN: f64 = 3.8;

/// Progress of the controller towards its waypoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    AwaitingFirstPose,
    Seeking,
    /// Terminal
    Arrived,
}

/// Result of a single control tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// No pose received yet
    WaitingForPose,
    /// Command to publish this tick
    Command(VelocityCommand),
    /// Waypoint reached on this tick. Completion is reported on the next tick.
    Arrived,
    /// The controller has arrived and the loop should stop
    Finished,
}

impl TickOutcome {
    /// Command to publish, if any
    pub fn command(&self) -> Option<VelocityCommand> {
        match self {
            TickOutcome::Command(cmd) => Some(*cmd),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, TickOutcome::Finished)
    }
}

/// Proportional controller driving a differential-drive turtle to a single waypoint
#[derive(Debug, Clone)]
pub struct WaypointController {
    waypoint: Waypoint,
    pose: Option<Pose>,
    state: ControllerState,
    config: ControllerConfig,
}

impl WaypointController {
    /// Create a controller with the default configuration
    pub fn new(waypoint: Waypoint) -> Self {
        Self::with_config(waypoint, ControllerConfig::default())
    }

    /// Create a controller with an explicit configuration
    pub fn with_config(waypoint: Waypoint, config: ControllerConfig) -> Self {
        info!("Heading to: {:.2}, {:.2}", waypoint.x, waypoint.y);
        WaypointController {
            waypoint,
            pose: None,
            state: ControllerState::AwaitingFirstPose,
            config,
        }
    }

    /// Create a controller from an explicit target, falling back to the
    /// `default_x`/`default_y` parameters when no target is given.
    pub fn from_sources(
        target: Option<(f64, f64)>,
        params: &dyn ParameterStore,
        config: ControllerConfig,
    ) -> Result<Self, WaypointError> {
        let waypoint = resolve_waypoint(target, params)?;
        Ok(Self::with_config(waypoint, config))
    }

    /// Store the latest pose. The first pose moves the controller out of
    /// `AwaitingFirstPose`; `Arrived` is never left.
    pub fn on_pose_update(&mut self, pose: Pose) {
        self.pose = Some(pose);
        if self.state == ControllerState::AwaitingFirstPose {
            self.state = ControllerState::Seeking;
        }
    }

    /// Run one control step
    pub fn tick(&mut self) -> TickOutcome {
        match self.state {
            ControllerState::AwaitingFirstPose => TickOutcome::WaitingForPose,
            ControllerState::Arrived => TickOutcome::Finished,
            ControllerState::Seeking => {
                let Some(pose) = self.pose else {
                    return TickOutcome::WaitingForPose;
                };

                let distance = self.distance_to_waypoint(&pose);
                if distance < ARRIVAL_TOLERANCE {
                    self.state = ControllerState::Arrived;
                    return TickOutcome::Arrived;
                }

                let cmd = self.compute_velocity(&pose);
                debug!(
                    distance,
                    linear = cmd.linear,
                    angular = cmd.angular,
                    "Moving..."
                );
                TickOutcome::Command(cmd)
            }
        }
    }

    /// Compute the proportional command for a pose, ignoring arrival
    pub fn compute_velocity(&self, pose: &Pose) -> VelocityCommand {
        let offset = self.waypoint.position() - pose.position();
        let distance = offset.norm();
        let bearing = offset.y.atan2(offset.x);

        let heading_error = match self.config.heading_error {
            HeadingError::Unwrapped => bearing - pose.theta,
            HeadingError::Wrapped => normalize_angle(bearing - pose.theta),
        };

        let cmd = VelocityCommand::new(LINEAR_GAIN * distance, ANGULAR_GAIN * heading_error);
        match self.config.limits {
            Some(limits) => limits.apply(cmd),
            None => cmd,
        }
    }

    /// Euclidean distance from a pose to the waypoint
    pub fn distance_to_waypoint(&self, pose: &Pose) -> f64 {
        (pose.position() - self.waypoint.position()).norm()
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn waypoint(&self) -> Waypoint {
        self.waypoint
    }

    /// Last pose received
    pub fn pose(&self) -> Option<Pose> {
        self.pose
    }
}
