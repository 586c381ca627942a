//! Control module for the waypoint turtle
pub mod controllers;

pub use self::controllers::{
    ControllerState, TickOutcome, WaypointController, ANGULAR_GAIN, ARRIVAL_TOLERANCE,
    LINEAR_GAIN,
};

use crate::common::VelocityCommand;

/// How the heading error fed to the angular gain is formed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadingError {
    /// Raw `bearing - theta`. Near +/-pi this can produce very large angular commands.
    #[default]
    Unwrapped,
    /// `bearing - theta` wrapped to [-pi, pi]
    Wrapped,
}

/// Symmetric bounds applied to every command
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityLimits {
    pub max_linear: f64,
    pub max_angular: f64,
}

impl VelocityLimits {
    /// Clamp a command into the limits
    pub fn apply(&self, cmd: VelocityCommand) -> VelocityCommand {
        VelocityCommand::new(
            cmd.linear.clamp(-self.max_linear, self.max_linear),
            cmd.angular.clamp(-self.max_angular, self.max_angular),
        )
    }
}

/// Controller options. Tolerance and gains are fixed constants.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControllerConfig {
    pub heading_error: HeadingError,
    /// No clamping when `None`
    pub limits: Option<VelocityLimits>,
}
