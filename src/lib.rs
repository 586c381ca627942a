pub mod cli;
pub mod common;
pub mod control;
pub mod error;
pub mod node;
pub mod params;
#[cfg(feature = "ros")]
pub mod ros;
pub mod sim;

pub use crate::common::{Pose, VelocityCommand, Waypoint};
pub use crate::control::{ControllerConfig, ControllerState, TickOutcome, WaypointController};
pub use crate::error::{ParamsError, WaypointError};
pub use crate::node::{CommandSink, NodeConfig, RunOutcome, WaypointNode};
