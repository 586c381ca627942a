//! Command line arguments and logging setup shared by the binaries

use crate::control::{ControllerConfig, HeadingError, VelocityLimits};
use crate::error::ParamsError;
use crate::params::{LayeredParameters, MemoryParameters, ParamsFile};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Waypoint selection and controller options
#[derive(clap::Args, Debug, Clone, Default)]
pub struct WaypointArgs {
    /// Target x and y. Anything other than two numbers falls back to the
    /// `default_x`/`default_y` parameters.
    #[arg(value_name = "COORD", allow_negative_numbers = true)]
    pub target: Vec<String>,

    /// YAML file with parameters such as `default_x` and `default_y`
    #[arg(long, value_name = "FILE")]
    pub params_file: Option<PathBuf>,

    /// Parameter override, takes precedence over the params file
    #[arg(long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Wrap the heading error to [-pi, pi] before applying the gain
    #[arg(long)]
    pub wrap_heading: bool,

    /// Clamp |linear| to this value
    #[arg(long, requires = "max_angular")]
    pub max_linear: Option<f64>,

    /// Clamp |angular| to this value
    #[arg(long, requires = "max_linear")]
    pub max_angular: Option<f64>,
}

impl WaypointArgs {
    /// Explicit target, when exactly two numeric coordinates were given
    pub fn target(&self) -> Option<(f64, f64)> {
        let target = match self.target.as_slice() {
            [x, y] => x.parse::<f64>().ok().zip(y.parse::<f64>().ok()),
            _ => None,
        };
        if target.is_none() {
            info!("No waypoint specified in commandline");
        }
        target
    }

    /// Overrides layered on top of the params file, if any
    pub fn parameters(&self) -> Result<LayeredParameters, ParamsError> {
        let mut params =
            LayeredParameters::new().with_layer(MemoryParameters::from_overrides(&self.params)?);
        if let Some(path) = &self.params_file {
            params = params.with_layer(ParamsFile::load(path)?);
        }
        Ok(params)
    }

    pub fn controller_config(&self) -> ControllerConfig {
        let heading_error = if self.wrap_heading {
            HeadingError::Wrapped
        } else {
            HeadingError::Unwrapped
        };
        let limits = match (self.max_linear, self.max_angular) {
            (Some(max_linear), Some(max_angular)) => Some(VelocityLimits {
                max_linear,
                max_angular,
            }),
            _ => None,
        };
        ControllerConfig {
            heading_error,
            limits,
        }
    }
}

/// Drop ROS arguments (`--ros-args ... [--]`) so only our own flags reach clap
pub fn strip_ros_args<I, T>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let mut kept = Vec::new();
    let mut in_ros_args = false;
    for arg in args {
        let arg = arg.into();
        if in_ros_args {
            if arg == "--" {
                in_ros_args = false;
            }
            continue;
        }
        if arg == "--ros-args" {
            in_ros_args = true;
            continue;
        }
        kept.push(arg);
    }
    kept
}

/// Install the fmt subscriber, filtered by `RUST_LOG` (default `info`)
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
