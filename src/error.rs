//! Error types for the waypoint controller

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while setting up the controller
#[derive(Error, Debug)]
pub enum WaypointError {
    /// Neither the command line nor the parameter store supplied a target
    #[error("No waypoint found in param server")]
    MissingWaypointConfiguration,
}

/// Errors raised while loading parameters
#[derive(Error, Debug)]
pub enum ParamsError {
    #[error("failed to read params file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse params file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `--param` override not in `key=value` form
    #[error("invalid parameter override '{0}', expected key=value")]
    InvalidOverride(String),
}
