use anyhow::{anyhow, Result};
use clap::Parser;
use rclrs::{Context, CreateBasicExecutor, RclrsErrorFilter, SpinOptions};
use std::process::ExitCode;
use std::thread;
use std::time::Duration;
use tracing::{error, info};
use turtle_waypoint::cli::{init_tracing, strip_ros_args, WaypointArgs};
use turtle_waypoint::node::{pose_channel, NodeConfig, RunOutcome, WaypointNode};
use turtle_waypoint::ros::{RosParameters, RosTransport};
use turtle_waypoint::WaypointController;

/// Drive turtlesim's turtle1 to a waypoint
#[derive(Parser, Debug)]
#[command(name = "turtle_waypoint_node", version)]
struct Cli {
    #[command(flatten)]
    waypoint: WaypointArgs,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse_from(strip_ros_args(std::env::args()));

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut executor = Context::default_from_env()?.create_basic_executor();
    let config = NodeConfig::default();

    let (pose_tx, pose_rx) = pose_channel();
    let transport = RosTransport::new(&executor, &config, pose_tx)?;

    // Command line overrides and params file come before the node's own parameters
    let params = cli
        .waypoint
        .parameters()?
        .with_layer(RosParameters::declare(transport.node())?);

    let controller = match WaypointController::from_sources(
        cli.waypoint.target(),
        &params,
        cli.waypoint.controller_config(),
    ) {
        Ok(controller) => controller,
        Err(_) => return Ok(ExitCode::from(1)),
    };

    let sink = transport.command_sink();
    let mut node = WaypointNode::new(controller, &config);
    let control = thread::spawn(move || -> Result<RunOutcome> {
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(node.run(pose_rx, &sink, tokio::signal::ctrl_c()))
    });

    info!("Spinning {}", config.node_name);
    while !control.is_finished() {
        executor
            .spin(SpinOptions::spin_once().timeout(Duration::from_millis(50)))
            .ignore_non_errors()
            .first_error()?;
    }

    let outcome = control
        .join()
        .map_err(|_| anyhow!("control loop panicked"))??;
    Ok(ExitCode::from(outcome.exit_code()))
}
