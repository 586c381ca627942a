use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use turtle_waypoint::cli::{init_tracing, strip_ros_args, WaypointArgs};
use turtle_waypoint::node::{pose_channel, NodeConfig, WaypointNode};
use turtle_waypoint::sim::{SimConfig, TurtleSim};
use turtle_waypoint::WaypointController;

/// Drive the simulated turtle to a waypoint
#[derive(Parser, Debug)]
#[command(name = "turtle_waypoint_sim", version)]
struct Cli {
    #[command(flatten)]
    waypoint: WaypointArgs,

    /// YAML file with simulator settings
    #[arg(long, value_name = "FILE")]
    sim_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse_from(strip_ros_args(std::env::args()));

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let params = cli.waypoint.parameters()?;
    let controller = match WaypointController::from_sources(
        cli.waypoint.target(),
        &params,
        cli.waypoint.controller_config(),
    ) {
        Ok(controller) => controller,
        // Already reported while resolving the waypoint
        Err(_) => return Ok(ExitCode::from(1)),
    };

    let sim_config = match cli.sim_config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };

    let config = NodeConfig::default();
    let (pose_tx, pose_rx) = pose_channel();
    let sim = TurtleSim::spawn(sim_config, pose_tx);

    let mut node = WaypointNode::new(controller, &config);
    let outcome = node
        .run(pose_rx, &sim.commands(), tokio::signal::ctrl_c())
        .await?;

    let turtle = sim.shutdown().await?;
    info!(
        x = turtle.pose().x,
        y = turtle.pose().y,
        theta = turtle.pose().theta,
        commands = node.published(),
        "Final pose"
    );

    Ok(ExitCode::from(outcome.exit_code()))
}
