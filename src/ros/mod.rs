//! ROS 2 transport: turtlesim pose in, Twist out

use crate::common::{Pose, VelocityCommand};
use crate::node::{CommandSink, NodeConfig, PoseSender};
use crate::params::{ParameterStore, DEFAULT_X_PARAM, DEFAULT_Y_PARAM};
use anyhow::{anyhow, Result};
use geometry_msgs::msg::Twist;
use rclrs::{Executor, Node, Publisher, Subscription, QOS_PROFILE_DEFAULT};
use std::sync::Arc;
use tracing::info;
use turtlesim::msg::Pose as TurtlePose;

/// Node, pose subscription and command publisher
pub struct RosTransport {
    node: Arc<Node>,
    cmd_vel_publisher: Arc<Publisher<Twist>>,
    _pose_subscription: Arc<Subscription<TurtlePose>>,
}

impl RosTransport {
    /// Create the node and forward every received pose into `poses`
    pub fn new(executor: &Executor, config: &NodeConfig, poses: PoseSender) -> Result<Self> {
        let node = executor.create_node(config.node_name.as_str())?;

        let cmd_vel_publisher =
            node.create_publisher::<Twist>(&config.cmd_vel_topic, QOS_PROFILE_DEFAULT)?;

        let pose_subscription = node.create_subscription::<TurtlePose, _>(
            &config.pose_topic,
            QOS_PROFILE_DEFAULT,
            move |msg: TurtlePose| {
                poses.send_replace(Some(Pose::new(
                    msg.x as f64,
                    msg.y as f64,
                    msg.theta as f64,
                )));
            },
        )?;

        info!(
            pose = %config.pose_topic,
            cmd_vel = %config.cmd_vel_topic,
            "ROS transport ready"
        );

        Ok(RosTransport {
            node,
            cmd_vel_publisher,
            _pose_subscription: pose_subscription,
        })
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Publisher handle that can be moved to the control thread
    pub fn command_sink(&self) -> RosCommandSink {
        RosCommandSink {
            publisher: Arc::clone(&self.cmd_vel_publisher),
        }
    }
}

/// Publishes commands as `geometry_msgs/Twist`
#[derive(Clone)]
pub struct RosCommandSink {
    publisher: Arc<Publisher<Twist>>,
}

impl CommandSink for RosCommandSink {
    fn publish(&self, cmd: &VelocityCommand) -> Result<()> {
        let mut twist = Twist::default();
        twist.linear.x = cmd.linear;
        twist.angular.z = cmd.angular;
        self.publisher.publish(&twist)?;
        Ok(())
    }
}

/// Snapshot of the node's `default_x`/`default_y` parameters
#[derive(Debug, Clone, Default)]
pub struct RosParameters {
    default_x: Option<f64>,
    default_y: Option<f64>,
}

impl RosParameters {
    /// Declare both parameters as optional and read their values
    pub fn declare(node: &Node) -> Result<Self> {
        let default_x = node
            .declare_parameter::<f64>(DEFAULT_X_PARAM)
            .optional()
            .map_err(|err| anyhow!("declaring {}: {:?}", DEFAULT_X_PARAM, err))?
            .get();
        let default_y = node
            .declare_parameter::<f64>(DEFAULT_Y_PARAM)
            .optional()
            .map_err(|err| anyhow!("declaring {}: {:?}", DEFAULT_Y_PARAM, err))?
            .get();
        Ok(RosParameters {
            default_x,
            default_y,
        })
    }
}

impl ParameterStore for RosParameters {
    fn get_f64(&self, key: &str) -> Option<f64> {
        match key.trim_start_matches('/') {
            DEFAULT_X_PARAM => self.default_x,
            DEFAULT_Y_PARAM => self.default_y,
            _ => None,
        }
    }
}
