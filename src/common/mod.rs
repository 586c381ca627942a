//! Common types shared by the controller, the simulator and the transports

/// Common types used across the codebase
pub mod types {
    use nalgebra::Vector2;

    /// Planar pose of the turtle (x, y, heading in radians)
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct Pose {
        pub x: f64,
        pub y: f64,
        pub theta: f64,
    }

    impl Pose {
        /// Create a new pose
        pub fn new(x: f64, y: f64, theta: f64) -> Self {
            Pose { x, y, theta }
        }

        /// Position part of the pose
        pub fn position(&self) -> Vector2<f64> {
            Vector2::new(self.x, self.y)
        }
    }

    /// Fixed target point
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Waypoint {
        pub x: f64,
        pub y: f64,
    }

    impl Waypoint {
        /// Create a new waypoint
        pub fn new(x: f64, y: f64) -> Self {
            Waypoint { x, y }
        }

        pub fn position(&self) -> Vector2<f64> {
            Vector2::new(self.x, self.y)
        }
    }

    /// Velocity command sent to the turtle
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct VelocityCommand {
        pub linear: f64,
        pub angular: f64,
    }

    impl VelocityCommand {
        pub fn new(linear: f64, angular: f64) -> Self {
            VelocityCommand { linear, angular }
        }
    }
}

pub use self::types::{Pose, VelocityCommand, Waypoint};

use std::f64::consts::PI;

/// Normalize an angle to [-pi, pi]
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    // rem_euclid maps +pi onto -pi; keep the sign of the input at the boundary
    if wrapped == -PI && angle > 0.0 {
        PI
    } else {
        wrapped
    }
}
