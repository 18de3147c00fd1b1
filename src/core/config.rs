use crate::math::Vector3;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Configuration parameters for the simulation step
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct SimulationConfig {
    /// Maximum number of velocity solver iterations per step
    pub velocity_iterations: u32,

    /// Maximum number of position solver iterations per step
    pub position_iterations: u32,

    /// Fraction of the position error resolved per position iteration (Baumgarte stabilization)
    pub baumgarte: f32,

    /// Scale applied to last step's accumulated impulses when warm starting
    pub warm_start_impulse_ratio: f32,

    /// Constant gravity acceleration
    pub gravity: Vector3,

    /// Global damping factor for linear velocity (per second)
    pub linear_damping: f32,

    /// Global damping factor for angular velocity (per second)
    pub angular_damping: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            velocity_iterations: 10,
            position_iterations: 2,
            baumgarte: 0.2,
            warm_start_impulse_ratio: 1.0,
            gravity: Vector3::new(0.0, -9.81, 0.0),
            linear_damping: 0.0,
            angular_damping: 0.0,
        }
    }
}
