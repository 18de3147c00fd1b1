pub mod math;
pub mod core;
pub mod bodies;
pub mod constraints;
pub mod io;

/// Re-export common types for easier usage
pub use crate::core::{PhysicsWorld, SimulationConfig, BodyHandle, ConstraintHandle};
pub use crate::bodies::{RigidBody, RigidBodyType};
pub use crate::constraints::{
    Constraint, ConstraintSpace, ConstraintSubType, MotorSettings, MotorState, SixDofAxis,
    SixDofConstraint, SixDofConstraintSettings,
};
pub use crate::math::{Quaternion, Vector3};

/// Error types for the constraint solver
pub mod error {
    use thiserror::Error;

    /// Errors reported by the constraint solver and its persistence
    #[derive(Error, Debug)]
    pub enum PhysicsError {
        #[error("Invalid parameter: {0}")]
        InvalidParameter(String),

        #[error("Resource not found: {0}")]
        ResourceNotFound(String),

        #[error("Invalid constraint settings: {0}")]
        InvalidSettings(String),

        #[error("Failed to read stream: {0}")]
        StreamRead(#[from] std::io::Error),

        #[error("Unknown {kind} value {value} in stream")]
        UnknownVariant { kind: &'static str, value: u32 },
    }
}

/// Result type for solver operations
pub type Result<T> = std::result::Result<T, error::PhysicsError>;

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
