pub mod world;
pub mod config;
pub mod storage;

pub use self::world::PhysicsWorld;
pub use self::config::SimulationConfig;
pub use self::storage::{BodyStorage, ConstraintStorage, Storage};

/// A unique identifier for a body in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub(crate) u32);

impl BodyHandle {
    /// Creates a handle from a raw index, for callers that manage their own body storage
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index of this handle
    pub fn index(self) -> u32 {
        self.0
    }
}

/// A unique identifier for a constraint in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstraintHandle(pub(crate) u32);
