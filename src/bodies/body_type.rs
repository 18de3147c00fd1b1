/// Motion type of a rigid body, determining how it responds to constraint impulses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum RigidBodyType {
    /// Fully simulated: forces and constraint impulses change its velocity
    #[default]
    Dynamic,

    /// Moved by the user through its velocity; infinite mass for the solver
    Kinematic,

    /// Never moves; infinite mass for the solver
    Static,
}

impl RigidBodyType {
    /// Returns true if impulses change the velocity of this kind of body
    #[inline]
    pub fn is_dynamic(self) -> bool {
        self == RigidBodyType::Dynamic
    }
}
