mod constraint;
mod motor;
pub mod parts;
pub mod six_dof;

pub use self::constraint::{Constraint, ConstraintSubType};
pub use self::motor::{MotorSettings, MotorState, SpringSettings};
pub use self::six_dof::{
    ConstraintSpace, SixDofAxes, SixDofAxis, SixDofConstraint, SixDofConstraintSettings,
};
