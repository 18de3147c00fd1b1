//! Single purpose impulse solvers combined by the joint constraints.
//!
//! Every part keeps its accumulated impulse (`total_lambda`) between steps so it can be
//! warm started, and exposes it for force feedback.

mod spring;
mod axis;
mod angle;
mod point;
mod rotation_euler;
mod swing_twist;

pub use self::spring::SpringPart;
pub use self::axis::AxisConstraintPart;
pub use self::angle::AngleConstraintPart;
pub use self::point::PointConstraintPart;
pub use self::rotation_euler::RotationEulerConstraintPart;
pub use self::swing_twist::SwingTwistConstraintPart;
