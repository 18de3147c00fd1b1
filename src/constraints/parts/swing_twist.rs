use bitflags::bitflags;
use nalgebra::Vector2;

use crate::bodies::RigidBody;
use crate::constraints::parts::{AngleConstraintPart, RotationEulerConstraintPart};
use crate::io::StateRecorder;
use crate::math::{self, Ellipse, Quaternion, Vector3};
use crate::Result;

/// Limits below this angle are treated as locked
const LOCKED_ANGLE: f32 = 0.5 * std::f32::consts::PI / 180.0;

/// Limits above this angle are treated as free
const FREE_ANGLE: f32 = 179.5 * std::f32::consts::PI / 180.0;

bitflags! {
    /// Which rotational degrees of freedom are locked or free
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RotationFlags: u8 {
        const TWIST_X_LOCKED = 1 << 0;
        const TWIST_X_FREE = 1 << 1;
        const SWING_Y_LOCKED = 1 << 2;
        const SWING_Y_FREE = 1 << 3;
        const SWING_Z_LOCKED = 1 << 4;
        const SWING_Z_FREE = 1 << 5;
        const SWING_YZ_FREE = Self::SWING_Y_FREE.bits() | Self::SWING_Z_FREE.bits();
    }
}

bitflags! {
    /// Which limits `clamp_swing_twist` had to enforce
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ClampedAxes: u8 {
        const TWIST_MIN = 1 << 0;
        const TWIST_MAX = 1 << 1;
        const SWING_Y_MIN = 1 << 2;
        const SWING_Y_MAX = 1 << 3;
        const SWING_Z_MIN = 1 << 4;
        const SWING_Z_MAX = 1 << 5;
        const TWIST = Self::TWIST_MIN.bits() | Self::TWIST_MAX.bits();
        const SWING_Y = Self::SWING_Y_MIN.bits() | Self::SWING_Y_MAX.bits();
        const SWING_Z = Self::SWING_Z_MIN.bits() | Self::SWING_Z_MAX.bits();
        const SWING = Self::SWING_Y.bits() | Self::SWING_Z.bits();
    }
}

/// Limits the relative rotation of two bodies with a twist range around the constraint X axis
/// and an elliptical swing cone around Y and Z.
///
/// The relative rotation `q` (body 1 constraint space to body 2 constraint space) is split as
/// `q = swing * twist`. The twist is clamped to `[twist_min, twist_max]`; the swing is clamped
/// to the half cone angles, an ellipse in `(swing.y, swing.z)` when both are limited.
/// Each violated limit becomes a one sided angular constraint, locked axes are two sided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingTwistConstraintPart {
    rotation_flags: RotationFlags,
    sin_twist_half_min_angle: f32,
    sin_twist_half_max_angle: f32,
    cos_twist_half_min_angle: f32,
    cos_twist_half_max_angle: f32,
    sin_swing_y_quarter_angle: f32,
    sin_swing_z_quarter_angle: f32,

    world_space_swing_y_axis: Vector3,
    world_space_swing_z_axis: Vector3,
    world_space_twist_axis: Vector3,

    swing_y_part: AngleConstraintPart,
    swing_z_part: AngleConstraintPart,
    twist_part: AngleConstraintPart,
}

impl Default for SwingTwistConstraintPart {
    fn default() -> Self {
        let mut part = Self {
            rotation_flags: RotationFlags::empty(),
            sin_twist_half_min_angle: 0.0,
            sin_twist_half_max_angle: 0.0,
            cos_twist_half_min_angle: 1.0,
            cos_twist_half_max_angle: 1.0,
            sin_swing_y_quarter_angle: 0.0,
            sin_swing_z_quarter_angle: 0.0,
            world_space_swing_y_axis: Vector3::zeros(),
            world_space_swing_z_axis: Vector3::zeros(),
            world_space_twist_axis: Vector3::zeros(),
            swing_y_part: AngleConstraintPart::default(),
            swing_z_part: AngleConstraintPart::default(),
            twist_part: AngleConstraintPart::default(),
        };
        part.set_limits(0.0, 0.0, 0.0, 0.0);
        part
    }
}

impl SwingTwistConstraintPart {
    /// Sets the twist range (radians, `min <= 0 <= max`) and the swing half cone angles (radians, `[0, pi]`)
    pub fn set_limits(&mut self, twist_min_angle: f32, twist_max_angle: f32, swing_y_half_angle: f32, swing_z_half_angle: f32) {
        debug_assert!(twist_min_angle <= 0.0 && twist_max_angle >= 0.0);
        debug_assert!(swing_y_half_angle >= 0.0 && swing_z_half_angle >= 0.0);

        let mut flags = RotationFlags::empty();

        if twist_min_angle > -LOCKED_ANGLE && twist_max_angle < LOCKED_ANGLE {
            flags |= RotationFlags::TWIST_X_LOCKED;
            self.sin_twist_half_min_angle = 0.0;
            self.sin_twist_half_max_angle = 0.0;
            self.cos_twist_half_min_angle = 1.0;
            self.cos_twist_half_max_angle = 1.0;
        } else if twist_min_angle < -FREE_ANGLE && twist_max_angle > FREE_ANGLE {
            flags |= RotationFlags::TWIST_X_FREE;
            self.sin_twist_half_min_angle = -1.0;
            self.sin_twist_half_max_angle = 1.0;
            self.cos_twist_half_min_angle = 0.0;
            self.cos_twist_half_max_angle = 0.0;
        } else {
            (self.sin_twist_half_min_angle, self.cos_twist_half_min_angle) = (0.5 * twist_min_angle).sin_cos();
            (self.sin_twist_half_max_angle, self.cos_twist_half_max_angle) = (0.5 * twist_max_angle).sin_cos();
        }

        if swing_y_half_angle < LOCKED_ANGLE {
            flags |= RotationFlags::SWING_Y_LOCKED;
            self.sin_swing_y_quarter_angle = 0.0;
        } else if swing_y_half_angle > FREE_ANGLE {
            flags |= RotationFlags::SWING_Y_FREE;
            self.sin_swing_y_quarter_angle = 1.0;
        } else {
            self.sin_swing_y_quarter_angle = (0.5 * swing_y_half_angle).sin();
        }

        if swing_z_half_angle < LOCKED_ANGLE {
            flags |= RotationFlags::SWING_Z_LOCKED;
            self.sin_swing_z_quarter_angle = 0.0;
        } else if swing_z_half_angle > FREE_ANGLE {
            flags |= RotationFlags::SWING_Z_FREE;
            self.sin_swing_z_quarter_angle = 1.0;
        } else {
            self.sin_swing_z_quarter_angle = (0.5 * swing_z_half_angle).sin();
        }

        self.rotation_flags = flags;
    }

    /// Locked and free classification of the current limits
    #[inline]
    pub fn get_rotation_flags(&self) -> RotationFlags {
        self.rotation_flags
    }

    /// Clamps `swing` and `twist` in place and reports which limits were hit
    pub fn clamp_swing_twist(&self, swing: &mut Quaternion, twist: &mut Quaternion) -> ClampedAxes {
        let mut clamped = ClampedAxes::empty();

        // Work with w >= 0 so the sign of x, y and z is the sign of the angle
        let negate_swing = swing.w < 0.0;
        if negate_swing {
            *swing = math::quat_negate(swing);
        }
        let negate_twist = twist.w < 0.0;
        if negate_twist {
            *twist = math::quat_negate(twist);
        }

        let flags = self.rotation_flags;

        if flags.contains(RotationFlags::TWIST_X_LOCKED) {
            if twist.i != 0.0 {
                *twist = Quaternion::identity();
                clamped |= ClampedAxes::TWIST;
            }
        } else if !flags.contains(RotationFlags::TWIST_X_FREE) {
            let delta_min = self.sin_twist_half_min_angle - twist.i;
            let delta_max = twist.i - self.sin_twist_half_max_angle;
            if delta_min > 0.0 || delta_max > 0.0 {
                if delta_min > delta_max {
                    *twist = math::quat_from_xyzw(self.sin_twist_half_min_angle, 0.0, 0.0, self.cos_twist_half_min_angle);
                    clamped |= ClampedAxes::TWIST_MIN;
                } else {
                    *twist = math::quat_from_xyzw(self.sin_twist_half_max_angle, 0.0, 0.0, self.cos_twist_half_max_angle);
                    clamped |= ClampedAxes::TWIST_MAX;
                }
            }
        }

        let y_locked = flags.contains(RotationFlags::SWING_Y_LOCKED);
        let z_locked = flags.contains(RotationFlags::SWING_Z_LOCKED);
        if y_locked && z_locked {
            if swing.j != 0.0 || swing.k != 0.0 {
                *swing = Quaternion::identity();
                clamped |= ClampedAxes::SWING;
            }
        } else if y_locked {
            let limit = self.sin_swing_z_quarter_angle;
            let z = math::clamp(swing.k, -limit, limit);
            if swing.j != 0.0 {
                clamped |= ClampedAxes::SWING_Y;
            }
            if z < swing.k {
                clamped |= ClampedAxes::SWING_Z_MAX;
            } else if z > swing.k {
                clamped |= ClampedAxes::SWING_Z_MIN;
            }
            *swing = math::quat_from_xyzw(0.0, 0.0, z, (1.0 - z * z).max(0.0).sqrt());
        } else if z_locked {
            let limit = self.sin_swing_y_quarter_angle;
            let y = math::clamp(swing.j, -limit, limit);
            if swing.k != 0.0 {
                clamped |= ClampedAxes::SWING_Z;
            }
            if y < swing.j {
                clamped |= ClampedAxes::SWING_Y_MAX;
            } else if y > swing.j {
                clamped |= ClampedAxes::SWING_Y_MIN;
            }
            *swing = math::quat_from_xyzw(0.0, y, 0.0, (1.0 - y * y).max(0.0).sqrt());
        } else if !flags.contains(RotationFlags::SWING_YZ_FREE) {
            let ellipse = Ellipse::new(self.sin_swing_y_quarter_angle, self.sin_swing_z_quarter_angle);
            let point = Vector2::new(swing.j, swing.k);
            if !ellipse.is_inside(point) {
                let closest = ellipse.closest_point(point);
                let w = (1.0 - closest.norm_squared()).max(0.0).sqrt();
                *swing = math::quat_from_xyzw(0.0, closest.x, closest.y, w);
                clamped |= ClampedAxes::SWING;
            }
        }

        if negate_swing {
            *swing = math::quat_negate(swing);
        }
        if negate_twist {
            *twist = math::quat_negate(twist);
        }

        clamped
    }

    /// Activates the angle parts for every violated limit.
    ///
    /// `constraint_rotation` is the rotation from body 1 constraint space to body 2 constraint space,
    /// `constraint_to_world` the world orientation of body 1's constraint frame.
    pub fn calculate_constraint_properties(
        &mut self,
        body1: &RigidBody,
        body2: &RigidBody,
        constraint_rotation: &Quaternion,
        constraint_to_world: &Quaternion,
    ) {
        let (mut swing, mut twist) = math::swing_twist(constraint_rotation);
        let unclamped_swing = swing;
        let clamped = self.clamp_swing_twist(&mut swing, &mut twist);

        let flags = self.rotation_flags;
        let y_locked = flags.contains(RotationFlags::SWING_Y_LOCKED);
        let z_locked = flags.contains(RotationFlags::SWING_Z_LOCKED);
        let twist_to_world = constraint_to_world * unclamped_swing;

        if y_locked || z_locked {
            self.world_space_swing_y_axis = twist_to_world * Vector3::y();
            self.world_space_swing_z_axis = twist_to_world * Vector3::z();

            if y_locked {
                self.swing_y_part.calculate_constraint_properties(body1, body2, &self.world_space_swing_y_axis);
            } else if clamped.intersects(ClampedAxes::SWING_Y) {
                // Hitting the lower bound: flip the axis so the impulse stays in [-MAX, 0]
                if clamped.contains(ClampedAxes::SWING_Y_MIN) {
                    self.world_space_swing_y_axis = -self.world_space_swing_y_axis;
                }
                self.swing_y_part.calculate_constraint_properties(body1, body2, &self.world_space_swing_y_axis);
            } else {
                self.swing_y_part.deactivate();
            }

            if z_locked {
                self.swing_z_part.calculate_constraint_properties(body1, body2, &self.world_space_swing_z_axis);
            } else if clamped.intersects(ClampedAxes::SWING_Z) {
                if clamped.contains(ClampedAxes::SWING_Z_MIN) {
                    self.world_space_swing_z_axis = -self.world_space_swing_z_axis;
                }
                self.swing_z_part.calculate_constraint_properties(body1, body2, &self.world_space_swing_z_axis);
            } else {
                self.swing_z_part.deactivate();
            }
        } else if !flags.contains(RotationFlags::SWING_YZ_FREE) && clamped.intersects(ClampedAxes::SWING) {
            // Rotate from the clamped swing back towards the current one
            let current = twist_to_world * Vector3::x();
            let desired = (constraint_to_world * swing) * Vector3::x();
            let axis = desired.cross(&current);
            let len = axis.norm();
            if len != 0.0 {
                self.world_space_swing_y_axis = axis / len;
                self.swing_y_part.calculate_constraint_properties(body1, body2, &self.world_space_swing_y_axis);
            } else {
                self.swing_y_part.deactivate();
            }
            self.swing_z_part.deactivate();
        } else {
            self.swing_y_part.deactivate();
            self.swing_z_part.deactivate();
        }

        if flags.contains(RotationFlags::TWIST_X_LOCKED) {
            self.world_space_twist_axis = twist_to_world * Vector3::x();
            self.twist_part.calculate_constraint_properties(body1, body2, &self.world_space_twist_axis);
        } else if !flags.contains(RotationFlags::TWIST_X_FREE) && clamped.intersects(ClampedAxes::TWIST) {
            self.world_space_twist_axis = twist_to_world * Vector3::x();
            if clamped.contains(ClampedAxes::TWIST_MIN) {
                self.world_space_twist_axis = -self.world_space_twist_axis;
            }
            self.twist_part.calculate_constraint_properties(body1, body2, &self.world_space_twist_axis);
        } else {
            self.twist_part.deactivate();
        }
    }

    /// Disables all three angle parts
    pub fn deactivate(&mut self) {
        self.swing_y_part.deactivate();
        self.swing_z_part.deactivate();
        self.twist_part.deactivate();
    }

    /// True when any limit is being enforced
    #[inline]
    pub fn is_active(&self) -> bool {
        self.swing_y_part.is_active() || self.swing_z_part.is_active() || self.twist_part.is_active()
    }

    /// Applies the previous step's impulses, scaled by `ratio`
    pub fn warm_start(&mut self, body1: &mut RigidBody, body2: &mut RigidBody, ratio: f32) {
        self.swing_y_part.warm_start(body1, body2, ratio);
        self.swing_z_part.warm_start(body1, body2, ratio);
        self.twist_part.warm_start(body1, body2, ratio);
    }

    /// Solves the active limits one sided, locked axes two sided
    pub fn solve_velocity_constraint(&mut self, body1: &mut RigidBody, body2: &mut RigidBody) -> bool {
        let flags = self.rotation_flags;
        let mut impulse = false;

        if self.swing_y_part.is_active() {
            let max = if flags.contains(RotationFlags::SWING_Y_LOCKED) { f32::MAX } else { 0.0 };
            impulse |= self.swing_y_part.solve_velocity_constraint(body1, body2, &self.world_space_swing_y_axis, -f32::MAX, max);
        }

        if self.swing_z_part.is_active() {
            let max = if flags.contains(RotationFlags::SWING_Z_LOCKED) { f32::MAX } else { 0.0 };
            impulse |= self.swing_z_part.solve_velocity_constraint(body1, body2, &self.world_space_swing_z_axis, -f32::MAX, max);
        }

        if self.twist_part.is_active() {
            let max = if flags.contains(RotationFlags::TWIST_X_LOCKED) { f32::MAX } else { 0.0 };
            impulse |= self.twist_part.solve_velocity_constraint(body1, body2, &self.world_space_twist_axis, -f32::MAX, max);
        }

        impulse
    }

    /// Rotates the bodies back inside the limits through a temporary Euler part aimed at
    /// the clamped orientation
    pub fn solve_position_constraint(
        &self,
        body1: &mut RigidBody,
        body2: &mut RigidBody,
        constraint_rotation: &Quaternion,
        constraint_to_body1: &Quaternion,
        constraint_to_body2: &Quaternion,
        baumgarte: f32,
    ) -> bool {
        let (mut swing, mut twist) = math::swing_twist(constraint_rotation);
        if self.clamp_swing_twist(&mut swing, &mut twist).is_empty() {
            return false;
        }

        let inv_initial_orientation = constraint_to_body2 * (constraint_to_body1 * swing * twist).inverse();

        let mut part = RotationEulerConstraintPart::default();
        let (rotation1, rotation2) = (body1.get_rotation(), body2.get_rotation());
        part.calculate_constraint_properties(body1, &rotation1, body2, &rotation2);
        part.solve_position_constraint(body1, body2, &inv_initial_orientation, baumgarte)
    }

    /// Accumulated impulse of the swing Y limit
    #[inline]
    pub fn get_total_swing_y_lambda(&self) -> f32 {
        self.swing_y_part.get_total_lambda()
    }

    /// Accumulated impulse of the swing Z limit
    #[inline]
    pub fn get_total_swing_z_lambda(&self) -> f32 {
        self.swing_z_part.get_total_lambda()
    }

    /// Accumulated impulse of the twist limit
    #[inline]
    pub fn get_total_twist_lambda(&self) -> f32 {
        self.twist_part.get_total_lambda()
    }

    /// Writes swing Y, swing Z and twist impulses in that order
    pub fn save_state(&self, recorder: &mut StateRecorder) {
        self.swing_y_part.save_state(recorder);
        self.swing_z_part.save_state(recorder);
        self.twist_part.save_state(recorder);
    }

    /// Reads impulses written by `save_state`
    pub fn restore_state(&mut self, recorder: &mut StateRecorder) -> Result<()> {
        self.swing_y_part.restore_state(recorder)?;
        self.swing_z_part.restore_state(recorder)?;
        self.twist_part.restore_state(recorder)
    }
}
