//! Six degree of freedom constraint.
//!
//! Every translation and rotation axis of the constraint frame can independently be free,
//! fixed, limited, driven by a motor or damped by friction.

mod axis;
mod settings;

pub use self::axis::{SixDofAxes, SixDofAxis};
pub use self::settings::{ConstraintSpace, SixDofConstraintSettings};

use std::any::Any;
use std::f32::consts::PI;

use log::{debug, trace, warn};

use crate::bodies::RigidBody;
use crate::constraints::parts::{
    AngleConstraintPart, AxisConstraintPart, PointConstraintPart, RotationEulerConstraintPart,
    SwingTwistConstraintPart,
};
use crate::constraints::{Constraint, ConstraintSubType, MotorSettings, MotorState};
use crate::core::BodyHandle;
use crate::io::StateRecorder;
use crate::math::{self, Isometry3, Quaternion, Vector3};
use crate::Result;

/// Solver for the translation axes, chosen once from the fixed mask
#[derive(Debug, Clone, Copy, PartialEq)]
enum TranslationPart {
    /// All three axes fixed: one 3x3 point solve
    AllFixedPoint(PointConstraintPart),

    /// One axis part per translation axis
    PerAxis([AxisConstraintPart; 3]),
}

/// Solver for the rotation axes, chosen once from the fixed mask
#[derive(Debug, Clone, Copy, PartialEq)]
enum RotationPart {
    /// All three axes fixed: one 3x3 rotation lock
    AllFixedEuler(RotationEulerConstraintPart),

    /// Twist around X plus a swing cone around Y and Z
    SwingTwist(SwingTwistConstraintPart),
}

/// World space quantities of the attachment points, see `get_position_constraint_properties`
struct PositionProperties {
    /// `p2 - x1`
    r1_plus_u: Vector3,
    /// `p2 - x2`
    r2: Vector3,
    /// `p2 - p1`
    u: Vector3,
}

/// Constraint that couples two bodies along up to six configurable axes.
///
/// Target velocity and position of the translation motors are expressed in body 1's
/// constraint space; target angular velocity and orientation in body 2's constraint space.
#[derive(Debug, Clone)]
pub struct SixDofConstraint {
    body1: BodyHandle,
    body2: BodyHandle,

    /// Attachment points relative to each body's center of mass, in body space
    local_space_position1: Vector3,
    local_space_position2: Vector3,

    /// Rotations from the constraint frames to body space
    constraint_to_body1: Quaternion,
    constraint_to_body2: Quaternion,

    /// Relative rotation to restore when all rotation axes are fixed
    inv_initial_orientation: Quaternion,

    /// Classification taken when the constraint is created
    free_axes: SixDofAxes,
    fixed_axes: SixDofAxes,

    translation_motor_active: bool,
    rotation_motor_active: bool,

    limit_min: [f32; 6],
    limit_max: [f32; 6],
    max_friction: [f32; 6],
    motor_settings: [MotorSettings; 6],
    motor_state: [MotorState; 6],

    target_velocity: Vector3,
    target_angular_velocity: Vector3,
    target_position: Vector3,
    target_orientation: Quaternion,

    // Recomputed by setup_velocity_constraint
    translation_axis: [Vector3; 3],
    rotation_axis: [Vector3; 3],
    displacement: [f32; 3],

    translation_part: TranslationPart,
    rotation_part: RotationPart,
    motor_translation_parts: [AxisConstraintPart; 3],
    motor_rotation_parts: [AngleConstraintPart; 3],
}

impl SixDofConstraint {
    /// Creates the constraint from settings and the bodies' current poses
    pub fn new(
        body1_handle: BodyHandle,
        body2_handle: BodyHandle,
        body1: &RigidBody,
        body2: &RigidBody,
        settings: &SixDofConstraintSettings,
    ) -> Self {
        let mut constraint_to_body1 =
            math::quat_from_axes(&settings.axis_x1.normalize(), &settings.axis_y1.normalize());
        let mut constraint_to_body2 =
            math::quat_from_axes(&settings.axis_x2.normalize(), &settings.axis_y2.normalize());

        let (local_space_position1, local_space_position2) = match settings.space {
            ConstraintSpace::WorldSpace => {
                constraint_to_body1 = body1.get_rotation().inverse() * constraint_to_body1;
                constraint_to_body2 = body2.get_rotation().inverse() * constraint_to_body2;
                (
                    body1
                        .get_center_of_mass_transform()
                        .inverse_transform_point(&settings.position1.into())
                        .coords,
                    body2
                        .get_center_of_mass_transform()
                        .inverse_transform_point(&settings.position2.into())
                        .coords,
                )
            }
            ConstraintSpace::LocalToBodyCom => (settings.position1, settings.position2),
        };

        let mut free_axes = SixDofAxes::empty();
        let mut fixed_axes = SixDofAxes::empty();
        for axis in SixDofAxis::ALL {
            if settings.is_fixed_axis(axis) {
                fixed_axes |= axis.bit();
            } else if settings.is_free_axis(axis) {
                free_axes |= axis.bit();
            }
        }

        let translation_part = if fixed_axes.contains(SixDofAxes::TRANSLATION) {
            TranslationPart::AllFixedPoint(PointConstraintPart::default())
        } else {
            TranslationPart::PerAxis([AxisConstraintPart::default(); 3])
        };

        let rotation_part = if fixed_axes.contains(SixDofAxes::ROTATION) {
            RotationPart::AllFixedEuler(RotationEulerConstraintPart::default())
        } else {
            RotationPart::SwingTwist(SwingTwistConstraintPart::default())
        };

        let mut constraint = Self {
            body1: body1_handle,
            body2: body2_handle,
            local_space_position1,
            local_space_position2,
            constraint_to_body1,
            constraint_to_body2,
            inv_initial_orientation: RotationEulerConstraintPart::get_inv_initial_orientation(
                &constraint_to_body1,
                &constraint_to_body2,
            ),
            free_axes,
            fixed_axes,
            translation_motor_active: false,
            rotation_motor_active: false,
            limit_min: settings.limit_min,
            limit_max: settings.limit_max,
            max_friction: settings.max_friction,
            motor_settings: settings.motor_settings,
            motor_state: [MotorState::Off; 6],
            target_velocity: Vector3::zeros(),
            target_angular_velocity: Vector3::zeros(),
            target_position: Vector3::zeros(),
            target_orientation: Quaternion::identity(),
            translation_axis: [Vector3::zeros(); 3],
            rotation_axis: [Vector3::zeros(); 3],
            displacement: [0.0; 3],
            translation_part,
            rotation_part,
            motor_translation_parts: [AxisConstraintPart::default(); 3],
            motor_rotation_parts: [AngleConstraintPart::default(); 3],
        };

        constraint.update_rotation_limits();
        constraint.cache_translation_motor_active();
        constraint.cache_rotation_motor_active();

        debug!(
            "Created six DOF constraint between {:?} and {:?}: free {:?}, fixed {:?}",
            body1_handle, body2_handle, free_axes, fixed_axes
        );

        constraint
    }

    /// True when the axis was free when the constraint was created
    #[inline]
    pub fn is_axis_free(&self, axis: SixDofAxis) -> bool {
        self.free_axes.has(axis)
    }

    /// True when the axis was fixed when the constraint was created
    #[inline]
    pub fn is_axis_fixed(&self, axis: SixDofAxis) -> bool {
        self.fixed_axes.has(axis)
    }

    /// True when all translation axes are fixed
    #[inline]
    pub fn is_translation_fully_constrained(&self) -> bool {
        self.fixed_axes.contains(SixDofAxes::TRANSLATION)
    }

    /// True when all rotation axes are fixed
    #[inline]
    pub fn is_rotation_fully_constrained(&self) -> bool {
        self.fixed_axes.contains(SixDofAxes::ROTATION)
    }

    #[inline]
    fn is_translation_constrained(&self) -> bool {
        !self.free_axes.contains(SixDofAxes::TRANSLATION)
    }

    #[inline]
    fn is_rotation_constrained(&self) -> bool {
        !self.free_axes.contains(SixDofAxes::ROTATION)
    }

    #[inline]
    fn has_friction(&self, axis: SixDofAxis) -> bool {
        !self.is_axis_fixed(axis) && self.max_friction[axis.index()] > 0.0
    }

    fn cache_translation_motor_active(&mut self) {
        self.translation_motor_active = SixDofAxis::TRANSLATION
            .iter()
            .any(|&axis| self.motor_state[axis.index()] != MotorState::Off || self.has_friction(axis));
    }

    fn cache_rotation_motor_active(&mut self) {
        self.rotation_motor_active = SixDofAxis::ROTATION
            .iter()
            .any(|&axis| self.motor_state[axis.index()] != MotorState::Off || self.has_friction(axis));
    }

    /// Limits as seen by the swing twist part: fixed is `[0, 0]`, free is `[-pi, pi]`, the rest is clamped to that range
    fn effective_rotation_limits(&self, axis: SixDofAxis) -> (f32, f32) {
        let i = axis.index();
        if self.is_axis_fixed(axis) {
            (0.0, 0.0)
        } else if self.is_axis_free(axis) {
            (-PI, PI)
        } else {
            (math::clamp(self.limit_min[i], -PI, PI), math::clamp(self.limit_max[i], -PI, PI))
        }
    }

    fn update_rotation_limits(&mut self) {
        let (twist_min, twist_max) = self.effective_rotation_limits(SixDofAxis::RotationX);
        let (_, swing_y) = self.effective_rotation_limits(SixDofAxis::RotationY);
        let (_, swing_z) = self.effective_rotation_limits(SixDofAxis::RotationZ);

        if let RotationPart::SwingTwist(part) = &mut self.rotation_part {
            part.set_limits(twist_min, twist_max, swing_y, swing_z);
        }
    }

    /// Updates the translation limits.
    ///
    /// Only the numeric bounds change; which axes are free or fixed was decided at creation.
    pub fn set_translation_limits(&mut self, limit_min: Vector3, limit_max: Vector3) {
        for (i, axis) in SixDofAxis::TRANSLATION.iter().enumerate() {
            self.limit_min[axis.index()] = limit_min[i];
            self.limit_max[axis.index()] = limit_max[i];
        }
    }

    /// Updates the rotation limits (twist range around X, half cone angles around Y and Z).
    ///
    /// Only the numeric bounds change; which axes are free or fixed was decided at creation.
    pub fn set_rotation_limits(&mut self, limit_min: Vector3, limit_max: Vector3) {
        for (i, axis) in SixDofAxis::ROTATION.iter().enumerate() {
            self.limit_min[axis.index()] = limit_min[i];
            self.limit_max[axis.index()] = limit_max[i];
        }
        self.update_rotation_limits();
    }

    /// Lower limit of an axis, as configured
    #[inline]
    pub fn get_limits_min(&self, axis: SixDofAxis) -> f32 {
        self.limit_min[axis.index()]
    }

    /// Upper limit of an axis, as configured
    #[inline]
    pub fn get_limits_max(&self, axis: SixDofAxis) -> f32 {
        self.limit_max[axis.index()]
    }

    /// Friction force or torque of an axis
    #[inline]
    pub fn get_max_friction(&self, axis: SixDofAxis) -> f32 {
        self.max_friction[axis.index()]
    }

    /// Sets the friction force or torque of an axis, 0 disables friction.
    ///
    /// Removing the friction of an axis without a motor clears its accumulated impulse.
    pub fn set_max_friction(&mut self, axis: SixDofAxis, friction: f32) {
        let i = axis.index();
        self.max_friction[i] = friction;
        let idle = self.motor_state[i] == MotorState::Off && !self.has_friction(axis);
        if axis.is_translation() {
            if idle {
                self.motor_translation_parts[i].deactivate();
            }
            self.cache_translation_motor_active();
        } else {
            if idle {
                self.motor_rotation_parts[i - SixDofAxis::NUM_TRANSLATION].deactivate();
            }
            self.cache_rotation_motor_active();
        }
    }

    /// Motor configuration of an axis
    #[inline]
    pub fn get_motor_settings(&self, axis: SixDofAxis) -> &MotorSettings {
        &self.motor_settings[axis.index()]
    }

    /// Mutable motor configuration of an axis
    #[inline]
    pub fn get_motor_settings_mut(&mut self, axis: SixDofAxis) -> &mut MotorSettings {
        &mut self.motor_settings[axis.index()]
    }

    /// Current drive mode of an axis
    #[inline]
    pub fn get_motor_state(&self, axis: SixDofAxis) -> MotorState {
        self.motor_state[axis.index()]
    }

    /// Switches the drive mode of an axis.
    ///
    /// The axis' motor part is reset so impulses from the previous mode are not warm started.
    pub fn set_motor_state(&mut self, axis: SixDofAxis, state: MotorState) {
        let i = axis.index();
        if state != MotorState::Off && !self.motor_settings[i].is_valid() {
            warn!("Enabling {:?} motor on {:?} with invalid motor settings", state, axis);
        }
        debug_assert!(state == MotorState::Off || self.motor_settings[i].is_valid());

        if self.motor_state[i] == state {
            return;
        }
        self.motor_state[i] = state;

        if axis.is_translation() {
            self.motor_translation_parts[i].deactivate();
            self.cache_translation_motor_active();
        } else {
            self.motor_rotation_parts[i - SixDofAxis::NUM_TRANSLATION].deactivate();
            self.cache_rotation_motor_active();
        }
    }

    /// Target relative velocity of the translation motors, in body 1 constraint space
    #[inline]
    pub fn get_target_velocity_cs(&self) -> Vector3 {
        self.target_velocity
    }

    /// Sets the target relative velocity, in body 1 constraint space
    #[inline]
    pub fn set_target_velocity_cs(&mut self, velocity: Vector3) {
        self.target_velocity = velocity;
    }

    /// Target relative angular velocity of the rotation motors, in body 2 constraint space
    #[inline]
    pub fn get_target_angular_velocity_cs(&self) -> Vector3 {
        self.target_angular_velocity
    }

    /// Sets the target relative angular velocity, in body 2 constraint space
    #[inline]
    pub fn set_target_angular_velocity_cs(&mut self, angular_velocity: Vector3) {
        self.target_angular_velocity = angular_velocity;
    }

    /// Target relative position of the translation motors, in body 1 constraint space
    #[inline]
    pub fn get_target_position_cs(&self) -> Vector3 {
        self.target_position
    }

    /// Sets the target relative position, in body 1 constraint space
    #[inline]
    pub fn set_target_position_cs(&mut self, position: Vector3) {
        self.target_position = position;
    }

    /// Target orientation of body 2's constraint frame relative to body 1's constraint frame
    #[inline]
    pub fn get_target_orientation_cs(&self) -> Quaternion {
        self.target_orientation
    }

    /// Sets the target orientation in constraint space, clamped to the rotation limits
    pub fn set_target_orientation_cs(&mut self, orientation: Quaternion) {
        self.target_orientation = match &self.rotation_part {
            RotationPart::SwingTwist(part) => {
                let (mut swing, mut twist) = math::swing_twist(&orientation);
                if part.clamp_swing_twist(&mut swing, &mut twist).is_empty() {
                    orientation
                } else {
                    swing * twist
                }
            }
            RotationPart::AllFixedEuler(_) => orientation,
        };
    }

    /// Sets the target orientation as the rotation of body 2 relative to body 1 (`q1^-1 * q2`)
    pub fn set_target_orientation_bs(&mut self, orientation: Quaternion) {
        let orientation_cs = self.constraint_to_body1.inverse() * orientation * self.constraint_to_body2;
        self.set_target_orientation_cs(orientation_cs);
    }

    /// Rotation from body 1's constraint frame to body 2's constraint frame
    pub fn get_rotation_in_constraint_space(&self, body1: &RigidBody, body2: &RigidBody) -> Quaternion {
        (body1.get_rotation() * self.constraint_to_body1).inverse() * (body2.get_rotation() * self.constraint_to_body2)
    }

    fn get_position_constraint_properties(&self, body1: &RigidBody, body2: &RigidBody) -> PositionProperties {
        let p1 = body1.get_center_of_mass_transform() * nalgebra::Point3::from(self.local_space_position1);
        let p2 = body2.get_center_of_mass_transform() * nalgebra::Point3::from(self.local_space_position2);
        PositionProperties {
            r1_plus_u: p2.coords - body1.get_position(),
            r2: p2.coords - body2.get_position(),
            u: p2 - p1,
        }
    }

    /// Position error of a translation axis, zero when the axis is inside its limits
    fn translation_error(&self, axis: SixDofAxis, displacement: f32) -> f32 {
        let i = axis.index();
        if self.is_axis_fixed(axis) {
            displacement
        } else if self.is_axis_free(axis) {
            0.0
        } else if displacement <= self.limit_min[i] {
            displacement - self.limit_min[i]
        } else if displacement >= self.limit_max[i] {
            displacement - self.limit_max[i]
        } else {
            0.0
        }
    }

    fn setup_translation(&mut self, dt: f32, body1: &RigidBody, body2: &RigidBody) {
        let rotation1 = body1.get_rotation();
        let rotation2 = body2.get_rotation();

        if let TranslationPart::AllFixedPoint(part) = &mut self.translation_part {
            part.calculate_constraint_properties(
                body1,
                &rotation1,
                &self.local_space_position1,
                body2,
                &rotation2,
                &self.local_space_position2,
            );
            for part in &mut self.motor_translation_parts {
                part.deactivate();
            }
            return;
        }

        if !self.is_translation_constrained() && !self.translation_motor_active {
            return;
        }

        let properties = self.get_position_constraint_properties(body1, body2);
        let constraint_body1_to_world = (rotation1 * self.constraint_to_body1).to_rotation_matrix();

        for (i, axis) in SixDofAxis::TRANSLATION.into_iter().enumerate() {
            let translation_axis = constraint_body1_to_world.matrix().column(i).into_owned();
            let d = translation_axis.dot(&properties.u);
            self.translation_axis[i] = translation_axis;
            self.displacement[i] = d;

            if let TranslationPart::PerAxis(parts) = &mut self.translation_part {
                let limit_active = self.fixed_axes.has(axis)
                    || (!self.free_axes.has(axis) && (d <= self.limit_min[i] || d >= self.limit_max[i]));
                if limit_active {
                    parts[i].calculate_constraint_properties(
                        body1,
                        &properties.r1_plus_u,
                        body2,
                        &properties.r2,
                        &translation_axis,
                    );
                } else {
                    parts[i].deactivate();
                }
            }

            let motor = &mut self.motor_translation_parts[i];
            match self.motor_state[i] {
                MotorState::Off => {
                    if !self.fixed_axes.has(axis) && self.max_friction[i] > 0.0 {
                        motor.calculate_constraint_properties(
                            body1,
                            &properties.r1_plus_u,
                            body2,
                            &properties.r2,
                            &translation_axis,
                        );
                    } else {
                        motor.deactivate();
                    }
                }
                MotorState::Velocity => motor.calculate_constraint_properties_with_bias(
                    body1,
                    &properties.r1_plus_u,
                    body2,
                    &properties.r2,
                    &translation_axis,
                    -self.target_velocity[i],
                ),
                MotorState::Position => motor.calculate_constraint_properties_with_spring(
                    dt,
                    body1,
                    &properties.r1_plus_u,
                    body2,
                    &properties.r2,
                    &translation_axis,
                    d - self.target_position[i],
                    &self.motor_settings[i].spring,
                ),
            }
        }
    }

    fn setup_rotation(&mut self, dt: f32, body1: &RigidBody, body2: &RigidBody) {
        let rotation1 = body1.get_rotation();
        let rotation2 = body2.get_rotation();

        if let RotationPart::AllFixedEuler(part) = &mut self.rotation_part {
            part.calculate_constraint_properties(body1, &rotation1, body2, &rotation2);
            for part in &mut self.motor_rotation_parts {
                part.deactivate();
            }
            return;
        }

        if !self.is_rotation_constrained() && !self.rotation_motor_active {
            return;
        }

        let constraint_body1_to_world = rotation1 * self.constraint_to_body1;
        let constraint_body2_to_world = rotation2 * self.constraint_to_body2;
        let q = constraint_body1_to_world.inverse() * constraint_body2_to_world;

        if self.is_rotation_constrained() {
            if let RotationPart::SwingTwist(part) = &mut self.rotation_part {
                part.calculate_constraint_properties(body1, body2, &q, &constraint_body1_to_world);
            }
        }

        if !self.rotation_motor_active {
            return;
        }

        let axes = constraint_body2_to_world.to_rotation_matrix();
        for i in 0..3 {
            self.rotation_axis[i] = axes.matrix().column(i).into_owned();
        }

        // Shortest path towards the target; `diff` is the remaining rotation in body 2 constraint space
        let target = if math::quat_dot(&q, &self.target_orientation) > 0.0 {
            self.target_orientation
        } else {
            math::quat_negate(&self.target_orientation)
        };
        let diff = q.inverse() * target;
        let rotation_error = -2.0 * math::quat_xyz(&diff);

        for (i, axis) in SixDofAxis::ROTATION.into_iter().enumerate() {
            let motor = &mut self.motor_rotation_parts[i];
            let rotation_axis = self.rotation_axis[i];
            match self.motor_state[axis.index()] {
                MotorState::Off => {
                    if !self.fixed_axes.has(axis) && self.max_friction[axis.index()] > 0.0 {
                        motor.calculate_constraint_properties(body1, body2, &rotation_axis);
                    } else {
                        motor.deactivate();
                    }
                }
                MotorState::Velocity => motor.calculate_constraint_properties_with_bias(
                    body1,
                    body2,
                    &rotation_axis,
                    -self.target_angular_velocity[i],
                ),
                MotorState::Position => motor.calculate_constraint_properties_with_spring(
                    dt,
                    body1,
                    body2,
                    &rotation_axis,
                    rotation_error[i],
                    &self.motor_settings[axis.index()].spring,
                ),
            }
        }
    }

    /// Impulse range for the motor part of `axis` over one step
    fn motor_lambda_range(&self, axis: SixDofAxis, dt: f32) -> (f32, f32) {
        let i = axis.index();
        let settings = &self.motor_settings[i];
        match self.motor_state[i] {
            MotorState::Off => {
                let max_lambda = self.max_friction[i] * dt;
                (-max_lambda, max_lambda)
            }
            _ if axis.is_translation() => (dt * settings.min_force_limit, dt * settings.max_force_limit),
            _ => (dt * settings.min_torque_limit, dt * settings.max_torque_limit),
        }
    }

    /// Accumulated impulse of the translation limits (point part or one value per axis)
    pub fn get_total_lambda_position(&self) -> Vector3 {
        match &self.translation_part {
            TranslationPart::AllFixedPoint(part) => part.get_total_lambda(),
            TranslationPart::PerAxis(parts) => Vector3::from_fn(|i, _| parts[i].get_total_lambda()),
        }
    }

    /// Accumulated impulse of the rotation limits; swing-twist reports `(twist, swing y, swing z)`
    pub fn get_total_lambda_rotation(&self) -> Vector3 {
        match &self.rotation_part {
            RotationPart::AllFixedEuler(part) => part.get_total_lambda(),
            RotationPart::SwingTwist(part) => Vector3::new(
                part.get_total_twist_lambda(),
                part.get_total_swing_y_lambda(),
                part.get_total_swing_z_lambda(),
            ),
        }
    }

    /// Accumulated impulses of the translation motors and friction
    pub fn get_total_lambda_motor_translation(&self) -> Vector3 {
        Vector3::from_fn(|i, _| self.motor_translation_parts[i].get_total_lambda())
    }

    /// Accumulated impulses of the rotation motors and friction
    pub fn get_total_lambda_motor_rotation(&self) -> Vector3 {
        Vector3::from_fn(|i, _| self.motor_rotation_parts[i].get_total_lambda())
    }

    /// Settings that recreate this constraint, expressed relative to the bodies' centers of mass
    pub fn to_settings(&self) -> SixDofConstraintSettings {
        SixDofConstraintSettings {
            space: ConstraintSpace::LocalToBodyCom,
            position1: self.local_space_position1,
            axis_x1: self.constraint_to_body1 * Vector3::x(),
            axis_y1: self.constraint_to_body1 * Vector3::y(),
            position2: self.local_space_position2,
            axis_x2: self.constraint_to_body2 * Vector3::x(),
            axis_y2: self.constraint_to_body2 * Vector3::y(),
            max_friction: self.max_friction,
            limit_min: self.limit_min,
            limit_max: self.limit_max,
            motor_settings: self.motor_settings,
        }
    }
}

impl Constraint for SixDofConstraint {
    fn constraint_type(&self) -> ConstraintSubType {
        ConstraintSubType::SixDof
    }

    fn get_bodies(&self) -> [BodyHandle; 2] {
        [self.body1, self.body2]
    }

    fn setup_velocity_constraint(&mut self, dt: f32, body1: &RigidBody, body2: &RigidBody) {
        self.setup_translation(dt, body1, body2);
        self.setup_rotation(dt, body1, body2);

        trace!(
            "Six DOF setup: point {}, euler {}, translation motors {}, rotation motors {}",
            self.is_translation_fully_constrained(),
            self.is_rotation_fully_constrained(),
            self.translation_motor_active,
            self.rotation_motor_active
        );
    }

    fn warm_start_velocity_constraint(&mut self, ratio: f32, body1: &mut RigidBody, body2: &mut RigidBody) {
        if self.translation_motor_active {
            for (part, axis) in self.motor_translation_parts.iter_mut().zip(&self.translation_axis) {
                if part.is_active() {
                    part.warm_start(body1, body2, axis, ratio);
                }
            }
        }

        if self.rotation_motor_active {
            for part in self.motor_rotation_parts.iter_mut().filter(|part| part.is_active()) {
                part.warm_start(body1, body2, ratio);
            }
        }

        match &mut self.rotation_part {
            RotationPart::AllFixedEuler(part) => part.warm_start(body1, body2, ratio),
            RotationPart::SwingTwist(part) => {
                if !self.free_axes.contains(SixDofAxes::ROTATION) {
                    part.warm_start(body1, body2, ratio);
                }
            }
        }

        match &mut self.translation_part {
            TranslationPart::AllFixedPoint(part) => part.warm_start(body1, body2, ratio),
            TranslationPart::PerAxis(parts) => {
                for (part, axis) in parts.iter_mut().zip(&self.translation_axis) {
                    if part.is_active() {
                        part.warm_start(body1, body2, axis, ratio);
                    }
                }
            }
        }
    }

    fn solve_velocity_constraint(&mut self, dt: f32, body1: &mut RigidBody, body2: &mut RigidBody) -> bool {
        let mut impulse = false;

        // Motors and friction first so the limits get the final say
        if self.translation_motor_active {
            for (i, axis) in SixDofAxis::TRANSLATION.into_iter().enumerate() {
                if self.motor_translation_parts[i].is_active() {
                    let (min, max) = self.motor_lambda_range(axis, dt);
                    let translation_axis = self.translation_axis[i];
                    impulse |= self.motor_translation_parts[i]
                        .solve_velocity_constraint(body1, body2, &translation_axis, min, max);
                }
            }
        }

        if self.rotation_motor_active {
            for (i, axis) in SixDofAxis::ROTATION.into_iter().enumerate() {
                if self.motor_rotation_parts[i].is_active() {
                    let (min, max) = self.motor_lambda_range(axis, dt);
                    let rotation_axis = self.rotation_axis[i];
                    impulse |= self.motor_rotation_parts[i]
                        .solve_velocity_constraint(body1, body2, &rotation_axis, min, max);
                }
            }
        }

        match &mut self.translation_part {
            TranslationPart::AllFixedPoint(part) => impulse |= part.solve_velocity_constraint(body1, body2),
            TranslationPart::PerAxis(parts) => {
                for (i, axis) in SixDofAxis::TRANSLATION.into_iter().enumerate() {
                    if !parts[i].is_active() {
                        continue;
                    }

                    // One sided at a limit, two sided when fixed
                    let mut min = -f32::MAX;
                    let mut max = f32::MAX;
                    if !self.fixed_axes.has(axis) {
                        if self.displacement[i] <= self.limit_min[i] {
                            min = 0.0;
                        }
                        if self.displacement[i] >= self.limit_max[i] {
                            max = 0.0;
                        }
                    }
                    impulse |= parts[i].solve_velocity_constraint(body1, body2, &self.translation_axis[i], min, max);
                }
            }
        }

        match &mut self.rotation_part {
            RotationPart::AllFixedEuler(part) => impulse |= part.solve_velocity_constraint(body1, body2),
            RotationPart::SwingTwist(part) => {
                if !self.free_axes.contains(SixDofAxes::ROTATION) {
                    impulse |= part.solve_velocity_constraint(body1, body2);
                }
            }
        }

        impulse
    }

    fn solve_position_constraint(
        &mut self,
        _dt: f32,
        baumgarte: f32,
        body1: &mut RigidBody,
        body2: &mut RigidBody,
    ) -> bool {
        let mut impulse = false;

        match &mut self.rotation_part {
            RotationPart::AllFixedEuler(part) => {
                let (rotation1, rotation2) = (body1.get_rotation(), body2.get_rotation());
                part.calculate_constraint_properties(body1, &rotation1, body2, &rotation2);
                impulse |= part.solve_position_constraint(body1, body2, &self.inv_initial_orientation, baumgarte);
            }
            RotationPart::SwingTwist(part) => {
                if !self.free_axes.contains(SixDofAxes::ROTATION) {
                    let q = (body1.get_rotation() * self.constraint_to_body1).inverse()
                        * (body2.get_rotation() * self.constraint_to_body2);
                    impulse |= part.solve_position_constraint(
                        body1,
                        body2,
                        &q,
                        &self.constraint_to_body1,
                        &self.constraint_to_body2,
                        baumgarte,
                    );
                }
            }
        }

        if self.is_translation_fully_constrained() {
            let (rotation1, rotation2) = (body1.get_rotation(), body2.get_rotation());
            if let TranslationPart::AllFixedPoint(part) = &mut self.translation_part {
                part.calculate_constraint_properties(
                    body1,
                    &rotation1,
                    &self.local_space_position1,
                    body2,
                    &rotation2,
                    &self.local_space_position2,
                );
                impulse |= part.solve_position_constraint(body1, body2, baumgarte);
            }
        } else if self.is_translation_constrained() {
            for (i, axis) in SixDofAxis::TRANSLATION.into_iter().enumerate() {
                if self.is_axis_free(axis) {
                    continue;
                }

                // The bodies may have moved during the previous axes
                let properties = self.get_position_constraint_properties(body1, body2);
                let constraint_body1_to_world = (body1.get_rotation() * self.constraint_to_body1).to_rotation_matrix();
                let translation_axis = constraint_body1_to_world.matrix().column(i).into_owned();

                let error = self.translation_error(axis, translation_axis.dot(&properties.u));
                if error == 0.0 {
                    continue;
                }

                if let TranslationPart::PerAxis(parts) = &mut self.translation_part {
                    parts[i].calculate_constraint_properties(
                        body1,
                        &properties.r1_plus_u,
                        body2,
                        &properties.r2,
                        &translation_axis,
                    );
                    impulse |= parts[i].solve_position_constraint(body1, body2, &translation_axis, error, baumgarte);
                }
            }
        }

        impulse
    }

    fn get_constraint_to_body1_matrix(&self) -> Isometry3 {
        Isometry3::from_parts(self.local_space_position1.into(), self.constraint_to_body1)
    }

    fn get_constraint_to_body2_matrix(&self) -> Isometry3 {
        Isometry3::from_parts(self.local_space_position2.into(), self.constraint_to_body2)
    }

    fn save_state(&self, recorder: &mut StateRecorder) {
        match &self.translation_part {
            TranslationPart::AllFixedPoint(part) => part.save_state(recorder),
            TranslationPart::PerAxis(parts) => parts.iter().for_each(|part| part.save_state(recorder)),
        }

        match &self.rotation_part {
            RotationPart::AllFixedEuler(part) => part.save_state(recorder),
            RotationPart::SwingTwist(part) => part.save_state(recorder),
        }

        for part in &self.motor_translation_parts {
            part.save_state(recorder);
        }
        for part in &self.motor_rotation_parts {
            part.save_state(recorder);
        }
    }

    fn restore_state(&mut self, recorder: &mut StateRecorder) -> Result<()> {
        match &mut self.translation_part {
            TranslationPart::AllFixedPoint(part) => part.restore_state(recorder)?,
            TranslationPart::PerAxis(parts) => {
                for part in parts.iter_mut() {
                    part.restore_state(recorder)?;
                }
            }
        }

        match &mut self.rotation_part {
            RotationPart::AllFixedEuler(part) => part.restore_state(recorder)?,
            RotationPart::SwingTwist(part) => part.restore_state(recorder)?,
        }

        for part in &mut self.motor_translation_parts {
            part.restore_state(recorder)?;
        }
        for part in &mut self.motor_rotation_parts {
            part.restore_state(recorder)?;
        }

        debug!("Restored six DOF constraint state for {:?} and {:?}", self.body1, self.body2);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
