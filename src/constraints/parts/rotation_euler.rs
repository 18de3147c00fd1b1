use crate::bodies::RigidBody;
use crate::io::StateRecorder;
use crate::math::{self, Matrix3, Quaternion, Vector3};
use crate::Result;

/// Locks all three rotational degrees of freedom between two bodies.
///
/// Velocity level: `w1 - w2 = 0`. Position level: the relative rotation must stay equal to
/// the one captured by `inv_initial_orientation`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationEulerConstraintPart {
    inv_i1: Matrix3,
    inv_i2: Matrix3,
    effective_mass: Option<Matrix3>,
    total_lambda: Vector3,
}

impl Default for RotationEulerConstraintPart {
    fn default() -> Self {
        Self {
            inv_i1: Matrix3::zeros(),
            inv_i2: Matrix3::zeros(),
            effective_mass: None,
            total_lambda: Vector3::zeros(),
        }
    }
}

impl RotationEulerConstraintPart {
    /// Inverse of the rest relative rotation: `constraint_to_body2 * constraint_to_body1^-1`.
    ///
    /// With it `q2 * inv_initial * q1^-1` is the identity whenever both constraint frames coincide.
    pub fn get_inv_initial_orientation(constraint_to_body1: &Quaternion, constraint_to_body2: &Quaternion) -> Quaternion {
        constraint_to_body2 * constraint_to_body1.inverse()
    }

    /// Computes the 3x3 effective mass for the current body orientations
    pub fn calculate_constraint_properties(
        &mut self,
        body1: &RigidBody,
        rotation1: &Quaternion,
        body2: &RigidBody,
        rotation2: &Quaternion,
    ) {
        self.inv_i1 = body1.get_inverse_inertia_for_rotation(rotation1.to_rotation_matrix().matrix());
        self.inv_i2 = body2.get_inverse_inertia_for_rotation(rotation2.to_rotation_matrix().matrix());

        match (self.inv_i1 + self.inv_i2).try_inverse() {
            Some(effective_mass) => self.effective_mass = Some(effective_mass),
            None => self.deactivate(),
        }
    }

    /// Disables the part and clears its impulse
    pub fn deactivate(&mut self) {
        self.effective_mass = None;
        self.total_lambda = Vector3::zeros();
    }

    /// True when the part takes part in this step
    #[inline]
    pub fn is_active(&self) -> bool {
        self.effective_mass.is_some()
    }

    fn apply_velocity_step(&self, body1: &mut RigidBody, body2: &mut RigidBody, lambda: &Vector3) -> bool {
        if *lambda == Vector3::zeros() {
            return false;
        }

        body1.add_angular_velocity_step(-(self.inv_i1 * lambda));
        body2.add_angular_velocity_step(self.inv_i2 * lambda);
        true
    }

    /// Applies the previous step's impulse, scaled by `ratio`
    pub fn warm_start(&mut self, body1: &mut RigidBody, body2: &mut RigidBody, ratio: f32) {
        self.total_lambda *= ratio;
        let lambda = self.total_lambda;
        self.apply_velocity_step(body1, body2, &lambda);
    }

    /// Drives the relative angular velocity to zero; returns true if an impulse was applied
    pub fn solve_velocity_constraint(&mut self, body1: &mut RigidBody, body2: &mut RigidBody) -> bool {
        let Some(effective_mass) = self.effective_mass else {
            return false;
        };

        let lambda = effective_mass * (body1.get_angular_velocity() - body2.get_angular_velocity());
        self.total_lambda += lambda;

        self.apply_velocity_step(body1, body2, &lambda)
    }

    /// Rotates the bodies back towards the relative orientation described by `inv_initial_orientation`
    pub fn solve_position_constraint(
        &self,
        body1: &mut RigidBody,
        body2: &mut RigidBody,
        inv_initial_orientation: &Quaternion,
        baumgarte: f32,
    ) -> bool {
        let Some(effective_mass) = self.effective_mass else {
            return false;
        };

        let diff = body2.get_rotation() * inv_initial_orientation * body1.get_rotation().inverse();
        let error = 2.0 * math::quat_xyz(&math::ensure_w_positive(&diff));
        if error == Vector3::zeros() {
            return false;
        }

        let lambda = -baumgarte * (effective_mass * error);
        body1.add_rotation_step(-(self.inv_i1 * lambda));
        body2.add_rotation_step(self.inv_i2 * lambda);
        true
    }

    /// Accumulated angular impulse
    #[inline]
    pub fn get_total_lambda(&self) -> Vector3 {
        self.total_lambda
    }

    /// Writes the accumulated impulse
    pub fn save_state(&self, recorder: &mut StateRecorder) {
        recorder.write_vec3(&self.total_lambda);
    }

    /// Reads an impulse written by `save_state`
    pub fn restore_state(&mut self, recorder: &mut StateRecorder) -> Result<()> {
        self.total_lambda = recorder.read_vec3()?;
        Ok(())
    }
}
