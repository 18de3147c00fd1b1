use crate::bodies::RigidBody;
use crate::constraints::parts::SpringPart;
use crate::constraints::SpringSettings;
use crate::io::StateRecorder;
use crate::math::{self, Vector3};
use crate::Result;

/// Removes one rotational degree of freedom around a world space axis.
///
/// Jacobian `[0, -a, 0, a]`: only the angular velocities take part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleConstraintPart {
    inv_i1_axis: Vector3,
    inv_i2_axis: Vector3,
    effective_mass: f32,
    spring_part: SpringPart,
    total_lambda: f32,
}

impl Default for AngleConstraintPart {
    fn default() -> Self {
        Self {
            inv_i1_axis: Vector3::zeros(),
            inv_i2_axis: Vector3::zeros(),
            effective_mass: 0.0,
            spring_part: SpringPart::default(),
            total_lambda: 0.0,
        }
    }
}

impl AngleConstraintPart {
    fn calculate_inverse_effective_mass(&mut self, body1: &RigidBody, body2: &RigidBody, axis: &Vector3) -> f32 {
        self.inv_i1_axis = body1.get_inverse_inertia_world() * axis;
        self.inv_i2_axis = body2.get_inverse_inertia_world() * axis;
        axis.dot(&(self.inv_i1_axis + self.inv_i2_axis))
    }

    /// Rigid constraint, used for limits and friction
    pub fn calculate_constraint_properties(&mut self, body1: &RigidBody, body2: &RigidBody, axis: &Vector3) {
        self.calculate_constraint_properties_with_bias(body1, body2, axis, 0.0);
    }

    /// Rigid constraint with a velocity bias; a bias of `-w` drives the relative angular velocity to `w`
    pub fn calculate_constraint_properties_with_bias(
        &mut self,
        body1: &RigidBody,
        body2: &RigidBody,
        axis: &Vector3,
        bias: f32,
    ) {
        let inv_effective_mass = self.calculate_inverse_effective_mass(body1, body2, axis);
        self.effective_mass = self.spring_part.calculate_rigid(inv_effective_mass, bias);
    }

    /// Soft constraint pulling the angle error `c` to zero through a spring
    pub fn calculate_constraint_properties_with_spring(
        &mut self,
        dt: f32,
        body1: &RigidBody,
        body2: &RigidBody,
        axis: &Vector3,
        c: f32,
        spring: &SpringSettings,
    ) {
        let inv_effective_mass = self.calculate_inverse_effective_mass(body1, body2, axis);
        self.effective_mass = self.spring_part.calculate_spring(dt, inv_effective_mass, c, spring);
    }

    /// Disables the part and clears its impulse
    pub fn deactivate(&mut self) {
        self.effective_mass = 0.0;
        self.total_lambda = 0.0;
    }

    /// True when the part takes part in this step
    #[inline]
    pub fn is_active(&self) -> bool {
        self.effective_mass != 0.0
    }

    fn apply_velocity_step(&self, body1: &mut RigidBody, body2: &mut RigidBody, lambda: f32) -> bool {
        if lambda == 0.0 {
            return false;
        }

        body1.add_angular_velocity_step(-self.inv_i1_axis * lambda);
        body2.add_angular_velocity_step(self.inv_i2_axis * lambda);
        true
    }

    /// Applies the previous step's impulse, scaled by `ratio`
    pub fn warm_start(&mut self, body1: &mut RigidBody, body2: &mut RigidBody, ratio: f32) {
        self.total_lambda *= ratio;
        self.apply_velocity_step(body1, body2, self.total_lambda);
    }

    /// Solves one iteration with the accumulated impulse clamped to `[min_lambda, max_lambda]`
    pub fn solve_velocity_constraint(
        &mut self,
        body1: &mut RigidBody,
        body2: &mut RigidBody,
        axis: &Vector3,
        min_lambda: f32,
        max_lambda: f32,
    ) -> bool {
        let jv = axis.dot(&(body1.get_angular_velocity() - body2.get_angular_velocity()));

        let lambda = self.effective_mass * (jv - self.spring_part.get_bias(self.total_lambda));
        let new_lambda = math::clamp(self.total_lambda + lambda, min_lambda, max_lambda);
        let lambda = new_lambda - self.total_lambda;
        self.total_lambda = new_lambda;

        self.apply_velocity_step(body1, body2, lambda)
    }

    /// Rotates the bodies to remove a fraction `baumgarte` of the angle error `c`
    pub fn solve_position_constraint(&self, body1: &mut RigidBody, body2: &mut RigidBody, c: f32, baumgarte: f32) -> bool {
        if c == 0.0 || !self.is_active() || self.spring_part.is_active() {
            return false;
        }

        let lambda = -self.effective_mass * baumgarte * c;
        body1.add_rotation_step(-self.inv_i1_axis * lambda);
        body2.add_rotation_step(self.inv_i2_axis * lambda);
        true
    }

    /// Accumulated angular impulse
    #[inline]
    pub fn get_total_lambda(&self) -> f32 {
        self.total_lambda
    }

    /// Writes the accumulated impulse
    pub fn save_state(&self, recorder: &mut StateRecorder) {
        recorder.write_f32(self.total_lambda);
    }

    /// Reads an impulse written by `save_state`
    pub fn restore_state(&mut self, recorder: &mut StateRecorder) -> Result<()> {
        self.total_lambda = recorder.read_f32()?;
        Ok(())
    }
}
