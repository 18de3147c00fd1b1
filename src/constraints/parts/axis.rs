use crate::bodies::RigidBody;
use crate::constraints::parts::SpringPart;
use crate::constraints::SpringSettings;
use crate::io::StateRecorder;
use crate::math::{self, Vector3};
use crate::Result;

/// Removes one translational degree of freedom along a world space axis.
///
/// The constraint equation is `C = (p2 - p1) . n`, with `p1 = x1 + r1`, `p2 = x2 + r2`
/// and `u = p2 - p1`. Its Jacobian is `[-n, -(r1 + u) x n, n, r2 x n]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisConstraintPart {
    r1_plus_u_x_axis: Vector3,
    r2_x_axis: Vector3,
    inv_i1_r1_plus_u_x_axis: Vector3,
    inv_i2_r2_x_axis: Vector3,
    effective_mass: f32,
    spring_part: SpringPart,
    total_lambda: f32,
}

impl Default for AxisConstraintPart {
    fn default() -> Self {
        Self {
            r1_plus_u_x_axis: Vector3::zeros(),
            r2_x_axis: Vector3::zeros(),
            inv_i1_r1_plus_u_x_axis: Vector3::zeros(),
            inv_i2_r2_x_axis: Vector3::zeros(),
            effective_mass: 0.0,
            spring_part: SpringPart::default(),
            total_lambda: 0.0,
        }
    }
}

impl AxisConstraintPart {
    fn calculate_inverse_effective_mass(
        &mut self,
        body1: &RigidBody,
        r1_plus_u: &Vector3,
        body2: &RigidBody,
        r2: &Vector3,
        axis: &Vector3,
    ) -> f32 {
        self.r1_plus_u_x_axis = r1_plus_u.cross(axis);
        self.r2_x_axis = r2.cross(axis);
        self.inv_i1_r1_plus_u_x_axis = body1.get_inverse_inertia_world() * self.r1_plus_u_x_axis;
        self.inv_i2_r2_x_axis = body2.get_inverse_inertia_world() * self.r2_x_axis;

        body1.get_inverse_mass()
            + self.r1_plus_u_x_axis.dot(&self.inv_i1_r1_plus_u_x_axis)
            + body2.get_inverse_mass()
            + self.r2_x_axis.dot(&self.inv_i2_r2_x_axis)
    }

    /// Rigid constraint, used for limits and friction
    pub fn calculate_constraint_properties(
        &mut self,
        body1: &RigidBody,
        r1_plus_u: &Vector3,
        body2: &RigidBody,
        r2: &Vector3,
        axis: &Vector3,
    ) {
        self.calculate_constraint_properties_with_bias(body1, r1_plus_u, body2, r2, axis, 0.0);
    }

    /// Rigid constraint with a velocity bias; a bias of `-v` drives the relative velocity to `v`
    pub fn calculate_constraint_properties_with_bias(
        &mut self,
        body1: &RigidBody,
        r1_plus_u: &Vector3,
        body2: &RigidBody,
        r2: &Vector3,
        axis: &Vector3,
        bias: f32,
    ) {
        let inv_effective_mass = self.calculate_inverse_effective_mass(body1, r1_plus_u, body2, r2, axis);
        self.effective_mass = self.spring_part.calculate_rigid(inv_effective_mass, bias);
    }

    /// Soft constraint pulling the position error `c` to zero through a spring
    #[allow(clippy::too_many_arguments)]
    pub fn calculate_constraint_properties_with_spring(
        &mut self,
        dt: f32,
        body1: &RigidBody,
        r1_plus_u: &Vector3,
        body2: &RigidBody,
        r2: &Vector3,
        axis: &Vector3,
        c: f32,
        spring: &SpringSettings,
    ) {
        let inv_effective_mass = self.calculate_inverse_effective_mass(body1, r1_plus_u, body2, r2, axis);
        self.effective_mass = self.spring_part.calculate_spring(dt, inv_effective_mass, c, spring);
    }

    /// Turns the part off and forgets the accumulated impulse
    pub fn deactivate(&mut self) {
        self.effective_mass = 0.0;
        self.total_lambda = 0.0;
    }

    /// True when the part takes part in this step
    #[inline]
    pub fn is_active(&self) -> bool {
        self.effective_mass != 0.0
    }

    fn apply_velocity_step(&self, body1: &mut RigidBody, body2: &mut RigidBody, axis: &Vector3, lambda: f32) -> bool {
        if lambda == 0.0 {
            return false;
        }

        body1.add_linear_velocity_step(-axis * (lambda * body1.get_inverse_mass()));
        body1.add_angular_velocity_step(-self.inv_i1_r1_plus_u_x_axis * lambda);
        body2.add_linear_velocity_step(axis * (lambda * body2.get_inverse_mass()));
        body2.add_angular_velocity_step(self.inv_i2_r2_x_axis * lambda);
        true
    }

    /// Re-applies the scaled impulse of the previous step
    pub fn warm_start(&mut self, body1: &mut RigidBody, body2: &mut RigidBody, axis: &Vector3, ratio: f32) {
        self.total_lambda *= ratio;
        self.apply_velocity_step(body1, body2, axis, self.total_lambda);
    }

    /// One Gauss-Seidel iteration, keeping the accumulated impulse in `[min_lambda, max_lambda]`
    pub fn solve_velocity_constraint(
        &mut self,
        body1: &mut RigidBody,
        body2: &mut RigidBody,
        axis: &Vector3,
        min_lambda: f32,
        max_lambda: f32,
    ) -> bool {
        let jv = axis.dot(&(body1.get_linear_velocity() - body2.get_linear_velocity()))
            + self.r1_plus_u_x_axis.dot(&body1.get_angular_velocity())
            - self.r2_x_axis.dot(&body2.get_angular_velocity());

        let lambda = self.effective_mass * (jv - self.spring_part.get_bias(self.total_lambda));
        let new_lambda = math::clamp(self.total_lambda + lambda, min_lambda, max_lambda);
        let lambda = new_lambda - self.total_lambda;
        self.total_lambda = new_lambda;

        self.apply_velocity_step(body1, body2, axis, lambda)
    }

    /// Moves the bodies to remove `baumgarte * c` of the position error
    pub fn solve_position_constraint(
        &self,
        body1: &mut RigidBody,
        body2: &mut RigidBody,
        axis: &Vector3,
        c: f32,
        baumgarte: f32,
    ) -> bool {
        if c == 0.0 || !self.is_active() || self.spring_part.is_active() {
            return false;
        }

        let lambda = -self.effective_mass * baumgarte * c;

        body1.add_position_step(-axis * (lambda * body1.get_inverse_mass()));
        body1.add_rotation_step(-self.inv_i1_r1_plus_u_x_axis * lambda);
        body2.add_position_step(axis * (lambda * body2.get_inverse_mass()));
        body2.add_rotation_step(self.inv_i2_r2_x_axis * lambda);
        true
    }

    /// Accumulated impulse of the last step
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
