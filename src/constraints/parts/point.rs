use crate::bodies::RigidBody;
use crate::io::StateRecorder;
use crate::math::{Matrix3, Quaternion, Vector3};
use crate::Result;

/// Removes all three translational degrees of freedom: `C = p2 - p1`.
///
/// Solving the three axes together with a 3x3 effective mass converges in one iteration
/// for an isolated pair, which three independent axis parts cannot do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointConstraintPart {
    r1: Vector3,
    r2: Vector3,
    inv_i1: Matrix3,
    inv_i2: Matrix3,
    effective_mass: Option<Matrix3>,
    total_lambda: Vector3,
}

impl Default for PointConstraintPart {
    fn default() -> Self {
        Self {
            r1: Vector3::zeros(),
            r2: Vector3::zeros(),
            inv_i1: Matrix3::zeros(),
            inv_i2: Matrix3::zeros(),
            effective_mass: None,
            total_lambda: Vector3::zeros(),
        }
    }
}

impl PointConstraintPart {
    /// Computes lever arms and effective mass for the given body orientations.
    ///
    /// `local_r1`/`local_r2` are the attachment points relative to each center of mass in body space.
    pub fn calculate_constraint_properties(
        &mut self,
        body1: &RigidBody,
        rotation1: &Quaternion,
        local_r1: &Vector3,
        body2: &RigidBody,
        rotation2: &Quaternion,
        local_r2: &Vector3,
    ) {
        let m1 = rotation1.to_rotation_matrix();
        let m2 = rotation2.to_rotation_matrix();
        self.r1 = m1 * local_r1;
        self.r2 = m2 * local_r2;
        self.inv_i1 = body1.get_inverse_inertia_for_rotation(m1.matrix());
        self.inv_i2 = body2.get_inverse_inertia_for_rotation(m2.matrix());

        let summed_inv_mass = body1.get_inverse_mass() + body2.get_inverse_mass();
        let r1_x = self.r1.cross_matrix();
        let r2_x = self.r2.cross_matrix();
        let inv_effective_mass = Matrix3::identity() * summed_inv_mass
            + r1_x * self.inv_i1 * r1_x.transpose()
            + r2_x * self.inv_i2 * r2_x.transpose();

        match inv_effective_mass.try_inverse() {
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

        body1.add_linear_velocity_step(-lambda * body1.get_inverse_mass());
        body1.add_angular_velocity_step(-(self.inv_i1 * self.r1.cross(lambda)));
        body2.add_linear_velocity_step(lambda * body2.get_inverse_mass());
        body2.add_angular_velocity_step(self.inv_i2 * self.r2.cross(lambda));
        true
    }

    /// Applies the previous step's impulse, scaled by `ratio`
    pub fn warm_start(&mut self, body1: &mut RigidBody, body2: &mut RigidBody, ratio: f32) {
        self.total_lambda *= ratio;
        let lambda = self.total_lambda;
        self.apply_velocity_step(body1, body2, &lambda);
    }

    /// Drives the relative velocity of the two attachment points to zero
    pub fn solve_velocity_constraint(&mut self, body1: &mut RigidBody, body2: &mut RigidBody) -> bool {
        let Some(effective_mass) = self.effective_mass else {
            return false;
        };

        let jv = body1.get_linear_velocity() + body1.get_angular_velocity().cross(&self.r1)
            - body2.get_linear_velocity()
            - body2.get_angular_velocity().cross(&self.r2);
        let lambda = effective_mass * jv;
        self.total_lambda += lambda;

        self.apply_velocity_step(body1, body2, &lambda)
    }

    /// Pulls the attachment points together by `baumgarte` times their separation
    pub fn solve_position_constraint(&self, body1: &mut RigidBody, body2: &mut RigidBody, baumgarte: f32) -> bool {
        let Some(effective_mass) = self.effective_mass else {
            return false;
        };

        let separation = (body2.get_position() + self.r2) - (body1.get_position() + self.r1);
        if separation == Vector3::zeros() {
            return false;
        }

        let lambda = effective_mass * (-baumgarte * separation);
        body1.add_position_step(-lambda * body1.get_inverse_mass());
        body1.add_rotation_step(-(self.inv_i1 * self.r1.cross(&lambda)));
        body2.add_position_step(lambda * body2.get_inverse_mass());
        body2.add_rotation_step(self.inv_i2 * self.r2.cross(&lambda));
        true
    }

    /// Accumulated linear impulse
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
