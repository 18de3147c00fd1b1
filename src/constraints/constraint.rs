use crate::bodies::RigidBody;
use crate::core::BodyHandle;
use crate::io::StateRecorder;
use crate::math::Isometry3;
use crate::Result;
use std::any::Any;

/// Concrete kind of a two body constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintSubType {
    SixDof,
}

/// Base trait for constraints between two bodies.
///
/// The constraint only stores body handles; the simulation loop looks the bodies up and
/// passes them to every phase. Per step the phases run in order: setup, warm start,
/// velocity iterations, position iterations.
pub trait Constraint: Send + Sync + 'static {
    /// Returns the kind of the constraint
    fn constraint_type(&self) -> ConstraintSubType;

    /// Returns the two bodies involved in the constraint
    fn get_bodies(&self) -> [BodyHandle; 2];

    /// Checks if the constraint involves a specific body
    fn involves_body(&self, body: BodyHandle) -> bool {
        self.get_bodies().contains(&body)
    }

    /// Computes world space axes and effective masses for this step
    fn setup_velocity_constraint(&mut self, dt: f32, body1: &RigidBody, body2: &RigidBody);

    /// Applies the impulses of the previous step, scaled by `ratio`
    fn warm_start_velocity_constraint(&mut self, ratio: f32, body1: &mut RigidBody, body2: &mut RigidBody);

    /// Runs one velocity iteration; returns true if any impulse was applied
    fn solve_velocity_constraint(&mut self, dt: f32, body1: &mut RigidBody, body2: &mut RigidBody) -> bool;

    /// Runs one position iteration; returns true if any correction was applied
    fn solve_position_constraint(
        &mut self,
        dt: f32,
        baumgarte: f32,
        body1: &mut RigidBody,
        body2: &mut RigidBody,
    ) -> bool;

    /// Transform from the constraint frame to body 1's center of mass space
    fn get_constraint_to_body1_matrix(&self) -> Isometry3;

    /// Transform from the constraint frame to body 2's center of mass space
    fn get_constraint_to_body2_matrix(&self) -> Isometry3;

    /// Writes the accumulated impulses
    fn save_state(&self, recorder: &mut StateRecorder);

    /// Reads impulses written by `save_state`
    fn restore_state(&mut self, recorder: &mut StateRecorder) -> Result<()>;

    /// Returns a dynamic reference to any for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Returns a dynamic mutable reference to any for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
