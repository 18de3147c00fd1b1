use log::trace;

use crate::bodies::RigidBody;
use crate::constraints::{Constraint, SixDofConstraintSettings};
use crate::core::storage::Storage;
use crate::core::{BodyHandle, BodyStorage, ConstraintHandle, ConstraintStorage, SimulationConfig};
use crate::error::PhysicsError;
use crate::io::StateRecorder;
use crate::Result;

/// Owns bodies and constraints and advances them in time.
///
/// Each step integrates forces, then runs the constraint phases in their fixed order:
/// setup, warm start, velocity iterations, position integration, position iterations.
pub struct PhysicsWorld {
    /// All rigid bodies in the world
    bodies: BodyStorage<RigidBody>,

    /// All constraints in the world
    constraints: ConstraintStorage<Box<dyn Constraint>>,

    /// Configuration for the simulation
    config: SimulationConfig,

    /// The total elapsed simulation time
    time: f32,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Creates a new physics world with default settings
    pub fn new() -> Self {
        Self::with_config(SimulationConfig::default())
    }

    /// Creates a new physics world with the given configuration
    pub fn with_config(config: SimulationConfig) -> Self {
        Self {
            bodies: BodyStorage::new(),
            constraints: ConstraintStorage::new(),
            config,
            time: 0.0,
        }
    }

    /// Returns the current simulation time
    pub fn get_time(&self) -> f32 {
        self.time
    }

    /// Returns a reference to the simulation configuration
    pub fn get_config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Returns a mutable reference to the simulation configuration
    pub fn get_config_mut(&mut self) -> &mut SimulationConfig {
        &mut self.config
    }

    /// Adds a rigid body to the world and returns its handle
    pub fn add_body(&mut self, body: RigidBody) -> BodyHandle {
        self.bodies.add(body)
    }

    /// Removes a rigid body and every constraint attached to it
    pub fn remove_body(&mut self, handle: BodyHandle) -> Result<RigidBody> {
        self.bodies.get_body(handle)?;

        let attached: Vec<ConstraintHandle> = self
            .constraints
            .handles()
            .into_iter()
            .filter(|&c| {
                self.constraints
                    .get(c)
                    .map_or(false, |constraint| constraint.involves_body(handle))
            })
            .collect();
        for c in attached {
            self.constraints.remove(c);
        }

        self.bodies
            .remove(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("Body with handle {:?} not found", handle)))
    }

    /// Gets a reference to a rigid body by its handle
    pub fn get_body(&self, handle: BodyHandle) -> Result<&RigidBody> {
        self.bodies.get_body(handle)
    }

    /// Gets a mutable reference to a rigid body by its handle
    pub fn get_body_mut(&mut self, handle: BodyHandle) -> Result<&mut RigidBody> {
        self.bodies.get_body_mut(handle)
    }

    /// Gets mutable references to two different bodies
    pub fn get_body_pair_mut(&mut self, first: BodyHandle, second: BodyHandle) -> Result<(&mut RigidBody, &mut RigidBody)> {
        self.bodies.get_pair_mut(first, second)
    }

    /// Adds a constraint; both of its bodies must exist and be distinct
    pub fn add_constraint(&mut self, constraint: Box<dyn Constraint>) -> Result<ConstraintHandle> {
        let [body1, body2] = constraint.get_bodies();
        self.bodies.get_pair_mut(body1, body2)?;
        Ok(self.constraints.add(constraint))
    }

    /// Creates a six DOF constraint from settings using the bodies' current poses
    pub fn create_six_dof_constraint(
        &mut self,
        settings: &SixDofConstraintSettings,
        body1: BodyHandle,
        body2: BodyHandle,
    ) -> Result<ConstraintHandle> {
        let (b1, b2) = self.bodies.get_pair_mut(body1, body2)?;
        let constraint = settings.create(b1, b2, body1, body2);
        Ok(self.constraints.add(Box::new(constraint)))
    }

    /// Removes a constraint from the world
    pub fn remove_constraint(&mut self, handle: ConstraintHandle) -> Result<Box<dyn Constraint>> {
        self.constraints.get_constraint(handle)?;
        self.constraints
            .remove(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("Constraint with handle {:?} not found", handle)))
    }

    /// Gets a reference to a constraint by its handle
    pub fn get_constraint(&self, handle: ConstraintHandle) -> Result<&dyn Constraint> {
        self.constraints.get_constraint(handle).map(|c| &**c)
    }

    /// Gets a mutable reference to a constraint by its handle
    pub fn get_constraint_mut(&mut self, handle: ConstraintHandle) -> Result<&mut dyn Constraint> {
        self.constraints.get_constraint_mut(handle).map(|c| &mut **c)
    }

    /// Gets a constraint downcast to its concrete type
    pub fn get_constraint_as<T: Constraint>(&self, handle: ConstraintHandle) -> Result<&T> {
        self.get_constraint(handle)?
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| PhysicsError::InvalidParameter(format!("Constraint {:?} has a different type", handle)))
    }

    /// Gets a constraint mutably, downcast to its concrete type
    pub fn get_constraint_as_mut<T: Constraint>(&mut self, handle: ConstraintHandle) -> Result<&mut T> {
        self.get_constraint_mut(handle)?
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or_else(|| PhysicsError::InvalidParameter(format!("Constraint {:?} has a different type", handle)))
    }

    /// Returns the number of bodies in the world
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Returns the number of constraints in the world
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Writes the accumulated impulses of every constraint, in insertion order
    pub fn save_state(&self, recorder: &mut StateRecorder) {
        for constraint in self.constraints.iter() {
            constraint.save_state(recorder);
        }
    }

    /// Reads impulses written by `save_state` into constraints created in the same order
    pub fn restore_state(&mut self, recorder: &mut StateRecorder) -> Result<()> {
        for constraint in self.constraints.iter_mut() {
            constraint.restore_state(recorder)?;
        }
        Ok(())
    }

    /// Advances the simulation by `dt`
    pub fn step(&mut self, dt: f32) -> Result<()> {
        let config = self.config.clone();

        for (_, body) in self.bodies.iter_mut() {
            body.integrate_forces(dt, config.gravity, config.linear_damping, config.angular_damping);
        }

        for constraint in self.constraints.iter_mut() {
            let [h1, h2] = constraint.get_bodies();
            let (body1, body2) = self.bodies.get_pair_mut(h1, h2)?;
            constraint.setup_velocity_constraint(dt, body1, body2);
        }

        for constraint in self.constraints.iter_mut() {
            let [h1, h2] = constraint.get_bodies();
            let (body1, body2) = self.bodies.get_pair_mut(h1, h2)?;
            constraint.warm_start_velocity_constraint(config.warm_start_impulse_ratio, body1, body2);
        }

        for iteration in 0..config.velocity_iterations {
            let mut applied = false;
            for constraint in self.constraints.iter_mut() {
                let [h1, h2] = constraint.get_bodies();
                let (body1, body2) = self.bodies.get_pair_mut(h1, h2)?;
                applied |= constraint.solve_velocity_constraint(dt, body1, body2);
            }
            if !applied {
                trace!("Velocity solver converged after {} iterations", iteration);
                break;
            }
        }

        for (_, body) in self.bodies.iter_mut() {
            body.integrate_velocity(dt);
        }

        for iteration in 0..config.position_iterations {
            let mut applied = false;
            for constraint in self.constraints.iter_mut() {
                let [h1, h2] = constraint.get_bodies();
                let (body1, body2) = self.bodies.get_pair_mut(h1, h2)?;
                applied |= constraint.solve_position_constraint(dt, config.baumgarte, body1, body2);
            }
            if !applied {
                trace!("Position solver converged after {} iterations", iteration);
                break;
            }
        }

        self.time += dt;
        Ok(())
    }
}
