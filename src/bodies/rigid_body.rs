use crate::bodies::RigidBodyType;
use crate::math::{self, Isometry3, Matrix3, Quaternion, Vector3};

/// A rigid body as seen by the constraint solver.
///
/// Positions are those of the center of mass. Velocities and poses are advanced by the
/// owning simulation loop; constraints only read them and apply velocity or position steps.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    /// Center of mass position in world space
    position: Vector3,

    /// Orientation in world space
    rotation: Quaternion,

    /// The body's linear velocity
    linear_velocity: Vector3,

    /// The body's angular velocity (world space)
    angular_velocity: Vector3,

    /// The body's type (dynamic, kinematic, or static)
    body_type: RigidBodyType,

    /// The body's mass
    mass: f32,

    /// Inverse of the body's mass, zero for non dynamic bodies
    inv_mass: f32,

    /// Inverse of the body's inertia tensor in local space
    inv_inertia_local: Matrix3,

    /// Force accumulated for the next integration step
    force: Vector3,

    /// Torque accumulated for the next integration step
    torque: Vector3,
}

impl RigidBody {
    /// Creates a new rigid body with the given mass properties
    pub fn new(
        position: Vector3,
        rotation: Quaternion,
        body_type: RigidBodyType,
        mass: f32,
        inertia: Matrix3,
    ) -> Self {
        let mut body = Self {
            position,
            rotation,
            linear_velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            body_type,
            mass: 0.0,
            inv_mass: 0.0,
            inv_inertia_local: Matrix3::zeros(),
            force: Vector3::zeros(),
            torque: Vector3::zeros(),
        };

        body.set_mass_properties(mass, inertia);
        body
    }

    /// Creates a dynamic body with a diagonal inertia tensor
    pub fn new_dynamic(position: Vector3, mass: f32, inertia_diagonal: Vector3) -> Self {
        Self::new(
            position,
            Quaternion::identity(),
            RigidBodyType::Dynamic,
            mass,
            Matrix3::from_diagonal(&inertia_diagonal),
        )
    }

    /// Creates a dynamic solid sphere
    pub fn sphere(position: Vector3, radius: f32, mass: f32) -> Self {
        let i = 0.4 * mass * radius * radius;
        Self::new_dynamic(position, mass, Vector3::new(i, i, i))
    }

    /// Creates a dynamic solid box from its half extents
    pub fn cuboid(position: Vector3, half_extents: Vector3, mass: f32) -> Self {
        let size = half_extents * 2.0;
        let (x2, y2, z2) = (size.x * size.x, size.y * size.y, size.z * size.z);
        let inertia = Vector3::new(y2 + z2, x2 + z2, x2 + y2) * (mass / 12.0);
        Self::new_dynamic(position, mass, inertia)
    }

    /// Creates a static body that never moves
    pub fn new_static(position: Vector3) -> Self {
        Self::new(position, Quaternion::identity(), RigidBodyType::Static, 0.0, Matrix3::zeros())
    }

    /// Creates a kinematic body, moved only through its velocity
    pub fn new_kinematic(position: Vector3) -> Self {
        Self::new(position, Quaternion::identity(), RigidBodyType::Kinematic, 0.0, Matrix3::zeros())
    }

    /// Returns the body with its orientation replaced
    pub fn with_rotation(mut self, rotation: Quaternion) -> Self {
        self.rotation = rotation;
        self
    }

    /// Updates mass and inertia; non dynamic bodies keep zero inverse mass
    pub fn set_mass_properties(&mut self, mass: f32, inertia: Matrix3) {
        self.mass = mass;

        if self.body_type.is_dynamic() && mass > 0.0 {
            self.inv_mass = 1.0 / mass;
            self.inv_inertia_local = inertia.try_inverse().unwrap_or_else(Matrix3::zeros);
        } else {
            self.inv_mass = 0.0;
            self.inv_inertia_local = Matrix3::zeros();
        }
    }

    /// Returns the center of mass position
    pub fn get_position(&self) -> Vector3 {
        self.position
    }

    /// Sets the center of mass position
    pub fn set_position(&mut self, position: Vector3) {
        self.position = position;
    }

    /// Returns the body's orientation
    pub fn get_rotation(&self) -> Quaternion {
        self.rotation
    }

    /// Sets the body's orientation
    pub fn set_rotation(&mut self, rotation: Quaternion) {
        self.rotation = rotation;
    }

    /// Transform from the body's local space to world space
    pub fn get_center_of_mass_transform(&self) -> Isometry3 {
        Isometry3::from_parts(self.position.into(), self.rotation)
    }

    /// Returns the body's linear velocity
    pub fn get_linear_velocity(&self) -> Vector3 {
        self.linear_velocity
    }

    /// Sets the body's linear velocity
    pub fn set_linear_velocity(&mut self, velocity: Vector3) {
        self.linear_velocity = velocity;
    }

    /// Returns the body's angular velocity
    pub fn get_angular_velocity(&self) -> Vector3 {
        self.angular_velocity
    }

    /// Sets the body's angular velocity
    pub fn set_angular_velocity(&mut self, velocity: Vector3) {
        self.angular_velocity = velocity;
    }

    /// Returns the body type
    pub fn get_body_type(&self) -> RigidBodyType {
        self.body_type
    }

    /// Returns true if constraint impulses affect this body
    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.body_type.is_dynamic()
    }

    /// Returns the body's mass
    pub fn get_mass(&self) -> f32 {
        self.mass
    }

    /// Returns the body's inverse mass
    pub fn get_inverse_mass(&self) -> f32 {
        self.inv_mass
    }

    /// Inverse inertia tensor in world space for the current orientation
    pub fn get_inverse_inertia_world(&self) -> Matrix3 {
        let rotation = self.rotation.to_rotation_matrix();
        self.get_inverse_inertia_for_rotation(rotation.matrix())
    }

    /// Inverse inertia tensor in world space for an arbitrary orientation `R`: `R * I^-1 * R^T`
    pub fn get_inverse_inertia_for_rotation(&self, rotation: &Matrix3) -> Matrix3 {
        rotation * self.inv_inertia_local * rotation.transpose()
    }

    /// Adds a velocity change to a dynamic body
    #[inline]
    pub fn add_linear_velocity_step(&mut self, delta: Vector3) {
        if self.is_dynamic() {
            self.linear_velocity += delta;
        }
    }

    /// Adds an angular velocity change to a dynamic body
    #[inline]
    pub fn add_angular_velocity_step(&mut self, delta: Vector3) {
        if self.is_dynamic() {
            self.angular_velocity += delta;
        }
    }

    /// Moves a dynamic body's center of mass
    #[inline]
    pub fn add_position_step(&mut self, delta: Vector3) {
        if self.is_dynamic() {
            self.position += delta;
        }
    }

    /// Rotates a dynamic body by a world space rotation vector
    #[inline]
    pub fn add_rotation_step(&mut self, delta: Vector3) {
        if self.is_dynamic() {
            self.rotation = math::rotation_step(&self.rotation, &delta);
        }
    }

    /// Applies an impulse at the center of mass
    pub fn apply_linear_impulse(&mut self, impulse: Vector3) {
        let delta = impulse * self.inv_mass;
        self.add_linear_velocity_step(delta);
    }

    /// Applies an angular impulse (world space)
    pub fn apply_angular_impulse(&mut self, impulse: Vector3) {
        let delta = self.get_inverse_inertia_world() * impulse;
        self.add_angular_velocity_step(delta);
    }

    /// Accumulates a force for the next integration step
    pub fn apply_force(&mut self, force: Vector3) {
        if self.is_dynamic() {
            self.force += force;
        }
    }

    /// Accumulates a torque for the next integration step
    pub fn apply_torque(&mut self, torque: Vector3) {
        if self.is_dynamic() {
            self.torque += torque;
        }
    }

    /// Integrates gravity and accumulated forces into velocities, then clears the forces
    pub fn integrate_forces(&mut self, dt: f32, gravity: Vector3, linear_damping: f32, angular_damping: f32) {
        if !self.is_dynamic() {
            return;
        }

        self.linear_velocity += (gravity + self.force * self.inv_mass) * dt;
        self.angular_velocity += self.get_inverse_inertia_world() * self.torque * dt;

        self.linear_velocity *= 1.0 - (linear_damping * dt).clamp(0.0, 1.0);
        self.angular_velocity *= 1.0 - (angular_damping * dt).clamp(0.0, 1.0);

        self.force = Vector3::zeros();
        self.torque = Vector3::zeros();
    }

    /// Integrates velocities into the pose
    pub fn integrate_velocity(&mut self, dt: f32) {
        if self.body_type == RigidBodyType::Static {
            return;
        }

        self.position += self.linear_velocity * dt;
        self.rotation = math::rotation_step(&self.rotation, &(self.angular_velocity * dt));
    }
}
