use approx::assert_relative_eq;
use rand::{rngs::StdRng, Rng, SeedableRng};
use sixdof_joint::{
    math::{self, Quaternion, Vector3},
    BodyHandle, Constraint, MotorState, PhysicsWorld, RigidBody, SimulationConfig, SixDofAxis,
    SixDofConstraint, SixDofConstraintSettings,
};

const DT: f32 = 1.0 / 60.0;

fn random_vector(rng: &mut StdRng, range: f32) -> Vector3 {
    Vector3::new(
        rng.gen_range(-range..range),
        rng.gen_range(-range..range),
        rng.gen_range(-range..range),
    )
}

fn zero_gravity_world() -> PhysicsWorld {
    PhysicsWorld::with_config(SimulationConfig {
        gravity: Vector3::zeros(),
        ..SimulationConfig::default()
    })
}

fn handles() -> (BodyHandle, BodyHandle) {
    (BodyHandle::from_raw(1), BodyHandle::from_raw(2))
}

#[test]
fn test_free_axes_apply_no_impulse() {
    let mut rng = StdRng::seed_from_u64(42);
    let (h1, h2) = handles();

    for _ in 0..50 {
        let mut body1 = RigidBody::cuboid(random_vector(&mut rng, 2.0), Vector3::new(0.5, 0.5, 0.5), 2.0);
        let mut body2 = RigidBody::sphere(random_vector(&mut rng, 2.0), 0.5, 1.0);

        let settings = SixDofConstraintSettings::at_world_position(random_vector(&mut rng, 2.0));
        let mut constraint = settings.create(&body1, &body2, h1, h2);

        body1.set_linear_velocity(random_vector(&mut rng, 10.0));
        body1.set_angular_velocity(random_vector(&mut rng, 10.0));
        body2.set_linear_velocity(random_vector(&mut rng, 10.0));
        body2.set_angular_velocity(random_vector(&mut rng, 10.0));
        let (v1, w1, v2, w2) = (
            body1.get_linear_velocity(),
            body1.get_angular_velocity(),
            body2.get_linear_velocity(),
            body2.get_angular_velocity(),
        );

        constraint.setup_velocity_constraint(DT, &body1, &body2);
        constraint.warm_start_velocity_constraint(1.0, &mut body1, &mut body2);
        for _ in 0..10 {
            assert!(!constraint.solve_velocity_constraint(DT, &mut body1, &mut body2));
        }
        assert!(!constraint.solve_position_constraint(DT, 0.2, &mut body1, &mut body2));

        assert_eq!(body1.get_linear_velocity(), v1);
        assert_eq!(body1.get_angular_velocity(), w1);
        assert_eq!(body2.get_linear_velocity(), v2);
        assert_eq!(body2.get_angular_velocity(), w2);
        assert_eq!(constraint.get_total_lambda_position(), Vector3::zeros());
        assert_eq!(constraint.get_total_lambda_rotation(), Vector3::zeros());
    }
}

#[test]
fn test_limited_axis_inside_range_is_idle() {
    let mut rng = StdRng::seed_from_u64(7);
    let (h1, h2) = handles();

    let mut body1 = RigidBody::new_static(Vector3::new(-1.0, 0.0, 0.0));
    let mut body2 = RigidBody::sphere(Vector3::zeros(), 0.5, 1.0);

    let mut settings = SixDofConstraintSettings::at_world_position(Vector3::zeros());
    settings.set_limited_axis(SixDofAxis::TranslationX, -0.5, 0.5);
    settings.set_limited_axis(SixDofAxis::TranslationY, -0.5, 0.5);
    settings.set_limited_axis(SixDofAxis::RotationX, -0.5, 0.5);
    let mut constraint = settings.create(&body1, &body2, h1, h2);

    for _ in 0..20 {
        body2.set_linear_velocity(random_vector(&mut rng, 5.0));
        body2.set_angular_velocity(random_vector(&mut rng, 5.0));
        let (v2, w2) = (body2.get_linear_velocity(), body2.get_angular_velocity());

        constraint.setup_velocity_constraint(DT, &body1, &body2);
        constraint.warm_start_velocity_constraint(1.0, &mut body1, &mut body2);
        assert!(!constraint.solve_velocity_constraint(DT, &mut body1, &mut body2));

        assert_eq!(body2.get_linear_velocity(), v2);
        assert_eq!(body2.get_angular_velocity(), w2);
    }
}

#[test]
fn test_all_fixed_behaves_like_weld() {
    let mut world = zero_gravity_world();
    let h1 = world.add_body(RigidBody::cuboid(Vector3::zeros(), Vector3::new(0.5, 0.5, 0.5), 2.0));
    let h2 = world.add_body(RigidBody::cuboid(Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.5, 0.25, 0.25), 1.0));

    let mut settings = SixDofConstraintSettings::at_world_position(Vector3::new(0.5, 0.0, 0.0));
    for axis in SixDofAxis::ALL {
        settings.make_fixed_axis(axis);
    }
    let c = world.create_six_dof_constraint(&settings, h1, h2).unwrap();
    {
        let constraint = world.get_constraint_as::<SixDofConstraint>(c).unwrap();
        assert!(constraint.is_translation_fully_constrained());
        assert!(constraint.is_rotation_fully_constrained());
    }

    for _ in 0..60 {
        world.get_body_mut(h1).unwrap().apply_force(Vector3::new(0.5, 0.5, 0.0));
        world.get_body_mut(h2).unwrap().apply_force(Vector3::new(1.5, -1.0, 0.5));
        world.get_body_mut(h2).unwrap().apply_torque(Vector3::new(0.2, 0.3, -0.1));
        world.step(DT).unwrap();
    }

    let body1 = world.get_body(h1).unwrap();
    let body2 = world.get_body(h2).unwrap();
    let relative_position = body1.get_rotation().inverse() * (body2.get_position() - body1.get_position());
    let relative_rotation = body1.get_rotation().inverse() * body2.get_rotation();

    assert_relative_eq!(relative_position, Vector3::new(1.0, 0.0, 0.0), epsilon = 1.0e-2);
    assert_relative_eq!(relative_rotation.angle(), 0.0, epsilon = 1.0e-2);

    // The pair did move as a whole
    assert!(body1.get_linear_velocity().norm() > 0.1);
}

#[test]
fn test_position_pass_reduces_limit_violation() {
    let (h1, h2) = handles();
    let mut body1 = RigidBody::new_static(Vector3::new(-1.0, 0.0, 0.0));
    let mut body2 = RigidBody::sphere(Vector3::zeros(), 0.5, 1.0);

    let mut settings = SixDofConstraintSettings::at_world_position(Vector3::zeros());
    settings.set_limited_axis(SixDofAxis::TranslationX, -0.2, 0.2);
    let mut constraint = settings.create(&body1, &body2, h1, h2);

    // Push the body well past the upper limit
    body2.set_position(Vector3::new(0.5, 0.0, 0.0));

    let mut violation = body2.get_position().x - 0.2;
    for _ in 0..20 {
        assert!(constraint.solve_position_constraint(DT, 0.2, &mut body1, &mut body2));
        let new_violation = body2.get_position().x - 0.2;
        assert!(new_violation < violation);
        assert!(new_violation > 0.0);
        violation = new_violation;
    }
    assert!(violation < 1.0e-2);
    assert_eq!(body1.get_position(), Vector3::new(-1.0, 0.0, 0.0));
}

#[test]
fn test_limit_holds_under_constant_load() {
    let mut world = zero_gravity_world();
    let h1 = world.add_body(RigidBody::new_static(Vector3::new(-1.0, 0.0, 0.0)));
    let h2 = world.add_body(RigidBody::sphere(Vector3::zeros(), 0.5, 1.0));

    let mut settings = SixDofConstraintSettings::at_world_position(Vector3::zeros());
    settings.set_limited_axis(SixDofAxis::TranslationX, -0.2, 0.2);
    world.create_six_dof_constraint(&settings, h1, h2).unwrap();

    for _ in 0..120 {
        world.get_body_mut(h2).unwrap().apply_force(Vector3::new(10.0, 0.0, 0.0));
        world.step(DT).unwrap();
    }

    let body2 = world.get_body(h2).unwrap();
    assert_relative_eq!(body2.get_position().x, 0.2, epsilon = 2.0e-2);
    assert!(body2.get_linear_velocity().x.abs() < 0.5);
}

#[test]
fn test_velocity_motor_with_saturated_twist() {
    let mut world = zero_gravity_world();
    let h1 = world.add_body(RigidBody::new_static(Vector3::zeros()));
    let h2 = world.add_body(RigidBody::sphere(Vector3::zeros(), 0.5, 1.0));

    let mut settings = SixDofConstraintSettings::at_world_position(Vector3::zeros());
    settings.make_fixed_axis(SixDofAxis::TranslationX);
    settings.make_fixed_axis(SixDofAxis::TranslationY);
    settings.set_limited_axis(SixDofAxis::RotationX, -0.5, 0.5);
    let c = world.create_six_dof_constraint(&settings, h1, h2).unwrap();

    {
        let constraint = world.get_constraint_as_mut::<SixDofConstraint>(c).unwrap();
        constraint.set_motor_state(SixDofAxis::TranslationZ, MotorState::Velocity);
        constraint.set_target_velocity_cs(Vector3::new(0.0, 0.0, 2.0));
    }

    for _ in 0..90 {
        world.get_body_mut(h2).unwrap().apply_torque(Vector3::new(5.0, 0.0, 0.0));
        world.step(DT).unwrap();
    }

    let body1 = world.get_body(h1).unwrap();
    let body2 = world.get_body(h2).unwrap();
    let relative_velocity = body2.get_linear_velocity() - body1.get_linear_velocity();
    assert_relative_eq!(relative_velocity.z, 2.0, epsilon = 1.0e-3);
    assert_relative_eq!(relative_velocity.x, 0.0, epsilon = 1.0e-3);

    let constraint = world.get_constraint_as::<SixDofConstraint>(c).unwrap();
    let (_, twist) = math::swing_twist(&constraint.get_rotation_in_constraint_space(body1, body2));
    let twist = math::ensure_w_positive(&twist);
    let twist_angle = 2.0 * twist.i.asin();
    assert!(twist_angle > 0.45 && twist_angle < 0.55, "twist angle {twist_angle}");

    // The limit is holding against the torque
    assert!(constraint.get_total_lambda_rotation().x != 0.0);
}

#[test]
fn test_position_motor_reaches_target() {
    let mut world = zero_gravity_world();
    let h1 = world.add_body(RigidBody::new_static(Vector3::zeros()));
    let h2 = world.add_body(RigidBody::sphere(Vector3::zeros(), 0.5, 1.0));

    let mut settings = SixDofConstraintSettings::at_world_position(Vector3::zeros());
    for axis in SixDofAxis::ROTATION {
        settings.make_fixed_axis(axis);
    }
    let c = world.create_six_dof_constraint(&settings, h1, h2).unwrap();

    {
        let constraint = world.get_constraint_as_mut::<SixDofConstraint>(c).unwrap();
        constraint.get_motor_settings_mut(SixDofAxis::TranslationY).spring.frequency = 4.0;
        constraint.set_motor_state(SixDofAxis::TranslationY, MotorState::Position);
        constraint.set_target_position_cs(Vector3::new(0.0, 0.3, 0.0));
    }

    for _ in 0..180 {
        world.step(DT).unwrap();
    }

    let body2 = world.get_body(h2).unwrap();
    assert_relative_eq!(body2.get_position().y, 0.3, epsilon = 1.0e-2);
    assert_relative_eq!(body2.get_position().x, 0.0, epsilon = 1.0e-4);
}

#[test]
fn test_friction_slows_free_axis() {
    let mut world = zero_gravity_world();
    let h1 = world.add_body(RigidBody::new_static(Vector3::zeros()));
    let h2 = world.add_body(RigidBody::sphere(Vector3::zeros(), 0.5, 1.0));

    let mut settings = SixDofConstraintSettings::at_world_position(Vector3::zeros());
    settings.max_friction[SixDofAxis::TranslationX.index()] = 6.0;
    world.create_six_dof_constraint(&settings, h1, h2).unwrap();

    world.get_body_mut(h2).unwrap().set_linear_velocity(Vector3::new(3.0, 1.0, 0.0));
    world.step(DT).unwrap();

    // Friction removes at most max_friction * dt of momentum per step
    let velocity = world.get_body(h2).unwrap().get_linear_velocity();
    assert_relative_eq!(velocity.x, 3.0 - 6.0 * DT, epsilon = 1.0e-4);
    assert_relative_eq!(velocity.y, 1.0, epsilon = 1.0e-6);

    for _ in 0..60 {
        world.step(DT).unwrap();
    }
    assert_relative_eq!(world.get_body(h2).unwrap().get_linear_velocity().x, 0.0, epsilon = 1.0e-3);
}

#[test]
fn test_motor_state_resets_motor_impulse() {
    let (h1, h2) = handles();
    let mut body1 = RigidBody::new_static(Vector3::zeros());
    let mut body2 = RigidBody::sphere(Vector3::zeros(), 0.5, 1.0);

    let settings = SixDofConstraintSettings::at_world_position(Vector3::zeros());
    let mut constraint = settings.create(&body1, &body2, h1, h2);
    assert_eq!(constraint.get_motor_state(SixDofAxis::TranslationX), MotorState::Off);

    constraint.set_motor_state(SixDofAxis::TranslationX, MotorState::Velocity);
    constraint.set_target_velocity_cs(Vector3::new(1.0, 0.0, 0.0));
    constraint.setup_velocity_constraint(DT, &body1, &body2);
    assert!(constraint.solve_velocity_constraint(DT, &mut body1, &mut body2));
    assert!(constraint.get_total_lambda_motor_translation().x > 0.0);

    constraint.set_motor_state(SixDofAxis::TranslationX, MotorState::Position);
    assert_eq!(constraint.get_motor_state(SixDofAxis::TranslationX), MotorState::Position);
    assert_eq!(constraint.get_total_lambda_motor_translation().x, 0.0);
}

#[test]
fn test_target_orientation_body_space_conversion() {
    let (h1, h2) = handles();
    let body1 = RigidBody::new_static(Vector3::zeros());
    let body2 = RigidBody::sphere(Vector3::zeros(), 0.5, 1.0);

    // Constraint X axis along body Y
    let settings = SixDofConstraintSettings {
        space: sixdof_joint::ConstraintSpace::LocalToBodyCom,
        axis_x1: Vector3::y(),
        axis_y1: Vector3::z(),
        axis_x2: Vector3::y(),
        axis_y2: Vector3::z(),
        ..SixDofConstraintSettings::default()
    };
    let mut constraint = settings.create(&body1, &body2, h1, h2);

    constraint.set_target_orientation_bs(Quaternion::from_axis_angle(&Vector3::y_axis(), 0.3));
    let expected = Quaternion::from_axis_angle(&Vector3::x_axis(), 0.3);
    assert_relative_eq!(math::quat_dot(&constraint.get_target_orientation_cs(), &expected).abs(), 1.0, epsilon = 1.0e-5);
}

#[test]
fn test_target_orientation_is_clamped_to_limits() {
    let (h1, h2) = handles();
    let body1 = RigidBody::new_static(Vector3::zeros());
    let body2 = RigidBody::sphere(Vector3::zeros(), 0.5, 1.0);

    let mut settings = SixDofConstraintSettings::at_world_position(Vector3::zeros());
    settings.set_limited_axis(SixDofAxis::RotationX, -0.2, 0.2);
    let mut constraint = settings.create(&body1, &body2, h1, h2);

    constraint.set_target_orientation_cs(Quaternion::from_axis_angle(&Vector3::x_axis(), 0.5));
    assert_relative_eq!(constraint.get_target_orientation_cs().angle(), 0.2, epsilon = 1.0e-5);

    constraint.set_target_orientation_cs(Quaternion::from_axis_angle(&Vector3::x_axis(), 0.1));
    assert_relative_eq!(constraint.get_target_orientation_cs().angle(), 0.1, epsilon = 1.0e-5);
}

#[test]
fn test_changing_limits_keeps_classification() {
    let (h1, h2) = handles();
    let body1 = RigidBody::new_static(Vector3::zeros());
    let body2 = RigidBody::sphere(Vector3::zeros(), 0.5, 1.0);

    let mut settings = SixDofConstraintSettings::at_world_position(Vector3::zeros());
    settings.make_fixed_axis(SixDofAxis::TranslationX);
    settings.set_limited_axis(SixDofAxis::TranslationY, -1.0, 1.0);
    let mut constraint = settings.create(&body1, &body2, h1, h2);

    assert!(constraint.is_axis_fixed(SixDofAxis::TranslationX));
    assert!(constraint.is_axis_free(SixDofAxis::TranslationZ));
    assert!(!constraint.is_axis_free(SixDofAxis::TranslationY));
    assert!(!constraint.is_axis_fixed(SixDofAxis::TranslationY));

    constraint.set_translation_limits(Vector3::new(-0.5, -2.0, -0.1), Vector3::new(0.5, 2.0, 0.1));
    assert!(constraint.is_axis_fixed(SixDofAxis::TranslationX));
    assert!(constraint.is_axis_free(SixDofAxis::TranslationZ));
    assert_eq!(constraint.get_limits_min(SixDofAxis::TranslationY), -2.0);
    assert_eq!(constraint.get_limits_max(SixDofAxis::TranslationZ), 0.1);
}

#[test]
fn test_to_settings_recreates_constraint_frames() {
    let (h1, h2) = handles();
    let body1 = RigidBody::cuboid(Vector3::new(0.0, 1.0, 0.0), Vector3::new(0.5, 0.5, 0.5), 1.0)
        .with_rotation(Quaternion::from_euler_angles(0.1, 0.4, -0.2));
    let body2 = RigidBody::sphere(Vector3::new(1.0, 1.0, 0.5), 0.5, 1.0)
        .with_rotation(Quaternion::from_euler_angles(-0.3, 0.0, 0.7));

    let mut settings = SixDofConstraintSettings::at_world_position(Vector3::new(0.5, 1.0, 0.25));
    settings.make_fixed_axis(SixDofAxis::TranslationX);
    settings.set_limited_axis(SixDofAxis::RotationY, -0.4, 0.4);
    settings.max_friction[SixDofAxis::RotationZ.index()] = 1.5;
    let original = settings.create(&body1, &body2, h1, h2);

    let recreated_settings = original.to_settings();
    assert!(recreated_settings.validate().is_ok());
    assert_eq!(recreated_settings.limit_min, settings.limit_min);
    assert_eq!(recreated_settings.limit_max, settings.limit_max);
    assert_eq!(recreated_settings.max_friction, settings.max_friction);

    let recreated = recreated_settings.create(&body1, &body2, h1, h2);
    let (a1, b1) = (original.get_constraint_to_body1_matrix(), recreated.get_constraint_to_body1_matrix());
    let (a2, b2) = (original.get_constraint_to_body2_matrix(), recreated.get_constraint_to_body2_matrix());
    assert_relative_eq!(a1.translation.vector, b1.translation.vector, epsilon = 1.0e-5);
    assert_relative_eq!(a2.translation.vector, b2.translation.vector, epsilon = 1.0e-5);
    assert_relative_eq!(math::quat_dot(&a1.rotation, &b1.rotation).abs(), 1.0, epsilon = 1.0e-5);
    assert_relative_eq!(math::quat_dot(&a2.rotation, &b2.rotation).abs(), 1.0, epsilon = 1.0e-5);

    for axis in SixDofAxis::ALL {
        assert_eq!(original.is_axis_free(axis), recreated.is_axis_free(axis));
        assert_eq!(original.is_axis_fixed(axis), recreated.is_axis_fixed(axis));
    }
}

#[test]
fn test_removing_friction_clears_its_impulse() {
    let (h1, h2) = handles();
    let mut body1 = RigidBody::new_static(Vector3::zeros());
    let mut body2 = RigidBody::sphere(Vector3::zeros(), 0.5, 1.0);

    let mut settings = SixDofConstraintSettings::at_world_position(Vector3::zeros());
    settings.max_friction[SixDofAxis::TranslationX.index()] = 5.0;
    let mut constraint = settings.create(&body1, &body2, h1, h2);

    body2.set_linear_velocity(Vector3::new(3.0, 0.0, 0.0));
    constraint.setup_velocity_constraint(DT, &body1, &body2);
    assert!(constraint.solve_velocity_constraint(DT, &mut body1, &mut body2));
    assert_relative_eq!(constraint.get_total_lambda_motor_translation().x, -5.0 * DT, epsilon = 1.0e-6);

    constraint.set_max_friction(SixDofAxis::TranslationX, 0.0);
    assert_eq!(constraint.get_total_lambda_motor_translation(), Vector3::zeros());

    let velocity = body2.get_linear_velocity();
    constraint.setup_velocity_constraint(DT, &body1, &body2);
    constraint.warm_start_velocity_constraint(1.0, &mut body1, &mut body2);
    assert!(!constraint.solve_velocity_constraint(DT, &mut body1, &mut body2));
    assert_eq!(body2.get_linear_velocity(), velocity);
}

/// Static body 1 and a unit sphere joined at the sphere's center with translation locked
fn rotating_pair(settings: &mut SixDofConstraintSettings) -> (PhysicsWorld, BodyHandle, BodyHandle, sixdof_joint::ConstraintHandle) {
    let mut world = zero_gravity_world();
    let h1 = world.add_body(RigidBody::new_static(Vector3::zeros()));
    let h2 = world.add_body(RigidBody::sphere(Vector3::zeros(), 0.5, 1.0));
    for axis in SixDofAxis::TRANSLATION {
        settings.make_fixed_axis(axis);
    }
    let c = world.create_six_dof_constraint(settings, h1, h2).unwrap();
    (world, h1, h2, c)
}

#[test]
fn test_rotation_velocity_motor_holds_target() {
    let mut settings = SixDofConstraintSettings::at_world_position(Vector3::zeros());
    let (mut world, h1, h2, c) = rotating_pair(&mut settings);
    {
        let constraint = world.get_constraint_as_mut::<SixDofConstraint>(c).unwrap();
        constraint.set_motor_state(SixDofAxis::RotationX, MotorState::Velocity);
        constraint.set_target_angular_velocity_cs(Vector3::new(1.5, 0.0, 0.0));
    }

    for _ in 0..60 {
        world.step(DT).unwrap();
    }

    let relative = world.get_body(h2).unwrap().get_angular_velocity() - world.get_body(h1).unwrap().get_angular_velocity();
    assert_relative_eq!(relative, Vector3::new(1.5, 0.0, 0.0), epsilon = 1.0e-3);
    assert!(world.get_body(h2).unwrap().get_rotation().angle() > 0.1);
}

#[test]
fn test_rotation_position_motor_reaches_target_orientation() {
    let mut settings = SixDofConstraintSettings::at_world_position(Vector3::zeros());
    let (mut world, h1, h2, c) = rotating_pair(&mut settings);
    let target = Quaternion::from_euler_angles(0.2, -0.1, 0.4);
    {
        let constraint = world.get_constraint_as_mut::<SixDofConstraint>(c).unwrap();
        for axis in SixDofAxis::ROTATION {
            constraint.get_motor_settings_mut(axis).spring.frequency = 4.0;
            constraint.set_motor_state(axis, MotorState::Position);
        }
        constraint.set_target_orientation_cs(target);
    }

    for _ in 0..240 {
        world.step(DT).unwrap();
    }

    let constraint = world.get_constraint_as::<SixDofConstraint>(c).unwrap();
    let reached = constraint.get_rotation_in_constraint_space(world.get_body(h1).unwrap(), world.get_body(h2).unwrap());
    assert!(reached.angle_to(&target) < 1.0e-3, "orientation error {}", reached.angle_to(&target));
}

#[test]
fn test_rotation_friction_slows_spin() {
    let mut settings = SixDofConstraintSettings::at_world_position(Vector3::zeros());
    settings.max_friction[SixDofAxis::RotationX.index()] = 0.5;
    let (mut world, _, h2, _) = rotating_pair(&mut settings);

    world.get_body_mut(h2).unwrap().set_angular_velocity(Vector3::new(2.0, 0.0, 0.0));
    let inverse_inertia = world.get_body(h2).unwrap().get_inverse_inertia_world()[(0, 0)];
    world.step(DT).unwrap();

    // At most max_friction * dt of angular momentum is removed per step
    let spin = world.get_body(h2).unwrap().get_angular_velocity();
    assert_relative_eq!(spin.x, 2.0 - 0.5 * DT * inverse_inertia, epsilon = 1.0e-4);
    assert_relative_eq!(spin.y, 0.0, epsilon = 1.0e-6);

    for _ in 0..60 {
        world.step(DT).unwrap();
    }
    assert_relative_eq!(world.get_body(h2).unwrap().get_angular_velocity().x, 0.0, epsilon = 1.0e-3);
}

#[test]
fn test_swing_cone_holds_against_torque() {
    let mut settings = SixDofConstraintSettings::at_world_position(Vector3::zeros());
    settings.set_limited_axis(SixDofAxis::RotationY, -0.4, 0.4);
    settings.set_limited_axis(SixDofAxis::RotationZ, -0.6, 0.6);
    let (mut world, h1, h2, c) = rotating_pair(&mut settings);

    let (a, b) = ((0.5f32 * 0.4).sin(), (0.5f32 * 0.6).sin());
    let mut ellipse_value = 0.0;
    for _ in 0..180 {
        world.get_body_mut(h2).unwrap().apply_torque(Vector3::new(0.0, 0.2, 0.2));
        world.step(DT).unwrap();

        let constraint = world.get_constraint_as::<SixDofConstraint>(c).unwrap();
        let q = constraint.get_rotation_in_constraint_space(world.get_body(h1).unwrap(), world.get_body(h2).unwrap());
        let (swing, _) = math::swing_twist(&q);
        let swing = math::ensure_w_positive(&swing);
        ellipse_value = (swing.j / a).powi(2) + (swing.k / b).powi(2);
    }

    // Pressed against the cone without passing through it
    assert!(ellipse_value > 0.9 && ellipse_value < 1.05, "swing at {} of the cone", ellipse_value);
    let lambda = world.get_constraint_as::<SixDofConstraint>(c).unwrap().get_total_lambda_rotation();
    assert!(lambda.y != 0.0);
}

#[test]
fn test_position_pass_reduces_twist_violation() {
    let (h1, h2) = handles();
    let mut body1 = RigidBody::new_static(Vector3::zeros());
    let mut body2 = RigidBody::sphere(Vector3::zeros(), 0.5, 1.0);

    let mut settings = SixDofConstraintSettings::at_world_position(Vector3::zeros());
    settings.set_limited_axis(SixDofAxis::RotationX, -0.5, 0.5);
    let mut constraint = settings.create(&body1, &body2, h1, h2);

    body2.set_rotation(Quaternion::from_axis_angle(&Vector3::x_axis(), 0.8));

    let twist_angle = |constraint: &SixDofConstraint, body1: &RigidBody, body2: &RigidBody| {
        let (_, twist) = math::swing_twist(&constraint.get_rotation_in_constraint_space(body1, body2));
        2.0 * math::ensure_w_positive(&twist).i.asin()
    };

    let mut angle = twist_angle(&constraint, &body1, &body2);
    for _ in 0..30 {
        assert!(constraint.solve_position_constraint(DT, 0.2, &mut body1, &mut body2));
        let new_angle = twist_angle(&constraint, &body1, &body2);
        assert!(new_angle < angle, "twist went from {} to {}", angle, new_angle);
        assert!(new_angle > 0.5 - 1.0e-4);
        angle = new_angle;
    }
    assert!(angle < 0.51, "twist still at {}", angle);
    assert_eq!(body1.get_rotation(), Quaternion::identity());
}
