use approx::assert_relative_eq;
use sixdof_joint::{
    error::PhysicsError,
    io::{StateRecorder, StreamIn, StreamOut},
    Constraint, ConstraintSpace, MotorSettings, PhysicsWorld, RigidBody, SimulationConfig, SixDofAxis,
    SixDofConstraint, SixDofConstraintSettings, Vector3,
};

const DT: f32 = 1.0 / 60.0;

fn configured_settings() -> SixDofConstraintSettings {
    let mut settings = SixDofConstraintSettings {
        space: ConstraintSpace::LocalToBodyCom,
        position1: Vector3::new(0.5, 0.0, 0.0),
        position2: Vector3::new(-0.5, 0.0, 0.0),
        ..SixDofConstraintSettings::default()
    };
    settings.make_fixed_axis(SixDofAxis::TranslationY);
    settings.make_fixed_axis(SixDofAxis::TranslationZ);
    settings.set_limited_axis(SixDofAxis::TranslationX, -0.1, 0.3);
    settings.set_limited_axis(SixDofAxis::RotationX, -0.6, 0.8);
    settings.set_limited_axis(SixDofAxis::RotationY, -0.4, 0.4);
    settings.max_friction[SixDofAxis::RotationZ.index()] = 0.25;
    settings.motor_settings[SixDofAxis::TranslationX.index()] = MotorSettings::new(3.0, 0.7);
    settings.motor_settings[SixDofAxis::RotationX.index()].set_torque_limit(12.0);
    settings
}

fn encode(settings: &SixDofConstraintSettings) -> Vec<u8> {
    let mut stream = StreamOut::new(Vec::new());
    settings.save_binary_state(&mut stream).unwrap();
    stream.into_inner()
}

#[test]
fn test_settings_binary_state_is_lossless() {
    let settings = configured_settings();
    let bytes = encode(&settings);

    let restored = SixDofConstraintSettings::restore_binary_state(&mut StreamIn::new(&bytes[..])).unwrap();
    assert_eq!(restored, settings);
    for axis in SixDofAxis::ALL {
        assert_eq!(restored.is_free_axis(axis), settings.is_free_axis(axis));
        assert_eq!(restored.is_fixed_axis(axis), settings.is_fixed_axis(axis));
    }
}

#[test]
fn test_truncated_settings_stream_fails() {
    let bytes = encode(&configured_settings());
    let truncated = &bytes[..bytes.len() - 3];

    let result = SixDofConstraintSettings::restore_binary_state(&mut StreamIn::new(truncated));
    assert!(matches!(result, Err(PhysicsError::StreamRead(_))));
}

#[test]
fn test_unknown_space_tag_fails() {
    let mut bytes = encode(&configured_settings());
    bytes[..4].copy_from_slice(&7u32.to_le_bytes());

    let result = SixDofConstraintSettings::restore_binary_state(&mut StreamIn::new(&bytes[..]));
    assert!(matches!(result, Err(PhysicsError::UnknownVariant { value: 7, .. })));
}

fn loaded_world() -> (PhysicsWorld, sixdof_joint::BodyHandle, sixdof_joint::BodyHandle) {
    let mut world = PhysicsWorld::with_config(SimulationConfig::default());
    let h1 = world.add_body(RigidBody::new_static(Vector3::zeros()));
    let h2 = world.add_body(RigidBody::sphere(Vector3::new(1.0, 0.0, 0.0), 0.5, 1.0));
    (world, h1, h2)
}

fn push(world: &mut PhysicsWorld, body: sixdof_joint::BodyHandle) {
    let body = world.get_body_mut(body).unwrap();
    body.apply_force(Vector3::new(8.0, 0.0, 0.0));
    body.apply_torque(Vector3::new(1.5, 0.0, 0.3));
}

#[test]
fn test_restored_impulses_reproduce_the_next_step() {
    let (mut world_a, h1, h2) = loaded_world();
    let c = world_a.create_six_dof_constraint(&configured_settings(), h1, h2).unwrap();

    for _ in 0..45 {
        push(&mut world_a, h2);
        world_a.step(DT).unwrap();
    }

    let mut recorder = StateRecorder::new();
    world_a.save_state(&mut recorder);
    assert!(!recorder.as_bytes().is_empty());

    // Rebuild the scene from the current poses and the captured settings
    let mut world_b = PhysicsWorld::with_config(SimulationConfig::default());
    let b1 = world_b.add_body(world_a.get_body(h1).unwrap().clone());
    let b2 = world_b.add_body(world_a.get_body(h2).unwrap().clone());
    let settings = world_a.get_constraint_as::<SixDofConstraint>(c).unwrap().to_settings();
    world_b.create_six_dof_constraint(&settings, b1, b2).unwrap();

    recorder.rewind();
    world_b.restore_state(&mut recorder).unwrap();
    assert!(recorder.is_eof());

    push(&mut world_a, h2);
    world_a.step(DT).unwrap();
    push(&mut world_b, b2);
    world_b.step(DT).unwrap();

    let a = world_a.get_body(h2).unwrap();
    let b = world_b.get_body(b2).unwrap();
    assert_relative_eq!(a.get_position(), b.get_position(), epsilon = 1.0e-5);
    assert_relative_eq!(a.get_linear_velocity(), b.get_linear_velocity(), epsilon = 1.0e-5);
    assert_relative_eq!(a.get_angular_velocity(), b.get_angular_velocity(), epsilon = 1.0e-5);
}

fn lambdas(constraint: &SixDofConstraint) -> [Vector3; 4] {
    [
        constraint.get_total_lambda_position(),
        constraint.get_total_lambda_rotation(),
        constraint.get_total_lambda_motor_translation(),
        constraint.get_total_lambda_motor_rotation(),
    ]
}

#[test]
fn test_constraint_state_survives_round_trip() {
    let (mut world, h1, h2) = loaded_world();
    let c = world.create_six_dof_constraint(&configured_settings(), h1, h2).unwrap();
    for _ in 0..30 {
        push(&mut world, h2);
        world.step(DT).unwrap();
    }

    let mut recorder = StateRecorder::new();
    world.get_constraint(c).unwrap().save_state(&mut recorder);
    let saved = lambdas(world.get_constraint_as::<SixDofConstraint>(c).unwrap());

    let bytes = recorder.as_bytes().to_vec();
    let body1 = world.get_body(h1).unwrap().clone();
    let body2 = world.get_body(h2).unwrap().clone();
    let settings = world.get_constraint_as::<SixDofConstraint>(c).unwrap().to_settings();
    let mut fresh = settings.create(&body1, &body2, h1, h2);
    fresh.restore_state(&mut StateRecorder::from_bytes(bytes)).unwrap();

    assert_eq!(lambdas(&fresh), saved);
    assert_ne!(saved[0], Vector3::zeros());
}

#[test]
fn test_truncated_state_fails_to_restore() {
    let (mut world, h1, h2) = loaded_world();
    world.create_six_dof_constraint(&configured_settings(), h1, h2).unwrap();

    let mut recorder = StateRecorder::from_bytes(vec![0; 10]);
    assert!(matches!(world.restore_state(&mut recorder), Err(PhysicsError::StreamRead(_))));
}
