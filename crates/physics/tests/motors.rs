use glam::Vec2;
use physics::{Body, Motor, PhysicsError};

#[test]
fn thrust_is_clamped_to_the_motor_range() {
    let mut motor = Motor::new(Vec2::ZERO);
    motor.set_thrust(25.0);
    assert_eq!(motor.thrust(), 10.0);
    motor.set_thrust(-3.0);
    assert_eq!(motor.thrust(), 0.0);
    motor.set_thrust(7.5);
    assert_eq!(motor.thrust(), 7.5);
}

#[test]
fn overlapping_motors_are_rejected() {
    let mut body = Body::new(0.0, 0.0, 1.0, 2.0, 0.5);
    body.add_motor(Motor::new(Vec2::new(0.5, 0.0))).unwrap();
    let result = body.add_motor(Motor::new(Vec2::new(0.5, 0.0)));
    assert!(matches!(result, Err(PhysicsError::MotorOverlap)));
    assert_eq!(body.motors().len(), 1);

    // a disjoint footprint is fine
    body.add_motor(Motor::new(Vec2::new(-0.5, 0.0))).unwrap();
    assert_eq!(body.motors().len(), 2);
}

#[test]
fn attaching_a_motor_adds_mass_and_inertia() {
    let mut body = Body::new(0.0, 0.0, 1.0, 1.0, 1.0);
    let base_mass = body.mass_value();
    let base_inertia = body.inertia_value();

    let motor = Motor::with_footprint(Vec2::new(0.6, 0.8), 0.1, 0.1, 0.2, 10.0);
    body.add_motor(motor).unwrap();

    assert!((body.mass_value() - (base_mass + 0.2)).abs() < 1e-6);
    // point mass at distance 1: I += 0.2 * 1^2
    assert!((body.inertia_value() - (base_inertia + 0.2)).abs() < 1e-6);
}

#[test]
fn motor_thrust_accelerates_and_spins_the_body() {
    // unit mass, unit inertia (box with w = h = sqrt(6)), motor at (1, 0)
    // thrusting +y with magnitude 1: after dt = 0.1 from rest,
    // v = (0, 0.1) and omega = 0.1
    let side = 6.0f32.sqrt();
    let mut body = Body::new(0.0, 0.0, 1.0, side, side);
    assert!((body.inertia_value() - 1.0).abs() < 1e-6);

    let mut motor = Motor::with_footprint(Vec2::new(1.0, 0.0), 0.1, 0.1, 0.0, 10.0);
    motor.set_thrust(1.0);
    body.add_motor(motor).unwrap();

    body.apply_motor_forces();
    body.step(0.1);

    let v = body.linear_velocity();
    assert!(v.x.abs() < 1e-6);
    assert!((v.y - 0.1).abs() < 1e-6);
    assert!((body.angular_velocity() - 0.1).abs() < 1e-6);
}

#[test]
fn idle_motors_apply_nothing() {
    let mut body = Body::new(0.0, 0.0, 1.0, 1.0, 1.0);
    body.add_motor(Motor::new(Vec2::new(0.4, 0.0))).unwrap();
    body.apply_motor_forces();

    let acc = body.force_accumulator();
    assert_eq!(body.graph().get(acc, 0, 0), 0.0);
    assert_eq!(body.graph().get(acc, 1, 0), 0.0);
}

#[test]
fn rotated_body_thrusts_in_world_frame() {
    // body rotated a quarter turn: local +y thrust points along -x
    let side = 6.0f32.sqrt();
    let mut body = Body::new(0.0, 0.0, 1.0, side, side);
    let rotation = body.rotation();
    body.graph_mut()
        .set(rotation, 0, 0, std::f32::consts::FRAC_PI_2);

    let mut motor = Motor::with_footprint(Vec2::ZERO, 0.1, 0.1, 0.0, 10.0);
    motor.set_thrust(2.0);
    body.add_motor(motor).unwrap();

    body.apply_motor_forces();
    body.step(0.1);

    let v = body.linear_velocity();
    assert!((v.x + 0.2).abs() < 1e-6);
    assert!(v.y.abs() < 1e-6);
    // centred motor: no torque
    assert!(body.angular_velocity().abs() < 1e-6);
}
