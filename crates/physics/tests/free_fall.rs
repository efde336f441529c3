use physics::{Body, Engine};

#[test]
fn free_fall_matches_semi_implicit_euler() {
    // gravity (0, -10), dt 0.01, one substep per frame
    let mut engine = Engine::new(800, 600, 50.0, 0.01, 1);
    engine.set_gravity(0.0, -10.0);
    let id = engine.add_body(Body::new(0.0, 10.0, 1.0, 1.0, 1.0));

    for _ in 0..10 {
        engine.update();
    }

    // v_i = v_{i-1} - 0.1, y_i = y_{i-1} + v_i * 0.01
    let body = engine.body(id);
    assert!((body.y() - 9.945).abs() < 1e-4, "y = {}", body.y());
    assert!((body.linear_velocity().y + 1.0).abs() < 1e-4);
    assert!(body.x().abs() < 1e-6);
}

#[test]
fn body_at_rest_stays_at_rest() {
    let mut body = Body::new(1.0, 2.0, 3.0, 1.0, 1.0);
    for _ in 0..5 {
        body.step(0.01);
    }
    assert_eq!(body.x(), 1.0);
    assert_eq!(body.y(), 2.0);
    assert_eq!(body.angle(), 0.0);
    assert_eq!(body.linear_velocity().length(), 0.0);
}

#[test]
fn constant_force_on_unit_mass() {
    let mut body = Body::new(0.0, 0.0, 1.0, 1.0, 1.0);
    let dt = 0.1;
    let force = body.graph_mut().from_slice(&[2.0, 0.0]);
    body.apply_force(force);
    body.step(dt);

    // semi-implicit Euler uses the updated velocity for the position update
    assert!((body.linear_velocity().x - 2.0 * dt).abs() < 1e-6);
    assert!((body.x() - 2.0 * dt * dt).abs() < 1e-6);
}

#[test]
fn static_bodies_never_move() {
    let mut engine = Engine::new(800, 600, 50.0, 0.016, 10);
    engine.set_gravity(0.0, -10.0);
    let id = engine.add_body(Body::new_static(0.0, 1.0, 4.0, 1.0, 0.3));

    for _ in 0..10 {
        engine.update();
    }
    let body = engine.body(id);
    assert_eq!(body.y(), 1.0);
    assert_eq!(body.angle(), 0.3);
    assert!(body.is_static);
    assert_eq!(body.friction, 0.8);
    assert_eq!(body.restitution, 0.0);
}
