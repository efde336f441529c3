//! Differentiating simulation outcomes with respect to physical parameters.

use approx::assert_relative_eq;
use physics::Body;

#[test]
fn height_loss_backpropagates_to_mass() {
    // constant downward unit force: y1 = y0 - dt^2 / m, dL/dm = dt^2 / m^2
    let mut body = Body::new(0.0, 1.0, 1.0, 1.0, 1.0);
    let mass = body.mass();
    body.graph_mut().set_requires_grad(mass, true);

    let force = body.graph_mut().from_slice(&[0.0, -1.0]);
    body.apply_force(force);
    body.step(0.1);

    assert_relative_eq!(body.y(), 1.0 - 0.01, epsilon = 1e-6);

    let pos = body.pos();
    let g = body.graph_mut();
    let loss = pos.select(1, g);
    g.backward(loss);

    let d_mass = g.grad(mass).unwrap()[(0, 0)];
    assert_relative_eq!(d_mass, 0.01, epsilon = 1e-5);
}

#[test]
fn height_loss_backpropagates_to_initial_position() {
    let mut body = Body::new(0.0, 1.0, 2.0, 1.0, 1.0);
    let y0 = body.pos();
    let force = body.graph_mut().from_slice(&[0.0, -1.0]);
    body.apply_force(force);
    body.step(0.1);

    let pos = body.pos();
    let g = body.graph_mut();
    let loss = pos.select(1, g);
    g.backward(loss);

    // position enters the update additively
    let d_y0 = g.grad(y0).unwrap()[(1, 0)];
    assert!((d_y0 - 1.0).abs() < 1e-6);
    let d_x0 = g.grad(y0).unwrap()[(0, 0)];
    assert_eq!(d_x0, 0.0);
}

#[test]
fn gradients_flow_through_a_two_step_trajectory() {
    // constant force both steps: y2 = y0 - 3 dt^2 / m, dL/dm = 3 dt^2 / m^2
    let mut body = Body::new(0.0, 1.0, 1.0, 1.0, 1.0);
    let mass = body.mass();
    body.graph_mut().set_requires_grad(mass, true);

    let dt = 0.1;
    for _ in 0..2 {
        let force = body.graph_mut().from_slice(&[0.0, -1.0]);
        body.apply_force(force);
        body.step(dt);
    }
    assert_relative_eq!(body.y(), 1.0 - 3.0 * dt * dt, epsilon = 1e-6);

    let pos = body.pos();
    let g = body.graph_mut();
    let loss = pos.select(1, g);
    g.backward(loss);

    let d_mass = g.grad(mass).unwrap()[(0, 0)];
    assert_relative_eq!(d_mass, 0.03, epsilon = 1e-5);
}

#[test]
fn velocity_gradient_through_rotation() {
    // spin the body with a torque, then differentiate the rotation w.r.t.
    // the inertia: theta1 = tau dt^2 / I, dL/dI = -tau dt^2 / I^2
    let mut body = Body::new(0.0, 0.0, 1.0, 2.0, 2.0);
    let inertia = body.inertia();
    body.graph_mut().set_requires_grad(inertia, true);
    let inertia_value = body.inertia_value();

    let torque = body.graph_mut().scalar(1.0);
    body.apply_torque(torque);
    body.step(0.1);

    let rotation = body.rotation();
    let g = body.graph_mut();
    g.backward(rotation);

    let d_inertia = g.grad(inertia).unwrap()[(0, 0)];
    let expected = -0.01 / (inertia_value * inertia_value);
    assert!((d_inertia - expected).abs() < 1e-5, "dL/dI = {d_inertia}");
}
