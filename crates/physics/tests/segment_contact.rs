//! Soft penalty contact against ground segments.

use glam::Vec2;
use physics::contact::{self, GroundSegment, STIFFNESS};
use physics::{Body, Engine};

#[test]
fn segment_normal_is_the_left_hand_normal() {
    let seg = GroundSegment::new(Vec2::new(-10.0, 0.0), Vec2::new(10.0, 0.0), 0.5);
    assert!((seg.normal - Vec2::Y).length() < 1e-6);
    assert_eq!(seg.stiffness, 20_000.0);
    assert_eq!(seg.damping, 100.0);

    let vertical = GroundSegment::new(Vec2::ZERO, Vec2::new(0.0, 2.0), 0.5);
    assert!((vertical.normal - Vec2::new(-1.0, 0.0)).length() < 1e-6);
}

#[test]
fn degenerate_segment_defaults_to_up_normal() {
    let seg = GroundSegment::new(Vec2::new(1.0, 1.0), Vec2::new(1.0, 1.0), 0.5);
    assert_eq!(seg.normal, Vec2::Y);
}

#[test]
fn resting_box_settles_on_the_segment() {
    // dropped box reaches a steady penetration d* with k * sum|d| = m g
    let mut engine = Engine::new(800, 600, 50.0, 0.016, 50);
    engine.set_gravity(0.0, -10.0);
    engine.add_ground_segment(-10.0, 0.0, 10.0, 0.0, 0.5);
    let id = engine.add_body(Body::new(0.0, 0.6, 1.0, 1.0, 1.0));

    for _ in 0..60 {
        engine.update();
    }

    let body = engine.body(id);
    let corner_y = body.y() - 0.5;
    assert!(corner_y.abs() < 0.01, "corner y = {corner_y}");
    assert!(body.linear_velocity().y.abs() < 0.05);

    // both bottom corners share the load: 2 k |d*| = m g
    let weight = 1.0 * 10.0;
    let support = 2.0 * STIFFNESS * corner_y.abs();
    assert!(
        (support - weight).abs() < 0.2 * weight,
        "support = {support}"
    );
}

#[test]
fn friction_force_follows_the_tanh_smoothing() {
    // sliding contact: mu = 0.5, tangential speed 0.2
    // |f_t| = mu * f_n * tanh(2 * 0.2)
    let mut body = Body::new(0.0, 0.499, 1.0, 1.0, 1.0);
    let vel = body.vel();
    body.graph_mut().set(vel, 0, 0, 0.2);

    let seg = GroundSegment::new(Vec2::new(-10.0, 0.0), Vec2::new(10.0, 0.0), 0.5);
    contact::apply_segment_contacts(&mut body, &[&seg]);

    let acc = body.force_accumulator();
    let fx = body.graph().get(acc, 0, 0);
    let fy = body.graph().get(acc, 1, 0);

    assert!(fy > 0.0, "normal force pushes the box out");
    let expected_ratio = 0.5 * 0.4f32.tanh();
    assert!(
        (fx.abs() / fy - expected_ratio).abs() < 1e-3,
        "|fx|/fy = {}",
        fx.abs() / fy
    );
    // friction opposes the motion
    assert!(fx < 0.0);
}

#[test]
fn corner_on_a_seam_gets_the_average_not_the_sum() {
    let long = GroundSegment::new(Vec2::new(-10.0, 0.0), Vec2::new(10.0, 0.0), 0.5);
    let left = GroundSegment::new(Vec2::new(-10.0, 0.0), Vec2::new(0.0, 0.0), 0.5);
    let right = GroundSegment::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), 0.5);

    let force_y = |segments: &[&GroundSegment]| {
        let mut body = Body::new(0.0, 0.499, 1.0, 1.0, 1.0);
        contact::apply_segment_contacts(&mut body, segments);
        let acc = body.force_accumulator();
        body.graph().get(acc, 1, 0)
    };

    let single = force_y(&[&long]);
    let split = force_y(&[&left, &right]);
    assert!(single > 0.0);
    assert!(
        (single - split).abs() < 1e-2 * single,
        "single = {single}, split = {split}"
    );
}

#[test]
fn separated_body_receives_no_contact_force() {
    let mut body = Body::new(0.0, 2.0, 1.0, 1.0, 1.0);
    let seg = GroundSegment::new(Vec2::new(-10.0, 0.0), Vec2::new(10.0, 0.0), 0.5);
    contact::apply_segment_contacts(&mut body, &[&seg]);

    let acc = body.force_accumulator();
    assert_eq!(body.graph().get(acc, 0, 0), 0.0);
    assert_eq!(body.graph().get(acc, 1, 0), 0.0);
}

#[test]
fn contact_force_is_differentiable_in_position() {
    // F_y = -2 k (y - 0.5) for the two penetrating corners, so the gradient
    // of the accumulated vertical force w.r.t. the body height is -2k
    let mut body = Body::new(0.0, 0.499, 1.0, 1.0, 1.0);
    let seg = GroundSegment::new(Vec2::new(-10.0, 0.0), Vec2::new(10.0, 0.0), 0.5);
    contact::apply_segment_contacts(&mut body, &[&seg]);

    let pos = body.pos();
    let acc = body.force_accumulator();
    let g = body.graph_mut();
    let loss = acc.select(1, g);
    g.backward(loss);

    let d_y = g.grad(pos).unwrap()[(1, 0)];
    let expected = -2.0 * STIFFNESS;
    assert!(
        (d_y - expected).abs() < 1e-2 * expected.abs(),
        "dF/dy = {d_y}"
    );
}
