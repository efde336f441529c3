//! Optimizer behaviour.

use ml::optim::{Adam, AdamW, Sgd};
use ml::Graph;

#[test]
fn sgd_applies_lr_times_grad() {
    let mut g = Graph::new();
    let p = g.from_slice(&[1.0, -2.0]);
    g.set_requires_grad(p, true);

    let loss = p.sum(&mut g);
    g.backward(loss);

    let mut sgd = Sgd::new(vec![p], 0.1);
    sgd.step(&mut g);
    assert_eq!(g.values(p), &[0.9, -2.1]);

    sgd.zero_grad(&mut g);
    assert_eq!(g.grad(p).unwrap().as_slice(), &[0.0, 0.0]);
}

#[test]
fn parameters_without_gradients_are_skipped() {
    let mut g = Graph::new();
    let tracked = g.scalar(1.0);
    g.set_requires_grad(tracked, true);
    let untracked = g.scalar(5.0);

    let loss = tracked.mul_scalar(2.0, &mut g);
    g.backward(loss);

    let mut sgd = Sgd::new(vec![tracked, untracked], 0.5);
    sgd.step(&mut g);
    assert_eq!(g.get(tracked, 0, 0), 0.0);
    // untracked parameter is silently left alone
    assert_eq!(g.get(untracked, 0, 0), 5.0);
}

#[test]
fn adam_minimizes_a_quadratic() {
    let mut g = Graph::new();
    let theta = g.scalar(5.0);
    g.set_requires_grad(theta, true);

    let mut adam = Adam::new(&g, vec![theta], 0.1);
    for _ in 0..200 {
        adam.zero_grad(&mut g);
        let loss = theta.mul(theta, &mut g);
        g.backward(loss);
        adam.step(&mut g);
    }
    assert!(
        g.get(theta, 0, 0).abs() < 0.1,
        "theta did not converge: {}",
        g.get(theta, 0, 0)
    );
}

#[test]
fn adam_first_step_moves_by_roughly_lr() {
    let mut g = Graph::new();
    let theta = g.scalar(5.0);
    g.set_requires_grad(theta, true);

    let mut adam = Adam::new(&g, vec![theta], 0.1);
    let loss = theta.mul(theta, &mut g);
    g.backward(loss);
    adam.step(&mut g);

    // with bias correction the first update is lr * g / (|g| + eps) ~= lr
    assert!((g.get(theta, 0, 0) - 4.9).abs() < 1e-3);
}

#[test]
fn adamw_decays_weights_before_the_update() {
    let mut g = Graph::new();
    let theta = g.scalar(2.0);
    g.set_requires_grad(theta, true);

    // zero gradient: only the decoupled decay moves the parameter
    let loss = theta.mul_scalar(0.0, &mut g);
    g.backward(loss);

    let mut adamw = AdamW::new(&g, vec![theta], 0.1, 0.5);
    adamw.step(&mut g);
    assert!((g.get(theta, 0, 0) - 2.0 * (1.0 - 0.1 * 0.5)).abs() < 1e-5);
}
