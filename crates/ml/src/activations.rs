//! Differentiable activation functions.

use crate::graph::Graph;
use crate::tensor::Tensor;

/// Rectified linear unit. The gradient passes where the input is positive.
pub fn relu(input: Tensor, g: &mut Graph) -> Tensor {
    let data = g.data(input).map(|v| v.max(0.0));
    g.op(data, &[input], move |g, out| {
        let grad = g.grad_of(out);
        let mask = g.data(input).map(|v| if v > 0.0 { 1.0 } else { 0.0 });
        let d = mask.component_mul(&grad);
        g.accumulate(input, &d);
    })
}

/// Hyperbolic tangent. `dy/dx = 1 - y²`, read from the result values.
pub fn tanh(input: Tensor, g: &mut Graph) -> Tensor {
    let data = g.data(input).map(f32::tanh);
    g.op(data, &[input], move |g, out| {
        let grad = g.grad_of(out);
        let d = g.data(out).map(|y| 1.0 - y * y).component_mul(&grad);
        g.accumulate(input, &d);
    })
}
