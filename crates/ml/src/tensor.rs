//! Tensor handles and the differentiable operation set.
//!
//! A [`Tensor`] is a copyable index into a [`Graph`] arena. Every operation
//! takes the graph as an explicit argument, computes the result eagerly and
//! registers a backward closure when any operand tracks gradients. Shapes are
//! `(rows, cols)`; vectors are `(n, 1)` and scalars `(1, 1)`. A `(1, 1)`
//! right-hand operand broadcasts over `mul` and `div`.

use nalgebra::DMatrix;

use crate::graph::Graph;

/// Handle to a node in a [`Graph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tensor(pub(crate) usize);

fn same_shape(g: &Graph, a: Tensor, b: Tensor, op: &str) {
    let (ar, ac) = g.shape(a);
    let (br, bc) = g.shape(b);
    assert!(
        ar == br && ac == bc,
        "shape mismatch in {op}: {ar}x{ac} vs {br}x{bc}"
    );
}

impl Tensor {
    // ---------------- elementwise binary ----------------

    pub fn add(self, other: Tensor, g: &mut Graph) -> Tensor {
        same_shape(g, self, other, "add");
        let data = g.data(self) + g.data(other);
        g.op(data, &[self, other], move |g, out| {
            let grad = g.grad_of(out);
            g.accumulate(self, &grad);
            g.accumulate(other, &grad);
        })
    }

    pub fn sub(self, other: Tensor, g: &mut Graph) -> Tensor {
        same_shape(g, self, other, "sub");
        let data = g.data(self) - g.data(other);
        g.op(data, &[self, other], move |g, out| {
            let grad = g.grad_of(out);
            g.accumulate(self, &grad);
            let neg = -&grad;
            g.accumulate(other, &neg);
        })
    }

    /// Hadamard product; a `(1, 1)` right-hand side broadcasts.
    pub fn mul(self, other: Tensor, g: &mut Graph) -> Tensor {
        let broadcast = g.shape(other) == (1, 1);
        if !broadcast {
            same_shape(g, self, other, "mul");
        }
        let data = if broadcast {
            g.data(self) * g.get(other, 0, 0)
        } else {
            g.data(self).component_mul(g.data(other))
        };
        g.op(data, &[self, other], move |g, out| {
            let grad = g.grad_of(out);
            if broadcast {
                let s = g.get(other, 0, 0);
                g.accumulate(self, &(&grad * s));
                let dot = grad.component_mul(g.data(self)).sum();
                g.accumulate_at(other, 0, dot);
            } else {
                let d_self = grad.component_mul(g.data(other));
                g.accumulate(self, &d_self);
                let d_other = grad.component_mul(g.data(self));
                g.accumulate(other, &d_other);
            }
        })
    }

    /// Elementwise quotient; a `(1, 1)` right-hand side broadcasts.
    ///
    /// Division by zero is not checked and produces infinities.
    pub fn div(self, other: Tensor, g: &mut Graph) -> Tensor {
        let broadcast = g.shape(other) == (1, 1);
        if !broadcast {
            same_shape(g, self, other, "div");
        }
        let data = if broadcast {
            g.data(self) / g.get(other, 0, 0)
        } else {
            g.data(self).component_div(g.data(other))
        };
        g.op(data, &[self, other], move |g, out| {
            let grad = g.grad_of(out);
            if broadcast {
                let s = g.get(other, 0, 0);
                g.accumulate(self, &(&grad / s));
                let dot = grad.component_mul(g.data(self)).sum() * (-1.0 / (s * s));
                g.accumulate_at(other, 0, dot);
            } else {
                let d_self = grad.component_div(g.data(other));
                g.accumulate(self, &d_self);
                let squared = g.data(other).map(|v| v * v);
                let d_other = -grad.component_mul(g.data(self)).component_div(&squared);
                g.accumulate(other, &d_other);
            }
        })
    }

    pub fn mul_scalar(self, scalar: f32, g: &mut Graph) -> Tensor {
        let data = g.data(self) * scalar;
        g.op(data, &[self], move |g, out| {
            let grad = g.grad_of(out);
            g.accumulate(self, &(&grad * scalar));
        })
    }

    // ---------------- linear algebra ----------------

    /// Matrix product `(m, k) · (k, n) -> (m, n)`.
    ///
    /// Gradients: `dA = dY · Bᵀ`, `dB = Aᵀ · dY`.
    pub fn matmul(self, other: Tensor, g: &mut Graph) -> Tensor {
        let (rows, inner) = g.shape(self);
        let (inner_b, cols) = g.shape(other);
        assert!(
            inner == inner_b,
            "shape mismatch in matmul: {rows}x{inner} vs {inner_b}x{cols}"
        );
        let data = g.data(self) * g.data(other);
        g.op(data, &[self, other], move |g, out| {
            let grad = g.grad_of(out);
            let d_self = &grad * g.data(other).transpose();
            g.accumulate(self, &d_self);
            let d_other = g.data(self).transpose() * &grad;
            g.accumulate(other, &d_other);
        })
    }

    pub fn transpose(self, g: &mut Graph) -> Tensor {
        let data = g.data(self).transpose();
        g.op(data, &[self], move |g, out| {
            let grad = g.grad_of(out).transpose();
            g.accumulate(self, &grad);
        })
    }

    // ---------------- reductions ----------------

    pub fn sum(self, g: &mut Graph) -> Tensor {
        let total = g.data(self).sum();
        g.op(DMatrix::from_element(1, 1, total), &[self], move |g, out| {
            let v = g.grad_of(out)[(0, 0)];
            let (rows, cols) = g.shape(self);
            g.accumulate(self, &DMatrix::from_element(rows, cols, v));
        })
    }

    /// Collapses one dimension: axis 0 sums columns into a `(1, cols)` row,
    /// axis 1 sums rows into a `(rows, 1)` column.
    pub fn sum_axis(self, axis: usize, g: &mut Graph) -> Tensor {
        assert!(axis <= 1, "axis must be 0 or 1");
        let m = g.data(self);
        let data = if axis == 0 {
            DMatrix::from_fn(1, m.ncols(), |_, j| m.column(j).sum())
        } else {
            DMatrix::from_fn(m.nrows(), 1, |i, _| m.row(i).sum())
        };
        g.op(data, &[self], move |g, out| {
            let grad = g.grad_of(out);
            let (rows, cols) = g.shape(self);
            let delta = if axis == 0 {
                DMatrix::from_fn(rows, cols, |_, j| grad[(0, j)])
            } else {
                DMatrix::from_fn(rows, cols, |i, _| grad[(i, 0)])
            };
            g.accumulate(self, &delta);
        })
    }

    /// Mean over all elements; the gradient divides by the element count.
    pub fn mean(self, g: &mut Graph) -> Tensor {
        let m = g.data(self);
        let count = m.len() as f32;
        let data = DMatrix::from_element(1, 1, m.sum() / count);
        g.op(data, &[self], move |g, out| {
            let v = g.grad_of(out)[(0, 0)] / count;
            let (rows, cols) = g.shape(self);
            g.accumulate(self, &DMatrix::from_element(rows, cols, v));
        })
    }

    pub fn mean_axis(self, axis: usize, g: &mut Graph) -> Tensor {
        assert!(axis <= 1, "axis must be 0 or 1");
        let m = g.data(self);
        let (rows, cols) = m.shape();
        let data = if axis == 0 {
            DMatrix::from_fn(1, cols, |_, j| m.column(j).sum() / rows as f32)
        } else {
            DMatrix::from_fn(rows, 1, |i, _| m.row(i).sum() / cols as f32)
        };
        g.op(data, &[self], move |g, out| {
            let grad = g.grad_of(out);
            let n = (if axis == 0 { rows } else { cols }) as f32;
            let delta = if axis == 0 {
                DMatrix::from_fn(rows, cols, |_, j| grad[(0, j)] / n)
            } else {
                DMatrix::from_fn(rows, cols, |i, _| grad[(i, 0)] / n)
            };
            g.accumulate(self, &delta);
        })
    }

    /// Maximum element; the gradient is one-hot on the first argmax in
    /// column-major order.
    pub fn max(self, g: &mut Graph) -> Tensor {
        let (flat, value) = argbest(g.values(self), |a, b| a > b);
        g.op(DMatrix::from_element(1, 1, value), &[self], move |g, out| {
            let v = g.grad_of(out)[(0, 0)];
            g.accumulate_at(self, flat, v);
        })
    }

    pub fn min(self, g: &mut Graph) -> Tensor {
        let (flat, value) = argbest(g.values(self), |a, b| a < b);
        g.op(DMatrix::from_element(1, 1, value), &[self], move |g, out| {
            let v = g.grad_of(out)[(0, 0)];
            g.accumulate_at(self, flat, v);
        })
    }

    // ---------------- unary elementwise ----------------

    pub fn exp(self, g: &mut Graph) -> Tensor {
        let data = g.data(self).map(f32::exp);
        g.op(data, &[self], move |g, out| {
            let grad = g.grad_of(out);
            let d = g.data(out).component_mul(&grad);
            g.accumulate(self, &d);
        })
    }

    pub fn log(self, g: &mut Graph) -> Tensor {
        let data = g.data(self).map(f32::ln);
        g.op(data, &[self], move |g, out| {
            let grad = g.grad_of(out);
            let d = grad.component_div(g.data(self));
            g.accumulate(self, &d);
        })
    }

    pub fn sqrt(self, g: &mut Graph) -> Tensor {
        let data = g.data(self).map(f32::sqrt);
        g.op(data, &[self], move |g, out| {
            let grad = g.grad_of(out);
            let d = grad.component_div(g.data(out)) * 0.5;
            g.accumulate(self, &d);
        })
    }

    pub fn abs(self, g: &mut Graph) -> Tensor {
        let data = g.data(self).map(f32::abs);
        g.op(data, &[self], move |g, out| {
            let grad = g.grad_of(out);
            let sign = g.data(self).map(|v| {
                if v > 0.0 {
                    1.0
                } else if v < 0.0 {
                    -1.0
                } else {
                    0.0
                }
            });
            let d = grad.component_mul(&sign);
            g.accumulate(self, &d);
        })
    }

    pub fn pow(self, exponent: f32, g: &mut Graph) -> Tensor {
        let data = g.data(self).map(|v| v.powf(exponent));
        g.op(data, &[self], move |g, out| {
            let grad = g.grad_of(out);
            let d = g
                .data(self)
                .map(|v| exponent * v.powf(exponent - 1.0))
                .component_mul(&grad);
            g.accumulate(self, &d);
        })
    }

    pub fn sin(self, g: &mut Graph) -> Tensor {
        let data = g.data(self).map(f32::sin);
        g.op(data, &[self], move |g, out| {
            let grad = g.grad_of(out);
            let d = g.data(self).map(f32::cos).component_mul(&grad);
            g.accumulate(self, &d);
        })
    }

    pub fn cos(self, g: &mut Graph) -> Tensor {
        let data = g.data(self).map(f32::cos);
        g.op(data, &[self], move |g, out| {
            let grad = g.grad_of(out);
            let d = -g.data(self).map(f32::sin).component_mul(&grad);
            g.accumulate(self, &d);
        })
    }

    /// Clamps to `[min, max]`; the gradient is identity inside the interval
    /// (bounds included) and zero outside.
    pub fn clamp(self, min: f32, max: f32, g: &mut Graph) -> Tensor {
        let data = g.data(self).map(|v| v.clamp(min, max));
        g.op(data, &[self], move |g, out| {
            let grad = g.grad_of(out);
            let mask = g
                .data(self)
                .map(|v| if v >= min && v <= max { 1.0 } else { 0.0 });
            let d = grad.component_mul(&mask);
            g.accumulate(self, &d);
        })
    }

    // ---------------- structural ----------------

    /// Differentiable scalar indexing by column-major flat index.
    pub fn select(self, idx: usize, g: &mut Graph) -> Tensor {
        let len = g.data(self).len();
        assert!(
            idx < len,
            "select index {idx} out of bounds for tensor of {len} elements"
        );
        let value = g.values(self)[idx];
        g.op(DMatrix::from_element(1, 1, value), &[self], move |g, out| {
            let v = g.grad_of(out)[(0, 0)];
            g.accumulate_at(self, idx, v);
        })
    }

    /// Glues `(1, 1)` scalars into an `(n, 1)` column vector.
    pub fn stack(parts: &[Tensor], g: &mut Graph) -> Tensor {
        let mut data = DMatrix::zeros(parts.len(), 1);
        for (i, &t) in parts.iter().enumerate() {
            let (rows, cols) = g.shape(t);
            assert!(
                rows == 1 && cols == 1,
                "stack expects (1,1) scalars, got {rows}x{cols} at position {i}"
            );
            data[(i, 0)] = g.get(t, 0, 0);
        }
        let inputs: Vec<Tensor> = parts.to_vec();
        g.op(data, parts, move |g, out| {
            let grad = g.grad_of(out);
            for (i, &t) in inputs.iter().enumerate() {
                g.accumulate_at(t, 0, grad[(i, 0)]);
            }
        })
    }

    /// Concatenates along rows (`dim == 0`) or columns (`dim == 1`).
    pub fn cat(parts: &[Tensor], dim: usize, g: &mut Graph) -> Tensor {
        assert!(dim <= 1, "cat dimension must be 0 or 1");
        assert!(!parts.is_empty(), "cat needs at least one tensor");
        let (rows0, cols0) = g.shape(parts[0]);
        let mut total = 0;
        for &t in parts {
            let (rows, cols) = g.shape(t);
            if dim == 0 {
                assert!(cols == cols0, "shape mismatch in cat(dim=0): {cols} vs {cols0} columns");
                total += rows;
            } else {
                assert!(rows == rows0, "shape mismatch in cat(dim=1): {rows} vs {rows0} rows");
                total += cols;
            }
        }
        let (out_rows, out_cols) = if dim == 0 { (total, cols0) } else { (rows0, total) };
        let mut data = DMatrix::zeros(out_rows, out_cols);
        let mut offset = 0;
        for &t in parts {
            let m = g.data(t);
            if dim == 0 {
                data.view_mut((offset, 0), (m.nrows(), m.ncols())).copy_from(m);
                offset += m.nrows();
            } else {
                data.view_mut((0, offset), (m.nrows(), m.ncols())).copy_from(m);
                offset += m.ncols();
            }
        }
        let inputs: Vec<Tensor> = parts.to_vec();
        g.op(data, parts, move |g, out| {
            let grad = g.grad_of(out);
            let mut offset = 0;
            for &t in &inputs {
                let (rows, cols) = g.shape(t);
                let block = if dim == 0 {
                    grad.view((offset, 0), (rows, cols)).into_owned()
                } else {
                    grad.view((0, offset), (rows, cols)).into_owned()
                };
                g.accumulate(t, &block);
                offset += if dim == 0 { rows } else { cols };
            }
        })
    }

    /// Reinterprets the column-major element sequence with a new shape.
    pub fn reshape(self, rows: usize, cols: usize, g: &mut Graph) -> Tensor {
        let len = g.data(self).len();
        assert!(
            rows * cols == len,
            "reshape to {rows}x{cols} does not match {len} elements"
        );
        let data = DMatrix::from_iterator(rows, cols, g.data(self).iter().copied());
        g.op(data, &[self], move |g, out| {
            let grad = g.grad_of(out);
            let (r, c) = g.shape(self);
            let delta = DMatrix::from_iterator(r, c, grad.iter().copied());
            g.accumulate(self, &delta);
        })
    }

    // ---------------- distributions ----------------

    /// Log probability of `action` under a diagonal Gaussian with `mean` and
    /// `log_std`, summed over dimensions.
    ///
    /// Gradients flow to `mean` and `log_std`; `action` is treated as a
    /// constant sample.
    pub fn gaussian_log_prob(
        action: Tensor,
        mean: Tensor,
        log_std: Tensor,
        g: &mut Graph,
    ) -> Tensor {
        const LOG_2PI: f32 = 1.837_877_1;
        same_shape(g, action, mean, "gaussian_log_prob");
        same_shape(g, action, log_std, "gaussian_log_prob");
        let n = g.data(action).nrows();
        let mut total = 0.0;
        for i in 0..n {
            let a = g.get(action, i, 0);
            let mu = g.get(mean, i, 0);
            let ls = g.get(log_std, i, 0);
            let diff = (a - mu) / ls.exp();
            total += -0.5 * diff * diff - ls - 0.5 * LOG_2PI;
        }
        let data = DMatrix::from_element(1, 1, total);
        g.op(data, &[mean, log_std], move |g, out| {
            let v = g.grad_of(out)[(0, 0)];
            for i in 0..n {
                let a = g.get(action, i, 0);
                let mu = g.get(mean, i, 0);
                let ls = g.get(log_std, i, 0);
                let sigma = ls.exp();
                let diff = a - mu;
                g.accumulate_at(mean, i, v * diff / (sigma * sigma));
                let normalized = diff / sigma;
                g.accumulate_at(log_std, i, v * (normalized * normalized - 1.0));
            }
        })
    }
}

fn argbest(values: &[f32], better: impl Fn(f32, f32) -> bool) -> (usize, f32) {
    assert!(!values.is_empty(), "reduction over an empty tensor");
    let mut flat = 0;
    let mut best = values[0];
    for (i, &v) in values.iter().enumerate().skip(1) {
        if better(v, best) {
            flat = i;
            best = v;
        }
    }
    (flat, best)
}
