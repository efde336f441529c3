//! Parameter update policies over a registered set of tensors.
//!
//! Each optimizer owns an ordered list of parameter handles and reads the
//! gradients out of the graph at `step`. Parameters whose gradient is missing
//! or whose requires-grad flag is off are skipped silently.

use nalgebra::DMatrix;

use crate::graph::Graph;
use crate::tensor::Tensor;

/// Plain stochastic gradient descent: `p -= lr * grad`.
pub struct Sgd {
    params: Vec<Tensor>,
    lr: f32,
}

impl Sgd {
    #[must_use]
    pub fn new(params: Vec<Tensor>, lr: f32) -> Self {
        Self { params, lr }
    }

    pub fn step(&mut self, g: &mut Graph) {
        for &p in &self.params {
            if !g.requires_grad(p) {
                continue;
            }
            let Some(grad) = g.grad(p) else { continue };
            let update = grad * self.lr;
            *g.data_mut(p) -= update;
        }
    }

    pub fn zero_grad(&self, g: &mut Graph) {
        for &p in &self.params {
            g.zero_grad(p);
        }
    }
}

/// Adam with bias-corrected first and second moment estimates.
pub struct Adam {
    params: Vec<Tensor>,
    lr: f32,
    beta1: f32,
    beta2: f32,
    eps: f32,
    t: u32,
    m: Vec<DMatrix<f32>>,
    v: Vec<DMatrix<f32>>,
}

impl Adam {
    #[must_use]
    pub fn new(g: &Graph, params: Vec<Tensor>, lr: f32) -> Self {
        Self::with_betas(g, params, lr, 0.9, 0.999, 1e-8)
    }

    #[must_use]
    pub fn with_betas(
        g: &Graph,
        params: Vec<Tensor>,
        lr: f32,
        beta1: f32,
        beta2: f32,
        eps: f32,
    ) -> Self {
        let moments = zero_moments(g, &params);
        Self {
            params,
            lr,
            beta1,
            beta2,
            eps,
            t: 0,
            m: moments.clone(),
            v: moments,
        }
    }

    pub fn step(&mut self, g: &mut Graph) {
        self.t += 1;
        for (i, &p) in self.params.iter().enumerate() {
            if !g.requires_grad(p) {
                continue;
            }
            let Some(grad) = g.grad(p) else { continue };
            let grad = grad.clone();
            let update = adam_update(
                &mut self.m[i],
                &mut self.v[i],
                &grad,
                self.t,
                self.lr,
                self.beta1,
                self.beta2,
                self.eps,
            );
            *g.data_mut(p) -= update;
        }
    }

    pub fn zero_grad(&self, g: &mut Graph) {
        for &p in &self.params {
            g.zero_grad(p);
        }
    }
}

/// Adam with decoupled weight decay applied before the moment update.
pub struct AdamW {
    params: Vec<Tensor>,
    lr: f32,
    beta1: f32,
    beta2: f32,
    eps: f32,
    weight_decay: f32,
    t: u32,
    m: Vec<DMatrix<f32>>,
    v: Vec<DMatrix<f32>>,
}

impl AdamW {
    #[must_use]
    pub fn new(g: &Graph, params: Vec<Tensor>, lr: f32, weight_decay: f32) -> Self {
        Self::with_betas(g, params, lr, 0.9, 0.999, 1e-8, weight_decay)
    }

    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn with_betas(
        g: &Graph,
        params: Vec<Tensor>,
        lr: f32,
        beta1: f32,
        beta2: f32,
        eps: f32,
        weight_decay: f32,
    ) -> Self {
        let moments = zero_moments(g, &params);
        Self {
            params,
            lr,
            beta1,
            beta2,
            eps,
            weight_decay,
            t: 0,
            m: moments.clone(),
            v: moments,
        }
    }

    pub fn step(&mut self, g: &mut Graph) {
        self.t += 1;
        for (i, &p) in self.params.iter().enumerate() {
            if !g.requires_grad(p) {
                continue;
            }
            if g.grad(p).is_none() {
                continue;
            }
            if self.weight_decay > 0.0 {
                let scale = 1.0 - self.lr * self.weight_decay;
                *g.data_mut(p) *= scale;
            }
            let grad = g.grad(p).unwrap().clone();
            let update = adam_update(
                &mut self.m[i],
                &mut self.v[i],
                &grad,
                self.t,
                self.lr,
                self.beta1,
                self.beta2,
                self.eps,
            );
            *g.data_mut(p) -= update;
        }
    }

    pub fn zero_grad(&self, g: &mut Graph) {
        for &p in &self.params {
            g.zero_grad(p);
        }
    }
}

fn zero_moments(g: &Graph, params: &[Tensor]) -> Vec<DMatrix<f32>> {
    params
        .iter()
        .map(|&p| {
            let (rows, cols) = g.shape(p);
            DMatrix::zeros(rows, cols)
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn adam_update(
    m: &mut DMatrix<f32>,
    v: &mut DMatrix<f32>,
    grad: &DMatrix<f32>,
    t: u32,
    lr: f32,
    beta1: f32,
    beta2: f32,
    eps: f32,
) -> DMatrix<f32> {
    *m = &*m * beta1 + grad * (1.0 - beta1);
    *v = &*v * beta2 + grad.map(|x| x * x) * (1.0 - beta2);
    let m_hat = &*m / (1.0 - beta1.powi(t as i32));
    let v_hat = &*v / (1.0 - beta2.powi(t as i32));
    m_hat.zip_map(&v_hat, |m, v| lr * m / (v.sqrt() + eps))
}
