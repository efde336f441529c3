//! Dense tensors with reverse-mode automatic differentiation.
//!
//! The engine is built around a [`Graph`] arena that owns every tensor node,
//! and a lightweight [`Tensor`] handle that indexes into it. Operations append
//! new nodes to the arena and record a backward closure over the operand
//! handles, so the computation graph is a DAG by construction and can be
//! dropped (or compacted) in one move.
//!
//! ```
//! use ml::Graph;
//!
//! let mut g = Graph::new();
//! let a = g.from_slice(&[1.0, 2.0, 3.0]);
//! g.set_requires_grad(a, true);
//! let loss = a.mul(a, &mut g).sum(&mut g);
//! g.backward(loss);
//! assert_eq!(g.grad(a).unwrap().as_slice(), &[2.0, 4.0, 6.0]);
//! ```

pub mod activations;
pub mod graph;
pub mod optim;
pub mod tensor;

pub use activations::{relu, tanh};
pub use graph::Graph;
pub use tensor::Tensor;
