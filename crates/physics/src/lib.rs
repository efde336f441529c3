#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_precision_loss,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
//! # Differentiable planar rigid-body dynamics
//!
//! This crate provides the physics layer of the simulation: rigid bodies whose
//! state lives as tensors in a per-body graph arena, thruster motors, soft
//! penalty contact against static ground segments, a cached manifold index for
//! body pairs, and the engine loop that ties them together.
//!
//! Because every state update is expressed through `ml` tensor operations, a
//! scalar computed from the resulting state can be backpropagated to physical
//! parameters such as masses or the initial state.
//!
//! ```no_run
//! use physics::{Body, Engine};
//!
//! let mut engine = Engine::new(800, 600, 40.0, 0.016, 10);
//! engine.set_gravity(0.0, -9.81);
//! engine.add_ground_segment(-10.0, 0.0, 10.0, 0.0, 0.5);
//! engine.add_body(Body::new(0.0, 3.0, 1.0, 1.0, 1.0));
//! while engine.step() {}
//! ```

pub mod body;
pub mod contact;
pub mod engine;
pub mod error;
pub mod manifold;
pub mod motor;
pub mod shapes;

pub use body::Body;
pub use contact::GroundSegment;
pub use engine::Engine;
pub use error::PhysicsError;
pub use manifold::{ContactManager, ContactManifold, ContactPoint};
pub use motor::Motor;
pub use shapes::{Aabb, Shape};
