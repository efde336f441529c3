#![deny(clippy::all, clippy::pedantic)]
//! Demo runtime.
//!
//! Runs a two-motor drone above segment terrain: three seconds of balanced
//! hover followed by an asymmetric-thrust turn, then a small
//! differentiability check that backpropagates a height loss to the body
//! mass. Pass `--draw` to write rendered frames as PNGs under `frames/`.

mod app;

use anyhow::Result;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let draw = std::env::args().any(|a| a == "--draw");
    app::run(draw)
}
