//! Drone hover scenario and a gradient sanity check.

use anyhow::Result;
use glam::Vec2;
use physics::{Body, Engine, Motor};
use render::{NullRenderer, RasterRenderer, Renderer};
use std::path::PathBuf;
use tracing::info;

const GRAVITY: f32 = -9.81;
const HOVER_FRAMES: u32 = 180;
const TURN_FRAMES: u32 = 120;
const FRAME_EVERY: u32 = 10;

pub fn run(draw: bool) -> Result<()> {
    // headless runs skip the framebuffer entirely
    let renderer: Box<dyn Renderer> = if draw {
        Box::new(RasterRenderer::new(800, 600, 40.0)?)
    } else {
        Box::new(NullRenderer::new(800, 600, 40.0))
    };
    let mut engine = Engine::with_renderer(renderer, 0.016, 30);
    engine.set_gravity(0.0, GRAVITY);
    engine.add_ground_segment(-10.0, 0.0, 10.0, 0.0, 0.6);

    // Wide flat drone with a motor near each wingtip.
    let spawn_x = fastrand::f32() * 0.4 - 0.2;
    let mut drone = Body::new(spawn_x, 3.0, 1.0, 2.0, 0.3);
    drone.name = String::from("drone");
    let left = drone.add_motor(Motor::with_footprint(
        Vec2::new(-0.9, 0.2),
        0.2,
        0.3,
        0.1,
        20.0,
    ))?;
    let right = drone.add_motor(Motor::with_footprint(
        Vec2::new(0.9, 0.2),
        0.2,
        0.3,
        0.1,
        20.0,
    ))?;
    let total_mass = drone.mass_value();
    let drone_id = engine.add_body(drone);

    let hover_thrust = total_mass * -GRAVITY / 2.0;
    info!(spawn_x, hover_thrust, "hovering");

    let mut frame = 0;
    while frame < HOVER_FRAMES + TURN_FRAMES {
        let (left_thrust, right_thrust) = if frame < HOVER_FRAMES {
            (hover_thrust, hover_thrust)
        } else {
            (hover_thrust * 1.5, hover_thrust * 0.5)
        };
        {
            let drone = engine.body_mut(drone_id);
            drone.motor_mut(left).set_thrust(left_thrust);
            drone.motor_mut(right).set_thrust(right_thrust);
        }
        if !engine.step() {
            break;
        }
        if frame % 30 == 0 {
            let drone = engine.body(drone_id);
            info!(
                frame,
                x = drone.x(),
                y = drone.y(),
                rotation = drone.angle().to_degrees(),
                "state"
            );
        }
        if draw && frame % FRAME_EVERY == 0 {
            let path = PathBuf::from(format!("frames/{frame:04}.png"));
            engine.renderer_mut().save_frame(&path)?;
        }
        frame += 1;
    }

    gradient_check();
    Ok(())
}

/// Backpropagates a one-step height loss to the body mass: with a constant
/// downward unit force, y1 = y0 - dt²/m, so dL/dm = dt²/m².
fn gradient_check() {
    let mut body = Body::new(0.0, 1.0, 2.0, 1.0, 1.0);
    let mass = body.mass();
    body.graph_mut().set_requires_grad(mass, true);
    let force = body.graph_mut().from_slice(&[0.0, -1.0]);
    body.apply_force(force);
    body.step(0.1);

    let pos = body.pos();
    let g = body.graph_mut();
    let loss = pos.select(1, g);
    g.backward(loss);
    let d_mass = g.grad(mass).map_or(0.0, |grad| grad[(0, 0)]);
    info!(d_mass, expected = 0.01 / 4.0, "mass gradient");
}
