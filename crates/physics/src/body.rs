//! Planar rigid bodies with differentiable state.

use glam::Vec2;
use ml::{Graph, Tensor};

use crate::error::PhysicsError;
use crate::motor::Motor;
use crate::shapes::{Aabb, Shape};

/// A planar rigid body.
///
/// All kinematic state (position, velocity, rotation, angular velocity) and
/// the force/torque accumulators are tensors inside the body's own graph
/// arena, so every integration step extends a computation graph that can be
/// backpropagated. Mass and inertia are tensors too; toggle their
/// requires-grad flag to obtain parameter gradients.
///
/// The arena is compacted at the start of every corner computation: the eight
/// owned tensors survive as detached leaves and everything else is dropped.
/// Run a backward pass before the next corner computation if it depends on
/// the accumulated history.
pub struct Body {
    graph: Graph,
    pos: Tensor,
    vel: Tensor,
    rotation: Tensor,
    ang_vel: Tensor,
    mass: Tensor,
    inertia: Tensor,
    force_acc: Tensor,
    torque_acc: Tensor,
    pub shapes: Vec<Shape>,
    motors: Vec<Motor>,
    pub name: String,
    pub is_static: bool,
    /// Friction coefficient in `[0, 1]`.
    pub friction: f32,
    /// Restitution in `[0, 1]`; 0 = no bounce.
    pub restitution: f32,
}

impl Body {
    /// Dynamic box body at `(x, y)`.
    ///
    /// Box inertia is `m (w² + h²) / 12`.
    ///
    /// # Panics
    /// If `mass` is not positive.
    #[must_use]
    pub fn new(x: f32, y: f32, mass: f32, width: f32, height: f32) -> Self {
        assert!(mass > 0.0, "body mass must be positive, got {mass}");
        let mut graph = Graph::new();
        let pos = graph.from_slice(&[x, y]);
        let vel = graph.from_slice(&[0.0, 0.0]);
        let rotation = graph.scalar(0.0);
        let ang_vel = graph.scalar(0.0);
        for state in [pos, vel, rotation, ang_vel] {
            graph.set_requires_grad(state, true);
        }
        let mass_t = graph.scalar(mass);
        let inertia = graph.scalar(mass * (width * width + height * height) / 12.0);
        let force_acc = graph.from_slice(&[0.0, 0.0]);
        let torque_acc = graph.scalar(0.0);
        Self {
            graph,
            pos,
            vel,
            rotation,
            ang_vel,
            mass: mass_t,
            inertia,
            force_acc,
            torque_acc,
            shapes: vec![Shape::Box {
                width,
                height,
                offset: Vec2::ZERO,
            }],
            motors: Vec::new(),
            name: String::from("body"),
            is_static: false,
            friction: 0.5,
            restitution: 0.0,
        }
    }

    /// Static collider (ground, walls, platforms): never integrates, counts
    /// as infinite mass during contact, and defaults to high friction.
    #[must_use]
    pub fn new_static(x: f32, y: f32, width: f32, height: f32, rotation: f32) -> Self {
        let mut body = Self::new(x, y, 1.0, width, height);
        body.is_static = true;
        body.friction = 0.8;
        body.restitution = 0.0;
        if rotation != 0.0 {
            body.graph.set(body.rotation, 0, 0, rotation);
        }
        body
    }

    // ---------------- tensor handles and scalar getters ----------------

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn pos(&self) -> Tensor {
        self.pos
    }

    pub fn vel(&self) -> Tensor {
        self.vel
    }

    pub fn rotation(&self) -> Tensor {
        self.rotation
    }

    pub fn ang_vel(&self) -> Tensor {
        self.ang_vel
    }

    pub fn mass(&self) -> Tensor {
        self.mass
    }

    pub fn inertia(&self) -> Tensor {
        self.inertia
    }

    pub fn force_accumulator(&self) -> Tensor {
        self.force_acc
    }

    pub fn torque_accumulator(&self) -> Tensor {
        self.torque_acc
    }

    pub fn x(&self) -> f32 {
        self.graph.get(self.pos, 0, 0)
    }

    pub fn y(&self) -> f32 {
        self.graph.get(self.pos, 1, 0)
    }

    pub fn angle(&self) -> f32 {
        self.graph.get(self.rotation, 0, 0)
    }

    pub fn linear_velocity(&self) -> Vec2 {
        Vec2::new(self.graph.get(self.vel, 0, 0), self.graph.get(self.vel, 1, 0))
    }

    pub fn angular_velocity(&self) -> f32 {
        self.graph.get(self.ang_vel, 0, 0)
    }

    pub fn mass_value(&self) -> f32 {
        self.graph.get(self.mass, 0, 0)
    }

    pub fn inertia_value(&self) -> f32 {
        self.graph.get(self.inertia, 0, 0)
    }

    // ---------------- motors ----------------

    /// Attaches a motor, adding its mass and point-mass inertia contribution
    /// to the body.
    ///
    /// # Errors
    /// [`PhysicsError::MotorOverlap`] if the footprint intersects an already
    /// attached motor; the body is left unchanged.
    pub fn add_motor(&mut self, motor: Motor) -> Result<usize, PhysicsError> {
        if self.motors.iter().any(|m| m.overlaps(&motor)) {
            return Err(PhysicsError::MotorOverlap);
        }
        let mass = self.graph.get(self.mass, 0, 0) + motor.mass;
        self.graph.set(self.mass, 0, 0, mass);
        let r_sq = motor.offset.length_squared();
        let inertia = self.graph.get(self.inertia, 0, 0) + motor.mass * r_sq;
        self.graph.set(self.inertia, 0, 0, inertia);
        self.motors.push(motor);
        Ok(self.motors.len() - 1)
    }

    pub fn motors(&self) -> &[Motor] {
        &self.motors
    }

    pub fn motor_mut(&mut self, index: usize) -> &mut Motor {
        &mut self.motors[index]
    }

    /// Applies the thrust of every active motor at its world-space mount
    /// point. Thrust magnitudes are plain constants, but the rotation into
    /// world space and the torque arm are tensor operations, so gradients
    /// flow through the application path.
    pub fn apply_motor_forces(&mut self) {
        for i in 0..self.motors.len() {
            let motor = self.motors[i];
            if motor.thrust() <= 0.0 {
                continue;
            }
            let local = Vec2::new(motor.angle.cos(), motor.angle.sin()) * motor.thrust();
            let (pos, rotation) = (self.pos, self.rotation);
            let (force, point) = {
                let g = &mut self.graph;
                let cos_t = rotation.cos(g);
                let sin_t = rotation.sin(g);
                let fx = cos_t.mul_scalar(local.x, g).sub(sin_t.mul_scalar(local.y, g), g);
                let fy = sin_t.mul_scalar(local.x, g).add(cos_t.mul_scalar(local.y, g), g);
                let force = Tensor::stack(&[fx, fy], g);
                let rx = cos_t
                    .mul_scalar(motor.offset.x, g)
                    .sub(sin_t.mul_scalar(motor.offset.y, g), g);
                let ry = sin_t
                    .mul_scalar(motor.offset.x, g)
                    .add(cos_t.mul_scalar(motor.offset.y, g), g);
                let px = pos.select(0, g);
                let py = pos.select(1, g);
                let wx = px.add(rx, g);
                let wy = py.add(ry, g);
                (force, Tensor::stack(&[wx, wy], g))
            };
            self.apply_force_at_point(force, point);
        }
    }

    // ---------------- forces ----------------

    /// Adds `force` (a `(2, 1)` tensor in this body's graph) to the force
    /// accumulator.
    pub fn apply_force(&mut self, force: Tensor) {
        self.force_acc = self.force_acc.add(force, &mut self.graph);
    }

    pub fn apply_torque(&mut self, torque: Tensor) {
        self.torque_acc = self.torque_acc.add(torque, &mut self.graph);
    }

    /// Applies a linear force plus the torque `(p - pos) × f` from its
    /// world-space application point. Both arguments are tensors so gradients
    /// flow through the point of application.
    pub fn apply_force_at_point(&mut self, force: Tensor, point: Tensor) {
        self.apply_force(force);
        let pos = self.pos;
        let g = &mut self.graph;
        let px = pos.select(0, g);
        let py = pos.select(1, g);
        let qx = point.select(0, g);
        let qy = point.select(1, g);
        let dx = qx.sub(px, g);
        let dy = qy.sub(py, g);
        let fx = force.select(0, g);
        let fy = force.select(1, g);
        let torque = dx.mul(fy, g).sub(dy.mul(fx, g), g);
        self.apply_torque(torque);
    }

    /// Resets both accumulators to fresh zero tensors.
    pub fn reset_forces(&mut self) {
        self.force_acc = self.graph.from_slice(&[0.0, 0.0]);
        self.torque_acc = self.graph.scalar(0.0);
    }

    // ---------------- integration ----------------

    /// One semi-implicit Euler substep driven by explicit force and torque
    /// tensors. Static bodies do not move.
    pub fn step_with(&mut self, forces: Tensor, torque: Tensor, dt: f32) {
        if self.is_static {
            return;
        }
        let (mass, inertia) = (self.mass, self.inertia);
        let (pos, vel, rotation, ang_vel) = (self.pos, self.vel, self.rotation, self.ang_vel);
        let g = &mut self.graph;
        let dt_t = g.scalar(dt);
        let acc = forces.div(mass, g);
        let alpha = torque.div(inertia, g);
        let vel = vel.add(acc.mul(dt_t, g), g);
        let pos = pos.add(vel.mul(dt_t, g), g);
        let ang_vel = ang_vel.add(alpha.mul(dt_t, g), g);
        let rotation = rotation.add(ang_vel.mul(dt_t, g), g);
        self.vel = vel;
        self.pos = pos;
        self.ang_vel = ang_vel;
        self.rotation = rotation;
    }

    /// One substep driven by the accumulators, which are cleared afterwards.
    pub fn step(&mut self, dt: f32) {
        let (forces, torque) = (self.force_acc, self.torque_acc);
        self.step_with(forces, torque, dt);
        self.reset_forces();
    }

    // ---------------- geometry ----------------

    /// World-space box corners as a flat list of scalar tensors
    /// `[x0, y0, .., x3, y3]`, ordered TR, TL, BL, BR.
    ///
    /// Compacts the graph arena first; handles from before this call are
    /// invalidated.
    pub fn corners(&mut self) -> Vec<Tensor> {
        self.clear_graph();
        let Shape::Box { width, height, .. } = self.shapes[0] else {
            return Vec::new();
        };
        let hw = width / 2.0;
        let hh = height / 2.0;
        let (pos, rotation) = (self.pos, self.rotation);
        let g = &mut self.graph;
        let cos_t = rotation.cos(g);
        let sin_t = rotation.sin(g);
        let px = pos.select(0, g);
        let py = pos.select(1, g);
        let offsets = [(hw, hh), (-hw, hh), (-hw, -hh), (hw, -hh)];
        let mut corners = Vec::with_capacity(8);
        for (ox, oy) in offsets {
            let rot_x = cos_t.mul_scalar(ox, g).sub(sin_t.mul_scalar(oy, g), g);
            let rot_y = sin_t.mul_scalar(ox, g).add(cos_t.mul_scalar(oy, g), g);
            corners.push(px.add(rot_x, g));
            corners.push(py.add(rot_y, g));
        }
        corners
    }

    /// Compacts the arena down to the eight owned tensors.
    pub fn clear_graph(&mut self) {
        let Self {
            graph,
            pos,
            vel,
            rotation,
            ang_vel,
            mass,
            inertia,
            force_acc,
            torque_acc,
            ..
        } = self;
        graph.compact(&mut [pos, vel, rotation, ang_vel, mass, inertia, force_acc, torque_acc]);
    }

    /// Conservative bounding box: the circumscribing disc of the first shape
    /// around the current position. Loose, but never misses a true overlap.
    pub fn aabb(&self) -> Aabb {
        let center = Vec2::new(self.x(), self.y());
        let radius = match self.shapes[0] {
            Shape::Box { width, height, .. } => (width * width + height * height).sqrt() / 2.0,
            Shape::Circle { radius, .. } => radius,
        };
        Aabb::around(center, radius)
    }
}
