//! The simulation loop: owns bodies and static geometry, applies gravity,
//! runs the contact phases and integrates.

use glam::Vec2;
use render::{NullRenderer, RasterRenderer, Renderer};

use crate::body::Body;
use crate::contact::{self, GroundSegment};
use crate::manifold::{self, ContactManager};
use crate::shapes::Shape;

/// Owns the world: bodies, static segments, gravity, the manifold cache and
/// a renderer.
///
/// [`Engine::update`] advances the simulation by `substeps` substeps of
/// `dt / substeps`; within a substep each dynamic body receives gravity, the
/// segment contact kernel, its motor forces and one integration step, in the
/// order the bodies were registered.
pub struct Engine {
    renderer: Box<dyn Renderer>,
    bodies: Vec<Body>,
    segments: Vec<GroundSegment>,
    contacts: ContactManager,
    gravity: Vec2,
    dt: f32,
    substeps: u32,
}

impl Engine {
    /// Builds an engine with a raster renderer of the given window size and
    /// world-to-screen scale. If the renderer cannot be constructed the
    /// engine still works headlessly with a null renderer.
    #[must_use]
    pub fn new(width: u32, height: u32, scale: f32, dt: f32, substeps: u32) -> Self {
        let renderer: Box<dyn Renderer> = match RasterRenderer::new(width, height, scale) {
            Ok(raster) => Box::new(raster),
            Err(err) => {
                tracing::warn!(%err, "renderer unavailable, running headless");
                Box::new(NullRenderer::new(width, height, scale))
            }
        };
        Self::with_renderer(renderer, dt, substeps)
    }

    #[must_use]
    pub fn with_renderer(renderer: Box<dyn Renderer>, dt: f32, substeps: u32) -> Self {
        assert!(substeps > 0, "substep count must be positive");
        Self {
            renderer,
            bodies: Vec::new(),
            segments: Vec::new(),
            contacts: ContactManager::new(),
            gravity: Vec2::new(0.0, -9.81),
            dt,
            substeps,
        }
    }

    // ---------------- world construction ----------------

    pub fn add_body(&mut self, body: Body) -> usize {
        self.bodies.push(body);
        self.bodies.len() - 1
    }

    pub fn body(&self, index: usize) -> &Body {
        &self.bodies[index]
    }

    pub fn body_mut(&mut self, index: usize) -> &mut Body {
        &mut self.bodies[index]
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn set_gravity(&mut self, x: f32, y: f32) {
        self.gravity = Vec2::new(x, y);
    }

    /// Adds a static ground segment. Stiffness and damping are fixed for
    /// stability; only the friction coefficient varies per segment.
    pub fn add_ground_segment(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, friction: f32) {
        self.segments.push(GroundSegment::new(
            Vec2::new(x1, y1),
            Vec2::new(x2, y2),
            friction,
        ));
    }

    pub fn segments(&self) -> &[GroundSegment] {
        &self.segments
    }

    pub fn clear_geometry(&mut self) {
        self.segments.clear();
    }

    pub fn contacts(&self) -> &ContactManager {
        &self.contacts
    }

    /// Mutable access for a downstream impulse solver.
    pub fn contacts_mut(&mut self) -> &mut ContactManager {
        &mut self.contacts
    }

    pub fn renderer_mut(&mut self) -> &mut dyn Renderer {
        self.renderer.as_mut()
    }

    // ---------------- simulation ----------------

    /// Advances one frame of physics.
    pub fn update(&mut self) {
        let sub_dt = self.dt / self.substeps as f32;
        for _ in 0..self.substeps {
            for body in &mut self.bodies {
                if body.is_static {
                    continue;
                }

                // Gravity: F = m g, with the mass tensor in the graph
                let mass = body.mass();
                let gravity = self.gravity;
                let force = {
                    let g = body.graph_mut();
                    let gravity_t = g.from_slice(&[gravity.x, gravity.y]);
                    gravity_t.mul(mass, g)
                };
                body.apply_force(force);

                let aabb = body.aabb();
                let candidates: Vec<&GroundSegment> = self
                    .segments
                    .iter()
                    .filter(|seg| seg.aabb.overlaps(&aabb))
                    .collect();
                contact::apply_segment_contacts(body, &candidates);

                body.apply_motor_forces();
                body.step(sub_dt);
            }
        }
        self.update_manifolds();
    }

    /// Broadphase and narrowphase over body pairs, refreshing the manifold
    /// cache. Impulse resolution is left to a downstream solver.
    fn update_manifolds(&mut self) {
        self.contacts.begin_frame();
        for i in 0..self.bodies.len() {
            for j in (i + 1)..self.bodies.len() {
                if self.bodies[i].is_static && self.bodies[j].is_static {
                    continue;
                }
                let (aabb_a, aabb_b) = (self.bodies[i].aabb(), self.bodies[j].aabb());
                let Some(hit) = manifold::collide_aabb(&aabb_a, &aabb_b) else {
                    continue;
                };
                let pos_a = Vec2::new(self.bodies[i].x(), self.bodies[i].y());
                let pos_b = Vec2::new(self.bodies[j].x(), self.bodies[j].y());
                let manifold = self.contacts.get_or_create(i, j, &self.bodies);
                manifold.update_points(hit.normal, &hit.points, hit.depth, pos_a, pos_b);
                manifold.touching = true;
                manifold.compute_mass(&self.bodies[i], &self.bodies[j]);
            }
        }
        self.contacts.end_frame();
    }

    /// One frame of the outer loop: events, physics, drawing. Returns `false`
    /// when the renderer requests quitting.
    pub fn step(&mut self) -> bool {
        if !self.renderer.process_events() {
            return false;
        }
        self.update();
        self.renderer.clear();
        self.render_bodies();
        self.renderer.present();
        true
    }

    /// Draws the static segments and every body shape.
    pub fn render_bodies(&mut self) {
        for seg in &self.segments {
            self.renderer
                .draw_line(seg.p1.x, seg.p1.y, seg.p2.x, seg.p2.y, 0.0, 1.0, 0.0);
        }
        for body in &self.bodies {
            for shape in &body.shapes {
                match *shape {
                    Shape::Box { width, height, .. } => {
                        self.renderer
                            .draw_box(body.x(), body.y(), width, height, body.angle(), 1.0, 1.0, 1.0);
                    }
                    Shape::Circle { radius, .. } => {
                        self.renderer
                            .draw_circle(body.x(), body.y(), radius, 1.0, 1.0, 1.0);
                    }
                }
            }
        }
    }
}
