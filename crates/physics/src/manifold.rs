//! Cached contact manifolds for body-body pairs.
//!
//! The manager keys manifolds by the ordered body-index pair so lookups are
//! symmetric, persists them while the pair keeps touching, and carries
//! accumulated impulses across frames to warm-start an impulse solver. The
//! solver itself is not part of this crate; the impulse fields are reserved
//! for it.

use glam::Vec2;
use std::collections::HashMap;

use crate::body::Body;
use crate::shapes::Aabb;

pub const MAX_POINTS: usize = 2;

/// One contact point with warm-start state and precomputed effective masses.
#[derive(Clone, Copy, Debug, Default)]
pub struct ContactPoint {
    pub position: Vec2,
    pub penetration: f32,
    /// Offset from body A's centre at the time of contact.
    pub local_a: Vec2,
    /// Offset from body B's centre at the time of contact.
    pub local_b: Vec2,
    pub normal_impulse: f32,
    pub tangent_impulse: f32,
    pub normal_mass: f32,
    pub tangent_mass: f32,
}

/// Persistent contact record between two bodies.
#[derive(Clone, Debug)]
pub struct ContactManifold {
    pub body_a: usize,
    pub body_b: usize,
    /// Contact normal pointing from body A toward body B.
    pub normal: Vec2,
    pub tangent: Vec2,
    pub points: [ContactPoint; MAX_POINTS],
    pub point_count: usize,
    /// Combined friction, `sqrt(mu_a * mu_b)`.
    pub friction: f32,
    /// Combined restitution, `max(e_a, e_b)`.
    pub restitution: f32,
    pub touching: bool,
    pub was_touching: bool,
}

impl ContactManifold {
    /// Replaces the contact geometry while keeping the accumulated impulses
    /// of points at the same slot, so warm-starting survives frame-to-frame
    /// updates.
    pub fn update_points(
        &mut self,
        normal: Vec2,
        points: &[Vec2],
        penetration: f32,
        pos_a: Vec2,
        pos_b: Vec2,
    ) {
        self.normal = normal;
        self.tangent = Vec2::new(-normal.y, normal.x);
        self.point_count = points.len().min(MAX_POINTS);
        for (slot, &position) in self.points.iter_mut().zip(points.iter()) {
            slot.position = position;
            slot.penetration = penetration;
            slot.local_a = position - pos_a;
            slot.local_b = position - pos_b;
        }
    }

    /// Precomputes the effective mass seen by the solver along the normal and
    /// tangent for every point:
    /// `k = 1/m_a + 1/m_b + (r_a x d)²/I_a + (r_b x d)²/I_b`.
    /// Static bodies contribute zero inverse mass; if the denominator is zero
    /// (two static bodies) the stored mass is zero.
    pub fn compute_mass(&mut self, body_a: &Body, body_b: &Body) {
        let inv_mass_a = if body_a.is_static { 0.0 } else { 1.0 / body_a.mass_value() };
        let inv_mass_b = if body_b.is_static { 0.0 } else { 1.0 / body_b.mass_value() };
        let inv_inertia_a = if body_a.is_static { 0.0 } else { 1.0 / body_a.inertia_value() };
        let inv_inertia_b = if body_b.is_static { 0.0 } else { 1.0 / body_b.inertia_value() };

        let pos_a = Vec2::new(body_a.x(), body_a.y());
        let pos_b = Vec2::new(body_b.x(), body_b.y());
        let (normal, tangent) = (self.normal, self.tangent);

        for point in self.points.iter_mut().take(self.point_count) {
            let ra = point.position - pos_a;
            let rb = point.position - pos_b;

            let ra_cross_n = ra.x * normal.y - ra.y * normal.x;
            let rb_cross_n = rb.x * normal.y - rb.y * normal.x;
            let k_normal = inv_mass_a
                + inv_mass_b
                + ra_cross_n * ra_cross_n * inv_inertia_a
                + rb_cross_n * rb_cross_n * inv_inertia_b;
            point.normal_mass = if k_normal > 0.0 { 1.0 / k_normal } else { 0.0 };

            let ra_cross_t = ra.x * tangent.y - ra.y * tangent.x;
            let rb_cross_t = rb.x * tangent.y - rb.y * tangent.x;
            let k_tangent = inv_mass_a
                + inv_mass_b
                + ra_cross_t * ra_cross_t * inv_inertia_a
                + rb_cross_t * rb_cross_t * inv_inertia_b;
            point.tangent_mass = if k_tangent > 0.0 { 1.0 / k_tangent } else { 0.0 };
        }
    }
}

/// Narrowphase result for a pair of bounding boxes.
pub struct AabbContact {
    pub normal: Vec2,
    pub depth: f32,
    pub points: [Vec2; 2],
}

/// Overlap test on the bodies' bounding boxes: the normal is the axis of
/// least penetration (pointing from `a` toward `b`) and the two points span
/// the overlap region on the contact plane.
#[must_use]
pub fn collide_aabb(a: &Aabb, b: &Aabb) -> Option<AabbContact> {
    let delta = b.center() - a.center();
    let overlap = a.half_extents() + b.half_extents() - delta.abs();
    if overlap.x <= 0.0 || overlap.y <= 0.0 {
        return None;
    }
    let lo = a.min.max(b.min);
    let hi = a.max.min(b.max);
    if overlap.x < overlap.y {
        let x = (lo.x + hi.x) * 0.5;
        Some(AabbContact {
            normal: Vec2::new(delta.x.signum(), 0.0),
            depth: overlap.x,
            points: [Vec2::new(x, lo.y), Vec2::new(x, hi.y)],
        })
    } else {
        let y = (lo.y + hi.y) * 0.5;
        Some(AabbContact {
            normal: Vec2::new(0.0, delta.y.signum()),
            depth: overlap.y,
            points: [Vec2::new(lo.x, y), Vec2::new(hi.x, y)],
        })
    }
}

/// Manifold cache keyed by the ordered body-index pair.
#[derive(Default)]
pub struct ContactManager {
    manifolds: HashMap<(usize, usize), ContactManifold>,
    active: Vec<(usize, usize)>,
}

impl ContactManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.manifolds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.manifolds.is_empty()
    }

    /// Rolls every manifold's `touching` into `was_touching` and resets it;
    /// clears the active list. Call once at the start of each frame.
    pub fn begin_frame(&mut self) {
        for manifold in self.manifolds.values_mut() {
            manifold.was_touching = manifold.touching;
            manifold.touching = false;
        }
        self.active.clear();
    }

    /// Looks up or creates the manifold for a body pair. Combined material
    /// properties are computed once at creation; warm-start impulses and
    /// lifecycle flags of an existing manifold are untouched — only
    /// [`ContactManager::begin_frame`] rolls `touching` into `was_touching`.
    pub fn get_or_create(&mut self, a: usize, b: usize, bodies: &[Body]) -> &mut ContactManifold {
        let key = if a <= b { (a, b) } else { (b, a) };
        self.manifolds.entry(key).or_insert_with(|| {
            let (body_a, body_b) = (&bodies[key.0], &bodies[key.1]);
            ContactManifold {
                body_a: key.0,
                body_b: key.1,
                normal: Vec2::Y,
                tangent: Vec2::X,
                points: [ContactPoint::default(); MAX_POINTS],
                point_count: 0,
                friction: (body_a.friction * body_b.friction).sqrt(),
                restitution: body_a.restitution.max(body_b.restitution),
                touching: false,
                was_touching: false,
            }
        })
    }

    #[must_use]
    pub fn find(&self, a: usize, b: usize) -> Option<&ContactManifold> {
        let key = if a <= b { (a, b) } else { (b, a) };
        self.manifolds.get(&key)
    }

    pub fn find_mut(&mut self, a: usize, b: usize) -> Option<&mut ContactManifold> {
        let key = if a <= b { (a, b) } else { (b, a) };
        self.manifolds.get_mut(&key)
    }

    /// Drops every manifold that stopped touching and collects the survivors
    /// into the active list consumed by an impulse solver.
    pub fn end_frame(&mut self) {
        self.manifolds.retain(|_, manifold| manifold.touching);
        self.active = self.manifolds.keys().copied().collect();
        self.active.sort_unstable();
    }

    /// Pairs whose manifolds survived the last `end_frame`.
    #[must_use]
    pub fn active(&self) -> &[(usize, usize)] {
        &self.active
    }

    pub fn clear(&mut self) {
        self.manifolds.clear();
        self.active.clear();
    }
}
