//! Soft penalty contact against static ground segments.
//!
//! Contact is modelled as a spring-damper on penetrating box corners with a
//! smoothed friction term, computed entirely through tensor operations so the
//! force path stays differentiable. When a corner overlaps several segments
//! at once, forces are blended by penetration depth; a corner straddling a
//! seam would otherwise receive the summed force of both segments and
//! over-brake.

use glam::Vec2;
use ml::{tanh, Tensor};

use crate::body::Body;
use crate::shapes::Aabb;

/// Spring stiffness of the penalty contact.
pub const STIFFNESS: f32 = 20_000.0;
/// Normal damping of the penalty contact.
pub const DAMPING: f32 = 100.0;

/// Broadphase margin around the segment's bounding box.
const AABB_MARGIN: f32 = 1.0;
/// Relaxation of the segment parameter bounds; prevents corners from slipping
/// through the seam between adjacent segments.
const SPAN_EPSILON: f32 = 0.05;

/// An oriented static line segment with contact material parameters.
///
/// The outward normal is the left-hand normal of `p1 -> p2`; a degenerate
/// zero-length segment gets the normal `(0, 1)`.
#[derive(Clone, Copy, Debug)]
pub struct GroundSegment {
    pub p1: Vec2,
    pub p2: Vec2,
    pub normal: Vec2,
    pub stiffness: f32,
    pub damping: f32,
    pub friction: f32,
    pub aabb: Aabb,
}

impl GroundSegment {
    #[must_use]
    pub fn new(p1: Vec2, p2: Vec2, friction: f32) -> Self {
        let span = p2 - p1;
        let len = span.length();
        let normal = if len > 0.0 {
            Vec2::new(-span.y, span.x) / len
        } else {
            Vec2::Y
        };
        let aabb = Aabb::new(p1.min(p2), p1.max(p2)).expanded(AABB_MARGIN);
        Self {
            p1,
            p2,
            normal,
            stiffness: STIFFNESS,
            damping: DAMPING,
            friction,
            aabb,
        }
    }
}

/// Runs the per-corner contact kernel for one body against the candidate
/// segments that survived the broadphase.
///
/// Recomputes the body's corners (which compacts its arena), then, for every
/// penetrating corner, accumulates a penetration-weighted average of the
/// per-segment spring, damping and friction forces and applies it at the
/// corner position.
pub fn apply_segment_contacts(body: &mut Body, segments: &[&GroundSegment]) {
    let corners = body.corners();
    if corners.is_empty() {
        return;
    }
    let (pos, vel, ang_vel) = (body.pos(), body.vel(), body.ang_vel());

    for pair in corners.chunks_exact(2) {
        let (cx, cy) = (pair[0], pair[1]);
        let corner = Vec2::new(body.graph().get(cx, 0, 0), body.graph().get(cy, 0, 0));

        let mut blended = None;
        {
            let g = body.graph_mut();
            let mut sum_fx = g.scalar(0.0);
            let mut sum_fy = g.scalar(0.0);
            let mut sum_weight = g.scalar(0.0);
            let mut touched = false;

            for seg in segments {
                let to_corner = corner - seg.p1;
                let distance = to_corner.dot(seg.normal);
                let span = seg.p2 - seg.p1;
                let t = to_corner.dot(span) / span.length_squared();
                let in_span = t >= -SPAN_EPSILON && t <= 1.0 + SPAN_EPSILON;
                if distance >= 0.0 || !in_span {
                    continue;
                }
                touched = true;

                // Signed distance as a graph node: d = (c - p1) . n
                let x1 = g.scalar(seg.p1.x);
                let y1 = g.scalar(seg.p1.y);
                let dx = cx.sub(x1, g);
                let dy = cy.sub(y1, g);
                let dist = dx
                    .mul_scalar(seg.normal.x, g)
                    .add(dy.mul_scalar(seg.normal.y, g), g);
                let spring_mag = dist.mul_scalar(-seg.stiffness, g);

                // Point velocity at the corner: v + omega x r
                let px = pos.select(0, g);
                let py = pos.select(1, g);
                let rx = cx.sub(px, g);
                let ry = cy.sub(py, g);
                let vx = vel.select(0, g);
                let vy = vel.select(1, g);
                let vpx = vx.add(ang_vel.mul(ry, g).mul_scalar(-1.0, g), g);
                let vpy = vy.add(ang_vel.mul(rx, g), g);

                let v_normal = vpx
                    .mul_scalar(seg.normal.x, g)
                    .add(vpy.mul_scalar(seg.normal.y, g), g);
                let damping_mag = v_normal.mul_scalar(-seg.damping, g);
                let normal_mag = spring_mag.add(damping_mag, g);

                // Smoothed friction along the tangent (-ny, nx)
                let tangent = Vec2::new(-seg.normal.y, seg.normal.x);
                let v_tangent = vpx
                    .mul_scalar(tangent.x, g)
                    .add(vpy.mul_scalar(tangent.y, g), g);
                let direction = tanh(v_tangent.mul_scalar(2.0, g), g);
                let friction_mag = normal_mag.mul_scalar(-seg.friction, g).mul(direction, g);

                let fx = normal_mag
                    .mul_scalar(seg.normal.x, g)
                    .add(friction_mag.mul_scalar(tangent.x, g), g);
                let fy = normal_mag
                    .mul_scalar(seg.normal.y, g)
                    .add(friction_mag.mul_scalar(tangent.y, g), g);

                // Weight by penetration depth; positive whenever in contact
                let weight = dist.mul_scalar(-1.0, g);
                sum_fx = sum_fx.add(fx.mul(weight, g), g);
                sum_fy = sum_fy.add(fy.mul(weight, g), g);
                sum_weight = sum_weight.add(weight, g);
            }

            if touched {
                let fx = sum_fx.div(sum_weight, g);
                let fy = sum_fy.div(sum_weight, g);
                let force = Tensor::stack(&[fx, fy], g);
                let point = Tensor::stack(&[cx, cy], g);
                blended = Some((force, point));
            }
        }

        if let Some((force, point)) = blended {
            body.apply_force_at_point(force, point);
        }
    }
}
