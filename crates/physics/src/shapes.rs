//! Collision shapes and axis-aligned bounding boxes.

use glam::Vec2;

/// Shape attached to a body at a local offset from its centre.
#[derive(Clone, Copy, Debug)]
pub enum Shape {
    Box {
        width: f32,
        height: f32,
        offset: Vec2,
    },
    Circle {
        radius: f32,
        offset: Vec2,
    },
}

/// Axis-aligned bounding box in world coordinates.
#[derive(Clone, Copy, Debug)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    #[must_use]
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Disc-shaped box of the given radius around `center`.
    #[must_use]
    pub fn around(center: Vec2, radius: f32) -> Self {
        Self {
            min: center - Vec2::splat(radius),
            max: center + Vec2::splat(radius),
        }
    }

    #[must_use]
    pub fn expanded(self, margin: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(margin),
            max: self.max + Vec2::splat(margin),
        }
    }

    #[must_use]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn half_extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }
}
