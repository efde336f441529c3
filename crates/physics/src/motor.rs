//! Thruster motors attached to rigid bodies.

use glam::Vec2;
use std::f32::consts::FRAC_PI_2;

/// A thruster mounted at a local offset from the body centre.
///
/// The thrust direction is a fixed angle in the body's local frame (default
/// straight up) and the commanded magnitude is clamped to `[0, max_thrust]`.
#[derive(Clone, Copy, Debug)]
pub struct Motor {
    /// Mount point relative to the body centre.
    pub offset: Vec2,
    pub width: f32,
    pub height: f32,
    pub mass: f32,
    pub max_thrust: f32,
    /// Thrust direction in the body's local frame, radians.
    pub angle: f32,
    thrust: f32,
}

impl Motor {
    /// Motor with the default footprint (0.1 × 0.1, mass 0.1, max thrust 10).
    #[must_use]
    pub fn new(offset: Vec2) -> Self {
        Self::with_footprint(offset, 0.1, 0.1, 0.1, 10.0)
    }

    #[must_use]
    pub fn with_footprint(offset: Vec2, width: f32, height: f32, mass: f32, max_thrust: f32) -> Self {
        Self {
            offset,
            width,
            height,
            mass,
            max_thrust,
            angle: FRAC_PI_2,
            thrust: 0.0,
        }
    }

    /// Commands a thrust magnitude, clamped to `[0, max_thrust]`.
    pub fn set_thrust(&mut self, thrust: f32) {
        self.thrust = thrust.clamp(0.0, self.max_thrust);
    }

    #[must_use]
    pub fn thrust(&self) -> f32 {
        self.thrust
    }

    /// Axis-aligned footprint overlap test in the body's local frame.
    #[must_use]
    pub fn overlaps(&self, other: &Motor) -> bool {
        let left_a = self.offset.x - self.width / 2.0;
        let right_a = self.offset.x + self.width / 2.0;
        let bottom_a = self.offset.y - self.height / 2.0;
        let top_a = self.offset.y + self.height / 2.0;

        let left_b = other.offset.x - other.width / 2.0;
        let right_b = other.offset.x + other.width / 2.0;
        let bottom_b = other.offset.y - other.height / 2.0;
        let top_b = other.offset.y + other.height / 2.0;

        !(right_a < left_b || right_b < left_a || top_a < bottom_b || top_b < bottom_a)
    }
}
