use thiserror::Error;

#[derive(Debug, Error)]
pub enum PhysicsError {
    /// Motor footprints are checked in the body's local frame; overlapping
    /// rectangles reject the attachment.
    #[error("motor footprint overlaps an existing motor on this body")]
    MotorOverlap,
}
