//! Raster transforms applied when an edit session is committed.
//!
//! Rotation happens first (quarter turns, clockwise), then the crop is taken
//! from the rotated raster. Both operate on full-resolution source pixels,
//! never on the scaled editor canvas.
//!
//! # Coordinate System
//!
//! - Crop rectangles are integral source pixels ([`PixelRect`])
//! - Origin is the top-left corner
//!
//! [`PixelRect`]: crate::geometry::PixelRect

mod crop;
mod rotation;

pub use crop::apply_crop;
pub use rotation::{apply_rotation, QuarterTurn};
