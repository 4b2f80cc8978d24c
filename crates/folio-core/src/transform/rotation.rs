//! Lossless quarter-turn rotation.
//!
//! The editor only offers ±90° steps, so rotation is a pure pixel
//! permutation with no interpolation.

use serde::{Deserialize, Serialize};

use crate::decode::DecodedImage;
use crate::geometry::normalize_degrees;

/// Clockwise rotation in multiples of 90°.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QuarterTurn {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl QuarterTurn {
    /// Convert an angle in degrees; returns `None` unless it is a multiple of 90.
    pub fn from_degrees(angle_degrees: i32) -> Option<Self> {
        match normalize_degrees(angle_degrees) {
            0 => Some(QuarterTurn::None),
            90 => Some(QuarterTurn::Cw90),
            180 => Some(QuarterTurn::Cw180),
            270 => Some(QuarterTurn::Cw270),
            _ => None,
        }
    }

    pub fn degrees(self) -> i32 {
        match self {
            QuarterTurn::None => 0,
            QuarterTurn::Cw90 => 90,
            QuarterTurn::Cw180 => 180,
            QuarterTurn::Cw270 => 270,
        }
    }

    /// Whether width and height trade places.
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, QuarterTurn::Cw90 | QuarterTurn::Cw270)
    }
}

/// Rotate an image clockwise by a quarter turn.
pub fn apply_rotation(image: &DecodedImage, turn: QuarterTurn) -> DecodedImage {
    if turn == QuarterTurn::None {
        return image.clone();
    }

    let (src_w, src_h) = (image.width as usize, image.height as usize);
    let (dst_w, dst_h) = if turn.swaps_dimensions() {
        (src_h, src_w)
    } else {
        (src_w, src_h)
    };

    let mut output = vec![0u8; dst_w * dst_h * 3];

    for dy in 0..dst_h {
        for dx in 0..dst_w {
            // Inverse mapping: which source pixel lands at (dx, dy)
            let (sx, sy) = match turn {
                QuarterTurn::Cw90 => (dy, src_h - 1 - dx),
                QuarterTurn::Cw180 => (src_w - 1 - dx, src_h - 1 - dy),
                QuarterTurn::Cw270 => (src_w - 1 - dy, dx),
                QuarterTurn::None => (dx, dy),
            };
            let src_idx = (sy * src_w + sx) * 3;
            let dst_idx = (dy * dst_w + dx) * 3;
            output[dst_idx..dst_idx + 3].copy_from_slice(&image.pixels[src_idx..src_idx + 3]);
        }
    }

    DecodedImage {
        width: dst_w as u32,
        height: dst_h as u32,
        pixels: output,
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
