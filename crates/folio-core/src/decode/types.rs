//! Pixel buffers and the small enums the decode pipeline shares.

use image::{imageops, RgbImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Size;

#[derive(Debug, Error)]
pub enum DecodeError {
    /// No decoder recognized the bytes, or the request made no sense
    /// (a zero-sized target, for instance).
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),
}

/// Resampling filter. Ingestion uses `Lanczos3`, editor previews `Bilinear`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterType {
    Nearest,
    #[default]
    Bilinear,
    Lanczos3,
}

impl FilterType {
    pub fn to_image_filter(self) -> imageops::FilterType {
        match self {
            FilterType::Nearest => imageops::FilterType::Nearest,
            FilterType::Bilinear => imageops::FilterType::Triangle,
            FilterType::Lanczos3 => imageops::FilterType::Lanczos3,
        }
    }
}

/// Value of the EXIF `Orientation` tag, naming the transform that makes the
/// stored pixels upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Upright,
    Mirrored,
    UpsideDown,
    MirroredUpsideDown,
    /// Mirrored, then a quarter turn counter-clockwise.
    Transposed,
    /// Needs a quarter turn clockwise.
    QuarterCw,
    /// Mirrored, then a quarter turn clockwise.
    Transversed,
    /// Needs a quarter turn counter-clockwise.
    QuarterCcw,
}

impl Orientation {
    /// Out-of-range tag values are treated as upright, like browsers do.
    pub fn from_exif(value: u32) -> Self {
        match value {
            2 => Orientation::Mirrored,
            3 => Orientation::UpsideDown,
            4 => Orientation::MirroredUpsideDown,
            5 => Orientation::Transposed,
            6 => Orientation::QuarterCw,
            7 => Orientation::Transversed,
            8 => Orientation::QuarterCcw,
            _ => Orientation::Upright,
        }
    }
}

/// Packed 8-bit RGB pixels, row-major, no padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize * 3);
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn from_rgb_image(img: RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw(),
        }
    }

    /// Copy into an [`RgbImage`]; `None` if the buffer length is inconsistent.
    pub fn to_rgb_image(&self) -> Option<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}
