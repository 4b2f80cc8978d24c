//! Pure geometry used by ingestion, the editor and the page compositor.
//!
//! Nothing in here allocates or fails. Degenerate (zero) pixel sizes never
//! reach these functions because the record store rejects them upstream, so
//! the few guards below only keep the arithmetic total.
//!
//! # Coordinate Systems
//!
//! - Pixel sizes ([`Size`], [`PixelRect`]) are integral, origin top-left
//! - Editor canvas and page coordinates ([`Point`], [`Rect`]) are `f64`,
//!   origin top-left; page coordinates are millimetres

use serde::{Deserialize, Serialize};

/// Integral width/height pair in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn square(edge: u32) -> Self {
        Self::new(edge, edge)
    }

    /// Swap width and height.
    pub const fn transposed(self) -> Self {
        Self::new(self.height, self.width)
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect_ratio(self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

/// A point in continuous (canvas or page) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in continuous coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bounding box of two points, in whatever order they were given.
    ///
    /// This is what a crop drag produces: the pointer may travel up and to
    /// the left of where it started.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    /// Centered rectangle covering `fraction` of `size` on each axis.
    pub fn centered_fraction(size: Size, fraction: f64) -> Self {
        let w = size.width as f64;
        let h = size.height as f64;
        let (width, height) = (w * fraction, h * fraction);
        Self::new((w - width) / 2.0, (h - height) / 2.0, width, height)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Axis-aligned rectangle in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Scale `size` so its longer side is at most `max_dim`, preserving aspect ratio.
///
/// Sizes that already fit are returned unchanged; nothing is ever upscaled.
pub fn scale_to_fit(size: Size, max_dim: u32) -> Size {
    scale_to_bounds(size, Size::square(max_dim))
}

/// Scale `size` to fit inside `bounds`, preserving aspect ratio.
///
/// The scale factor is `min(bw / w, bh / h, 1)`, so a size that already fits
/// comes back unchanged. Both output sides are at least one pixel.
pub fn scale_to_bounds(size: Size, bounds: Size) -> Size {
    if size.is_empty() || bounds.is_empty() {
        return size;
    }
    if size.width <= bounds.width && size.height <= bounds.height {
        return size;
    }

    let scale = (bounds.width as f64 / size.width as f64)
        .min(bounds.height as f64 / size.height as f64);

    let width = ((size.width as f64 * scale).round() as u32).clamp(1, bounds.width);
    let height = ((size.height as f64 * scale).round() as u32).clamp(1, bounds.height);
    Size::new(width, height)
}

/// Map a rectangle drawn on the editor canvas onto source pixels.
///
/// The canvas shows the source scaled (independently per axis) to
/// `canvas`. The mapped rectangle is clipped at the source edges instead of
/// being rejected, so a selection dragged past the canvas border simply ends
/// at the image border. The result may be empty; callers treat an empty
/// rectangle as "no crop".
pub fn map_crop_rect_to_source(crop: Rect, canvas: Size, source: Size) -> PixelRect {
    if canvas.is_empty() || source.is_empty() {
        return PixelRect::default();
    }

    let scale_x = source.width as f64 / canvas.width as f64;
    let scale_y = source.height as f64 / canvas.height as f64;

    let clip = |v: f64, max: u32| -> u32 { v.clamp(0.0, max as f64) as u32 };

    let left = clip((crop.x * scale_x).floor(), source.width);
    let top = clip((crop.y * scale_y).floor(), source.height);
    let right = clip((crop.right() * scale_x).ceil(), source.width);
    let bottom = clip((crop.bottom() * scale_y).ceil(), source.height);

    // A zero-width selection must stay empty even though floor/ceil could
    // otherwise widen it to a single pixel.
    if crop.width <= 0.0 || crop.height <= 0.0 {
        return PixelRect::new(left, top, 0, 0);
    }

    PixelRect::new(
        left,
        top,
        right.saturating_sub(left),
        bottom.saturating_sub(top),
    )
}

/// Normalize an angle in degrees into `0..360`.
pub fn normalize_degrees(angle_degrees: i32) -> i32 {
    angle_degrees.rem_euclid(360)
}

/// Canvas size needed to show `size` rotated by `angle_degrees`.
///
/// Quarter turns (90/270 modulo 360) swap the sides; half turns and the
/// identity keep them.
pub fn rotated_canvas_size(size: Size, angle_degrees: i32) -> Size {
    match normalize_degrees(angle_degrees) {
        90 | 270 => size.transposed(),
        _ => size,
    }
}

/// Fit an image into `region`, preserving aspect ratio, centered on both axes.
///
/// When the image is relatively wider than the region it is width-constrained
/// (full region width, letterboxed vertically); otherwise it is
/// height-constrained (full region height, pillarboxed horizontally).
pub fn layout_image_in_region(image: Size, region: Rect) -> Rect {
    if image.is_empty() || region.width <= 0.0 || region.height <= 0.0 {
        return Rect::new(region.x, region.y, 0.0, 0.0);
    }

    let image_ratio = image.aspect_ratio();
    let region_ratio = region.width / region.height;

    let (width, height) = if image_ratio > region_ratio {
        (region.width, region.width / image_ratio)
    } else {
        (region.height * image_ratio, region.height)
    };

    Rect::new(
        region.x + (region.width - width) / 2.0,
        region.y + (region.height - height) / 2.0,
        width,
        height,
    )
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn size_strategy() -> impl Strategy<Value = Size> {
        (1u32..=8000, 1u32..=8000).prop_map(|(w, h)| Size::new(w, h))
    }

    proptest! {
        /// Property: neither side ever exceeds the cap.
        #[test]
        fn prop_scale_to_fit_never_exceeds_cap(size in size_strategy(), max_dim in 1u32..=4000) {
            let scaled = scale_to_fit(size, max_dim);
            prop_assert!(scaled.width <= max_dim);
            prop_assert!(scaled.height <= max_dim);
            prop_assert!(scaled.width >= 1 && scaled.height >= 1);
        }

        /// Property: sizes that already fit are untouched.
        #[test]
        fn prop_scale_to_fit_identity_when_small(w in 1u32..=2000, h in 1u32..=2000) {
            prop_assert_eq!(scale_to_fit(Size::new(w, h), 2000), Size::new(w, h));
        }

        /// Property: aspect ratio survives within one pixel of rounding.
        #[test]
        fn prop_scale_to_fit_preserves_ratio(size in size_strategy(), max_dim in 16u32..=4000) {
            let scaled = scale_to_fit(size, max_dim);
            // Check the short side against the long one; the long side is exact.
            let (actual, expected) = if size.width >= size.height {
                (scaled.height as f64, scaled.width as f64 / size.aspect_ratio())
            } else {
                (scaled.width as f64, scaled.height as f64 * size.aspect_ratio())
            };
            prop_assert!((actual - expected).abs() <= 1.0, "{:?} -> {:?}", size, scaled);
        }

        /// Property: four quarter turns bring the canvas back.
        #[test]
        fn prop_four_quarter_turns_identity(size in size_strategy(), start in -3i32..=3) {
            let mut angle = start * 90;
            let original = rotated_canvas_size(size, angle);
            for _ in 0..4 {
                angle = normalize_degrees(angle + 90);
            }
            prop_assert_eq!(rotated_canvas_size(size, angle), original);
        }

        /// Property: mapped crops never leave the source.
        #[test]
        fn prop_mapped_crop_within_source(
            source in size_strategy(),
            canvas in (1u32..=500, 1u32..=400).prop_map(|(w, h)| Size::new(w, h)),
            x in -100.0f64..600.0,
            y in -100.0f64..500.0,
            w in 0.0f64..700.0,
            h in 0.0f64..700.0,
        ) {
            let mapped = map_crop_rect_to_source(Rect::new(x, y, w, h), canvas, source);
            prop_assert!(mapped.x + mapped.width <= source.width);
            prop_assert!(mapped.y + mapped.height <= source.height);
        }

        /// Property: laid-out images stay inside their region.
        #[test]
        fn prop_layout_inside_region(
            image in size_strategy(),
            rw in 1.0f64..300.0,
            rh in 1.0f64..300.0,
        ) {
            let region = Rect::new(5.0, 7.0, rw, rh);
            let placed = layout_image_in_region(image, region);
            prop_assert!(placed.x >= region.x - 1e-6);
            prop_assert!(placed.y >= region.y - 1e-6);
            prop_assert!(placed.right() <= region.right() + 1e-6);
            prop_assert!(placed.bottom() <= region.bottom() + 1e-6);
        }
    }
}
