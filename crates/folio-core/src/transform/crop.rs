//! Pixel-rectangle cropping.

use crate::decode::DecodedImage;
use crate::geometry::PixelRect;

/// Copy the pixels inside `rect` into a new image.
///
/// The rectangle is clipped to the image bounds first. An empty rectangle,
/// before or after clipping, means "no crop" and returns a copy of the input.
pub fn apply_crop(image: &DecodedImage, rect: PixelRect) -> DecodedImage {
    let left = rect.x.min(image.width);
    let top = rect.y.min(image.height);
    let out_width = rect.width.min(image.width - left);
    let out_height = rect.height.min(image.height - top);

    if out_width == 0 || out_height == 0 {
        return image.clone();
    }
    if left == 0 && top == 0 && out_width == image.width && out_height == image.height {
        return image.clone();
    }

    let src_stride = image.width as usize * 3;
    let row_len = out_width as usize * 3;
    let mut output = Vec::with_capacity(row_len * out_height as usize);

    for y in top..top + out_height {
        let start = y as usize * src_stride + left as usize * 3;
        output.extend_from_slice(&image.pixels[start..start + row_len]);
    }

    DecodedImage {
        width: out_width,
        height: out_height,
        pixels: output,
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
