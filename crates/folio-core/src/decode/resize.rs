//! Image resizing for ingestion downscaling and editor previews.
//!
//! All functions return new `DecodedImage` instances without modifying the input.

use super::{DecodeError, DecodedImage, FilterType};
use crate::geometry::{scale_to_bounds, scale_to_fit, Size};

/// Resize an image to exact dimensions.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if either target dimension is zero.
pub fn resize(
    image: &DecodedImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<DecodedImage, DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidFormat);
    }

    // Fast path: if dimensions match, just clone
    if image.width == width && image.height == height {
        return Ok(image.clone());
    }

    let rgb_image = image
        .to_rgb_image()
        .ok_or_else(|| DecodeError::CorruptedFile("Failed to create RgbImage".to_string()))?;

    let resized = image::imageops::resize(&rgb_image, width, height, filter.to_image_filter());

    Ok(DecodedImage::from_rgb_image(resized))
}

/// Resize an image so its longest edge is at most `max_edge`.
///
/// Images that already fit are returned unchanged; nothing is upscaled.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if `max_edge` is zero.
pub fn resize_to_fit(
    image: &DecodedImage,
    max_edge: u32,
    filter: FilterType,
) -> Result<DecodedImage, DecodeError> {
    if max_edge == 0 {
        return Err(DecodeError::InvalidFormat);
    }
    let target = scale_to_fit(image.size(), max_edge);
    resize(image, target.width, target.height, filter)
}

/// Resize an image to fit inside `bounds`, preserving aspect ratio.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if `bounds` has a zero side.
pub fn resize_to_bounds(
    image: &DecodedImage,
    bounds: Size,
    filter: FilterType,
) -> Result<DecodedImage, DecodeError> {
    if bounds.is_empty() {
        return Err(DecodeError::InvalidFormat);
    }
    let target = scale_to_bounds(image.size(), bounds);
    resize(image, target.width, target.height, filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_image(width: u32, height: u32) -> DecodedImage {
        // Create a simple gradient image for testing
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(((x * 255) / width.max(1)) as u8); // R
                pixels.push(((y * 255) / height.max(1)) as u8); // G
                pixels.push(128); // B
            }
        }
        DecodedImage::new(width, height, pixels)
    }

    #[test]
    fn test_resize_basic() {
        let img = create_test_image(100, 50);
        let resized = resize(&img, 50, 25, FilterType::Bilinear).unwrap();

        assert_eq!(resized.width, 50);
        assert_eq!(resized.height, 25);
        assert_eq!(resized.pixels.len(), 50 * 25 * 3);
    }

    #[test]
    fn test_resize_same_dimensions() {
        let img = create_test_image(100, 50);
        let resized = resize(&img, 100, 50, FilterType::Bilinear).unwrap();
        assert_eq!(resized, img);
    }

    #[test]
    fn test_resize_zero_dimensions_error() {
        let img = create_test_image(100, 50);

        assert!(resize(&img, 0, 50, FilterType::Bilinear).is_err());
        assert!(resize(&img, 50, 0, FilterType::Bilinear).is_err());
    }

    #[test]
    fn test_resize_to_fit_landscape() {
        let img = create_test_image(3000, 2000);
        let resized = resize_to_fit(&img, 2000, FilterType::Bilinear).unwrap();

        assert_eq!(resized.width, 2000);
        assert_eq!(resized.height, 1333);
    }

    #[test]
    fn test_resize_to_fit_portrait() {
        let img = create_test_image(2000, 3000);
        let resized = resize_to_fit(&img, 2000, FilterType::Bilinear).unwrap();

        assert_eq!(resized.height, 2000);
        assert_eq!(resized.width, 1333);
    }

    #[test]
    fn test_resize_to_fit_already_smaller() {
        let img = create_test_image(100, 50);
        let resized = resize_to_fit(&img, 256, FilterType::Bilinear).unwrap();

        assert_eq!(resized.width, 100);
        assert_eq!(resized.height, 50);
    }

    #[test]
    fn test_resize_to_fit_zero_max_edge_error() {
        let img = create_test_image(100, 50);
        assert!(resize_to_fit(&img, 0, FilterType::Bilinear).is_err());
    }

    #[test]
    fn test_resize_to_bounds_editor_canvas() {
        let img = create_test_image(1000, 1000);
        let resized = resize_to_bounds(&img, Size::new(500, 400), FilterType::Bilinear).unwrap();

        assert_eq!(resized.size(), Size::new(400, 400));
    }

    #[test]
    fn test_resize_to_bounds_empty_error() {
        let img = create_test_image(10, 10);
        assert!(resize_to_bounds(&img, Size::new(0, 400), FilterType::Bilinear).is_err());
    }

    #[test]
    fn test_all_filter_types() {
        let img = create_test_image(100, 50);

        for filter in [
            FilterType::Nearest,
            FilterType::Bilinear,
            FilterType::Lanczos3,
        ] {
            let resized = resize(&img, 50, 25, filter).unwrap();
            assert_eq!(resized.width, 50);
            assert_eq!(resized.height, 25);
        }
    }
}
