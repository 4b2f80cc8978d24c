//! Upload decoding with EXIF orientation and alpha flattening.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader, Rgb, RgbImage};

use super::{DecodeError, DecodedImage, Orientation};

/// Decode PNG/JPEG/GIF/WebP bytes into an RGB raster.
///
/// The container format is sniffed from the bytes, not taken from the
/// declared MIME type. EXIF orientation is applied when present, and any
/// alpha channel is composited over white.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the format cannot be recognized,
/// `DecodeError::CorruptedFile` if decoding fails midway.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let orientation = extract_orientation(bytes);

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let oriented = apply_orientation(img, orientation);
    let rgb = flatten_onto_white(oriented);
    if rgb.width() == 0 || rgb.height() == 0 {
        return Err(DecodeError::InvalidFormat);
    }

    Ok(DecodedImage::from_rgb_image(rgb))
}

/// Returns `Orientation::Upright` if no EXIF data is found or orientation
/// cannot be determined.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);

    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from_exif)
            .unwrap_or_default(),
        Err(_) => Orientation::Upright,
    }
}

fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Upright => img,
        Orientation::Mirrored => img.fliph(),
        Orientation::UpsideDown => img.rotate180(),
        Orientation::MirroredUpsideDown => img.flipv(),
        Orientation::Transposed => img.rotate90().fliph(),
        Orientation::QuarterCw => img.rotate90(),
        Orientation::Transversed => img.rotate270().fliph(),
        Orientation::QuarterCcw => img.rotate270(),
    }
}

/// JPEG has no alpha, so transparent regions would otherwise turn black.
fn flatten_onto_white(img: DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.into_rgb8();
    }

    let rgba = img.into_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, px) in rgba.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        let alpha = a as u16;
        let blend = |c: u8| -> u8 { ((c as u16 * alpha + 255 * (255 - alpha) + 127) / 255) as u8 };
        out.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn encode_png(img: DynamicImage) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_decode_png() {
        let bytes = encode_png(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            4,
            3,
            Rgb([10, 20, 30]),
        )));
        let img = decode_image(&bytes).unwrap();

        assert_eq!(img.width, 4);
        assert_eq!(img.height, 3);
        assert_eq!(&img.pixels[0..3], &[10, 20, 30]);
    }

    #[test]
    fn test_decode_jpeg_roundtrip_dimensions() {
        let pixels = vec![128u8; 16 * 8 * 3];
        let jpeg = crate::encode::encode_jpeg(&pixels, 16, 8, 90).unwrap();
        let img = decode_image(&jpeg).unwrap();

        assert_eq!((img.width, img.height), (16, 8));
    }

    #[test]
    fn test_transparent_pixels_become_white() {
        let mut rgba = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 0]));
        rgba.put_pixel(1, 0, Rgba([255, 0, 0, 255]));
        let bytes = encode_png(DynamicImage::ImageRgba8(rgba));

        let img = decode_image(&bytes).unwrap();
        assert_eq!(&img.pixels[0..3], &[255, 255, 255]);
        assert_eq!(&img.pixels[3..6], &[255, 0, 0]);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = decode_image(&[0x00, 0x01, 0x02, 0x03]);
        assert!(matches!(result, Err(DecodeError::InvalidFormat)));
    }

    #[test]
    fn test_decode_empty_bytes() {
        assert!(decode_image(&[]).is_err());
    }

    #[test]
    fn test_decode_truncated_png() {
        let bytes = encode_png(DynamicImage::ImageRgb8(RgbImage::new(32, 32)));
        let result = decode_image(&bytes[..bytes.len() / 2]);
        assert!(matches!(result, Err(DecodeError::CorruptedFile(_))));
    }

    /// Left half red, right half blue, as a JPEG carrying an EXIF
    /// Orientation tag with `value`.
    fn jpeg_with_orientation(value: u8) -> Vec<u8> {
        let (width, height) = (32u32, 16u32);
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for _ in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(if x < width / 2 { &[220, 20, 20] } else { &[20, 20, 220] });
            }
        }
        let jpeg = crate::encode::encode_jpeg(&pixels, width, height, 95).unwrap();

        let mut payload = b"Exif\0\0".to_vec();
        // Big-endian TIFF header, IFD0 at offset 8 with a single SHORT entry.
        payload.extend_from_slice(b"MM\0\x2a\0\0\0\x08");
        payload.extend_from_slice(&[0x00, 0x01]);
        payload.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0, 0, 0, 1, 0x00, value, 0, 0]);
        payload.extend_from_slice(&[0, 0, 0, 0]);

        let length = (payload.len() + 2) as u16;
        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&length.to_be_bytes());
        out.extend_from_slice(&payload);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    #[test]
    fn test_exif_quarter_turn_is_applied() {
        let bytes = jpeg_with_orientation(6);
        assert_eq!(extract_orientation(&bytes), Orientation::QuarterCw);

        let img = decode_image(&bytes).unwrap();
        assert_eq!((img.width, img.height), (16, 32));

        // Turned clockwise, the red left half ends up on top.
        let pixel = |x: u32, y: u32| {
            let i = ((y * img.width + x) * 3) as usize;
            [img.pixels[i], img.pixels[i + 1], img.pixels[i + 2]]
        };
        let top = pixel(8, 4);
        let bottom = pixel(8, 27);
        assert!(top[0] > 150 && top[2] < 100, "top was {top:?}");
        assert!(bottom[2] > 150 && bottom[0] < 100, "bottom was {bottom:?}");
    }

    #[test]
    fn test_exif_upright_tag_keeps_dimensions() {
        let bytes = jpeg_with_orientation(1);
        assert_eq!(extract_orientation(&bytes), Orientation::Upright);

        let img = decode_image(&bytes).unwrap();
        assert_eq!((img.width, img.height), (32, 16));
    }

    #[test]
    fn test_orientation_extraction_invalid_data() {
        assert_eq!(extract_orientation(&[0x00, 0x01, 0x02]), Orientation::Upright);
    }

    #[test]
    fn test_apply_orientation_rotate90() {
        let rgb_img = RgbImage::from_raw(2, 1, vec![255, 0, 0, 0, 255, 0]).unwrap();
        let result = apply_orientation(DynamicImage::ImageRgb8(rgb_img), Orientation::QuarterCw);

        assert_eq!(result.into_rgb8().dimensions(), (1, 2));
    }

    #[test]
    fn test_apply_orientation_flip_horizontal() {
        let rgb_img = RgbImage::from_raw(2, 1, vec![255, 0, 0, 0, 255, 0]).unwrap();
        let result = apply_orientation(DynamicImage::ImageRgb8(rgb_img), Orientation::Mirrored)
            .into_rgb8();

        assert_eq!(result.get_pixel(0, 0).0, [0, 255, 0]);
        assert_eq!(result.get_pixel(1, 0).0, [255, 0, 0]);
    }
}
