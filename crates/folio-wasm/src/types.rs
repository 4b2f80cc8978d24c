//! JavaScript-facing wrappers around core values.

use folio_core::{ComposedPdf, DecodedImage};
use wasm_bindgen::prelude::*;

/// The editor canvas as pixels, ready for `putImageData`.
///
/// Pixel data lives in WASM memory; `rgb()` and `rgba()` copy it out.
#[wasm_bindgen]
pub struct JsPreview {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsPreview {
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Packed RGB, 3 bytes per pixel.
    pub fn rgb(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    /// RGBA with opaque alpha, the layout `ImageData` expects.
    ///
    /// ```typescript
    /// const preview = workspace.edit_open(id);
    /// const data = new ImageData(
    ///   new Uint8ClampedArray(preview.rgba()), preview.width, preview.height);
    /// ctx.putImageData(data, 0, 0);
    /// ```
    pub fn rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() / 3 * 4);
        for px in self.pixels.chunks_exact(3) {
            out.extend_from_slice(px);
            out.push(255);
        }
        out
    }
}

impl From<DecodedImage> for JsPreview {
    fn from(img: DecodedImage) -> Self {
        Self {
            width: img.width,
            height: img.height,
            pixels: img.pixels,
        }
    }
}

/// A finished document and the name to download it under.
#[wasm_bindgen]
pub struct JsComposedPdf {
    filename: String,
    bytes: Vec<u8>,
    page_count: usize,
}

#[wasm_bindgen]
impl JsComposedPdf {
    #[wasm_bindgen(getter)]
    pub fn filename(&self) -> String {
        self.filename.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// PDF bytes as `Uint8Array`, e.g. for `new Blob([pdf.bytes()])`.
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

impl From<ComposedPdf> for JsComposedPdf {
    fn from(pdf: ComposedPdf) -> Self {
        Self {
            filename: pdf.filename,
            bytes: pdf.bytes,
            page_count: pdf.page_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_rgba_adds_alpha() {
        let preview = JsPreview::from(DecodedImage::new(2, 1, vec![1, 2, 3, 4, 5, 6]));
        assert_eq!(preview.width(), 2);
        assert_eq!(preview.height(), 1);
        assert_eq!(preview.rgba(), vec![1, 2, 3, 255, 4, 5, 6, 255]);
        assert_eq!(preview.rgb().len(), 6);
    }

    #[test]
    fn test_composed_pdf_accessors() {
        let pdf = JsComposedPdf::from(ComposedPdf {
            filename: "documento_2024-01-01.pdf".into(),
            bytes: b"%PDF".to_vec(),
            page_count: 2,
        });
        assert_eq!(pdf.filename(), "documento_2024-01-01.pdf");
        assert_eq!(pdf.page_count(), 2);
        assert_eq!(pdf.bytes(), b"%PDF");
    }
}
