//! PDF 1.4 output through `lopdf`.
//!
//! Layout arrives in millimetres from the top-left corner; PDF user space is
//! points from the bottom-left, so every y coordinate is flipped against the
//! page height on the way in.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::debug;

use super::config::PageSettings;
use super::font;
use super::layout::{RuleLine, TextLine};
use super::render::{DocumentInfo, DocumentRenderer, FontFace, PageMetrics};
use super::CompositionError;
use crate::geometry::{Rect, Size};

const PDF_VERSION: &str = "1.4";

fn mm_to_pt(mm: f64) -> f64 {
    mm * 72.0 / 25.4
}

fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

fn color_operands(color: [u8; 3]) -> Vec<Object> {
    color.iter().map(|&c| real(c as f64 / 255.0)).collect()
}

fn font_resource(face: FontFace) -> &'static str {
    match face {
        FontFace::Regular => "F1",
        FontFace::Bold => "F2",
    }
}

/// Text string in the info dictionary: UTF-16BE with a byte order mark.
fn info_string(text: &str) -> Object {
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn render_error(err: lopdf::Error) -> CompositionError {
    CompositionError::Render(err.to_string())
}

#[derive(Default)]
struct PageBuffer {
    operations: Vec<Operation>,
    images: Dictionary,
}

/// [`DocumentRenderer`] that writes a PDF with the standard Helvetica faces.
pub struct PdfRenderer {
    doc: Document,
    page: PageSettings,
    pages_id: ObjectId,
    fonts_id: ObjectId,
    kids: Vec<Object>,
    current: Option<PageBuffer>,
    info: Option<DocumentInfo>,
    image_count: usize,
}

impl PdfRenderer {
    pub fn new(page: PageSettings) -> Self {
        let mut doc = Document::with_version(PDF_VERSION);
        let pages_id = doc.new_object_id();

        let mut fonts = Dictionary::new();
        for face in [FontFace::Regular, FontFace::Bold] {
            let id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => font::base_font(face),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(font_resource(face), id);
        }
        let fonts_id = doc.add_object(fonts);

        Self {
            doc,
            page,
            pages_id,
            fonts_id,
            kids: Vec::new(),
            current: None,
            info: None,
            image_count: 0,
        }
    }

    /// Pages written so far, counting the one being drawn.
    pub fn page_count(&self) -> usize {
        self.kids.len() + usize::from(self.current.is_some())
    }

    fn y_pt(&self, y_mm: f64) -> f64 {
        mm_to_pt(self.page.height_mm - y_mm)
    }

    fn current_page(&mut self) -> Result<&mut PageBuffer, CompositionError> {
        self.current
            .as_mut()
            .ok_or_else(|| CompositionError::Render("drawing before the first page".into()))
    }

    fn flush_page(&mut self) -> Result<(), CompositionError> {
        let Some(buffer) = self.current.take() else {
            return Ok(());
        };

        let content = Content {
            operations: buffer.operations,
        };
        let content_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, content.encode().map_err(render_error)?));

        let mut resources = dictionary! {
            "Font" => self.fonts_id,
        };
        if !buffer.images.is_empty() {
            resources.set("XObject", buffer.images);
        }

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "Contents" => content_id,
            "Resources" => resources,
        });
        self.kids.push(page_id.into());
        Ok(())
    }

    fn write_info(&mut self) {
        let Some(info) = self.info.take() else {
            return;
        };
        let date = format!("D:{}000000", info.created.format("%Y%m%d"));
        let info_id = self.doc.add_object(dictionary! {
            "Title" => info_string(&info.title),
            "Author" => info_string(&info.author),
            "Creator" => info_string(&info.creator),
            "Producer" => info_string(&info.producer),
            "CreationDate" => Object::string_literal(date),
        });
        self.doc.trailer.set("Info", info_id);
    }
}

impl PageMetrics for PdfRenderer {
    fn page_size_mm(&self) -> (f64, f64) {
        (self.page.width_mm, self.page.height_mm)
    }

    fn text_width_mm(&self, text: &str, face: FontFace, size_pt: f64) -> f64 {
        font::text_width_mm(text, face, size_pt)
    }
}

impl DocumentRenderer for PdfRenderer {
    fn set_info(&mut self, info: &DocumentInfo) {
        self.info = Some(info.clone());
    }

    fn begin_page(&mut self) -> Result<(), CompositionError> {
        self.flush_page()?;
        self.current = Some(PageBuffer::default());
        Ok(())
    }

    fn draw_image(&mut self, jpeg: &[u8], pixels: Size, rect: Rect) -> Result<(), CompositionError> {
        if jpeg.is_empty() || pixels.is_empty() {
            return Err(CompositionError::Render("empty image payload".into()));
        }
        self.current_page()?;

        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => pixels.width as i64,
                "Height" => pixels.height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg.to_vec(),
        )
        .with_compression(false);
        let image_id = self.doc.add_object(image);

        self.image_count += 1;
        let name = format!("Im{}", self.image_count);
        let x = mm_to_pt(rect.x);
        let y = self.y_pt(rect.bottom());
        let (w, h) = (mm_to_pt(rect.width), mm_to_pt(rect.height));

        let page = self.current_page()?;
        page.images.set(name.as_bytes().to_vec(), image_id);
        page.operations.extend([
            Operation::new("q", vec![]),
            Operation::new("cm", vec![real(w), 0.into(), 0.into(), real(h), real(x), real(y)]),
            Operation::new("Do", vec![Object::Name(name.into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
        Ok(())
    }

    fn draw_text(&mut self, line: &TextLine) -> Result<(), CompositionError> {
        let x = mm_to_pt(line.x);
        let y = self.y_pt(line.baseline);
        let page = self.current_page()?;
        page.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("rg", color_operands(line.color)),
            Operation::new("Tf", vec![font_resource(line.face).into(), real(line.size_pt)]),
            Operation::new("Td", vec![real(x), real(y)]),
            Operation::new(
                "Tj",
                vec![Object::String(font::encode_win_ansi(&line.text), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ]);
        Ok(())
    }

    fn draw_rule(&mut self, rule: &RuleLine) -> Result<(), CompositionError> {
        let y = self.y_pt(rule.y);
        let page = self.current_page()?;
        page.operations.extend([
            Operation::new("q", vec![]),
            Operation::new("RG", color_operands(rule.color)),
            Operation::new("w", vec![real(mm_to_pt(rule.width_mm))]),
            Operation::new("m", vec![real(mm_to_pt(rule.x1)), real(y)]),
            Operation::new("l", vec![real(mm_to_pt(rule.x2)), real(y)]),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ]);
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<u8>, CompositionError> {
        self.flush_page()?;
        if self.kids.is_empty() {
            return Err(CompositionError::Render("document has no pages".into()));
        }

        let count = self.kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Count" => count,
            "Kids" => std::mem::take(&mut self.kids),
            "MediaBox" => vec![
                0.into(),
                0.into(),
                real(mm_to_pt(self.page.width_mm)),
                real(mm_to_pt(self.page.height_mm)),
            ],
        };
        self.doc.set_object(self.pages_id, pages);

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.write_info();

        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| CompositionError::Render(e.to_string()))?;
        debug!(pages = count, bytes = buffer.len(), "pdf written");
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    fn jpeg(width: u32, height: u32) -> Vec<u8> {
        let pixels = vec![200u8; (width * height * 3) as usize];
        crate::encode::encode_jpeg(&pixels, width, height, 80).unwrap()
    }

    fn text(value: &str) -> TextLine {
        TextLine {
            text: value.into(),
            x: 20.0,
            baseline: 25.0,
            face: FontFace::Bold,
            size_pt: 20.0,
            color: [0, 0, 0],
        }
    }

    #[test]
    fn test_mm_to_pt() {
        assert!((mm_to_pt(25.4) - 72.0).abs() < 1e-9);
        assert!((mm_to_pt(210.0) - 595.2755).abs() < 1e-3);
    }

    #[test]
    fn test_info_string_is_utf16_with_bom() {
        match info_string("Ó") {
            Object::String(bytes, StringFormat::Hexadecimal) => {
                assert_eq!(bytes, vec![0xFE, 0xFF, 0x00, 0xD3]);
            }
            other => panic!("unexpected object {other:?}"),
        }
    }

    #[test]
    fn test_draw_before_page_fails() {
        let mut renderer = PdfRenderer::new(PageSettings::A4);
        assert!(matches!(
            renderer.draw_text(&text("x")),
            Err(CompositionError::Render(_))
        ));
    }

    #[test]
    fn test_finish_without_pages_fails() {
        let renderer = PdfRenderer::new(PageSettings::A4);
        assert!(renderer.finish().is_err());
    }

    #[test]
    fn test_empty_jpeg_rejected() {
        let mut renderer = PdfRenderer::new(PageSettings::A4);
        renderer.begin_page().unwrap();
        let result = renderer.draw_image(&[], Size::new(1, 1), Rect::new(0.0, 0.0, 1.0, 1.0));
        assert!(result.is_err());
    }

    #[test]
    fn test_writes_pdf_document() {
        let mut renderer = PdfRenderer::new(PageSettings::A4);
        renderer.set_info(&DocumentInfo {
            title: "Relatório".into(),
            author: "Ana".into(),
            creator: "Folio".into(),
            producer: "Folio".into(),
            created: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        });

        renderer.begin_page().unwrap();
        renderer.draw_text(&text("Página 1")).unwrap();
        renderer
            .draw_rule(&RuleLine {
                x1: 20.0,
                x2: 190.0,
                y: 35.0,
                width_mm: 1.0,
                color: [102, 126, 234],
            })
            .unwrap();
        renderer
            .draw_image(&jpeg(8, 4), Size::new(8, 4), Rect::new(10.0, 47.0, 190.0, 95.0))
            .unwrap();
        renderer.begin_page().unwrap();
        renderer
            .draw_image(&jpeg(4, 8), Size::new(4, 8), Rect::new(10.0, 20.0, 50.0, 100.0))
            .unwrap();
        assert_eq!(renderer.page_count(), 2);

        let bytes = renderer.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(contains(&bytes, b"DCTDecode"));
        assert!(contains(&bytes, b"Helvetica-Bold"));
        assert!(contains(&bytes, b"WinAnsiEncoding"));
        assert!(contains(&bytes, b"D:20240229000000"));
        assert!(contains(&bytes, b"%%EOF"));
    }
}
