//! The rendering capability the compositor draws through.
//!
//! Layout happens in millimetres with a top-left origin. Implementations
//! convert to whatever their output format needs.

use chrono::NaiveDate;

use super::layout::{RuleLine, TextLine};
use super::CompositionError;
use crate::geometry::{Rect, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFace {
    Regular,
    Bold,
}

/// Page size and text measurement, enough to lay out a document.
pub trait PageMetrics {
    /// `(width, height)` in millimetres.
    fn page_size_mm(&self) -> (f64, f64);

    fn text_width_mm(&self, text: &str, face: FontFace, size_pt: f64) -> f64;
}

/// Document-level metadata stamped into the output.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentInfo {
    pub title: String,
    pub author: String,
    pub creator: String,
    pub producer: String,
    pub created: NaiveDate,
}

/// Sink for a laid-out document.
///
/// Calls arrive in document order: `set_info`, then for each page a
/// `begin_page` followed by the drawing calls for that page, then `finish`.
pub trait DocumentRenderer: PageMetrics {
    fn set_info(&mut self, info: &DocumentInfo);

    fn begin_page(&mut self) -> Result<(), CompositionError>;

    /// Place an already-encoded JPEG of `pixels` dimensions into `rect`.
    fn draw_image(&mut self, jpeg: &[u8], pixels: Size, rect: Rect) -> Result<(), CompositionError>;

    fn draw_text(&mut self, line: &TextLine) -> Result<(), CompositionError>;

    fn draw_rule(&mut self, rule: &RuleLine) -> Result<(), CompositionError>;

    fn finish(self) -> Result<Vec<u8>, CompositionError>;
}
