//! Pure page layout: which image lands on which page, and where.
//!
//! All measurements are millimetres from the top-left corner of the page.
//! Text positions are baselines.

use super::config::PdfConfig;
use super::render::{FontFace, PageMetrics};
use super::CompositionError;
use crate::geometry::{layout_image_in_region, Rect, Size};
use crate::store::ImageId;

pub const TITLE_SIZE_PT: f64 = 20.0;
pub const TITLE_FIRST_BASELINE_MM: f64 = 25.0;
pub const TITLE_LINE_HEIGHT_MM: f64 = 7.0;
/// Horizontal room the title is wrapped to, subtracted from the page width.
pub const TITLE_WRAP_INSET_MM: f64 = 40.0;
pub const TITLE_RULE_GAP_MM: f64 = 3.0;
pub const TITLE_BLOCK_PADDING_MM: f64 = 15.0;
pub const TITLE_RULE_COLOR: [u8; 3] = [102, 126, 234];
pub const TITLE_RULE_WIDTH_MM: f64 = 1.0;
pub const RULE_INSET_MM: f64 = 20.0;

pub const DEFAULT_TOP_MM: f64 = 20.0;
pub const FOOTER_RESERVE_MM: f64 = 30.0;
pub const SLOT_SPACING_MM: f64 = 20.0;

pub const FOOTER_SIZE_PT: f64 = 10.0;
pub const FOOTER_INSET_MM: f64 = 20.0;
pub const FOOTER_BASELINE_FROM_BOTTOM_MM: f64 = 10.0;
pub const FOOTER_COLOR: [u8; 3] = [128, 128, 128];

const BLACK: [u8; 3] = [0, 0, 0];

#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub x: f64,
    pub baseline: f64,
    pub face: FontFace,
    pub size_pt: f64,
    pub color: [u8; 3],
}

/// Horizontal stroke from `x1` to `x2` at height `y`.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleLine {
    pub x1: f64,
    pub x2: f64,
    pub y: f64,
    pub width_mm: f64,
    pub color: [u8; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub struct TitleBlock {
    pub lines: Vec<TextLine>,
    pub rule: RuleLine,
    /// Where the image area starts below the block.
    pub bottom: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedImage {
    /// Position of the image in the composed sequence.
    pub index: usize,
    pub id: ImageId,
    /// Region reserved for the image before fitting.
    pub slot: Rect,
    /// Final, aspect-preserving placement inside `slot`.
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Footer {
    pub left: TextLine,
    pub right: Option<TextLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PagePlan {
    /// One-based page number.
    pub number: usize,
    pub title: Option<TitleBlock>,
    pub images: Vec<PlacedImage>,
    pub footer: Footer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentPlan {
    pub pages: Vec<PagePlan>,
    pub page_width: f64,
    pub page_height: f64,
}

impl DocumentPlan {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn image_count(&self) -> usize {
        self.pages.iter().map(|p| p.images.len()).sum()
    }
}

/// Lay out `images` (id and pixel size, in document order) into pages.
///
/// # Errors
///
/// `NoRoomForImages` when the title and footer leave a page without a
/// positive image area, as happens with a very long title or a short page.
pub fn plan_document(
    images: &[(ImageId, Size)],
    config: &PdfConfig,
    metrics: &impl PageMetrics,
) -> Result<DocumentPlan, CompositionError> {
    let (page_width, page_height) = metrics.page_size_mm();
    let per_page = config.images_per_page.count();
    let margin = config.page.margin_mm;

    let pages = images
        .chunks(per_page)
        .enumerate()
        .map(|(page_index, chunk)| {
            let number = page_index + 1;
            let title = (page_index == 0).then(|| title_block(&config.title, page_width, metrics));
            let top = title.as_ref().map_or(DEFAULT_TOP_MM, |t| t.bottom);
            let slots = slot_regions(top, page_width, page_height, margin, per_page);
            if slots.iter().any(|slot| slot.width <= 0.0 || slot.height <= 0.0) {
                return Err(CompositionError::NoRoomForImages { page: number });
            }

            let placed = chunk
                .iter()
                .zip(slots)
                .enumerate()
                .map(|(offset, (&(id, size), slot))| PlacedImage {
                    index: page_index * per_page + offset,
                    id,
                    slot,
                    rect: layout_image_in_region(size, slot),
                })
                .collect();

            Ok(PagePlan {
                number,
                title,
                images: placed,
                footer: footer(config, number, page_width, page_height, metrics),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DocumentPlan {
        pages,
        page_width,
        page_height,
    })
}

fn title_block(title: &str, page_width: f64, metrics: &impl PageMetrics) -> TitleBlock {
    let wrapped = super::font::wrap_text(
        title,
        FontFace::Bold,
        TITLE_SIZE_PT,
        page_width - TITLE_WRAP_INSET_MM,
    );

    let lines: Vec<TextLine> = wrapped
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let width = metrics.text_width_mm(&text, FontFace::Bold, TITLE_SIZE_PT);
            TextLine {
                x: (page_width - width) / 2.0,
                baseline: TITLE_FIRST_BASELINE_MM + i as f64 * TITLE_LINE_HEIGHT_MM,
                text,
                face: FontFace::Bold,
                size_pt: TITLE_SIZE_PT,
                color: BLACK,
            }
        })
        .collect();

    let block_height = lines.len() as f64 * TITLE_LINE_HEIGHT_MM;
    TitleBlock {
        rule: RuleLine {
            x1: RULE_INSET_MM,
            x2: page_width - RULE_INSET_MM,
            y: TITLE_FIRST_BASELINE_MM + block_height + TITLE_RULE_GAP_MM,
            width_mm: TITLE_RULE_WIDTH_MM,
            color: TITLE_RULE_COLOR,
        },
        bottom: TITLE_FIRST_BASELINE_MM + block_height + TITLE_BLOCK_PADDING_MM,
        lines,
    }
}

fn slot_regions(top: f64, page_width: f64, page_height: f64, margin: f64, per_page: usize) -> Vec<Rect> {
    let area = page_height - top - FOOTER_RESERVE_MM;
    let width = page_width - 2.0 * margin;

    if per_page <= 1 {
        return vec![Rect::new(margin, top, width, area)];
    }

    let gaps = (per_page - 1) as f64 * SLOT_SPACING_MM;
    let height = (area - gaps) / per_page as f64;
    (0..per_page)
        .map(|i| Rect::new(margin, top + i as f64 * (height + SLOT_SPACING_MM), width, height))
        .collect()
}

fn footer(
    config: &PdfConfig,
    page_number: usize,
    page_width: f64,
    page_height: f64,
    metrics: &impl PageMetrics,
) -> Footer {
    let baseline = page_height - FOOTER_BASELINE_FROM_BOTTOM_MM;
    let line = |text: String, x: f64| TextLine {
        text,
        x,
        baseline,
        face: FontFace::Regular,
        size_pt: FOOTER_SIZE_PT,
        color: FOOTER_COLOR,
    };

    let right = config.footer_right_text(page_number).map(|text| {
        let width = metrics.text_width_mm(&text, FontFace::Regular, FOOTER_SIZE_PT);
        line(text, page_width - width - FOOTER_INSET_MM)
    });

    Footer {
        left: line(config.footer_left_text(), FOOTER_INSET_MM),
        right,
    }
}
