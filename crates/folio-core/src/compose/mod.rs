//! PDF composition from the ordered image records.
//!
//! Composition is split in two steps. [`plan_document`] computes a pure
//! [`DocumentPlan`] from image sizes and the configuration, then the plan is
//! replayed onto a [`DocumentRenderer`]. [`PdfRenderer`] is the shipped
//! renderer.

mod config;
mod font;
mod layout;
mod pdf;
mod render;

use std::cell::Cell;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::store::ImageRecord;

pub use config::{
    output_filename, sanitize_stem, ImagesPerPage, PageSettings, PdfConfig, DEFAULT_AUTHOR,
    DEFAULT_FILENAME, DEFAULT_TITLE,
};
pub use font::{encode_win_ansi, text_width_mm, wrap_text};
pub use layout::{
    plan_document, DocumentPlan, Footer, PagePlan, PlacedImage, RuleLine, TextLine, TitleBlock,
};
pub use pdf::PdfRenderer;
pub use render::{DocumentInfo, DocumentRenderer, FontFace, PageMetrics};

/// Name stamped as creator and producer of every document.
pub const PRODUCER: &str = "Folio";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositionError {
    #[error("A PDF is already being generated")]
    AlreadyInProgress,

    #[error("No valid images to add to the PDF")]
    NoImages,

    #[error("No room left for images on page {page}")]
    NoRoomForImages { page: usize },

    #[error("Failed to render PDF: {0}")]
    Render(String),
}

/// Incremental progress reported while composing.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    /// Completed share of the work, `0.0..=1.0`.
    pub fraction: f64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComposedPdf {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// Composes documents, refusing to start while one is already running.
#[derive(Debug, Default)]
pub struct Compositor {
    busy: Cell<bool>,
}

struct BusyGuard<'a>(&'a Cell<bool>);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }

    fn acquire(&self) -> Result<BusyGuard<'_>, CompositionError> {
        if self.busy.replace(true) {
            warn!("composition requested while another is in progress");
            return Err(CompositionError::AlreadyInProgress);
        }
        Ok(BusyGuard(&self.busy))
    }

    /// Compose `records` in order into a PDF file.
    pub fn compose(
        &self,
        records: &[ImageRecord],
        config: &PdfConfig,
        today: NaiveDate,
        progress: impl FnMut(Progress),
    ) -> Result<ComposedPdf, CompositionError> {
        let renderer = PdfRenderer::new(config.page);
        self.compose_with(renderer, records, config, today, progress)
    }

    /// Like [`Compositor::compose`], drawing through a caller-supplied renderer.
    pub fn compose_with<R: DocumentRenderer>(
        &self,
        mut renderer: R,
        records: &[ImageRecord],
        config: &PdfConfig,
        today: NaiveDate,
        mut progress: impl FnMut(Progress),
    ) -> Result<ComposedPdf, CompositionError> {
        let _guard = self.acquire()?;
        let config = config.clone().normalized();

        let valid: Vec<&ImageRecord> = records
            .iter()
            .filter(|record| {
                let ok = record.is_valid();
                if !ok {
                    warn!(id = %record.id(), name = record.name(), "skipping invalid image");
                }
                ok
            })
            .collect();
        if valid.is_empty() {
            return Err(CompositionError::NoImages);
        }

        let sizes: Vec<_> = valid.iter().map(|r| (r.id(), r.size())).collect();
        let plan = plan_document(&sizes, &config, &renderer).map_err(|err| {
            error!(error = %err, "pdf layout failed");
            err
        })?;
        debug!(
            images = plan.image_count(),
            pages = plan.page_count(),
            "composing pdf"
        );

        renderer.set_info(&DocumentInfo {
            title: config.title.clone(),
            author: config.author.clone(),
            creator: PRODUCER.to_string(),
            producer: PRODUCER.to_string(),
            created: today,
        });

        let total = valid.len();
        let result = render_plan(&mut renderer, &plan, &valid, |done| {
            progress(Progress {
                fraction: done as f64 / total as f64,
                message: config.locale.processing_image(done, total),
            })
        })
        .and_then(|()| {
            progress(Progress {
                fraction: 1.0,
                message: config.locale.finalizing().to_string(),
            });
            renderer.finish()
        });

        match result {
            Ok(bytes) => Ok(ComposedPdf {
                filename: output_filename(&config.filename, today),
                bytes,
                page_count: plan.page_count(),
            }),
            Err(err) => {
                error!(error = %err, "pdf composition failed");
                Err(err)
            }
        }
    }
}

fn render_plan<R: DocumentRenderer>(
    renderer: &mut R,
    plan: &DocumentPlan,
    records: &[&ImageRecord],
    mut placed: impl FnMut(usize),
) -> Result<(), CompositionError> {
    let mut done = 0;
    for page in &plan.pages {
        renderer.begin_page()?;

        if let Some(title) = &page.title {
            for line in &title.lines {
                renderer.draw_text(line)?;
            }
            renderer.draw_rule(&title.rule)?;
        }

        for image in &page.images {
            let record = records
                .get(image.index)
                .ok_or_else(|| CompositionError::Render(format!("missing image {}", image.id)))?;
            renderer.draw_image(record.encoded(), record.size(), image.rect)?;
            done += 1;
            placed(done);
        }

        renderer.draw_text(&page.footer.left)?;
        if let Some(right) = &page.footer.right {
            renderer.draw_text(right)?;
        }
    }
    Ok(())
}
