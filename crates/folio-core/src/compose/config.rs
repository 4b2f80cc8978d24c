//! Document configuration passed in from the page.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::locale::Locale;

pub const DEFAULT_TITLE: &str = "Documento PDF";
pub const DEFAULT_AUTHOR: &str = "Folio";
pub const DEFAULT_FILENAME: &str = "documento";

/// How many images share one page. Serialized as the number `1` or `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ImagesPerPage {
    #[default]
    One,
    Two,
}

impl ImagesPerPage {
    pub fn count(self) -> usize {
        match self {
            ImagesPerPage::One => 1,
            ImagesPerPage::Two => 2,
        }
    }
}

impl TryFrom<u8> for ImagesPerPage {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ImagesPerPage::One),
            2 => Ok(ImagesPerPage::Two),
            other => Err(format!("images per page must be 1 or 2, got {other}")),
        }
    }
}

impl From<ImagesPerPage> for u8 {
    fn from(value: ImagesPerPage) -> Self {
        value.count() as u8
    }
}

/// Physical page settings in millimetres. Fixed to A4 portrait by default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSettings {
    pub width_mm: f64,
    pub height_mm: f64,
    pub margin_mm: f64,
}

impl PageSettings {
    pub const A4: PageSettings = PageSettings {
        width_mm: 210.0,
        height_mm: 297.0,
        margin_mm: 10.0,
    };
}

impl Default for PageSettings {
    fn default() -> Self {
        Self::A4
    }
}

/// Everything the compositor needs to know about the output document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    pub title: String,
    pub author: String,
    /// Output filename stem, before sanitizing and date stamping.
    pub filename: String,
    pub images_per_page: ImagesPerPage,
    pub number_pages: bool,
    /// Printed in the footer as `DD/MM/YYYY` when present.
    pub footer_date: Option<NaiveDate>,
    pub locale: Locale,
    /// Always A4 for documents configured from the page; never read from input.
    #[serde(skip)]
    pub page: PageSettings,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            author: DEFAULT_AUTHOR.to_string(),
            filename: DEFAULT_FILENAME.to_string(),
            images_per_page: ImagesPerPage::One,
            number_pages: true,
            footer_date: None,
            locale: Locale::Pt,
            page: PageSettings::A4,
        }
    }
}

impl PdfConfig {
    /// Trim text fields and replace blank ones with their defaults.
    pub fn normalized(mut self) -> Self {
        fn or_default(value: String, default: &str) -> String {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                default.to_string()
            } else {
                trimmed.to_string()
            }
        }

        self.title = or_default(self.title, DEFAULT_TITLE);
        self.author = or_default(self.author, DEFAULT_AUTHOR);
        self.filename = or_default(self.filename, DEFAULT_FILENAME);
        self
    }

    pub fn footer_date_text(&self) -> Option<String> {
        self.footer_date.map(|d| d.format("%d/%m/%Y").to_string())
    }

    /// Right-hand footer text for `page_number`, if anything is shown.
    pub fn footer_right_text(&self, page_number: usize) -> Option<String> {
        let page = self
            .number_pages
            .then(|| self.locale.page_label(page_number));
        match (page, self.footer_date_text()) {
            (Some(page), Some(date)) => Some(format!("{page} | {date}")),
            (Some(page), None) => Some(page),
            (None, date) => date,
        }
    }

    pub fn footer_left_text(&self) -> String {
        format!("{} {}", self.locale.author_label(), self.author)
    }
}

/// Replace every character outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize_stem(stem: &str) -> String {
    stem.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `<sanitized-stem>_<YYYY-MM-DD>.pdf`
pub fn output_filename(stem: &str, date: NaiveDate) -> String {
    let stem = match stem.trim() {
        "" => DEFAULT_FILENAME,
        s => s,
    };
    format!("{}_{}.pdf", sanitize_stem(stem), date.format("%Y-%m-%d"))
}
