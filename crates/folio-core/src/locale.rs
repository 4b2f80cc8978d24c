//! Document-facing strings in the three supported languages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Pt,
    En,
    De,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported language: {0}")]
pub struct UnknownLocale(pub String);

impl Locale {
    pub const ALL: [Locale; 3] = [Locale::Pt, Locale::En, Locale::De];

    pub fn as_str(self) -> &'static str {
        match self {
            Locale::Pt => "pt",
            Locale::En => "en",
            Locale::De => "de",
        }
    }

    /// Label printed before the author name in the footer.
    pub fn author_label(self) -> &'static str {
        match self {
            Locale::Pt => "Elaborado por:",
            Locale::En => "Prepared by:",
            Locale::De => "Erstellt von:",
        }
    }

    pub fn page_label(self, page: usize) -> String {
        match self {
            Locale::Pt => format!("Página {page}"),
            Locale::En => format!("Page {page}"),
            Locale::De => format!("Seite {page}"),
        }
    }

    pub fn processing_image(self, current: usize, total: usize) -> String {
        match self {
            Locale::Pt => format!("Processando imagem {current} de {total}"),
            Locale::En => format!("Processing image {current} of {total}"),
            Locale::De => format!("Verarbeite Bild {current} von {total}"),
        }
    }

    pub fn finalizing(self) -> &'static str {
        match self {
            Locale::Pt => "Finalizando PDF...",
            Locale::En => "Finalizing PDF...",
            Locale::De => "PDF wird finalisiert...",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = UnknownLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pt" => Ok(Locale::Pt),
            "en" => Ok(Locale::En),
            "de" => Ok(Locale::De),
            _ => Err(UnknownLocale(s.to_string())),
        }
    }
}
