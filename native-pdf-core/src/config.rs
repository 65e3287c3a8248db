//! Configuration records consumed by the document builders
//!
//! These types only carry options; none of them performs I/O.

use crate::bytes::escape_pdf_string;
use crate::objects::Dictionary;
use chrono::{DateTime, Local};

/// Physical page sizes in points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Legal,
    A3,
}

impl PageSize {
    /// `(width, height)` in portrait orientation.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::A3 => (841.89, 1190.55),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PageOrientation {
    #[default]
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Margins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Margins {
    pub fn uniform(value: f64) -> Self {
        Self {
            left: value,
            right: value,
            top: value,
            bottom: value,
        }
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(72.0)
    }
}

/// Document information written to the header comments and the trailer `/Info`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    pub creation_date: DateTime<Local>,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self {
            title: None,
            author: None,
            subject: None,
            keywords: None,
            creator: Some("native-pdf".to_string()),
            creation_date: Local::now(),
        }
    }
}

impl DocumentMetadata {
    /// True when no descriptive field carries text.
    pub fn is_empty(&self) -> bool {
        [
            &self.title,
            &self.author,
            &self.subject,
            &self.keywords,
            &self.creator,
        ]
        .iter()
        .all(|field| field.as_deref().map_or(true, str::is_empty))
    }

    /// `%%Key: value` comment lines placed after the header banner. Line
    /// breaks in a value become spaces so each comment stays on one line.
    pub fn header_comments(&self) -> Vec<String> {
        [
            ("Title", &self.title),
            ("Author", &self.author),
            ("Subject", &self.subject),
            ("Keywords", &self.keywords),
        ]
        .into_iter()
        .filter_map(|(key, value)| match value.as_deref() {
            Some(text) if !text.is_empty() => {
                let text = text.replace(['\r', '\n'], " ");
                Some(format!("%%{key}: {text}"))
            }
            _ => None,
        })
        .collect()
    }

    /// Inline `/Info` dictionary for the trailer.
    pub fn to_info_dictionary(&self) -> Dictionary {
        let mut info = Dictionary::new();
        let fields = [
            ("Title", &self.title),
            ("Author", &self.author),
            ("Subject", &self.subject),
            ("Keywords", &self.keywords),
            ("Creator", &self.creator),
        ];
        for (key, value) in fields {
            if let Some(text) = value.as_deref().filter(|text| !text.is_empty()) {
                info.set(key, format!("({})", escape_pdf_string(text)));
            }
        }
        info.set(
            "CreationDate",
            format!("({})", format_pdf_date(self.creation_date)),
        );
        info
    }
}

/// Format a timestamp as `D:YYYYMMDDHHmmSS`.
pub fn format_pdf_date(date: DateTime<Local>) -> String {
    date.format("D:%Y%m%d%H%M%S").to_string()
}

/// Layout options for the builders.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PdfConfig {
    pub page_size: PageSize,
    pub orientation: PageOrientation,
    pub margins: Margins,
    pub font_name: String,
    pub font_size: f64,
    pub metadata: Option<DocumentMetadata>,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            orientation: PageOrientation::Portrait,
            margins: Margins::default(),
            font_name: "Helvetica".to_string(),
            font_size: 12.0,
            metadata: None,
        }
    }
}

impl PdfConfig {
    /// Page `(width, height)` after applying the orientation.
    pub fn page_dimensions(&self) -> (f64, f64) {
        let (width, height) = self.page_size.dimensions();
        match self.orientation {
            PageOrientation::Portrait => (width, height),
            PageOrientation::Landscape => (height, width),
        }
    }

    pub fn with_metadata(mut self, metadata: DocumentMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
