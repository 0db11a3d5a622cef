//! Document conversion.
//!
//! Turns an uploaded file into a [`ReportTable`]:
//! - CSV files keep their own columns
//! - PDFs and images go through ocrmypdf (forced OCR) and pdftotext
//! - TXT, DOCX and ODT files are read directly
//!
//! Everything except CSV becomes a single row in the `report` column.

mod ocr;
mod office;
mod tools;

use std::path::Path;

use thiserror::Error;

use crate::report::{CsvError, ReportTable};
use crate::utils::extension_lowercase;

pub use tools::check_binary;

/// External executables the extractor shells out to.
pub const EXTERNAL_TOOLS: &[&str] = &["ocrmypdf", "pdftotext"];

/// Errors that can occur during text extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFileType(String),

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("{tool} failed: {message}")]
    ToolFailed { tool: String, message: String },

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Invalid CSV: {0}")]
    Csv(#[from] CsvError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Csv,
    Pdf,
    Image,
    Text,
    Docx,
    Odt,
}

impl DocumentKind {
    /// Extensions accepted by the upload form.
    pub const EXTENSIONS: &'static [&'static str] =
        &["csv", "pdf", "jpg", "jpeg", "png", "txt", "docx", "odt"];

    /// Classify a file by its (case-insensitive) extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match extension_lowercase(path)?.as_str() {
            "csv" => Some(Self::Csv),
            "pdf" => Some(Self::Pdf),
            "jpg" | "jpeg" | "png" => Some(Self::Image),
            "txt" => Some(Self::Text),
            "docx" => Some(Self::Docx),
            "odt" => Some(Self::Odt),
            _ => None,
        }
    }

    /// `accept` attribute value for the upload form.
    pub fn accept_attribute() -> String {
        Self::EXTENSIONS
            .iter()
            .map(|ext| format!(".{}", ext))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Converts uploaded documents using external tools.
#[derive(Debug, Clone, Default)]
pub struct TextExtractor {
    /// Language passed to ocrmypdf; its default (English) when unset.
    ocr_language: Option<String>,
}

impl TextExtractor {
    /// Create a new text extractor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the OCR language (tesseract codes, e.g. `deu+eng`).
    pub fn with_language(mut self, lang: Option<String>) -> Self {
        self.ocr_language = lang;
        self
    }

    /// Convert one file. Blocks while external tools run.
    pub fn extract(&self, path: &Path) -> Result<ReportTable, ExtractionError> {
        let kind = DocumentKind::from_path(path)
            .ok_or_else(|| ExtractionError::UnsupportedFileType(path.display().to_string()))?;

        tracing::debug!(file = %path.display(), kind = ?kind, "Extracting document");

        match kind {
            DocumentKind::Csv => {
                let bytes = std::fs::read(path)?;
                Ok(ReportTable::from_csv(&String::from_utf8_lossy(&bytes))?)
            }
            DocumentKind::Pdf => self.ocr(path, false),
            DocumentKind::Image => self.ocr(path, true),
            DocumentKind::Text => {
                let bytes = std::fs::read(path)?;
                Ok(ReportTable::from_report(String::from_utf8_lossy(&bytes)))
            }
            DocumentKind::Docx => Ok(ReportTable::from_report(office::docx_text(path)?)),
            DocumentKind::Odt => Ok(ReportTable::from_report(office::odt_text(path)?)),
        }
    }

    fn ocr(&self, path: &Path, is_image: bool) -> Result<ReportTable, ExtractionError> {
        let text = ocr::ocr_document(path, is_image, self.ocr_language.as_deref())?;
        Ok(ReportTable::from_report(text))
    }

    /// Check if required tools are available.
    pub fn check_tools() -> Vec<(String, bool)> {
        EXTERNAL_TOOLS
            .iter()
            .map(|tool| (tool.to_string(), check_binary(tool)))
            .collect()
    }
}
