use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{DocumentFormat, DocumentType, ProcessingStatus};

/// Text marker substituted for a page whose OCR failed.
pub const OCR_FAILED_MARKER: &str = "[OCR Failed]";

/// One ingested claim document. Produced once by ingestion and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub filename: String,
    pub format: DocumentFormat,
    pub pages: Vec<Page>,
    pub full_text: String,
    pub classified_type: DocumentType,
    pub metadata: DocumentMetadata,
    pub tables: Vec<DocumentTable>,
    pub has_images: bool,
    pub needed_ocr: bool,
    pub status: ProcessingStatus,
    pub processed_at: DateTime<Utc>,
}

/// Per-page extraction result. Page numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub page_number: usize,
    pub text: String,
    /// Heuristic OCR reliability, present only when the page went through OCR.
    pub ocr_confidence: Option<f32>,
    pub extraction_error: Option<String>,
    #[serde(default)]
    pub has_images: bool,
}

impl Page {
    pub fn text(page_number: usize, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
            ocr_confidence: None,
            extraction_error: None,
            has_images: false,
        }
    }

    pub fn ocr_failed(page_number: usize, error: impl Into<String>) -> Self {
        Self {
            page_number,
            text: OCR_FAILED_MARKER.to_string(),
            ocr_confidence: None,
            extraction_error: Some(error.into()),
            has_images: true,
        }
    }
}

/// Table lifted out of a word-processor document as a row/column grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentTable {
    pub table_number: usize,
    pub rows: Vec<Vec<String>>,
}

/// Best-effort hints scanned out of the full text. None of these are authoritative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub dates: Vec<String>,
    pub ssn_detected: bool,
    /// Only the last four digits survive, as `XXX-XX-1234`.
    pub ssn_masked: Vec<String>,
    pub possible_names: Vec<String>,
    pub medical_terms: Vec<String>,
    pub military_units: Vec<String>,
}

impl Document {
    pub fn page(&self, page_number: usize) -> Option<&Page> {
        self.pages.iter().find(|p| p.page_number == page_number)
    }
}
