pub mod types;
pub mod format;
pub mod confidence;
pub mod sanitize;
pub mod preprocess;
pub mod pdf;
pub mod pdfium;
pub mod docx;
pub mod ocr;
pub mod metadata;
pub mod classify;
pub mod orchestrator;

#[cfg(test)]
pub(crate) mod test_support;

pub use types::*;
pub use format::*;
pub use confidence::*;
pub use sanitize::*;
pub use preprocess::*;
pub use pdf::*;
pub use pdfium::*;
pub use docx::*;
pub use ocr::*;
pub use metadata::*;
pub use classify::*;
pub use orchestrator::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("PDF rendering failed on page {page}: {reason}")]
    PdfRendering { page: usize, reason: String },

    #[error("OCR engine initialization failed: {0}")]
    OcrInit(String),

    #[error("OCR processing failed: {0}")]
    OcrProcessing(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Word document parsing failed: {0}")]
    DocxParsing(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
