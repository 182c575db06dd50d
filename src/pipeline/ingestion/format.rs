use std::path::Path;

use crate::models::DocumentFormat;

use super::ExtractionError;

/// Extensions accepted for ingestion, lower-case with the leading dot.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[".pdf", ".docx", ".txt", ".png", ".jpg", ".jpeg", ".tiff"];

/// Resolve the document format from the filename extension (case-insensitive).
pub fn detect_format(filename: &str) -> Result<DocumentFormat, ExtractionError> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => Ok(DocumentFormat::Pdf),
        "docx" => Ok(DocumentFormat::Docx),
        "txt" => Ok(DocumentFormat::PlainText),
        "png" | "jpg" | "jpeg" | "tiff" => Ok(DocumentFormat::Image),
        "" => Err(ExtractionError::UnsupportedFormat(format!(
            "{filename} has no file extension"
        ))),
        other => Err(ExtractionError::UnsupportedFormat(format!(".{other}"))),
    }
}
