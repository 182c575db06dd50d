use crate::models::DocumentType;

use super::ExtractionError;

/// Text layer of one PDF page as produced by direct extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfPageText {
    /// 1-based.
    pub page_number: usize,
    pub text: String,
    pub has_images: bool,
}

/// Optical character recognizer. May fail per page.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, ExtractionError>;

    /// Short label used in logs and health reports.
    fn name(&self) -> &'static str {
        "ocr"
    }
}

/// Born-digital PDF text extraction, one entry per page in page order.
pub trait PdfExtractor: Send + Sync {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PdfPageText>, ExtractionError>;
}

/// Rasterizes PDF pages so they can be sent through OCR.
///
/// `page_index` is 0-based. Output is PNG bytes.
pub trait PdfPageRenderer: Send + Sync {
    fn page_count(&self, pdf_bytes: &[u8]) -> Result<usize, ExtractionError>;

    fn render_page(
        &self,
        pdf_bytes: &[u8],
        page_index: usize,
        dpi: u32,
    ) -> Result<Vec<u8>, ExtractionError>;
}

/// Normalizes a raster page before OCR. Input and output are encoded images.
pub trait ImagePreprocessor: Send + Sync {
    fn preprocess(&self, image_bytes: &[u8]) -> Result<Vec<u8>, ExtractionError>;
}

/// Labels a document by type from its extracted text.
pub trait DocumentClassifier: Send + Sync {
    fn classify(&self, text: &str) -> DocumentType;
}
