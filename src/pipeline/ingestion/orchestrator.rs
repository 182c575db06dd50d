use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use super::classify::KeywordClassifier;
use super::confidence::score_ocr_text;
use super::docx::{extract_docx, paginate};
use super::format::detect_format;
use super::metadata::extract_metadata;
use super::preprocess::OcrPreprocessor;
use super::sanitize::{clean_ocr_text, decode_permissive};
use super::types::{
    DocumentClassifier, ImagePreprocessor, OcrEngine, PdfExtractor, PdfPageRenderer, PdfPageText,
};
use super::ExtractionError;
use crate::models::{Document, DocumentFormat, DocumentTable, Page, ProcessingStatus};
use crate::pipeline_config::IngestionConfig;

/// Error recorded on a low-text PDF page that could not be rasterized.
pub const NO_RENDERER_ERROR: &str = "no page renderer configured";

/// Turns raw file bytes into a [`Document`].
///
/// Capabilities are injected so tests can swap in deterministic fakes.
pub struct DocumentIngestor {
    ocr_engine: Arc<dyn OcrEngine>,
    pdf_extractor: Arc<dyn PdfExtractor>,
    pdf_renderer: Option<Arc<dyn PdfPageRenderer>>,
    preprocessor: Arc<dyn ImagePreprocessor>,
    classifier: Arc<dyn DocumentClassifier>,
    config: IngestionConfig,
}

/// Format-specific extraction output, before classification and metadata.
struct Extracted {
    pages: Vec<Page>,
    full_text: String,
    tables: Vec<DocumentTable>,
    has_images: bool,
    needed_ocr: bool,
}

impl DocumentIngestor {
    pub fn new(
        ocr_engine: Arc<dyn OcrEngine>,
        pdf_extractor: Arc<dyn PdfExtractor>,
        config: IngestionConfig,
    ) -> Self {
        Self {
            ocr_engine,
            pdf_extractor,
            pdf_renderer: None,
            preprocessor: Arc::new(OcrPreprocessor),
            classifier: Arc::new(KeywordClassifier),
            config,
        }
    }

    /// Add a PDF page renderer for OCR of scanned pages.
    pub fn with_pdf_renderer(mut self, renderer: Arc<dyn PdfPageRenderer>) -> Self {
        self.pdf_renderer = Some(renderer);
        self
    }

    pub fn with_preprocessor(mut self, preprocessor: Arc<dyn ImagePreprocessor>) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn DocumentClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Ingest one file. Only an unsupported extension, a PDF that can be
    /// neither parsed nor rendered, or an unreadable word-processor archive
    /// fail the call; per-page OCR problems are recorded on the page.
    ///
    /// OCR of PDF pages needs a renderer (see [`Self::with_pdf_renderer`]).
    /// Without one, low-text pages keep their direct text and a PDF whose
    /// text layer cannot be parsed returns the parse error.
    pub fn ingest(&self, bytes: &[u8], filename: &str) -> Result<Document, ExtractionError> {
        let format = detect_format(filename)?;
        let processed_at = Utc::now();
        let id = document_id(filename, &processed_at);

        info!(
            document_id = %id,
            format = format.as_str(),
            bytes = bytes.len(),
            "Starting document ingestion"
        );

        let extracted = match format {
            DocumentFormat::Pdf => self.extract_pdf(bytes, &id)?,
            DocumentFormat::Docx => self.extract_docx(bytes)?,
            DocumentFormat::PlainText => extract_plain_text(bytes),
            DocumentFormat::Image => self.extract_image(bytes, &id),
        };

        let classified_type = self.classifier.classify(&extracted.full_text);
        let metadata = extract_metadata(&extracted.full_text);

        info!(
            document_id = %id,
            pages = extracted.pages.len(),
            needed_ocr = extracted.needed_ocr,
            document_type = classified_type.as_str(),
            "Document ingested"
        );

        Ok(Document {
            id,
            filename: filename.to_string(),
            format,
            pages: extracted.pages,
            full_text: extracted.full_text,
            classified_type,
            metadata,
            tables: extracted.tables,
            has_images: extracted.has_images,
            needed_ocr: extracted.needed_ocr,
            status: ProcessingStatus::Completed,
            processed_at,
        })
    }

    /// Ingest many files in parallel. Results keep input order.
    pub fn ingest_batch(&self, files: &[(String, Vec<u8>)]) -> Vec<Result<Document, ExtractionError>> {
        info!(files = files.len(), "Starting batch ingestion");
        files
            .par_iter()
            .map(|(filename, bytes)| self.ingest(bytes, filename))
            .collect()
    }

    // ── PDF ──────────────────────────────────────────────

    fn extract_pdf(&self, bytes: &[u8], id: &str) -> Result<Extracted, ExtractionError> {
        match self.pdf_extractor.extract_pages(bytes) {
            Ok(direct) => Ok(self.pdf_with_page_fallback(bytes, id, direct)),
            Err(e) => {
                warn!(document_id = %id, error = %e, "Direct PDF extraction failed, OCR'ing every page");
                self.pdf_full_ocr(bytes, id, e)
            }
        }
    }

    fn pdf_with_page_fallback(&self, bytes: &[u8], id: &str, direct: Vec<PdfPageText>) -> Extracted {
        let threshold = self.config.min_page_text_chars;
        let needs_ocr = |text: &str| text.chars().filter(|c| !c.is_whitespace()).count() < threshold;
        let needed_ocr = direct.iter().any(|p| needs_ocr(&p.text));

        let pages: Vec<Page> = direct
            .into_par_iter()
            .map(|src| {
                if !needs_ocr(&src.text) {
                    return Page {
                        has_images: src.has_images,
                        ..Page::text(src.page_number, src.text)
                    };
                }
                let Some(renderer) = self.pdf_renderer.as_deref() else {
                    return Page {
                        extraction_error: Some(NO_RENDERER_ERROR.to_string()),
                        has_images: src.has_images,
                        ..Page::text(src.page_number, src.text)
                    };
                };
                let page = self.ocr_pdf_page(
                    renderer,
                    bytes,
                    id,
                    src.page_number,
                    self.config.scanned_page_render_dpi,
                );
                Page {
                    has_images: src.has_images,
                    ..page
                }
            })
            .collect();

        let has_images = pages.iter().any(|p| p.has_images);
        Extracted {
            full_text: paged_full_text(&pages),
            pages,
            tables: Vec::new(),
            has_images,
            needed_ocr,
        }
    }

    fn pdf_full_ocr(&self, bytes: &[u8], id: &str, cause: ExtractionError) -> Result<Extracted, ExtractionError> {
        let Some(renderer) = self.pdf_renderer.as_deref() else {
            return Err(cause);
        };
        let page_count = renderer.page_count(bytes)?;
        let dpi = self.config.fallback_render_dpi;

        let pages: Vec<Page> = (1..=page_count)
            .into_par_iter()
            .map(|n| self.ocr_pdf_page(renderer, bytes, id, n, dpi))
            .collect();

        Ok(Extracted {
            full_text: paged_full_text(&pages),
            pages,
            tables: Vec::new(),
            has_images: true,
            needed_ocr: true,
        })
    }

    fn ocr_pdf_page(
        &self,
        renderer: &dyn PdfPageRenderer,
        bytes: &[u8],
        id: &str,
        page_number: usize,
        dpi: u32,
    ) -> Page {
        let result = renderer
            .render_page(bytes, page_number - 1, dpi)
            .and_then(|png| self.ocr_image_bytes(&png));
        self.page_from_ocr(id, page_number, result)
    }

    // ── Other formats ────────────────────────────────────

    fn extract_docx(&self, bytes: &[u8]) -> Result<Extracted, ExtractionError> {
        let content = extract_docx(bytes)?;
        let full_text = content.text();
        let pages = paginate(&full_text, self.config.docx_page_chars)
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| Page::text(i + 1, chunk))
            .collect();

        Ok(Extracted {
            pages,
            full_text,
            tables: content.tables,
            has_images: content.has_images,
            needed_ocr: false,
        })
    }

    fn extract_image(&self, bytes: &[u8], id: &str) -> Extracted {
        let page = Page {
            has_images: true,
            ..self.page_from_ocr(id, 1, self.ocr_image_bytes(bytes))
        };
        Extracted {
            full_text: page.text.clone(),
            pages: vec![page],
            tables: Vec::new(),
            has_images: true,
            needed_ocr: true,
        }
    }

    // ── OCR helpers ──────────────────────────────────────

    fn ocr_image_bytes(&self, image: &[u8]) -> Result<String, ExtractionError> {
        let prepared = self.preprocessor.preprocess(image)?;
        let raw = self.ocr_engine.recognize(&prepared)?;
        Ok(clean_ocr_text(&raw))
    }

    fn page_from_ocr(&self, id: &str, page_number: usize, result: Result<String, ExtractionError>) -> Page {
        match result {
            Ok(text) => Page {
                ocr_confidence: Some(score_ocr_text(&text)),
                ..Page::text(page_number, text)
            },
            Err(e) => {
                warn!(
                    document_id = %id,
                    page = page_number,
                    engine = self.ocr_engine.name(),
                    error = %e,
                    "OCR failed for page"
                );
                Page::ocr_failed(page_number, e.to_string())
            }
        }
    }
}

fn extract_plain_text(bytes: &[u8]) -> Extracted {
    let text = decode_permissive(bytes);
    Extracted {
        pages: vec![Page::text(1, text.clone())],
        full_text: text,
        tables: Vec::new(),
        has_images: false,
        needed_ocr: false,
    }
}

/// PDF full text: each page preceded by a `[Page N]` marker line.
fn paged_full_text(pages: &[Page]) -> String {
    pages
        .iter()
        .map(|p| format!("\n[Page {}]\n{}\n", p.page_number, p.text))
        .collect()
}

/// First 16 hex characters of SHA-256 over the filename and ingestion time.
pub fn document_id(filename: &str, at: &DateTime<Utc>) -> String {
    let digest = Sha256::digest(format!("{filename}{}", at.to_rfc3339_opts(SecondsFormat::Nanos, true)));
    let mut hex = format!("{digest:x}");
    hex.truncate(16);
    hex
}
