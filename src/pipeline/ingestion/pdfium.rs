//! Page rasterization through Google PDFium.
//!
//! `PdfiumRenderer` holds no library handle: `Pdfium` is `!Send`, so each call
//! binds the dynamic library again. Repeat binds hit the OS loader cache.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma};
use pdfium_render::prelude::*;
use tracing::{debug, warn};

use super::types::PdfPageRenderer;
use super::ExtractionError;

/// Upper bound on either rendered dimension.
const MAX_DIMENSION_PX: u32 = 4096;

const POINTS_PER_INCH: f32 = 72.0;

pub struct PdfiumRenderer;

impl PdfiumRenderer {
    /// Fails fast when no PDFium library can be bound.
    ///
    /// Lookup order: `PDFIUM_DYNAMIC_LIB_PATH`, the executable's directory,
    /// then the system library path.
    pub fn new() -> Result<Self, ExtractionError> {
        load_pdfium()?;
        Ok(Self)
    }
}

fn load_pdfium() -> Result<Pdfium, ExtractionError> {
    if let Ok(path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        debug!(path = %path, "Binding PDFium from PDFIUM_DYNAMIC_LIB_PATH");
        let bindings = Pdfium::bind_to_library(&path).map_err(|e| ExtractionError::PdfRendering {
            page: 0,
            reason: format!("Failed to load PDFium from {path}: {e}"),
        })?;
        return Ok(Pdfium::new(bindings));
    }

    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(|d| d.to_path_buf())) {
        let lib_path = Pdfium::pdfium_platform_library_name_at_path(exe_dir.to_string_lossy().as_ref());
        if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
            debug!(dir = %exe_dir.display(), "Bound PDFium next to executable");
            return Ok(Pdfium::new(bindings));
        }
    }

    let bindings = Pdfium::bind_to_system_library().map_err(|e| ExtractionError::PdfRendering {
        page: 0,
        reason: format!("PDFium library not found. Set PDFIUM_DYNAMIC_LIB_PATH or install PDFium: {e}"),
    })?;
    Ok(Pdfium::new(bindings))
}

/// Pixel size for a page at `dpi`, each side clamped to `[1, MAX_DIMENSION_PX]`
/// with aspect ratio preserved.
pub fn compute_render_dimensions(width_points: f32, height_points: f32, dpi: u32) -> (u32, u32) {
    let scale = dpi as f32 / POINTS_PER_INCH;
    let raw_w = (width_points * scale).max(1.0);
    let raw_h = (height_points * scale).max(1.0);

    let longest = raw_w.max(raw_h);
    if longest <= MAX_DIMENSION_PX as f32 {
        return (raw_w as u32, raw_h as u32);
    }

    let ratio = MAX_DIMENSION_PX as f32 / longest;
    (
        ((raw_w * ratio) as u32).clamp(1, MAX_DIMENSION_PX),
        ((raw_h * ratio) as u32).clamp(1, MAX_DIMENSION_PX),
    )
}

impl PdfPageRenderer for PdfiumRenderer {
    fn page_count(&self, pdf_bytes: &[u8]) -> Result<usize, ExtractionError> {
        let pdfium = load_pdfium()?;
        let document = pdfium
            .load_pdf_from_byte_slice(pdf_bytes, None)
            .map_err(|e| ExtractionError::PdfParsing(format!("PDFium could not open document: {e}")))?;
        Ok(document.pages().len() as usize)
    }

    fn render_page(&self, pdf_bytes: &[u8], page_index: usize, dpi: u32) -> Result<Vec<u8>, ExtractionError> {
        let rendering_error = |reason: String| ExtractionError::PdfRendering {
            page: page_index + 1,
            reason,
        };

        let pdfium = load_pdfium()?;
        let document = pdfium
            .load_pdf_from_byte_slice(pdf_bytes, None)
            .map_err(|e| rendering_error(format!("PDFium could not open document: {e}")))?;
        let pages = document.pages();

        let index = u16::try_from(page_index)
            .map_err(|_| rendering_error(format!("page index {page_index} exceeds u16")))?;
        let page = pages
            .get(index)
            .map_err(|_| rendering_error(format!("document has only {} pages", pages.len())))?;

        let (width_pt, height_pt) = (page.width().value, page.height().value);
        let (target_w, target_h) = compute_render_dimensions(width_pt, height_pt, dpi);
        if (width_pt * dpi as f32 / POINTS_PER_INCH) as u32 > target_w {
            warn!(page = page_index + 1, target_w, target_h, "Rendered page capped at {MAX_DIMENSION_PX}px");
        }

        let config = PdfRenderConfig::new()
            .set_target_width(target_w as i32)
            .set_maximum_height(target_h as i32);
        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| rendering_error(format!("render failed: {e}")))?;

        let mut cursor = Cursor::new(Vec::new());
        bitmap
            .as_image()
            .write_to(&mut cursor, ImageOutputFormat::Png)
            .map_err(|e| ExtractionError::ImageProcessing(format!("PNG encoding failed: {e}")))?;
        let png = cursor.into_inner();

        debug!(page = page_index + 1, dpi, width = target_w, height = target_h, bytes = png.len(), "Rendered PDF page");
        Ok(png)
    }
}

/// Renderer stand-in that returns a blank white PNG for every in-range page.
pub struct MockPdfPageRenderer {
    page_count: usize,
}

impl MockPdfPageRenderer {
    pub fn new(page_count: usize) -> Self {
        Self { page_count }
    }
}

impl PdfPageRenderer for MockPdfPageRenderer {
    fn page_count(&self, _pdf_bytes: &[u8]) -> Result<usize, ExtractionError> {
        Ok(self.page_count)
    }

    fn render_page(&self, _pdf_bytes: &[u8], page_index: usize, _dpi: u32) -> Result<Vec<u8>, ExtractionError> {
        if page_index >= self.page_count {
            return Err(ExtractionError::PdfRendering {
                page: page_index + 1,
                reason: format!("mock has {} pages", self.page_count),
            });
        }
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(GrayImage::from_pixel(32, 32, Luma([255])))
            .write_to(&mut cursor, ImageOutputFormat::Png)
            .map_err(|e| ExtractionError::ImageProcessing(e.to_string()))?;
        Ok(cursor.into_inner())
    }
}
