use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::warn;

use super::types::{PdfExtractor, PdfPageText};
use super::ExtractionError;

/// Born-digital PDF text extraction via `pdf-extract`, with per-page image
/// detection through `lopdf`.
pub struct PdfTextExtractor;

impl PdfExtractor for PdfTextExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PdfPageText>, ExtractionError> {
        let page_texts = pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
            .map_err(|e| ExtractionError::PdfParsing(e.to_string()))?;

        let image_flags = match page_image_flags(pdf_bytes) {
            Ok(flags) => flags,
            Err(e) => {
                warn!(error = %e, "Could not inspect PDF page resources for images");
                Vec::new()
            }
        };

        Ok(page_texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| PdfPageText {
                page_number: i + 1,
                text,
                has_images: image_flags.get(i).copied().unwrap_or(false),
            })
            .collect())
    }
}

/// One flag per page, in page order: does the page reference an image XObject?
pub fn page_image_flags(pdf_bytes: &[u8]) -> Result<Vec<bool>, ExtractionError> {
    let doc = Document::load_mem(pdf_bytes)
        .map_err(|e| ExtractionError::PdfParsing(format!("Failed to load PDF: {e}")))?;

    Ok(doc
        .get_pages()
        .into_values()
        .map(|page_id| page_has_images(&doc, page_id))
        .collect())
}

fn page_has_images(doc: &Document, page_id: ObjectId) -> bool {
    let Some(page_dict) = doc.get_object(page_id).ok().and_then(|o| o.as_dict().ok()) else {
        return false;
    };
    let Some(resources) = resolve_dict_entry(doc, page_dict, b"Resources") else {
        return false;
    };
    let Some(xobjects) = resolve_dict_entry(doc, resources, b"XObject") else {
        return false;
    };

    xobjects.iter().any(|(_, obj)| match resolve_object(doc, obj) {
        Object::Stream(stream) => is_image_subtype(&stream.dict),
        _ => false,
    })
}

fn is_image_subtype(dict: &Dictionary) -> bool {
    dict.get(b"Subtype")
        .map(|obj| matches!(obj, Object::Name(ref n) if n == b"Image"))
        .unwrap_or(false)
}

fn resolve_object<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn resolve_dict_entry<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
    let obj = dict.get(key).ok()?;
    resolve_object(doc, obj).as_dict().ok()
}
