use super::types::OcrEngine;
use super::ExtractionError;

/// Tesseract page segmentation mode 6: a single uniform block of text.
#[cfg(feature = "ocr")]
const PAGE_SEG_MODE: &str = "6";

/// Tesseract-backed recognizer. Only available with the `ocr` feature.
#[cfg(feature = "ocr")]
pub struct TesseractOcr {
    tessdata_dir: Option<std::path::PathBuf>,
    lang: String,
}

#[cfg(feature = "ocr")]
impl TesseractOcr {
    /// `tessdata_dir = None` uses the system tessdata location.
    pub fn new(tessdata_dir: Option<&std::path::Path>) -> Result<Self, ExtractionError> {
        if let Some(dir) = tessdata_dir {
            if !dir.join("eng.traineddata").exists() {
                return Err(ExtractionError::OcrInit(format!(
                    "eng.traineddata not found in {}",
                    dir.display()
                )));
            }
        }
        Ok(Self {
            tessdata_dir: tessdata_dir.map(|d| d.to_path_buf()),
            lang: "eng".to_string(),
        })
    }

    pub fn with_language(mut self, lang: &str) -> Self {
        self.lang = lang.to_string();
        self
    }
}

#[cfg(feature = "ocr")]
impl OcrEngine for TesseractOcr {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, ExtractionError> {
        let datapath = match &self.tessdata_dir {
            Some(dir) => Some(
                dir.to_str()
                    .ok_or_else(|| ExtractionError::OcrInit("Invalid tessdata path".into()))?,
            ),
            None => None,
        };

        let tess = tesseract::Tesseract::new(datapath, Some(&self.lang))
            .map_err(|e| ExtractionError::OcrInit(format!("{e:?}")))?
            .set_variable("tessedit_pageseg_mode", PAGE_SEG_MODE)
            .map_err(|e| ExtractionError::OcrInit(format!("{e:?}")))?;

        let mut tess = tess
            .set_image_from_mem(image_bytes)
            .map_err(|e| ExtractionError::OcrProcessing(format!("{e:?}")))?;

        tess.get_text()
            .map_err(|e| ExtractionError::OcrProcessing(format!("{e:?}")))
    }

    fn name(&self) -> &'static str {
        "tesseract"
    }
}

/// Deterministic recognizer for tests and OCR-less deployments.
///
/// Returns the same text for every image, or always fails when built with
/// [`MockOcrEngine::failing`].
pub struct MockOcrEngine {
    text: String,
    failure: Option<String>,
}

impl MockOcrEngine {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            failure: None,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            text: String::new(),
            failure: Some(reason.to_string()),
        }
    }
}

impl OcrEngine for MockOcrEngine {
    fn recognize(&self, _image_bytes: &[u8]) -> Result<String, ExtractionError> {
        match &self.failure {
            Some(reason) => Err(ExtractionError::OcrProcessing(reason.clone())),
            None => Ok(self.text.clone()),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
