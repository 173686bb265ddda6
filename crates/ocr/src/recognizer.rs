use thiserror::Error;

use crate::types::RecognizedToken;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("Tesseract not available — build with `tesseract` feature")]
    NotAvailable,
}

/// Abstraction over an OCR backend.
///
/// Implementations accept raw PNG/JPEG image bytes and return one token per
/// detected text region. Engines are built once at startup and shared, so
/// `recognize` takes `&self` and must tolerate concurrent callers.
pub trait OcrBackend: Send + Sync {
    fn recognize(&self, image_bytes: &[u8]) -> Result<Vec<RecognizedToken>, OcrError>;
}

impl<T: OcrBackend + ?Sized> OcrBackend for std::sync::Arc<T> {
    fn recognize(&self, image_bytes: &[u8]) -> Result<Vec<RecognizedToken>, OcrError> {
        (**self).recognize(image_bytes)
    }
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns preset tokens regardless of the image.
pub struct MockRecognizer {
    pub tokens: Vec<RecognizedToken>,
}

impl MockRecognizer {
    pub fn new(tokens: Vec<RecognizedToken>) -> Self {
        Self { tokens }
    }

    /// One token per line of `text`, all at the same confidence.
    pub fn from_lines(text: &str, confidence: f32) -> Self {
        Self::new(
            text.lines()
                .map(|l| RecognizedToken::new(l, confidence))
                .collect(),
        )
    }
}

impl OcrBackend for MockRecognizer {
    fn recognize(&self, _image_bytes: &[u8]) -> Result<Vec<RecognizedToken>, OcrError> {
        Ok(self.tokens.clone())
    }
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrBackend, OcrError};
    use crate::types::RecognizedToken;
    use leptess::LepTess;

    pub struct TesseractRecognizer {
        data_path: Option<String>,
        lang: String,
    }

    impl TesseractRecognizer {
        pub fn new(data_path: Option<String>, lang: &str) -> Self {
            Self { data_path, lang: lang.to_string() }
        }
    }

    impl OcrBackend for TesseractRecognizer {
        /// Tesseract reports a single page-level confidence, so every line
        /// token shares it.
        fn recognize(&self, image_bytes: &[u8]) -> Result<Vec<RecognizedToken>, OcrError> {
            // LepTess needs `&mut`; one handle per call.
            let mut lt = LepTess::new(self.data_path.as_deref(), &self.lang)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.set_image_from_mem(image_bytes)
                .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
            let text = lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))?;
            let confidence = lt.mean_text_conf() as f32 / 100.0;

            Ok(text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(|l| RecognizedToken::new(l, confidence))
                .collect())
        }
    }
}
