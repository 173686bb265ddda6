use std::path::Path;

use chrono::NaiveDate;
use freshtrack_core::{ExtractorConfig, OcrConfig};
use thiserror::Error;
use tracing::info;

use crate::extract::ExpiryExtractor;
use crate::preprocess;
use crate::recognizer::{OcrBackend, OcrError};
use crate::types::ExtractionResult;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image preprocessing failed: {0}")]
    Preprocess(#[from] crate::preprocess::PreprocessError),
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
}

/// Orchestrates: read → preprocess → OCR → extract.
///
/// The recognizer is injected by the caller and reused for every image.
pub struct ExpiryPipeline<R: OcrBackend> {
    recognizer: R,
    extractor: ExpiryExtractor,
    ocr_config: OcrConfig,
}

impl<R: OcrBackend> ExpiryPipeline<R> {
    pub fn new(recognizer: R) -> Self {
        Self::with_config(recognizer, ExtractorConfig::default(), OcrConfig::default())
    }

    pub fn with_config(recognizer: R, extractor: ExtractorConfig, ocr_config: OcrConfig) -> Self {
        Self {
            recognizer,
            extractor: ExpiryExtractor::new(extractor),
            ocr_config,
        }
    }

    /// Read the label photo at `path` and extract its expiry date.
    pub async fn extract_expiry_date(&self, path: &Path) -> Result<ExtractionResult, PipelineError> {
        info!("Scanning label: {}", path.display());
        let bytes = tokio::fs::read(path).await?;
        self.process_bytes(&bytes)
    }

    /// Process raw image bytes, judging plausibility against the local date.
    pub fn process_bytes(&self, data: &[u8]) -> Result<ExtractionResult, PipelineError> {
        self.process_bytes_at(data, chrono::Local::now().date_naive())
    }

    pub fn process_bytes_at(
        &self,
        data: &[u8],
        today: NaiveDate,
    ) -> Result<ExtractionResult, PipelineError> {
        let image_bytes = preprocess::prepare_for_ocr_from_bytes(data, &self.ocr_config)?;
        let tokens = self.recognizer.recognize(&image_bytes)?;
        info!(tokens = tokens.len(), "OCR complete");
        Ok(self.extractor.extract(&tokens, today))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::MockRecognizer;
    use crate::types::RecognizedToken;
    use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn tiny_png() -> Vec<u8> {
        let img: GrayImage = ImageBuffer::from_fn(4, 4, |_, _| Luma([200u8]));
        let mut buf = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct BrokenEngine;

    impl OcrBackend for BrokenEngine {
        fn recognize(&self, _image_bytes: &[u8]) -> Result<Vec<RecognizedToken>, OcrError> {
            Err(OcrError::Engine("segfault in model".into()))
        }
    }

    struct CountingEngine {
        calls: AtomicUsize,
    }

    impl OcrBackend for CountingEngine {
        fn recognize(&self, _image_bytes: &[u8]) -> Result<Vec<RecognizedToken>, OcrError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![RecognizedToken::new("EXP 12/09/2025", 0.9)])
        }
    }

    #[test]
    fn process_bytes_extracts_date() {
        let pipeline = ExpiryPipeline::new(MockRecognizer::from_lines(
            "WHOLE MILK\nMFG 01/08/2025\nEXP 12/09/2025",
            0.9,
        ));
        let r = pipeline.process_bytes_at(&tiny_png(), date(2025, 9, 1)).unwrap();
        assert_eq!(r.date, Some(date(2025, 9, 12)));
        assert_eq!(r.raw_text, "WHOLE MILK\nMFG 01/08/2025\nEXP 12/09/2025");
    }

    #[test]
    fn process_bytes_without_date_is_not_an_error() {
        let pipeline = ExpiryPipeline::new(MockRecognizer::from_lines("KEEP REFRIGERATED", 0.9));
        let r = pipeline.process_bytes_at(&tiny_png(), date(2025, 9, 1)).unwrap();
        assert_eq!(r.date, None);
        assert_eq!(r.raw_text, "KEEP REFRIGERATED");
    }

    #[test]
    fn engine_failure_propagates() {
        let pipeline = ExpiryPipeline::new(BrokenEngine);
        let err = pipeline.process_bytes_at(&tiny_png(), date(2025, 9, 1)).unwrap_err();
        assert!(matches!(err, PipelineError::Ocr(OcrError::Engine(_))));
    }

    #[test]
    fn unreadable_image_propagates() {
        let pipeline = ExpiryPipeline::new(MockRecognizer::new(vec![]));
        let err = pipeline.process_bytes_at(b"definitely not a png", date(2025, 9, 1)).unwrap_err();
        assert!(matches!(err, PipelineError::Preprocess(_)));
    }

    #[test]
    fn shared_engine_is_reused_across_pipelines() {
        let engine = Arc::new(CountingEngine { calls: AtomicUsize::new(0) });
        let a = ExpiryPipeline::new(Arc::clone(&engine));
        let b = ExpiryPipeline::new(Arc::clone(&engine));
        let today = date(2025, 9, 1);

        let ra = a.process_bytes_at(&tiny_png(), today).unwrap();
        let rb = b.process_bytes_at(&tiny_png(), today).unwrap();

        assert_eq!(ra, rb);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn extract_expiry_date_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("label.png");
        std::fs::write(&path, tiny_png()).unwrap();

        let pipeline = ExpiryPipeline::new(MockRecognizer::from_lines("BB 2099-01-31", 0.7));
        let r = pipeline.extract_expiry_date(&path).await.unwrap();
        assert_eq!(r.date, Some(date(2099, 1, 31)));
    }

    #[tokio::test]
    async fn extract_expiry_date_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = ExpiryPipeline::new(MockRecognizer::new(vec![]));
        let err = pipeline
            .extract_expiry_date(&dir.path().join("missing.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));
    }
}
