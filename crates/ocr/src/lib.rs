pub mod extract;
pub mod pipeline;
pub mod preprocess;
pub mod recognizer;
pub mod types;

pub use extract::{detect_date_substring, parse_date, DateOrder, ExpiryExtractor};
pub use pipeline::{ExpiryPipeline, PipelineError};
pub use preprocess::{prepare_for_ocr_from_bytes, PreprocessError};
pub use recognizer::{MockRecognizer, OcrBackend, OcrError};
pub use types::{DateCandidate, ExtractionResult, RecognizedToken};

#[cfg(feature = "tesseract")]
pub use recognizer::tesseract_backend::TesseractRecognizer;
