use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One text region as reported by the OCR engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecognizedToken {
    pub text: String,
    /// Engine confidence for this region (0.0–1.0).
    pub confidence: f32,
}

impl RecognizedToken {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self { text: text.into(), confidence: confidence.clamp(0.0, 1.0) }
    }
}

/// A date-shaped substring pulled from a token, with its ranking score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DateCandidate {
    pub raw: String,
    /// Token confidence plus the keyword bonus, when one applied.
    pub score: f32,
}

/// Output of a single extraction run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractionResult {
    /// `None` means the expiry date could not be determined.
    pub date: Option<NaiveDate>,
    /// All recognized text, one token per line, kept for auditing.
    pub raw_text: String,
}
