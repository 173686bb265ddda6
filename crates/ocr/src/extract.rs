use std::cmp::Ordering;
use std::sync::OnceLock;

use chrono::{Datelike, Duration, NaiveDate};
use freshtrack_core::ExtractorConfig;
use regex::Regex;
use tracing::{debug, trace};

use crate::types::{DateCandidate, ExtractionResult, RecognizedToken};

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

// D/M/Y or M/D/Y with 2–4 digit year, or Y/M/D. Separators may be `/` or `-`.
re!(re_date_shape,
    r"\b((?:\d{1,2}[/-]\d{1,2}[/-]\d{2,4})|(?:\d{4}[/-]\d{1,2}[/-]\d{1,2}))\b");
re!(re_year_first,
    r"^(\d{4})[/-](\d{1,2})[/-](\d{1,2})$");
re!(re_year_last,
    r"^(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})$");

/// How the two leading fields of a `A/B/YEAR` date are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrder {
    DayFirst,
    MonthFirst,
}

/// Tried in this order: printed labels are overwhelmingly day-first.
const INTERPRETATIONS: [DateOrder; 2] = [DateOrder::DayFirst, DateOrder::MonthFirst];

// ── Public extraction API ─────────────────────────────────────────────────────

/// Picks the expiry date out of OCR tokens.
///
/// Detection, ranking and parsing all run once per call; nothing is kept
/// between calls, so the same tokens and reference date always give the same
/// result.
#[derive(Debug, Clone, Default)]
pub struct ExpiryExtractor {
    config: ExtractorConfig,
}

impl ExpiryExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        let keywords = config.keywords.iter().map(|k| k.to_lowercase()).collect();
        Self { config: ExtractorConfig { keywords, ..config } }
    }

    /// Best plausible expiry date relative to `today`, plus the joined raw text.
    pub fn extract(&self, tokens: &[RecognizedToken], today: NaiveDate) -> ExtractionResult {
        let raw_text = tokens
            .iter()
            .map(|t| t.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        let candidates = self.rank_candidates(tokens);
        let date = self.select(&candidates, today);
        if date.is_none() {
            debug!(candidates = candidates.len(), "no plausible expiry date found");
        }

        ExtractionResult { date, raw_text }
    }

    /// Date-shaped substrings, highest score first. Ties keep token order.
    pub fn rank_candidates(&self, tokens: &[RecognizedToken]) -> Vec<DateCandidate> {
        let mut candidates: Vec<DateCandidate> = tokens
            .iter()
            .filter_map(|token| {
                let text = token.text.trim();
                let raw = detect_date_substring(text)?;
                let mut score = token.confidence;
                if self.has_keyword(text) {
                    score += self.config.keyword_bonus;
                }
                Some(DateCandidate { raw: raw.to_string(), score })
            })
            .collect();

        // `sort_by` is stable.
        candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        candidates
    }

    fn has_keyword(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.config.keywords.iter().any(|k| lower.contains(k.as_str()))
    }

    fn select(&self, candidates: &[DateCandidate], today: NaiveDate) -> Option<NaiveDate> {
        // Negative tolerances are treated as zero; an overflowing one means no lower bound.
        let earliest = Duration::try_days(self.config.past_tolerance_days.max(0))
            .and_then(|d| today.checked_sub_signed(d))
            .unwrap_or(NaiveDate::MIN);

        for candidate in candidates {
            let mut tried: Option<NaiveDate> = None;
            for order in INTERPRETATIONS {
                let Some(date) = parse_date(&candidate.raw, order, today) else {
                    trace!(raw = %candidate.raw, ?order, "unparsable");
                    continue;
                };
                // Year-first dates read the same either way.
                if tried == Some(date) {
                    continue;
                }
                tried = Some(date);

                if date < earliest {
                    debug!(raw = %candidate.raw, %date, "rejected as too far in the past");
                    continue;
                }
                debug!(raw = %candidate.raw, %date, score = candidate.score, "accepted expiry date");
                return Some(date);
            }
        }
        None
    }
}

// ── Detection & parsing helpers ───────────────────────────────────────────────

/// First date-shaped substring in `text`, if any.
pub fn detect_date_substring(text: &str) -> Option<&str> {
    re_date_shape().find(text).map(|m| m.as_str())
}

/// Parse a detected substring under one interpretation. Year-first strings
/// are always Y-M-D. Two-digit years are resolved against `today`.
pub fn parse_date(raw: &str, order: DateOrder, today: NaiveDate) -> Option<NaiveDate> {
    if let Some(c) = re_year_first().captures(raw) {
        let y: i32 = c.get(1)?.as_str().parse().ok()?;
        let m: u32 = c.get(2)?.as_str().parse().ok()?;
        let d: u32 = c.get(3)?.as_str().parse().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }

    let c = re_year_last().captures(raw)?;
    let p1: u32 = c.get(1)?.as_str().parse().ok()?;
    let p2: u32 = c.get(2)?.as_str().parse().ok()?;
    let year = expand_year(c.get(3)?.as_str(), today.year())?;
    let (day, month) = match order {
        DateOrder::DayFirst => (p1, p2),
        DateOrder::MonthFirst => (p2, p1),
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Four-digit years are taken verbatim. A two-digit year lands within 49
/// years of `current_year`, so in 2026 `60` is 2060 and `99` is 1999.
/// Three-digit years are not dates.
fn expand_year(s: &str, current_year: i32) -> Option<i32> {
    let y: i32 = s.parse().ok()?;
    match s.len() {
        2 => {
            let year = current_year - current_year.rem_euclid(100) + y;
            if year - current_year >= 50 {
                Some(year - 100)
            } else if current_year - year >= 50 {
                Some(year + 100)
            } else {
                Some(year)
            }
        }
        4 => Some(y),
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
