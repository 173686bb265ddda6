use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Upper bound for every day-count setting, roughly a century.
const MAX_CONFIG_DAYS: i64 = 36_500;

/// Words that mark a label line as describing a date printed on the pack.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "exp",
    "expiry",
    "expires",
    "best",
    "before",
    "use",
    "bb",
    "mfg",
    "manufacture",
];

/// Tuning for candidate ranking and the plausibility filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Added to a candidate's OCR confidence when its token contains a keyword.
    pub keyword_bonus: f32,
    /// Dates further than this many days in the past are treated as manufacture dates.
    pub past_tolerance_days: i64,
    pub keywords: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        ExtractorConfig {
            keyword_bonus: 0.1,
            past_tolerance_days: 7,
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Threshold the contrast-stretched grayscale to black and white before OCR.
    pub binarize: bool,
    pub binarize_threshold: u8,
    pub language: String,
    pub data_path: Option<String>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        OcrConfig {
            binarize: true,
            binarize_threshold: 150,
            language: "eng".to_string(),
            data_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub alert_days: i64,
    /// Window used for the "soon" status shown in listings.
    pub soon_days: i64,
    pub poll_interval_secs: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        AlertConfig {
            alert_days: 3,
            soon_days: 3,
            poll_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub extractor: ExtractorConfig,
    pub ocr: OcrConfig,
    pub alerts: AlertConfig,
}

impl AppConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(AppConfig::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let bonus = self.extractor.keyword_bonus;
        if !bonus.is_finite() || bonus < 0.0 {
            return Err(ConfigError::Invalid {
                key: "extractor.keyword_bonus",
                reason: format!("must be a non-negative number, got {bonus}"),
            });
        }
        check_days("extractor.past_tolerance_days", self.extractor.past_tolerance_days)?;
        check_days("alerts.alert_days", self.alerts.alert_days)?;
        check_days("alerts.soon_days", self.alerts.soon_days)?;
        if self.alerts.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "alerts.poll_interval_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

fn check_days(key: &'static str, value: i64) -> Result<(), ConfigError> {
    if (0..=MAX_CONFIG_DAYS).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            key,
            reason: format!("must be between 0 and {MAX_CONFIG_DAYS} days, got {value}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let c = AppConfig::from_toml_str("").unwrap();
        assert_eq!(c, AppConfig::default());
        assert_eq!(c.extractor.keyword_bonus, 0.1);
        assert_eq!(c.extractor.past_tolerance_days, 7);
        assert_eq!(c.extractor.keywords.len(), DEFAULT_KEYWORDS.len());
        assert_eq!(c.alerts.poll_interval_secs, 60);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let c = AppConfig::from_toml_str("[extractor]\npast_tolerance_days = 14\n").unwrap();
        assert_eq!(c.extractor.past_tolerance_days, 14);
        assert_eq!(c.extractor.keyword_bonus, 0.1);
        assert_eq!(c.ocr.language, "eng");
    }

    #[test]
    fn rejects_negative_bonus() {
        let err = AppConfig::from_toml_str("[extractor]\nkeyword_bonus = -0.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "extractor.keyword_bonus", .. }));
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let err = AppConfig::from_toml_str("[alerts]\npoll_interval_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn rejects_out_of_range_day_counts() {
        let cases = [
            ("[extractor]\npast_tolerance_days = 100000000000\n", "extractor.past_tolerance_days"),
            ("[extractor]\npast_tolerance_days = -3\n", "extractor.past_tolerance_days"),
            ("[alerts]\nsoon_days = 40000\n", "alerts.soon_days"),
            ("[alerts]\nsoon_days = -1\n", "alerts.soon_days"),
            ("[alerts]\nalert_days = -7\n", "alerts.alert_days"),
        ];
        for (text, expected) in cases {
            match AppConfig::from_toml_str(text) {
                Err(ConfigError::Invalid { key, .. }) => assert_eq!(key, expected, "toml: {text:?}"),
                other => panic!("expected {expected} to be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn accepts_day_count_bounds() {
        let text = format!("[extractor]\npast_tolerance_days = 0\n[alerts]\nsoon_days = {MAX_CONFIG_DAYS}\n");
        let c = AppConfig::from_toml_str(&text).unwrap();
        assert_eq!(c.extractor.past_tolerance_days, 0);
        assert_eq!(c.alerts.soon_days, MAX_CONFIG_DAYS);
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        assert!(matches!(
            AppConfig::from_toml_str("[extractor"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let c = AppConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(c, AppConfig::default());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[alerts]\nalert_days = 5\n").unwrap();
        assert_eq!(AppConfig::load(&path).unwrap().alerts.alert_days, 5);
    }
}
