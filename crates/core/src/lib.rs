pub mod alert;
pub mod config;
pub mod item;

pub use alert::{check_expiries, AlertId, ExpiryAlert, StoredAlert};
pub use config::{AlertConfig, AppConfig, ConfigError, ExtractorConfig, OcrConfig, DEFAULT_KEYWORDS};
pub use item::{Item, ItemId, ItemStatus, NewItem};
