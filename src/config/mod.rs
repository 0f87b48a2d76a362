pub mod event_config;
pub mod settings;

pub use event_config::{EventConfig, FormatRuleConfig};
pub use settings::{AppConfig, CollationSettings, ParserSettings};
