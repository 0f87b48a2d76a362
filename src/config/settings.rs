use super::event_config::{DEFAULT_AUTHORIZATION_DELAY_DAYS, DEFAULT_KEEP_WORD_SPLITTERS};

pub struct ParserSettings {
    /// Joined names longer than this are offered for truncation.
    pub max_joined_words: usize,
    /// Word count a joined name is cut to when truncation is accepted.
    pub truncated_words: usize,
    pub keep_word_splitters: &'static str,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            max_joined_words: 50,
            truncated_words: 20,
            keep_word_splitters: DEFAULT_KEEP_WORD_SPLITTERS,
        }
    }
}

pub struct CollationSettings {
    pub authorization_delay_days: Option<i64>,
    /// Database used by `update` unless DATABASE_PATH is set.
    pub database_path: &'static str,
}

impl Default for CollationSettings {
    fn default() -> Self {
        Self {
            authorization_delay_days: Some(DEFAULT_AUTHORIZATION_DELAY_DAYS),
            database_path: "chess_results.db",
        }
    }
}

pub struct AppConfig {
    pub parser: ParserSettings,
    pub collation: CollationSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            parser: ParserSettings::default(),
            collation: CollationSettings::default(),
        }
    }

    /// Database path from DATABASE_PATH, else the default.
    pub fn database_path(&self) -> String {
        std::env::var("DATABASE_PATH").unwrap_or_else(|_| self.collation.database_path.to_string())
    }
}
