//! The line-oriented event configuration file.
//!
//! One `key value` pair per line; `#` starts a comment line. Unknown keys are
//! skipped. Each `results_prefix` line starts a new format rule set and the
//! pattern keys that follow it belong to that set.

use anyhow::Context;
use log::debug;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::errors::{self, ConfigError};
use crate::rules::csv_rows::{is_field, CsvMapping};
use crate::rules::substitutions::ValueMap;

pub const DEFAULT_KEEP_WORD_SPLITTERS: &str = "+=-,.'";
pub const DEFAULT_AUTHORIZATION_DELAY_DAYS: i64 = 5;

/// Pattern keys of a format rule set.
pub const RULE_KEYS: [&str; 19] = [
    "section_prefix",
    "section_body",
    "match_body",
    "teams_body",
    "games_body",
    "finished",
    "unfinished",
    "default",
    "match_default",
    "match_date_body",
    "played_on_body",
    "teams_played_on_body",
    "games_played_on_body",
    "finished_played_on",
    "unfinished_played_on",
    "match_date_played_on_body",
    "schedule_body",
    "fixture_body",
    "results_prefix",
];

/// Patterns of one format rule set, by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatRuleConfig {
    pub results_prefix: Option<String>,
    pub patterns: BTreeMap<String, String>,
}

impl FormatRuleConfig {
    pub fn pattern(&self, key: &str) -> Option<&str> {
        self.patterns.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventConfig {
    pub collected: Option<PathBuf>,
    pub extracted: Option<PathBuf>,
    pub textentry: Option<PathBuf>,
    pub content_types: BTreeMap<String, String>,
    pub rules: Vec<FormatRuleConfig>,
    /// Competition names recognised in free text.
    pub competitions: Vec<String>,
    pub competition_aliases: ValueMap,
    pub team_aliases: ValueMap,
    pub section_aliases: ValueMap,
    pub keep_word_splitters: String,
    pub drop_forwarded_markers: Option<String>,
    pub source: Option<String>,
    /// Days a report must have been received before it authorizes a
    /// match; `None` authorizes every match.
    pub authorization_delay: Option<i64>,
    pub csv: CsvMapping,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            collected: None,
            extracted: None,
            textentry: None,
            content_types: BTreeMap::new(),
            rules: Vec::new(),
            competitions: Vec::new(),
            competition_aliases: ValueMap::default(),
            team_aliases: ValueMap::default(),
            section_aliases: ValueMap::default(),
            keep_word_splitters: DEFAULT_KEEP_WORD_SPLITTERS.to_string(),
            drop_forwarded_markers: None,
            source: None,
            authorization_delay: Some(DEFAULT_AUTHORIZATION_DELAY_DAYS),
            csv: CsvMapping::default(),
        }
    }
}

fn mapping<'a>(line: usize, key: &str, value: &'a str) -> Result<(&'a str, &'a str), ConfigError> {
    value
        .split_once('=')
        .map(|(old, new)| (old.trim(), new.trim()))
        .ok_or_else(|| ConfigError::BadMapping {
            line,
            key: key.to_string(),
            value: value.to_string(),
        })
}

fn field_mapping<'a>(
    line: usize,
    key: &str,
    value: &'a str,
) -> Result<(&'a str, &'a str, &'a str), ConfigError> {
    let (field, rest) = value.split_once(char::is_whitespace).unwrap_or((value, ""));
    if !is_field(field) {
        return Err(ConfigError::UnknownField {
            line,
            key: key.to_string(),
            field: field.to_string(),
        });
    }
    let (old, new) = mapping(line, key, rest.trim())?;
    Ok((field, old, new))
}

impl EventConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = errors::read_to_string(path)?;
        Self::parse(&text).with_context(|| errors::parse_context("event configuration", path))
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let (key, value) = trimmed
                .split_once(char::is_whitespace)
                .map(|(k, v)| (k, v.trim()))
                .unwrap_or((trimmed, ""));
            config.apply(line, key, value)?;
        }
        Ok(config)
    }

    fn current_rule(&mut self) -> &mut FormatRuleConfig {
        if self.rules.is_empty() {
            self.rules.push(FormatRuleConfig::default());
        }
        let last = self.rules.len() - 1;
        &mut self.rules[last]
    }

    fn apply(&mut self, line: usize, key: &str, value: &str) -> Result<(), ConfigError> {
        let needs_value = !matches!(key, "drop_forwarded_markers" | "authorization_delay");
        if value.is_empty() && needs_value {
            return Err(ConfigError::MissingValue {
                line,
                key: key.to_string(),
            });
        }

        match key {
            "collected" => self.collected = Some(PathBuf::from(value)),
            "extracted" => self.extracted = Some(PathBuf::from(value)),
            "textentry" => self.textentry = Some(PathBuf::from(value)),
            "text_content_type" | "pdf_content_type" | "csv_content_type" => {
                self.content_types.insert(key.to_string(), value.to_string());
            }
            "results_prefix" => self.rules.push(FormatRuleConfig {
                results_prefix: Some(value.to_string()),
                patterns: BTreeMap::new(),
            }),
            key if RULE_KEYS.contains(&key) => {
                self.current_rule()
                    .patterns
                    .insert(key.to_string(), value.to_string());
            }
            "competition" => match value.split_once('=') {
                Some((old, new)) => {
                    self.competition_aliases.insert(old, new);
                    self.competitions.push(old.trim().to_string());
                    self.competitions.push(new.trim().to_string());
                }
                None => self.competitions.push(value.to_string()),
            },
            "team_name" => {
                let (old, new) = mapping(line, key, value)?;
                self.team_aliases.insert(old, new);
            }
            "section_name" => {
                let (old, new) = mapping(line, key, value)?;
                self.section_aliases.insert(old, new);
            }
            "keep_word_splitters" => self.keep_word_splitters = value.to_string(),
            "drop_forwarded_markers" => {
                self.drop_forwarded_markers = (!value.is_empty()).then(|| value.to_string())
            }
            "source" => self.source = Some(value.to_string()),
            "authorization_delay" => {
                self.authorization_delay = match value.to_lowercase().as_str() {
                    "none" | "null" => None,
                    number => Some(
                        number
                            .parse()
                            .unwrap_or(DEFAULT_AUTHORIZATION_DELAY_DAYS),
                    ),
                }
            }
            "text_from_rows" => {
                self.csv.text_from_rows.insert(value.to_string());
            }
            "replace" => {
                let (field, old, new) = field_mapping(line, key, value)?;
                self.csv.substitutions.add_replace(field, old, new);
            }
            "partial_replace" => {
                let (field, old, new) = field_mapping(line, key, value)?;
                self.csv.substitutions.add_partial_replace(field, old, new);
            }
            key if key.starts_with("sched_") || key.starts_with("report_") => {
                let (target, field) = match key.split_once('_') {
                    Some(("sched", field)) => (&mut self.csv.schedule, field),
                    Some((_, field)) => (&mut self.csv.report, field),
                    None => return Ok(()),
                };
                if !is_field(field) {
                    return Err(ConfigError::UnknownField {
                        line,
                        key: key.to_string(),
                        field: field.to_string(),
                    });
                }
                target.insert(field.to_string(), value.to_string());
            }
            other => debug!("Ignoring unknown event configuration key {}", other),
        }
        Ok(())
    }
}
