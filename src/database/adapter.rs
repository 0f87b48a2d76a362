//! The narrow boundary between collation and a results store.

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::EventIdentity;

/// Kinds of record a store keeps, one table or file each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordFile {
    Event,
    Player,
    Game,
    Alias,
}

impl RecordFile {
    pub fn table(&self) -> &'static str {
        match self {
            RecordFile::Event => "events",
            RecordFile::Player => "players",
            RecordFile::Game => "games",
            RecordFile::Alias => "aliases",
        }
    }

    /// Columns a cursor can be opened on.
    pub fn indexed_fields(&self) -> &'static [&'static str] {
        match self {
            RecordFile::Event => &["name_key", "start_date"],
            RecordFile::Player => &["name_key", "club", "section"],
            RecordFile::Game => &["competition", "date", "source"],
            RecordFile::Alias => &["alias_key", "kind"],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl From<&EventIdentity> for EventRecord {
    fn from(identity: &EventIdentity) -> Self {
        Self {
            name: identity.name.clone(),
            start_date: identity.start_date,
            end_date: identity.end_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub event_id: i64,
    pub name: String,
    pub club: Option<String>,
    pub section: Option<String>,
    pub pin: Option<u32>,
    pub affiliation: Option<String>,
    /// Reported codes, space separated.
    pub codes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub event_id: i64,
    pub section: String,
    pub competition: Option<String>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub board: Option<String>,
    pub round: Option<u32>,
    pub date: Option<NaiveDate>,
    pub home_player_id: Option<i64>,
    pub away_player_id: Option<i64>,
    pub result: String,
    pub home_player_white: Option<bool>,
    pub grading_only: bool,
    pub source: Option<String>,
}

/// A name the event knows something else by, such as a team's club.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRecord {
    pub event_id: i64,
    pub kind: String,
    pub alias: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Record {
    Event(EventRecord),
    Player(PlayerRecord),
    Game(GameRecord),
    Alias(AliasRecord),
}

impl Record {
    pub fn file(&self) -> RecordFile {
        match self {
            Record::Event(_) => RecordFile::Event,
            Record::Player(_) => RecordFile::Player,
            Record::Game(_) => RecordFile::Game,
            Record::Alias(_) => RecordFile::Alias,
        }
    }
}

/// Record numbers of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordList {
    pub file: RecordFile,
    pub ids: Vec<i64>,
}

impl RecordList {
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

/// How names become keys in the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EncodingPolicy {
    /// UTF-8, case folded, whitespace collapsed.
    #[default]
    Utf8,
}

impl EncodingPolicy {
    pub fn key(&self, text: &str) -> String {
        match self {
            EncodingPolicy::Utf8 => text
                .split_whitespace()
                .map(str::to_lowercase)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// Everything the update path needs from a results store.
///
/// Writes between `start_transaction` and `commit` either all happen or,
/// after `backout`, none do.
pub trait ResultsStore {
    fn start_transaction(&mut self) -> Result<()>;
    fn commit(&mut self) -> Result<()>;
    fn backout(&mut self) -> Result<()>;

    fn recordlist_nil(&self, file: RecordFile) -> RecordList {
        RecordList { file, ids: Vec::new() }
    }

    fn get_primary_record(&mut self, file: RecordFile, id: i64) -> Result<Option<Record>>;
    fn get_events_matching_event_identity(&mut self, identity: &EventIdentity) -> Result<RecordList>;
    fn get_aliases_for_event(&mut self, event_id: i64) -> Result<RecordList>;
    fn get_games_for_event(&mut self, event_id: i64) -> Result<RecordList>;

    /// `(key, record number)` pairs of `file` in `field` order.
    fn database_cursor(&mut self, file: RecordFile, field: &str) -> Result<Vec<(String, i64)>>;

    fn put_record(&mut self, record: &Record) -> Result<i64>;
    fn edit_record(&mut self, id: i64, record: &Record) -> Result<()>;
    fn delete_record(&mut self, file: RecordFile, id: i64) -> Result<()>;

    fn encoding(&self) -> EncodingPolicy;

    /// Record number as stored in selector keys; sorts numerically.
    fn encode_record_number(&self, id: i64) -> String {
        format!("{:010}", id)
    }

    fn encode_record_selector(&self, text: &str) -> String {
        self.encoding().key(text)
    }
}
