pub mod parser;

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{Diagnostic, EventIdentity, Fixture, SectionType, Team};

pub use parser::parse_schedule;

/// A player listed in a swiss or all-play-all section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedPlayer {
    pub name: String,
    pub codes: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleSection {
    pub name: String,
    pub section_type: SectionType,
    pub rapidplay: bool,
    pub round_dates: BTreeMap<u32, NaiveDate>,
    pub players: BTreeMap<u32, ListedPlayer>,
    pub teams: Vec<Team>,
    pub fixtures: Vec<Fixture>,
    pub entrants: Vec<String>,
}

impl ScheduleSection {
    pub fn new(name: &str, section_type: SectionType) -> Self {
        Self {
            name: name.to_string(),
            section_type,
            rapidplay: false,
            round_dates: BTreeMap::new(),
            players: BTreeMap::new(),
            teams: Vec::new(),
            fixtures: Vec::new(),
            entrants: Vec::new(),
        }
    }
}

/// The event's schedule: sections with their teams, fixtures, round dates
/// and listed players.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schedule {
    pub event_name: Option<String>,
    pub dates: Option<(NaiveDate, NaiveDate)>,
    pub sections: Vec<ScheduleSection>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Schedule {
    pub fn identity(&self) -> Option<EventIdentity> {
        let (start_date, end_date) = self.dates?;
        Some(EventIdentity {
            name: self.event_name.clone()?,
            start_date,
            end_date,
        })
    }

    pub fn section(&self, name: &str) -> Option<&ScheduleSection> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Every fixture of every section, in date order.
    pub fn fixtures(&self) -> Vec<&Fixture> {
        let mut fixtures: Vec<&Fixture> = self.sections.iter().flat_map(|s| &s.fixtures).collect();
        fixtures.sort_by(|a, b| a.date.cmp(&b.date).then(a.tagger.line.cmp(&b.tagger.line)));
        fixtures
    }

    /// Club of a team as listed in its division.
    pub fn club_of_team(&self, team: &str) -> Option<&str> {
        self.sections
            .iter()
            .flat_map(|s| &s.teams)
            .find(|t| t.name == team)
            .and_then(|t| t.club.as_deref())
    }
}
