use chrono::{NaiveDate, Weekday};

use crate::domain::{Card, Problem, Score, Tagger};
use crate::rules::TabularRow;

/// A result line: two player or team names either side of a score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultLine {
    pub competition: Option<String>,
    pub date: Option<NaiveDate>,
    pub round: Option<u32>,
    pub board: Option<String>,
    pub home_player_white: Option<bool>,
    pub nameone: String,
    /// For `Found::ResultNames` both names are still joined in `nameone`.
    pub nametwo: Option<String>,
    pub score: Option<Score>,
    pub result_only: bool,
}

/// A scheduled fixture between two teams.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixtureLine {
    pub competition: Option<String>,
    pub date: Option<NaiveDate>,
    pub day: Option<Weekday>,
    pub round: Option<u32>,
    pub home: String,
    /// `None` when both team names were found as one joined fragment in `home`.
    pub away: Option<String>,
}

/// What a classified line means.
#[derive(Debug, Clone, PartialEq)]
pub enum Found {
    EventAndDates {
        name: Option<String>,
        start: NaiveDate,
        end: NaiveDate,
    },
    CompetitionAndDates {
        competition: String,
        dates: Vec<NaiveDate>,
    },
    Competition(String),
    CompetitionRound {
        competition: String,
        round: u32,
    },
    RoundHeader {
        round: u32,
        date: NaiveDate,
    },
    CompetitionDate {
        competition: String,
        date: NaiveDate,
    },
    CompetitionGameDate {
        competition: String,
        date: NaiveDate,
        day: Weekday,
    },
    CompetitionRoundGameDate {
        competition: String,
        round: u32,
        date: NaiveDate,
    },
    Fixture(FixtureLine),
    FixtureTeams(FixtureLine),
    Result(ResultLine),
    ResultNames(ResultLine),
    Unfinished(ResultLine),
    SwissPairingCard(Card),
    AllPlayAllCard(Card),
    DateOnly {
        date: NaiveDate,
        day: Option<Weekday>,
    },
    RoundOnly(u32),
    CsvTabular(TabularRow),
    PossibleEventName(String),
    Ignore,
    Error(Problem),
}

impl Found {
    pub fn label(&self) -> &'static str {
        match self {
            Found::EventAndDates { .. } => "event and dates",
            Found::CompetitionAndDates { .. } => "competition and dates",
            Found::Competition(_) => "competition",
            Found::CompetitionRound { .. } => "competition round",
            Found::RoundHeader { .. } => "round header",
            Found::CompetitionDate { .. } => "competition date",
            Found::CompetitionGameDate { .. } => "competition game date",
            Found::CompetitionRoundGameDate { .. } => "competition round game date",
            Found::Fixture(_) => "fixture",
            Found::FixtureTeams(_) => "fixture teams",
            Found::Result(_) => "result",
            Found::ResultNames(_) => "result names",
            Found::Unfinished(_) => "unfinished",
            Found::SwissPairingCard(_) => "swiss pairing card",
            Found::AllPlayAllCard(_) => "all-play-all card",
            Found::DateOnly { .. } => "date only",
            Found::RoundOnly(_) => "round only",
            Found::CsvTabular(_) => "csv tabular",
            Found::PossibleEventName(_) => "possible event name",
            Found::Ignore => "ignore",
            Found::Error(_) => "error",
        }
    }
}

/// A line together with what it was found to mean.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedLine {
    pub found: Found,
    pub text: String,
    pub tagger: Tagger,
    /// The line began with a played-on marker.
    pub played_on: bool,
}
