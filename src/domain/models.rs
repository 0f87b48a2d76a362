use chrono::{NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::game::Game;
use super::points::Points;
use super::score::Score;
use super::tagger::Tagger;

/// Name and dates identifying an event. Dates print as ISO `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventIdentity {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl EventIdentity {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

impl fmt::Display for EventIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.start_date, self.end_date)
    }
}

/// Competition format of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SectionType {
    League,
    FixtureList,
    Swiss,
    AllPlayAll,
    Individual,
}

impl SectionType {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word.to_lowercase().as_str() {
            "league" => Some(SectionType::League),
            "fixturelist" => Some(SectionType::FixtureList),
            "swiss" => Some(SectionType::Swiss),
            "allplayall" => Some(SectionType::AllPlayAll),
            "individual" => Some(SectionType::Individual),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            SectionType::League => "league",
            SectionType::FixtureList => "fixturelist",
            SectionType::Swiss => "swiss",
            SectionType::AllPlayAll => "allplayall",
            SectionType::Individual => "individual",
        }
    }

    pub fn has_matches(&self) -> bool {
        matches!(self, SectionType::League | SectionType::FixtureList)
    }

    pub fn has_cards(&self) -> bool {
        matches!(self, SectionType::Swiss | SectionType::AllPlayAll)
    }
}

/// A team entered in a league division.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    pub club: Option<String>,
}

/// A scheduled match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub competition: String,
    pub home_team: String,
    pub away_team: String,
    pub date: NaiveDate,
    pub day: Option<Weekday>,
    pub round: Option<u32>,
    pub tagger: Tagger,
}

impl Fixture {
    pub fn key(&self) -> FixtureKey {
        FixtureKey {
            competition: self.competition.clone(),
            home_team: self.home_team.clone(),
            away_team: self.away_team.clone(),
            date: self.date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FixtureKey {
    pub competition: String,
    pub home_team: String,
    pub away_team: String,
    pub date: NaiveDate,
}

impl fmt::Display for FixtureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} v {}",
            self.competition, self.date, self.home_team, self.away_team
        )
    }
}

/// Identity of one report of a match: duplicates differ by source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchKey {
    pub competition: String,
    pub home_team: String,
    pub away_team: String,
    pub source: String,
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} v {} ({})",
            self.competition, self.home_team, self.away_team, self.source
        )
    }
}

/// One reported result of a team match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub competition: String,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Option<Points>,
    pub away_score: Option<Points>,
    pub date: Option<NaiveDate>,
    pub round: Option<u32>,
    pub source: String,
    pub order: usize,
    pub default: bool,
    pub played_on: bool,
    /// Latest of the send and delivery dates of the report's source.
    pub received: Option<NaiveDateTime>,
    pub games: Vec<Game>,
    pub tagger: Tagger,
}

impl MatchReport {
    pub fn key(&self) -> MatchKey {
        MatchKey {
            competition: self.competition.clone(),
            home_team: self.home_team.clone(),
            away_team: self.away_team.clone(),
            source: self.source.clone(),
        }
    }

    /// Sum of points from games that count towards the match score, and the
    /// home-minus-away difference.
    pub fn game_totals(&self) -> (Points, Points) {
        let mut home = Points::ZERO;
        let mut away = Points::ZERO;
        for game in &self.games {
            if let Some((h, a)) = game.result.and_then(|r| r.match_points()) {
                home += h;
                away += a;
            }
        }
        (home + away, home - away)
    }

    /// Whether the reported match score agrees with the games.
    pub fn is_score_consistent(&self) -> bool {
        let has_unfinished = self.games.iter().any(|g| g.is_unfinished());
        if self.default {
            return !has_unfinished;
        }
        let (Some(home), Some(away)) = (self.home_score, self.away_score) else {
            return false;
        };
        let (points, difference) = self.game_totals();
        points == home + away && difference == home - away
    }

    pub fn header_score(&self) -> Score {
        match (self.default, self.home_score, self.away_score) {
            (true, _, _) => Score::MatchDefaulted,
            (false, Some(home), Some(away)) => Score::Match(home, away),
            _ => Score::BadScore,
        }
    }
}

/// Colour of a card cell from the card owner's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellColour {
    White,
    Black,
    Unknown,
}

impl CellColour {
    pub fn opposite(&self) -> CellColour {
        match self {
            CellColour::White => CellColour::Black,
            CellColour::Black => CellColour::White,
            CellColour::Unknown => CellColour::Unknown,
        }
    }

    pub fn as_white(&self) -> Option<bool> {
        match self {
            CellColour::White => Some(true),
            CellColour::Black => Some(false),
            CellColour::Unknown => None,
        }
    }
}

/// Score of a card cell from the card owner's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellScore {
    Win,
    Draw,
    Loss,
    DefaultWin,
    DefaultLoss,
    DrawDefault,
    NotPlayed,
}

impl CellScore {
    pub fn opposite(&self) -> CellScore {
        match self {
            CellScore::Win => CellScore::Loss,
            CellScore::Loss => CellScore::Win,
            CellScore::Draw => CellScore::Draw,
            CellScore::DefaultWin => CellScore::DefaultLoss,
            CellScore::DefaultLoss => CellScore::DefaultWin,
            CellScore::DrawDefault => CellScore::DrawDefault,
            CellScore::NotPlayed => CellScore::NotPlayed,
        }
    }

    /// Result of the game with the card owner as home player.
    pub fn as_home_score(&self) -> Option<Score> {
        match self {
            CellScore::Win => Some(Score::HomeWin),
            CellScore::Loss => Some(Score::AwayWin),
            CellScore::Draw => Some(Score::Draw),
            CellScore::DefaultWin => Some(Score::HomeWinDefault),
            CellScore::DefaultLoss => Some(Score::AwayWinDefault),
            CellScore::DrawDefault => Some(Score::DrawDefault),
            CellScore::NotPlayed => None,
        }
    }
}

/// One cell of a swiss pairing card or all-play-all cross-table row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardCell {
    /// Opponent's pin; `None` for byes and unplayed rounds.
    pub opponent: Option<u32>,
    pub colour: CellColour,
    pub score: CellScore,
    /// Round for swiss cells; for all-play-all cells the nominal round is
    /// derived once the table size is known.
    pub round: Option<u32>,
    /// The all-play-all `~` cell on the diagonal.
    pub is_self: bool,
    pub token: String,
}

/// A player's card in a swiss or all-play-all section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub pin: u32,
    pub name: Option<String>,
    pub cells: Vec<CardCell>,
    pub tagger: Tagger,
}

impl Card {
    /// Canonical text form: pin followed by the cell tokens.
    pub fn line(&self) -> String {
        let mut parts = vec![self.pin.to_string()];
        parts.extend(self.cells.iter().map(|c| c.token.clone()));
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::game::Game;

    fn game(result: Score) -> Game {
        Game {
            result: Some(result),
            ..Game::default()
        }
    }

    #[test]
    fn test_match_score_consistency() {
        let mut report = MatchReport {
            home_score: Points::parse("1.5"),
            away_score: Points::parse("0.5"),
            games: vec![game(Score::HomeWin), game(Score::Draw)],
            ..MatchReport::default()
        };
        assert!(report.is_score_consistent());

        report.games.push(game(Score::Void));
        assert!(report.is_score_consistent());

        report.games.push(game(Score::AwayWinDefault));
        assert!(!report.is_score_consistent());
    }

    #[test]
    fn test_defaulted_match_is_consistent_without_unfinished_games() {
        let mut report = MatchReport {
            default: true,
            games: vec![game(Score::MatchDefaulted)],
            ..MatchReport::default()
        };
        assert!(report.is_score_consistent());

        report.games.push(game(Score::Unfinished));
        assert!(!report.is_score_consistent());
    }
}
