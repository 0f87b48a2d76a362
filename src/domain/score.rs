use serde::{Deserialize, Serialize};
use std::fmt;

use super::points::Points;

/// Outcome of a game or, for `Match`, the numeric score of a team match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Score {
    HomeWin,
    AwayWin,
    Draw,
    /// Game defaulted, side not stated.
    Default,
    HomeWinDefault,
    AwayWinDefault,
    DrawDefault,
    DoubleDefault,
    Unfinished,
    Void,
    MatchDefaulted,
    ByeWin,
    ByeDraw,
    BadScore,
    Error,
    Match(Points, Points),
}

impl Score {
    /// Token used for this score in the canonical results text.
    pub fn token(&self) -> String {
        match self {
            Score::HomeWin => "1-0".to_string(),
            Score::AwayWin => "0-1".to_string(),
            Score::Draw => "draw".to_string(),
            Score::Default => "defaulted".to_string(),
            Score::HomeWinDefault => "def+".to_string(),
            Score::AwayWinDefault => "def-".to_string(),
            Score::DrawDefault => "=d".to_string(),
            Score::DoubleDefault => "dbld".to_string(),
            Score::Unfinished => "unfinished".to_string(),
            Score::Void => "void".to_string(),
            Score::MatchDefaulted => "matchdefaulted".to_string(),
            Score::ByeWin => "bye+".to_string(),
            Score::ByeDraw => "bye=".to_string(),
            Score::BadScore => "badscore".to_string(),
            Score::Error => "error".to_string(),
            Score::Match(home, away) => format!("{}-{}", home, away),
        }
    }

    /// Parse a canonical game token. Numeric match scores are not game tokens.
    pub fn from_token(token: &str) -> Option<Score> {
        let score = match token.to_lowercase().as_str() {
            "1-0" => Score::HomeWin,
            "0-1" => Score::AwayWin,
            "draw" | "½-½" | "0.5-0.5" => Score::Draw,
            "default" | "defaulted" => Score::Default,
            "def+" => Score::HomeWinDefault,
            "def-" => Score::AwayWinDefault,
            "=d" => Score::DrawDefault,
            "dbld" | "dbldef" => Score::DoubleDefault,
            "unfinished" => Score::Unfinished,
            "void" => Score::Void,
            "matchdefaulted" => Score::MatchDefaulted,
            "bye+" => Score::ByeWin,
            "bye=" => Score::ByeDraw,
            "badscore" => Score::BadScore,
            "error" => Score::Error,
            _ => return None,
        };
        Some(score)
    }

    /// Convert a numeric pair to a game outcome when it is one.
    pub fn from_game_points(home: Points, away: Points) -> Option<Score> {
        match (home.halves(), away.halves()) {
            (2, 0) => Some(Score::HomeWin),
            (0, 2) => Some(Score::AwayWin),
            (1, 1) => Some(Score::Draw),
            _ => None,
        }
    }

    /// Points awarded to (home, away) towards a match score, or `None` when
    /// the game does not count.
    pub fn match_points(&self) -> Option<(Points, Points)> {
        match self {
            Score::HomeWin | Score::HomeWinDefault | Score::ByeWin => Some((Points::ONE, Points::ZERO)),
            Score::AwayWin | Score::AwayWinDefault => Some((Points::ZERO, Points::ONE)),
            Score::Draw | Score::DrawDefault | Score::ByeDraw => Some((Points::HALF, Points::HALF)),
            Score::Match(home, away) => Some((*home, *away)),
            Score::Default
            | Score::DoubleDefault
            | Score::Unfinished
            | Score::Void
            | Score::MatchDefaulted
            | Score::BadScore
            | Score::Error => None,
        }
    }

    /// True for results that were decided without play.
    pub fn is_default(&self) -> bool {
        matches!(
            self,
            Score::Default
                | Score::HomeWinDefault
                | Score::AwayWinDefault
                | Score::DrawDefault
                | Score::DoubleDefault
                | Score::MatchDefaulted
        )
    }

    pub fn is_unfinished(&self) -> bool {
        matches!(self, Score::Unfinished)
    }

    /// True for a single game's outcome, false for a team match score.
    pub fn is_game_result(&self) -> bool {
        !matches!(self, Score::Match(..))
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}
