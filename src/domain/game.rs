use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::player::PlayerId;
use super::score::Score;
use super::tagger::Tagger;

/// Where an unfinished game was reported, so a later played-on report can
/// find it again.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnfinishedContext {
    pub source: String,
    pub section: String,
    pub competition: String,
    pub home_team: String,
    pub away_team: String,
}

/// One game. Match games carry a board, swiss games a round, unfinished
/// match games their unfinished context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub home_player: Option<PlayerId>,
    pub away_player: Option<PlayerId>,
    pub result: Option<Score>,
    pub date: Option<NaiveDate>,
    pub home_player_white: Option<bool>,
    pub board: Option<String>,
    pub grading_only: bool,
    pub round: Option<u32>,
    pub unfinished: Option<UnfinishedContext>,
    pub tagger: Tagger,
}

impl Game {
    pub fn is_unfinished(&self) -> bool {
        self.result.is_some_and(|r| r.is_unfinished())
    }

    /// Board number and game-within-board, so `"1.2"` is `(1, 2)` and `"3"` is `(3, 1)`.
    pub fn board_position(&self) -> Option<(u32, u32)> {
        board_position(self.board.as_deref()?)
    }
}

pub fn board_position(board: &str) -> Option<(u32, u32)> {
    let mut parts = board.split('.');
    let number = parts.next()?.parse().ok()?;
    let game = match parts.next() {
        Some(part) => part.parse().ok()?,
        None => 1,
    };
    Some((number, game))
}

/// Rule giving the home player's colour when a game line does not say.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColourRule {
    WhiteOnAll,
    BlackOnAll,
    WhiteOnOdd,
    BlackOnOdd,
    #[default]
    NotSpecified,
}

impl ColourRule {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word.to_lowercase().as_str() {
            "whiteonall" => Some(ColourRule::WhiteOnAll),
            "blackonall" => Some(ColourRule::BlackOnAll),
            "whiteonodd" => Some(ColourRule::WhiteOnOdd),
            "blackonodd" => Some(ColourRule::BlackOnOdd),
            "notspecified" => Some(ColourRule::NotSpecified),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            ColourRule::WhiteOnAll => "whiteonall",
            ColourRule::BlackOnAll => "blackonall",
            ColourRule::WhiteOnOdd => "whiteonodd",
            ColourRule::BlackOnOdd => "blackonodd",
            ColourRule::NotSpecified => "notspecified",
        }
    }

    /// Whether the home player has white on `board`.
    ///
    /// Under the odd/even rules the second game of a board (`"1.2"`) swaps
    /// colours relative to the first.
    pub fn home_player_white(&self, board: Option<&str>) -> Option<bool> {
        match self {
            ColourRule::WhiteOnAll => Some(true),
            ColourRule::BlackOnAll => Some(false),
            ColourRule::NotSpecified => None,
            ColourRule::WhiteOnOdd | ColourRule::BlackOnOdd => {
                let (number, game) = board_position(board?)?;
                let odd = (number % 2 == 1) == (game % 2 == 1);
                Some(board_colour(*self == ColourRule::BlackOnOdd, odd))
            }
        }
    }
}

/// Home player's colour keyed by (black on odd boards, odd board).
fn board_colour(black_on_odd: bool, odd: bool) -> bool {
    match (black_on_odd, odd) {
        (true, true) => false,
        (true, false) => true,
        (false, true) => true,
        (false, false) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_position() {
        assert_eq!(board_position("3"), Some((3, 1)));
        assert_eq!(board_position("1.2"), Some((1, 2)));
        assert_eq!(board_position("x"), None);
    }

    #[test]
    fn test_colour_rules() {
        assert_eq!(ColourRule::WhiteOnOdd.home_player_white(Some("1")), Some(true));
        assert_eq!(ColourRule::WhiteOnOdd.home_player_white(Some("2")), Some(false));
        assert_eq!(ColourRule::BlackOnOdd.home_player_white(Some("1")), Some(false));
        assert_eq!(ColourRule::BlackOnOdd.home_player_white(Some("4")), Some(true));
        assert_eq!(ColourRule::WhiteOnOdd.home_player_white(Some("1.2")), Some(false));
        assert_eq!(ColourRule::WhiteOnOdd.home_player_white(None), None);
        assert_eq!(ColourRule::BlackOnAll.home_player_white(None), Some(false));
        assert_eq!(ColourRule::NotSpecified.home_player_white(Some("1")), None);
    }
}
