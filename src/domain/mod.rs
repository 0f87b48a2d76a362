pub mod diagnostics;
pub mod game;
pub mod models;
pub mod player;
pub mod points;
pub mod score;
pub mod tagger;

pub use diagnostics::{has_errors, Category, Diagnostic, Problem, Severity};
pub use game::{board_position, ColourRule, Game, UnfinishedContext};
pub use models::{
    Card, CardCell, CellColour, CellScore, EventIdentity, Fixture, FixtureKey, MatchKey,
    MatchReport, SectionType, Team,
};
pub use player::{Affiliation, Player, PlayerId, PlayerIdentity};
pub use points::Points;
pub use score::Score;
pub use tagger::{tagged_lines, Tagger};
