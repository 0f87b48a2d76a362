pub mod cards;
pub mod parser;

use serde::Serialize;

use crate::domain::{Card, ColourRule, Diagnostic, Game, MatchReport, Player, PlayerId, SectionType};

pub use parser::parse_report;

/// Reported results of one section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSection {
    pub name: String,
    pub section_type: SectionType,
    pub rapidplay: bool,
    pub colour_rule: ColourRule,
    pub matches: Vec<MatchReport>,
    /// Games outside team matches: individual games and games deduced from
    /// swiss or all-play-all cards.
    pub games: Vec<Game>,
    pub cards: Vec<Card>,
}

impl ReportSection {
    pub fn new(name: &str, section_type: SectionType) -> Self {
        Self {
            name: name.to_string(),
            section_type,
            rapidplay: false,
            colour_rule: ColourRule::default(),
            matches: Vec::new(),
            games: Vec::new(),
            cards: Vec::new(),
        }
    }
}

/// Everything reported for an event. Games refer to players by their index
/// in `players`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub event_name: Option<String>,
    pub sections: Vec<ReportSection>,
    pub players: Vec<Player>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn add_player(&mut self, player: Player) -> PlayerId {
        self.players.push(player);
        PlayerId(self.players.len() - 1)
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id.0)
    }

    /// Name of a game's player, empty when there is none.
    pub fn player_name(&self, id: Option<PlayerId>) -> &str {
        id.and_then(|id| self.player(id))
            .map_or("", |p| p.name.as_str())
    }

    pub fn section(&self, name: &str) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn match_count(&self) -> usize {
        self.sections.iter().map(|s| s.matches.len()).sum()
    }

    pub fn game_count(&self) -> usize {
        self.sections
            .iter()
            .map(|s| s.games.len() + s.matches.iter().map(|m| m.games.len()).sum::<usize>())
            .sum()
    }
}
