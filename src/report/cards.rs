//! Games deduced from swiss pairing cards and all-play-all cross-tables.
//!
//! A game is read from the lower pin's card when both cards are present and
//! from the only card otherwise. Each played cell must be the complement of
//! the opponent's cell for the same round: opposite colour, opposite score.

use log::debug;
use std::collections::{BTreeMap, BTreeSet};

use super::{Report, ReportSection};
use crate::domain::{
    CardCell, CellScore, Diagnostic, Game, Player, PlayerId, Problem, Score, SectionType,
};
use crate::lexical::{apa_nominal_round, apa_rounds, split_codes};

/// A deduced game before players are attached.
struct CellGame {
    home: u32,
    away: Option<u32>,
    cell: CardCell,
    round: Option<u32>,
    card: usize,
}

fn complements(cell: &CardCell, other: Option<&CardCell>, owner: u32) -> bool {
    other.is_some_and(|other| {
        other.opponent == Some(owner)
            && other.colour == cell.colour.opposite()
            && other.score == cell.score.opposite()
    })
}

/// Result of a cell with no opponent, such as `bye+` or `def+`.
fn unpaired_result(cell: &CardCell) -> Option<Score> {
    match cell.score {
        CellScore::Win => Some(Score::ByeWin),
        CellScore::Draw => Some(Score::ByeDraw),
        CellScore::DefaultWin => Some(Score::HomeWinDefault),
        _ => None,
    }
}

/// Cards of a section with duplicate pins removed and reported.
fn unique_cards(section: &ReportSection, diagnostics: &mut Vec<Diagnostic>) -> BTreeMap<u32, usize> {
    let mut by_pin = BTreeMap::new();
    for (index, card) in section.cards.iter().enumerate() {
        if by_pin.contains_key(&card.pin) {
            diagnostics.push(Diagnostic::error(
                Problem::DuplicatePin,
                &card.tagger,
                format!("pin {} has two cards in {}", card.pin, section.name),
            ));
            continue;
        }
        by_pin.insert(card.pin, index);
    }
    by_pin
}

fn swiss_games(
    section: &ReportSection,
    by_pin: &BTreeMap<u32, usize>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<CellGame> {
    let mut games = Vec::new();
    let mut inconsistent = BTreeSet::new();
    for (&pin, &index) in by_pin {
        let card = &section.cards[index];
        for cell in &card.cells {
            let Some(opponent) = cell.opponent else {
                if unpaired_result(cell).is_some() {
                    games.push(CellGame { home: pin, away: None, cell: cell.clone(), round: cell.round, card: index });
                }
                continue;
            };
            match by_pin.get(&opponent) {
                Some(&other) => {
                    let answer = section.cards[other].cells.iter().find(|c| c.round == cell.round);
                    let pair = (pin.min(opponent), pin.max(opponent), cell.round);
                    if !complements(cell, answer, pin) && inconsistent.insert(pair) {
                        diagnostics.push(Diagnostic::error(
                            Problem::CrosstableInconsistent,
                            &card.tagger,
                            format!(
                                "round {} cell {} of pin {} does not match pin {}",
                                cell.round.unwrap_or_default(),
                                cell.token,
                                pin,
                                opponent
                            ),
                        ));
                    }
                    if pin < opponent {
                        games.push(CellGame { home: pin, away: Some(opponent), cell: cell.clone(), round: cell.round, card: index });
                    }
                }
                None => games.push(CellGame { home: pin, away: Some(opponent), cell: cell.clone(), round: cell.round, card: index }),
            }
        }
    }
    games
}

fn apa_games(
    section: &ReportSection,
    by_pin: &BTreeMap<u32, usize>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<CellGame> {
    let columns = by_pin
        .values()
        .map(|index| section.cards[*index].cells.len())
        .max()
        .unwrap_or_default() as u32;
    let rounds = apa_rounds(columns);
    let mut games = Vec::new();
    for (&pin, &index) in by_pin {
        let card = &section.cards[index];
        if pin > columns {
            diagnostics.push(Diagnostic::error(
                Problem::PinOutOfRange,
                &card.tagger,
                format!("pin {} but the table has {} columns", pin, columns),
            ));
            continue;
        }
        let self_column = card.cells.iter().position(|c| c.is_self).map(|i| i as u32 + 1);
        if self_column != Some(pin) {
            diagnostics.push(Diagnostic::error(
                Problem::ApaSelfCell,
                &card.tagger,
                format!("pin {} has its ~ cell in column {:?}", pin, self_column),
            ));
            continue;
        }
        for cell in &card.cells {
            let Some(opponent) = cell.opponent.filter(|_| cell.score != CellScore::NotPlayed) else {
                continue;
            };
            let round = Some(apa_nominal_round(pin, opponent, rounds));
            match by_pin.get(&opponent) {
                Some(&other) => {
                    let answer = (pin as usize)
                        .checked_sub(1)
                        .and_then(|column| section.cards[other].cells.get(column));
                    let answer = answer.map(|a| CardCell { opponent: Some(pin), ..a.clone() });
                    if pin < opponent && !complements(cell, answer.as_ref(), pin) {
                        diagnostics.push(Diagnostic::error(
                            Problem::CrosstableInconsistent,
                            &card.tagger,
                            format!("pin {} column {} does not match pin {} column {}", pin, opponent, opponent, pin),
                        ));
                    }
                    if pin < opponent {
                        games.push(CellGame { home: pin, away: Some(opponent), cell: cell.clone(), round, card: index });
                    }
                }
                None => games.push(CellGame { home: pin, away: Some(opponent), cell: cell.clone(), round, card: index }),
            }
        }
    }
    games
}

/// Player for a pin: the card's name, else `#pin`.
fn pin_player(
    pins: &mut BTreeMap<u32, PlayerId>,
    players: &mut Vec<Player>,
    section: &ReportSection,
    by_pin: &BTreeMap<u32, usize>,
    pin: u32,
) -> PlayerId {
    if let Some(id) = pins.get(&pin) {
        return *id;
    }
    let named = by_pin
        .get(&pin)
        .and_then(|index| section.cards[*index].name.as_deref())
        .map(split_codes);
    let mut player = match named {
        Some((name, codes)) if !name.is_empty() => {
            let mut player = Player::new(&name);
            player.reported_codes = codes;
            player
        }
        _ => Player::new(&format!("#{}", pin)),
    };
    player.section = Some(section.name.clone());
    player.pin = Some(pin);
    players.push(player);
    let id = PlayerId(players.len() - 1);
    pins.insert(pin, id);
    id
}

/// Turn every card section's cards into games.
pub fn deduce_games(report: &mut Report) {
    for section in report.sections.iter_mut() {
        if !section.section_type.has_cards() || section.cards.is_empty() {
            continue;
        }
        let by_pin = unique_cards(section, &mut report.diagnostics);
        let cell_games = match section.section_type {
            SectionType::Swiss => swiss_games(section, &by_pin, &mut report.diagnostics),
            _ => apa_games(section, &by_pin, &mut report.diagnostics),
        };

        let mut pins = BTreeMap::new();
        for pin in by_pin.keys() {
            pin_player(&mut pins, &mut report.players, section, &by_pin, *pin);
        }
        let games: Vec<Game> = cell_games
            .into_iter()
            .filter_map(|found| {
                let result = match found.away {
                    Some(_) => found.cell.score.as_home_score(),
                    None => unpaired_result(&found.cell),
                }?;
                let home_player = pin_player(&mut pins, &mut report.players, section, &by_pin, found.home);
                let away_player = found
                    .away
                    .map(|pin| pin_player(&mut pins, &mut report.players, section, &by_pin, pin));
                Some(Game {
                    home_player: Some(home_player),
                    away_player,
                    result: Some(result),
                    home_player_white: found.cell.colour.as_white(),
                    round: found.round,
                    tagger: section.cards[found.card].tagger.clone(),
                    ..Game::default()
                })
            })
            .collect();
        debug!("{} games from {} cards in {}", games.len(), section.cards.len(), section.name);
        section.games.extend(games);
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::{Problem, Score};
    use crate::report::parse_report;

    #[test]
    fn test_swiss_games_from_consistent_cards() {
        let text = "Open\nswiss Open\n1 Alice b2+ w3-\n2 Bob w1- b4=\n3 Carol b4+ b1+\n4 Dan w3- w2=\n";
        let report = parse_report("results", text);
        assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
        let section = report.section("Open").unwrap();
        assert_eq!(section.games.len(), 4);
        let first = &section.games[0];
        assert_eq!(report.player_name(first.home_player), "Alice");
        assert_eq!(report.player_name(first.away_player), "Bob");
        assert_eq!(first.result, Some(Score::HomeWin));
        assert_eq!(first.home_player_white, Some(false));
        assert_eq!(first.round, Some(1));
        assert_eq!(report.players.len(), 4);
    }

    #[test]
    fn test_swiss_inconsistent_cells() {
        let text = "Open\nswiss Open\n1 b2+ w3-\n2 w1- b3=\n3 b1+ w2=\n";
        let report = parse_report("results", text);
        let problems: Vec<Problem> = report.diagnostics.iter().map(|d| d.problem).collect();
        assert!(!problems.is_empty());
        assert!(problems.iter().all(|p| *p == Problem::CrosstableInconsistent));
        assert_eq!(report.player_name(report.sections[0].games[0].home_player), "#1");
    }

    #[test]
    fn test_single_apa_row() {
        let report = parse_report("results", "Club\nallplayall Club\n3 w+ b= ~ w- b+ w=\n");
        assert!(report.diagnostics.is_empty());
        let games = &report.sections[0].games;
        assert_eq!(games.len(), 5);
        let rounds: Vec<Option<u32>> = games.iter().map(|g| g.round).collect();
        assert_eq!(rounds, vec![Some(3), Some(4), Some(1), Some(2), Some(5)]);
        assert_eq!(games[2].result, Some(Score::AwayWin));
    }

    #[test]
    fn test_apa_problems() {
        let text = "Club\nallplayall Club\n1 ~ w+ b=\n2 w- ~ b+\n2 w- ~ b+\n5 w- b= ~\n";
        let report = parse_report("results", text);
        let problems: Vec<Problem> = report.diagnostics.iter().map(|d| d.problem).collect();
        assert!(problems.contains(&Problem::DuplicatePin));
        assert!(problems.contains(&Problem::PinOutOfRange));
        assert!(problems.contains(&Problem::CrosstableInconsistent));
    }

    #[test]
    fn test_apa_self_cell_off_the_diagonal() {
        let report = parse_report("results", "Club\nallplayall Club\n3 ~ w+ b= w- b+ w=\n");
        let problems: Vec<Problem> = report.diagnostics.iter().map(|d| d.problem).collect();
        assert_eq!(problems, vec![Problem::ApaSelfCell]);
        assert!(report.sections[0].games.is_empty());
    }

    #[test]
    fn test_byes() {
        let report = parse_report("results", "Open\nswiss Open\n1 Alice bye+ *\n");
        let games = &report.sections[0].games;
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].result, Some(Score::ByeWin));
        assert!(games[0].away_player.is_none());
    }
}
