//! Reads the results text into matches, games and cards.

use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info, warn};

use super::{cards, Report, ReportSection};
use crate::classifier::cards::{apa_card, swiss_card};
use crate::domain::{
    has_errors, tagged_lines, ColourRule, Diagnostic, Game, MatchReport, Player, PlayerId, Problem,
    Score, SectionType, Tagger, UnfinishedContext,
};
use crate::lexical::dates;
use crate::lexical::scanners::{words, DRAW};
use crate::lexical::{is_board, score_word, split_codes};

/// Whether the next match header reports played-on games.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayedOn {
    Not,
    Seeking,
    GameReportPlayedOn,
}

/// Fields of one game line.
#[derive(Debug, Clone, PartialEq)]
struct GameLine {
    board: Option<String>,
    /// `Some(None)` when the line says `unknown`.
    colour: Option<Option<bool>>,
    date: Option<NaiveDate>,
    home: String,
    score: Score,
    away: String,
    grading_only: bool,
}

fn colour_word(word: &str) -> Option<Option<bool>> {
    match word {
        "white" => Some(Some(true)),
        "black" => Some(Some(false)),
        "unknown" => Some(None),
        _ => None,
    }
}

fn game_line(line: &str, with_board: bool) -> Option<GameLine> {
    let mut found: Vec<&str> = line.split_whitespace().collect();
    let grading_only = found.last().is_some_and(|w| w.eq_ignore_ascii_case("gradingonly"));
    if grading_only {
        found.pop();
    }
    let mut index = 0;
    let mut board = None;
    if with_board && found.first().is_some_and(|w| is_board(w)) {
        board = found.first().map(|w| w.to_string());
        index = 1;
    }
    let position = (index..found.len()).find(|i| Score::from_token(found[*i]).is_some())?;
    let score = Score::from_token(found[position])?;

    // Colour and date words lead the home name, which keeps at least one word.
    let mut colour = None;
    let mut date = None;
    while index + 1 < position {
        let word = found[index];
        if colour.is_none() && colour_word(word).is_some() {
            colour = colour_word(word);
        } else if date.is_none() && dates::parse(word).is_some() {
            date = dates::parse(word);
        } else {
            break;
        }
        index += 1;
    }

    Some(GameLine {
        board,
        colour,
        date,
        home: found[index..position].join(" "),
        score,
        away: found[position + 1..].join(" "),
        grading_only,
    })
}

/// Home team, match score and away team of a match header line.
fn match_header(line: &str) -> Option<(String, Score, String)> {
    let found = words(line);
    let last = found.len().checked_sub(1)?;
    found.iter().enumerate().find_map(|(index, word)| {
        if index == 0 || index == last {
            return None;
        }
        let score = if word.text.eq_ignore_ascii_case("matchdefaulted") {
            Score::MatchDefaulted
        } else if DRAW.is_match(word.text) {
            return None;
        } else {
            let (home, away) = score_word(word.text)?;
            Score::Match(home, away)
        };
        Some((
            line[..word.start].trim().to_string(),
            score,
            line[word.end..].trim().to_string(),
        ))
    })
}

fn received(text: &str) -> Option<NaiveDateTime> {
    text.split_whitespace()
        .filter_map(|word| {
            NaiveDateTime::parse_from_str(word, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .or_else(|| dates::parse(word).and_then(|d| d.and_hms_opt(0, 0, 0)))
        })
        .max()
}

struct ReportParser {
    report: Report,
    source: String,
    received: Option<NaiveDateTime>,
    date: Option<NaiveDate>,
    round: Option<u32>,
    played_on: PlayedOn,
    in_match: bool,
    order: usize,
    seen_event: bool,
}

/// Parse a results text. Reports carry `source` until a `source` line
/// names another.
pub fn parse_report(source: &str, text: &str) -> Report {
    let mut parser = ReportParser {
        report: Report::default(),
        source: source.to_string(),
        received: None,
        date: None,
        round: None,
        played_on: PlayedOn::Not,
        in_match: false,
        order: 0,
        seen_event: false,
    };
    for (tagger, line) in tagged_lines(source, text) {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        parser.line(line, &tagger);
    }

    let mut report = parser.report;
    cards::deduce_games(&mut report);
    info!(
        "  → Parsed results: {} sections, {} matches, {} games, {} players",
        report.sections.len(),
        report.match_count(),
        report.game_count(),
        report.players.len()
    );
    if has_errors(&report.diagnostics) {
        warn!("Results have {} problems", report.diagnostics.len());
    }
    report
}

impl ReportParser {
    fn error(&mut self, problem: Problem, tagger: &Tagger, message: String) {
        debug!("{} at {}: {}", problem, tagger.describe(), message);
        self.report
            .diagnostics
            .push(Diagnostic::error(problem, tagger, message));
    }

    fn current(&mut self) -> Option<&mut ReportSection> {
        self.report.sections.last_mut()
    }

    fn line(&mut self, line: &str, tagger: &Tagger) {
        let (first, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        if let Some(section_type) = SectionType::from_keyword(first).filter(|_| !rest.is_empty()) {
            self.seen_event = true;
            self.start_section(section_type, rest);
            return;
        }
        if !self.seen_event {
            self.seen_event = true;
            self.report.event_name = Some(line.to_string());
            return;
        }
        let Some(section) = self.report.sections.last() else {
            self.error(Problem::UnrecognisedLine, tagger, format!("no section for {:?}", line));
            return;
        };
        let section_type = section.section_type;

        match first.to_lowercase().as_str() {
            "source" if !rest.is_empty() => {
                self.source = rest.to_string();
                self.received = None;
                self.in_match = false;
                return;
            }
            "dates" if !rest.is_empty() => {
                self.received = received(rest);
                return;
            }
            "round" => {
                if let Ok(round) = rest.parse() {
                    self.round = Some(round);
                    self.in_match = false;
                    return;
                }
            }
            "date" => {
                if let Some(date) = dates::parse(rest) {
                    self.date = Some(date);
                    self.in_match = false;
                    return;
                }
            }
            "played_on" if rest.is_empty() => {
                self.played_on = PlayedOn::Seeking;
                self.in_match = false;
                return;
            }
            "rapidplay" if rest.is_empty() => {
                if let Some(section) = self.current() {
                    section.rapidplay = true;
                }
                return;
            }
            word if rest.is_empty() && ColourRule::from_keyword(word).is_some() => {
                if let (Some(rule), Some(section)) = (ColourRule::from_keyword(word), self.current()) {
                    section.colour_rule = rule;
                }
                return;
            }
            _ => {}
        }

        if section_type.has_cards() && self.card(section_type, line, tagger) {
            return;
        }
        if section_type.has_matches() {
            if self.in_match && is_board(first) {
                match game_line(line, true) {
                    Some(game) => self.match_game(game, tagger),
                    None => self.error(Problem::UnrecognisedLine, tagger, format!("unreadable game: {}", line)),
                }
                return;
            }
            if let Some((home, score, away)) = match_header(line) {
                self.header(home, score, away, tagger);
                return;
            }
        }
        match game_line(line, false) {
            Some(game) => self.loose_game(game, tagger),
            None => self.error(Problem::UnrecognisedLine, tagger, format!("unreadable line: {}", line)),
        }
    }

    fn start_section(&mut self, section_type: SectionType, name: &str) {
        debug!("Results for {} {}", section_type.keyword(), name);
        self.report.sections.push(ReportSection::new(name, section_type));
        self.date = None;
        self.round = None;
        self.in_match = false;
        self.played_on = PlayedOn::Not;
    }

    /// Record a swiss or all-play-all card. False when the line is not one.
    fn card(&mut self, section_type: SectionType, line: &str, tagger: &Tagger) -> bool {
        let found = match section_type {
            SectionType::Swiss => swiss_card(line, tagger),
            _ => apa_card(line, tagger),
        };
        match found {
            Some(Ok(card)) => {
                if let Some(section) = self.current() {
                    section.cards.push(card);
                }
                true
            }
            Some(Err(problem)) => {
                self.error(problem, tagger, format!("bad card: {}", line));
                true
            }
            None => false,
        }
    }

    fn header(&mut self, home_team: String, score: Score, away_team: String, tagger: &Tagger) {
        self.played_on = match self.played_on {
            PlayedOn::Seeking => PlayedOn::GameReportPlayedOn,
            _ => PlayedOn::Not,
        };
        self.order += 1;
        let (home_score, away_score) = match score {
            Score::Match(home, away) => (Some(home), Some(away)),
            _ => (None, None),
        };
        let Some(section) = self.report.sections.last_mut() else {
            return;
        };
        let report = MatchReport {
            competition: section.name.clone(),
            home_team,
            away_team,
            home_score,
            away_score,
            date: self.date,
            round: self.round,
            source: self.source.clone(),
            order: self.order,
            default: score == Score::MatchDefaulted,
            played_on: self.played_on == PlayedOn::GameReportPlayedOn,
            received: self.received,
            games: Vec::new(),
            tagger: tagger.clone(),
        };
        debug!(
            "Match {} {} {} from {}",
            report.home_team, score, report.away_team, report.source
        );
        section.matches.push(report);
        self.in_match = true;
    }

    fn new_player(&mut self, name: &str) -> Option<PlayerId> {
        let (name, codes) = split_codes(name);
        if name.is_empty() {
            return None;
        }
        let mut player = Player::new(&name);
        player.reported_codes = codes;
        Some(self.report.add_player(player))
    }

    fn match_game(&mut self, line: GameLine, tagger: &Tagger) {
        let Some(section) = self.report.sections.last() else {
            return;
        };
        let Some(current) = section.matches.last() else {
            return;
        };
        let (rapidplay, rule, section_name) = (section.rapidplay, section.colour_rule, section.name.clone());
        let (home, _) = split_codes(&line.home);
        let (away, _) = split_codes(&line.away);

        let taken = |board: &Option<String>| current.games.iter().any(|g| board.is_some() && g.board == *board);
        let mut board = line.board.clone();
        if rapidplay && taken(&board) {
            if let Some(number) = board.as_deref().filter(|b| !b.contains('.')) {
                board = Some(format!("{}.2", number));
            }
        }

        if let Some(index) = current.games.iter().position(|g| board.is_some() && g.board == board) {
            let previous = &current.games[index];
            let same_players = self.report.player_name(previous.home_player) == home
                && self.report.player_name(previous.away_player) == away;
            if previous.is_unfinished() && !line.score.is_unfinished() && same_players {
                debug!("Board {:?} finished as {}", board, line.score);
                if let Some(game) = self
                    .report
                    .sections
                    .last_mut()
                    .and_then(|s| s.matches.last_mut())
                    .and_then(|m| m.games.get_mut(index))
                {
                    game.result = Some(line.score);
                    game.unfinished = None;
                    game.tagger = tagger.clone();
                }
            } else if !same_players || previous.result != Some(line.score) {
                let message = format!("board {} reported twice with different games", board.unwrap_or_default());
                self.error(Problem::GameConflict, tagger, message);
            }
            return;
        }

        let unfinished = line.score.is_unfinished().then(|| UnfinishedContext {
            source: current.source.clone(),
            section: section_name,
            competition: current.competition.clone(),
            home_team: current.home_team.clone(),
            away_team: current.away_team.clone(),
        });
        let date = line.date.or(current.date);
        let home_player_white = line
            .colour
            .unwrap_or_else(|| rule.home_player_white(board.as_deref()));
        let home_player = self.new_player(&line.home);
        let away_player = self.new_player(&line.away);
        let game = Game {
            home_player,
            away_player,
            result: Some(line.score),
            date,
            home_player_white,
            board,
            grading_only: line.grading_only,
            round: self.round,
            unfinished,
            tagger: tagger.clone(),
        };
        if let Some(current) = self.current().and_then(|s| s.matches.last_mut()) {
            current.games.push(game);
        }
    }

    fn loose_game(&mut self, line: GameLine, tagger: &Tagger) {
        let home_player = self.new_player(&line.home);
        let away_player = self.new_player(&line.away);
        let game = Game {
            home_player,
            away_player,
            result: Some(line.score),
            date: line.date.or(self.date),
            home_player_white: line.colour.flatten(),
            board: None,
            grading_only: line.grading_only,
            round: self.round,
            unfinished: None,
            tagger: tagger.clone(),
        };
        if let Some(section) = self.current() {
            section.games.push(game);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Points;

    const RESULTS: &str = "My League 2024
fixturelist Division 1
blackonodd
Toytown A 3-2 Anytown B
1 2024-10-05 Smith 1-0 Jones
2 2024-10-05 Brown draw Green
3 2024-10-05 White 0-1 Black
4 2024-10-05 Grey 1-0 Pink
5 2024-10-05 Red draw Blue
";

    #[test]
    fn test_match_report() {
        let report = parse_report("results", RESULTS);
        assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
        assert_eq!(report.event_name.as_deref(), Some("My League 2024"));
        let section = report.section("Division 1").unwrap();
        assert_eq!(section.colour_rule, ColourRule::BlackOnOdd);
        assert_eq!(section.matches.len(), 1);

        let report_match = &section.matches[0];
        assert_eq!(report_match.home_team, "Toytown A");
        assert_eq!(report_match.home_score, Points::parse("3"));
        assert_eq!(report_match.source, "results");
        assert_eq!(report_match.games.len(), 5);
        assert!(report_match.is_score_consistent());

        let third = &report_match.games[2];
        assert_eq!(third.board.as_deref(), Some("3"));
        assert_eq!(report.player_name(third.home_player), "White");
        assert_eq!(report.player_name(third.away_player), "Black");
        assert_eq!(third.result, Some(Score::AwayWin));
        assert_eq!(third.home_player_white, Some(false));
        assert_eq!(report_match.games[1].home_player_white, Some(true));
        assert_eq!(dates::iso(third.date.unwrap()), "2024-10-05");
    }

    #[test]
    fn test_game_line_words() {
        let line = game_line("2 white 2024-10-05 Smith J (123456) def+ Jones gradingonly", true).unwrap();
        assert_eq!(line.board.as_deref(), Some("2"));
        assert_eq!(line.colour, Some(Some(true)));
        assert_eq!(line.home, "Smith J (123456)");
        assert_eq!(line.score, Score::HomeWinDefault);
        assert_eq!(line.away, "Jones");
        assert!(line.grading_only);

        assert!(game_line("Smith beat Jones", false).is_none());
        assert_eq!(
            match_header("Toytown A matchdefaulted Anytown B"),
            Some(("Toytown A".to_string(), Score::MatchDefaulted, "Anytown B".to_string()))
        );
        assert_eq!(match_header("Smith draw Jones"), None);
    }

    #[test]
    fn test_unfinished_game_updated_in_same_match() {
        let text = "Cup\nleague Cup\nsource email1\nToytown A 1-0 Anytown B\n1 Smith unfinished Jones\n2 Brown 1-0 Green\n1 Smith 0-1 Jones\n2 Brown 0-1 Green\n";
        let report = parse_report("results", text);
        let games = &report.sections[0].matches[0].games;
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].result, Some(Score::AwayWin));
        assert!(games[0].unfinished.is_none());
        let problems: Vec<Problem> = report.diagnostics.iter().map(|d| d.problem).collect();
        assert_eq!(problems, vec![Problem::GameConflict]);
    }

    #[test]
    fn test_rapidplay_second_game_on_board() {
        let text = "Cup\nleague Cup\nrapidplay\nwhiteonodd\nToytown A 1-1 Anytown B\n1 Smith 1-0 Jones\n1 Smith 0-1 Jones\n";
        let report = parse_report("results", text);
        let games = &report.sections[0].matches[0].games;
        assert_eq!(games[1].board.as_deref(), Some("1.2"));
        assert_eq!(games[0].home_player_white, Some(true));
        assert_eq!(games[1].home_player_white, Some(false));
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn test_played_on_and_sources() {
        let text = "Cup
league Cup
source email1
dates 2024-10-06T09:00:00 2024-10-06T10:30:00
date 2024-10-05
Toytown A 1-0 Anytown B
1 Smith unfinished Jones
2 Brown 1-0 Green
source email2
played_on
Toytown A 1-0 Anytown B
1 Smith 0-1 Jones
Anytown B 2-0 Toytown A
1 Jones 1-0 Smith
2 Green 1-0 Brown
";
        let report = parse_report("results", text);
        let matches = &report.sections[0].matches;
        assert_eq!(matches.len(), 3);
        let unfinished = matches[0].games[0].unfinished.as_ref().unwrap();
        assert_eq!(unfinished.source, "email1");
        assert_eq!(unfinished.home_team, "Toytown A");
        assert_eq!(
            matches[0].received.map(|r| r.format("%H:%M").to_string()),
            Some("10:30".to_string())
        );
        assert!(!matches[0].played_on);
        assert!(matches[1].played_on);
        assert_eq!(matches[1].source, "email2");
        assert_eq!(matches[1].received, None);
        assert!(!matches[2].played_on);
        assert_eq!(matches[2].order, 3);
    }

    #[test]
    fn test_individual_games_and_bad_lines() {
        let text = "Juniors\nindividual Juniors\nround 2\n2024-10-05 black Alice 1-0 Bob\nAlice beat Bob\n";
        let report = parse_report("results", text);
        let games = &report.sections[0].games;
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].round, Some(2));
        assert_eq!(games[0].home_player_white, Some(false));
        assert_eq!(report.diagnostics[0].problem, Problem::UnrecognisedLine);
        assert_eq!(report.diagnostics[0].tagger.line, 5);
    }
}
