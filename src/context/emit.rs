//! Canonical schedule and results texts written from an event context.
//!
//! Both texts are plain line formats read back by the schedule and report
//! parsers, so the context's view of the event can be reviewed and edited
//! before it is collated.

use chrono::{NaiveDate, Weekday};
use std::collections::{BTreeMap, HashMap};

use super::{EventContext, ResultEntry, Routed};
use crate::domain::{Card, Points, Score, SectionType};
use crate::lexical::dates::iso;
use crate::names::{Disambiguator, TruncationPolicy};
use crate::rules::TabularRow;

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn is_match_header(entry: &ResultEntry) -> bool {
    matches!(entry.line.score, Some(Score::Match(..) | Score::MatchDefaulted))
}

/// Split joined name pairs once for the whole event.
struct JoinedNames {
    splits: HashMap<String, (String, String)>,
}

impl JoinedNames {
    fn new(context: &EventContext, disambiguator: &Disambiguator, policy: &dyn TruncationPolicy) -> Self {
        let joined: Vec<String> = context
            .items()
            .iter()
            .filter_map(|item| match item {
                Routed::Fixture { fixture, .. } if fixture.away.is_none() => Some(fixture.home.clone()),
                Routed::Result { entry, .. } if entry.joined => Some(entry.line.nameone.clone()),
                _ => None,
            })
            .collect();
        let splits = joined
            .iter()
            .cloned()
            .zip(disambiguator.split_all(&joined, policy))
            .collect();
        Self { splits }
    }

    fn pair(&self, first: &str, second: Option<&str>) -> (String, String) {
        match second {
            Some(second) => (first.to_string(), second.to_string()),
            None => self
                .splits
                .get(first)
                .cloned()
                .unwrap_or_else(|| (first.to_string(), String::new())),
        }
    }
}

/// Competition format inferred from what the competition received.
pub fn section_type(context: &EventContext, competition: &str) -> SectionType {
    let items = context.items().iter().filter(|i| i.competition() == competition);
    let mut section = SectionType::Individual;
    for item in items {
        match item {
            Routed::SwissCard { .. } => return SectionType::Swiss,
            Routed::AllPlayAllCard { .. } => return SectionType::AllPlayAll,
            Routed::Fixture { .. } => section = SectionType::League,
            Routed::Result { entry, .. } if is_match_header(entry) => section = SectionType::League,
            Routed::Tabular { row, .. } if !row.get("home_team").is_empty() => section = SectionType::League,
            _ => {}
        }
    }
    section
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !name.is_empty() && !list.iter().any(|n| n == name) {
        list.push(name.to_string());
    }
}

fn card_players(cards: &[&Card]) -> BTreeMap<u32, String> {
    let mut players = BTreeMap::new();
    for card in cards {
        if let Some(name) = &card.name {
            players.entry(card.pin).or_insert_with(|| name.clone());
        }
    }
    players
}

impl EventContext {
    /// The schedule text: event, dates, then each competition's teams,
    /// fixtures, round dates and players.
    pub fn schedule_text(&self, disambiguator: &Disambiguator, policy: &dyn TruncationPolicy) -> String {
        let names = JoinedNames::new(self, disambiguator, policy);
        let mut lines = Vec::new();
        lines.push(self.event_name().unwrap_or_default().to_string());
        if let Some((start, end)) = self.event_dates() {
            lines.push(format!("{} {}", iso(start), iso(end)));
        }

        for competition in self.competitions() {
            let section = section_type(self, competition);
            let items: Vec<&Routed> = self
                .items()
                .iter()
                .filter(|i| i.competition() == competition)
                .collect();
            match section {
                SectionType::Swiss | SectionType::AllPlayAll => {
                    lines.push(format!("{} {}", section.keyword(), competition));
                    let mut rounds: BTreeMap<u32, NaiveDate> = BTreeMap::new();
                    let mut cards = Vec::new();
                    for item in &items {
                        match item {
                            Routed::RoundDate { round, date, .. } => {
                                rounds.entry(*round).or_insert(*date);
                            }
                            Routed::SwissCard { card, .. } | Routed::AllPlayAllCard { card, .. } => {
                                cards.push(card)
                            }
                            _ => {}
                        }
                    }
                    lines.extend(rounds.iter().map(|(round, date)| format!("{} {}", round, iso(*date))));
                    lines.push("players".to_string());
                    lines.extend(
                        card_players(&cards)
                            .iter()
                            .map(|(pin, name)| format!("{} {}", pin, name)),
                    );
                }
                SectionType::League => {
                    let fixtures: Vec<(String, String, NaiveDate, Option<Weekday>, Option<u32>)> = items
                        .iter()
                        .filter_map(|item| match item {
                            Routed::Fixture { fixture, .. } => {
                                let (home, away) = names.pair(&fixture.home, fixture.away.as_deref());
                                Some((home, away, fixture.date?, fixture.day, fixture.round))
                            }
                            _ => None,
                        })
                        .collect();
                    if fixtures.is_empty() {
                        continue;
                    }
                    lines.push(format!("league {}", competition));
                    let mut teams = Vec::new();
                    for (home, away, ..) in &fixtures {
                        push_unique(&mut teams, home);
                        push_unique(&mut teams, away);
                    }
                    lines.extend(teams);
                    lines.push("matches".to_string());
                    let mut round = None;
                    for (home, away, date, day, fixture_round) in fixtures {
                        if fixture_round.is_some() && fixture_round != round {
                            round = fixture_round;
                            lines.push(format!("round {}", fixture_round.unwrap_or_default()));
                        }
                        let when = match day {
                            Some(day) => format!("{} {}", weekday_name(day), iso(date)),
                            None => iso(date),
                        };
                        lines.push(format!("{}\t{}\t{}", when, home, away));
                    }
                }
                SectionType::FixtureList | SectionType::Individual => {}
            }
        }
        lines.join("\n") + "\n"
    }

    /// The results text: event, then each competition's reports in the
    /// order they arrived, with source headers where the source changes.
    pub fn results_text(&self, disambiguator: &Disambiguator, policy: &dyn TruncationPolicy) -> String {
        let names = JoinedNames::new(self, disambiguator, policy);
        let mut lines = vec![self.event_name().unwrap_or_default().to_string()];

        for competition in self.competitions() {
            let section = section_type(self, competition);
            let mut writer = SectionWriter::new(section);
            for item in self.items().iter().filter(|i| i.competition() == competition) {
                match item {
                    Routed::Result { entry, .. } => writer.result(entry, &names),
                    Routed::SwissCard { card, .. } | Routed::AllPlayAllCard { card, .. } => writer.card(card),
                    Routed::Tabular { row, document, .. } => {
                        writer.source(&document.source, document.received);
                        writer.tabular(row);
                    }
                    Routed::Fixture { .. } | Routed::RoundDate { .. } => {}
                }
            }
            if !writer.lines.is_empty() {
                lines.push(format!("{} {}", section.keyword(), competition));
                lines.extend(writer.lines);
            }
        }
        lines.join("\n") + "\n"
    }
}

/// Writes one section of the results text, tracking what was last said.
struct SectionWriter {
    section: SectionType,
    lines: Vec<String>,
    source: Option<String>,
    date: Option<NaiveDate>,
    round: Option<u32>,
    in_match: bool,
    next_board: u32,
    teams: Option<(String, String)>,
    /// Last match header written, as `(home, score token, away)`.
    header: Option<(String, String, String)>,
    played_on: bool,
}

impl SectionWriter {
    fn new(section: SectionType) -> Self {
        Self {
            section,
            lines: Vec::new(),
            source: None,
            date: None,
            round: None,
            in_match: false,
            next_board: 1,
            teams: None,
            header: None,
            played_on: false,
        }
    }

    fn source(&mut self, source: &str, received: Option<chrono::NaiveDateTime>) {
        if self.source.as_deref() == Some(source) || source.is_empty() {
            return;
        }
        self.source = Some(source.to_string());
        self.played_on = false;
        self.lines.push(format!("source {}", source));
        if let Some(received) = received {
            self.lines.push(format!("dates {}", received.format("%Y-%m-%dT%H:%M:%S")));
        }
    }

    fn header(&mut self, home: &str, token: &str, away: &str, date: Option<NaiveDate>, round: Option<u32>, played_on: bool) {
        if round.is_some() && round != self.round {
            self.round = round;
            self.lines.push(format!("round {}", round.unwrap_or_default()));
        }
        if let Some(date) = date.filter(|d| Some(*d) != self.date) {
            self.date = Some(date);
            self.lines.push(format!("date {}", iso(date)));
        }
        if played_on {
            self.lines.push("played_on".to_string());
        }
        self.lines.push(format!("{} {} {}", home, token, away));
        self.in_match = true;
        self.next_board = 1;
        self.header = Some((home.to_string(), token.to_string(), away.to_string()));
        self.played_on = played_on;
    }

    /// A played-on game of the current match is reported under its own
    /// `played_on` copy of the match header.
    fn played_on_game(&mut self) {
        if self.played_on {
            return;
        }
        if let Some((home, token, away)) = self.header.clone() {
            self.header(&home, &token, &away, None, None, true);
        }
    }

    fn game(
        &mut self,
        board: Option<&str>,
        white: Option<bool>,
        date: Option<NaiveDate>,
        players: (&str, &str),
        token: &str,
        grading_only: bool,
    ) {
        let mut parts = Vec::new();
        if self.in_match {
            let board = match board {
                Some(board) => board.to_string(),
                None => self.next_board.to_string(),
            };
            self.next_board = board
                .split('.')
                .next()
                .and_then(|b| b.parse::<u32>().ok())
                .map_or(self.next_board + 1, |b| b + 1);
            parts.push(board);
        }
        if let Some(white) = white {
            parts.push(if white { "white" } else { "black" }.to_string());
        }
        if let Some(date) = date {
            parts.push(iso(date));
        }
        parts.extend(
            [players.0, token, players.1]
                .into_iter()
                .filter(|p| !p.is_empty())
                .map(str::to_string),
        );
        if grading_only {
            parts.push("gradingonly".to_string());
        }
        self.lines.push(parts.join(" "));
    }

    fn result(&mut self, entry: &ResultEntry, names: &JoinedNames) {
        self.source(&entry.document.source, entry.document.received);
        let line = &entry.line;
        let (first, second) = names.pair(&line.nameone, line.nametwo.as_deref());
        let score = line.score.unwrap_or(Score::BadScore);
        if is_match_header(entry) {
            self.header(&first, &score.token(), &second, line.date, line.round, entry.played_on);
            return;
        }
        if !self.section.has_matches() && line.round.is_some() && line.round != self.round {
            self.round = line.round;
            self.lines.push(format!("round {}", line.round.unwrap_or_default()));
        }
        if entry.played_on && self.section.has_matches() {
            self.played_on_game();
        }
        let date = line.date.filter(|_| !self.in_match);
        self.game(
            line.board.as_deref(),
            line.home_player_white,
            date,
            (&first, &second),
            &score.token(),
            line.result_only,
        );
    }

    fn card(&mut self, card: &Card) {
        let mut parts = vec![card.pin.to_string()];
        parts.extend(card.name.iter().cloned());
        parts.extend(card.cells.iter().map(|c| c.token.clone()));
        self.lines.push(parts.join(" "));
    }

    fn tabular(&mut self, row: &TabularRow) {
        let (home_team, away_team) = (row.get("home_team"), row.get("away_team"));
        if !home_team.is_empty() && !away_team.is_empty() {
            let teams = (home_team.to_string(), away_team.to_string());
            let scores = (
                Points::parse(row.get("home_team_score")),
                Points::parse(row.get("away_team_score")),
            );
            if self.teams.as_ref() != Some(&teams) {
                if let (Some(home), Some(away)) = scores {
                    let date = crate::lexical::dates::parse(row.get("date"));
                    let round = row.get("round").parse().ok();
                    self.header(home_team, &Score::Match(home, away).token(), away_team, date, round, false);
                    self.teams = Some(teams);
                }
            }
        }
        let (home, away) = (row.get("home_player"), row.get("away_player"));
        if home.is_empty() && away.is_empty() {
            return;
        }
        let token = Score::from_token(row.get("result"))
            .or_else(|| {
                crate::lexical::scanners::score_word(row.get("result"))
                    .and_then(|(h, a)| Score::from_game_points(h, a))
            })
            .unwrap_or(Score::BadScore)
            .token();
        let white = match row.get("home_player_colour").to_lowercase().as_str() {
            "white" | "w" => Some(true),
            "black" | "b" => Some(false),
            _ => None,
        };
        let board = Some(row.get("board")).filter(|b| !b.is_empty());
        let date = crate::lexical::dates::parse(row.get("date")).filter(|_| !self.in_match);
        self.game(board, white, date, (home, away), &token, false);
    }
}
