//! Reads the schedule text line by line.
//!
//! A section keyword as the first word starts a new section; otherwise the
//! line is read with the grammar of the current state. Problems are recorded
//! on the schedule and the offending line is skipped.

use chrono::{NaiveDate, Weekday};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use super::{ListedPlayer, Schedule, ScheduleSection};
use crate::domain::{has_errors, Diagnostic, Fixture, Problem, SectionType, Tagger, Team};
use crate::lexical::dates::{self, is_weekday};
use crate::lexical::{day_name, split_codes};

/// Fields of a team or fixture line: separated by tabs or two or more spaces.
static FIELD_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\t\s*|\s{2,}").expect("static field separator"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ExpectEventName,
    ExpectDates,
    ExpectSection,
    AllPlayAllRoundDates,
    AllPlayAllPlayers,
    SwissRoundDates,
    SwissPlayers,
    LeagueTeams,
    LeagueMatches,
    FixtureList,
    Individual,
}

fn fields(line: &str) -> Vec<&str> {
    FIELD_SEPARATOR
        .split(line.trim())
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect()
}

/// Leading day and date of a fixture line, and how many fields they used.
fn when(fields: &[&str]) -> Option<(Option<Weekday>, NaiveDate, usize)> {
    let first = fields.first()?;
    if let Some(date) = dates::parse(first) {
        return Some((None, date, 1));
    }
    let (head, rest) = first.split_once(char::is_whitespace).unwrap_or((first, ""));
    let day = day_name(head)?;
    if rest.trim().is_empty() {
        let date = dates::parse(fields.get(1)?)?;
        return Some((Some(day), date, 2));
    }
    Some((Some(day), dates::parse(rest)?, 1))
}

/// Both dates of an event-dates line, or `None` when the line is anything else.
fn event_dates(line: &str) -> Option<(NaiveDate, NaiveDate)> {
    let found = dates::find_all(line);
    if found.len() != 2 || !dates::split(line).is_empty() {
        return None;
    }
    let (a, b) = (found[0].date, found[1].date);
    Some((a.min(b), a.max(b)))
}

struct ScheduleParser {
    schedule: Schedule,
    state: State,
    round: Option<u32>,
}

/// Parse a schedule text. `source` names the text in diagnostics.
pub fn parse_schedule(source: &str, text: &str) -> Schedule {
    let mut parser = ScheduleParser {
        schedule: Schedule::default(),
        state: State::ExpectEventName,
        round: None,
    };
    for (tagger, line) in crate::domain::tagged_lines(source, text) {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        parser.line(line, &tagger);
    }

    let schedule = parser.schedule;
    info!(
        "  → Parsed schedule: {} sections, {} fixtures",
        schedule.sections.len(),
        schedule.sections.iter().map(|s| s.fixtures.len()).sum::<usize>()
    );
    if has_errors(&schedule.diagnostics) {
        warn!("Schedule has {} problems", schedule.diagnostics.len());
    }
    schedule
}

impl ScheduleParser {
    fn error(&mut self, problem: Problem, tagger: &Tagger, message: String) {
        debug!("{} at {}: {}", problem, tagger.describe(), message);
        self.schedule
            .diagnostics
            .push(Diagnostic::error(problem, tagger, message));
    }

    fn current(&mut self) -> Option<&mut ScheduleSection> {
        self.schedule.sections.last_mut()
    }

    fn line(&mut self, line: &str, tagger: &Tagger) {
        match self.state {
            State::ExpectEventName => {
                if let Some(found) = event_dates(line) {
                    self.error(Problem::MissingEventName, tagger, "event dates before event name".to_string());
                    self.schedule.dates = Some(found);
                    self.state = State::ExpectSection;
                } else {
                    self.schedule.event_name = Some(line.to_string());
                    self.state = State::ExpectDates;
                }
                return;
            }
            State::ExpectDates => {
                self.state = State::ExpectSection;
                match event_dates(line) {
                    Some(found) => {
                        self.schedule.dates = Some(found);
                        return;
                    }
                    None => self.error(Problem::MissingEventDates, tagger, format!("expected event dates: {}", line)),
                }
            }
            _ => {}
        }

        let (first, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        if let Some(section_type) = SectionType::from_keyword(first).filter(|_| !rest.trim().is_empty()) {
            self.start_section(section_type, rest.trim());
            return;
        }
        if first.eq_ignore_ascii_case("rapidplay") && rest.is_empty() {
            if let Some(section) = self.current() {
                section.rapidplay = true;
                return;
            }
        }

        match self.state {
            State::ExpectEventName | State::ExpectDates | State::ExpectSection => {
                self.error(Problem::UnknownSectionType, tagger, format!("unknown section type {:?}", first));
            }
            State::AllPlayAllRoundDates | State::SwissRoundDates => self.round_date(line, tagger),
            State::AllPlayAllPlayers | State::SwissPlayers => self.player(line, tagger),
            State::LeagueTeams => self.team(line, tagger),
            State::LeagueMatches => self.league_fixture(line, tagger),
            State::FixtureList => self.fixture_list_line(line, tagger),
            State::Individual => {
                let (name, _) = split_codes(line);
                if let Some(section) = self.current() {
                    section.entrants.push(name);
                }
            }
        }
    }

    fn start_section(&mut self, section_type: SectionType, name: &str) {
        debug!("Section {} {}", section_type.keyword(), name);
        self.schedule.sections.push(ScheduleSection::new(name, section_type));
        self.round = None;
        self.state = match section_type {
            SectionType::League => State::LeagueTeams,
            SectionType::FixtureList => State::FixtureList,
            SectionType::Swiss => State::SwissRoundDates,
            SectionType::AllPlayAll => State::AllPlayAllRoundDates,
            SectionType::Individual => State::Individual,
        };
    }

    fn check_in_event(&mut self, date: NaiveDate, tagger: &Tagger) {
        if let Some((start, end)) = self.schedule.dates {
            if date < start || date > end {
                self.error(
                    Problem::DateOutsideEvent,
                    tagger,
                    format!("{} is outside the event dates", dates::iso(date)),
                );
            }
        }
    }

    fn round_date(&mut self, line: &str, tagger: &Tagger) {
        if line.eq_ignore_ascii_case("players") {
            self.state = match self.state {
                State::SwissRoundDates => State::SwissPlayers,
                _ => State::AllPlayAllPlayers,
            };
            return;
        }
        let (first, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let Ok(round) = first.parse::<u32>() else {
            self.error(Problem::UnrecognisedLine, tagger, format!("expected a round date: {}", line));
            return;
        };
        let Some(date) = dates::parse(rest) else {
            self.error(Problem::BadDate, tagger, format!("round {} date {:?}", round, rest.trim()));
            return;
        };
        let duplicate = self
            .current()
            .is_some_and(|section| section.round_dates.contains_key(&round));
        if duplicate {
            self.error(Problem::DuplicateRound, tagger, format!("round {} already has a date", round));
            return;
        }
        self.check_in_event(date, tagger);
        if let Some(section) = self.current() {
            section.round_dates.insert(round, date);
        }
    }

    fn player(&mut self, line: &str, tagger: &Tagger) {
        let (first, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let Ok(pin) = first.parse::<u32>() else {
            self.error(Problem::UnrecognisedLine, tagger, format!("expected a player: {}", line));
            return;
        };
        let (name, codes) = split_codes(rest);
        let Some(section) = self.current() else {
            return;
        };
        if section.players.contains_key(&pin) {
            let message = format!("pin {} is listed twice in {}", pin, section.name);
            self.error(Problem::DuplicatePin, tagger, message);
            return;
        }
        section.players.insert(pin, ListedPlayer { name, codes });
    }

    fn team(&mut self, line: &str, tagger: &Tagger) {
        if line.eq_ignore_ascii_case("matches") {
            self.state = State::LeagueMatches;
            return;
        }
        let found = fields(line);
        let team = Team {
            name: found[0].to_string(),
            club: found.get(1).map(|c| c.to_string()),
        };
        let Some(section) = self.current() else {
            return;
        };
        if section.teams.iter().any(|t| t.name == team.name) {
            let message = format!("{} is entered twice in {}", team.name, section.name);
            self.error(Problem::DuplicateTeam, tagger, message);
            return;
        }
        section.teams.push(team);
    }

    fn league_fixture(&mut self, line: &str, tagger: &Tagger) {
        let (first, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        if first.eq_ignore_ascii_case("round") {
            match rest.trim().parse() {
                Ok(round) => self.round = Some(round),
                Err(_) => self.error(Problem::UnrecognisedLine, tagger, format!("bad round header: {}", line)),
            }
            return;
        }
        let found = fields(line);
        let Some((day, date, used)) = when(&found) else {
            self.error(Problem::BadDate, tagger, format!("fixture has no date: {}", line));
            return;
        };
        let [home, away] = found[used..] else {
            self.error(Problem::UnrecognisedLine, tagger, format!("expected home and away teams: {}", line));
            return;
        };
        let Some(section) = self.schedule.sections.last() else {
            return;
        };
        let competition = section.name.clone();
        let unknown: Vec<&str> = [home, away]
            .into_iter()
            .filter(|team| !section.teams.is_empty() && !section.teams.iter().any(|t| t.name == *team))
            .collect();
        for team in unknown {
            self.error(Problem::UnknownTeam, tagger, format!("{} is not entered in {}", team, competition));
        }
        self.fixture(competition, (home, away), (day, date), tagger);
    }

    fn fixture_list_line(&mut self, line: &str, tagger: &Tagger) {
        let found = fields(line);
        let Some((day, date, used)) = when(&found) else {
            self.error(Problem::BadDate, tagger, format!("fixture has no date: {}", line));
            return;
        };
        let [competition, home, away] = found[used..] else {
            self.error(
                Problem::UnrecognisedLine,
                tagger,
                format!("expected competition, home and away teams: {}", line),
            );
            return;
        };
        self.fixture(competition.to_string(), (home, away), (day, date), tagger);
    }

    fn fixture(
        &mut self,
        competition: String,
        (home, away): (&str, &str),
        (day, date): (Option<Weekday>, NaiveDate),
        tagger: &Tagger,
    ) {
        if let Some(day) = day.filter(|d| !is_weekday(date, *d)) {
            self.error(
                Problem::WeekdayMismatch,
                tagger,
                format!("{} is not a {:?}", dates::iso(date), day),
            );
        }
        self.check_in_event(date, tagger);
        let fixture = Fixture {
            competition,
            home_team: home.to_string(),
            away_team: away.to_string(),
            date,
            day,
            round: self.round,
            tagger: tagger.clone(),
        };
        if let Some(section) = self.current() {
            section.fixtures.push(fixture);
        }
    }
}
