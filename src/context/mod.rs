//! Event context: folds classified lines into the event being reported.
//!
//! `EventContext::reduce` takes the context by value and hands back the next
//! context together with the item the line was routed to, if any.

pub mod emit;

use chrono::{NaiveDate, NaiveDateTime};
use log::debug;
use std::collections::BTreeMap;

use crate::classifier::{ClassifiedLine, FixtureLine, Found, ResultLine};
use crate::domain::{Card, Diagnostic, EventIdentity, Tagger};
use crate::rules::TabularRow;

/// Section used for items that arrive before any competition is named.
pub const DEFAULT_SECTION: &str = "Results";

/// Where the lines being reduced came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSource {
    pub source: String,
    pub received: Option<NaiveDateTime>,
}

/// A result line with what the context knew when it arrived.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultEntry {
    pub line: ResultLine,
    /// Both names are still joined in `line.nameone`.
    pub joined: bool,
    pub played_on: bool,
    pub document: DocumentSource,
    pub tagger: Tagger,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Routed {
    AllPlayAllCard {
        competition: String,
        card: Card,
    },
    SwissCard {
        competition: String,
        card: Card,
    },
    Fixture {
        competition: String,
        fixture: FixtureLine,
        tagger: Tagger,
    },
    Result {
        competition: String,
        entry: ResultEntry,
    },
    RoundDate {
        competition: String,
        round: u32,
        date: NaiveDate,
    },
    Tabular {
        competition: String,
        row: TabularRow,
        document: DocumentSource,
    },
}

impl Routed {
    pub fn competition(&self) -> &str {
        match self {
            Routed::AllPlayAllCard { competition, .. }
            | Routed::SwissCard { competition, .. }
            | Routed::Fixture { competition, .. }
            | Routed::Result { competition, .. }
            | Routed::RoundDate { competition, .. }
            | Routed::Tabular { competition, .. } => competition,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventContext {
    event_name: Option<String>,
    event_dates: Option<(NaiveDate, NaiveDate)>,
    possible_name: Option<String>,
    competition: Option<String>,
    date: Option<NaiveDate>,
    round: Option<u32>,
    document: DocumentSource,
    competitions: Vec<String>,
    pending_dates: BTreeMap<String, Vec<NaiveDate>>,
    items: Vec<Routed>,
    diagnostics: Vec<Diagnostic>,
}

impl EventContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines reduced from here on come from `document`. The competition
    /// defaults do not carry over between documents.
    pub fn begin_document(mut self, document: DocumentSource) -> Self {
        self.document = document;
        self.competition = None;
        self.date = None;
        self.round = None;
        self
    }

    /// True once an event name is known, from a heading or a dated line.
    pub fn event_identified(&self) -> bool {
        self.event_name.is_some()
    }

    /// The event identity, once both name and dates are known.
    pub fn identity(&self) -> Option<EventIdentity> {
        let name = self.event_name()?;
        let (start_date, end_date) = self.event_dates?;
        Some(EventIdentity {
            name: name.to_string(),
            start_date,
            end_date,
        })
    }

    pub fn event_name(&self) -> Option<&str> {
        self.event_name.as_deref().or(self.possible_name.as_deref())
    }

    pub fn event_dates(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.event_dates
    }

    pub fn competitions(&self) -> &[String] {
        &self.competitions
    }

    pub fn items(&self) -> &[Routed] {
        &self.items
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    fn frozen(&self) -> bool {
        self.event_name.is_some() && self.event_dates.is_some()
    }

    fn register(&mut self, competition: &str) {
        if !self.competitions.iter().any(|c| c == competition) {
            self.competitions.push(competition.to_string());
        }
    }

    fn current_competition(&self, named: Option<&String>) -> String {
        named
            .or(self.competition.as_ref())
            .cloned()
            .unwrap_or_else(|| DEFAULT_SECTION.to_string())
    }

    fn set_competition(&mut self, competition: String, date: Option<NaiveDate>, round: Option<u32>) {
        self.register(&competition);
        self.competition = Some(competition);
        self.date = date;
        self.round = round;
    }

    /// Dates given with a competition heading become its round dates once
    /// the competition receives cards or fixtures.
    fn promote_pending(&mut self, competition: &str) {
        let Some(dates) = self.pending_dates.remove(competition) else {
            return;
        };
        for (index, date) in dates.into_iter().enumerate() {
            self.items.push(Routed::RoundDate {
                competition: competition.to_string(),
                round: index as u32 + 1,
                date,
            });
        }
    }

    fn route(&mut self, routed: Routed) -> Option<Routed> {
        self.items.push(routed.clone());
        Some(routed)
    }

    pub fn reduce(mut self, line: ClassifiedLine) -> (Self, Option<Routed>) {
        let ClassifiedLine {
            found,
            text,
            tagger,
            played_on,
        } = line;
        let origin = tagger.describe();
        let routed = match found {
            Found::EventAndDates { name, start, end } => {
                if !self.frozen() {
                    if self.event_name.is_none() {
                        self.event_name = name.or_else(|| self.possible_name.take());
                    }
                    self.event_dates.get_or_insert((start, end));
                }
                None
            }
            Found::PossibleEventName(name) => {
                if self.event_name.is_none() && self.possible_name.is_none() {
                    self.possible_name = Some(name);
                }
                None
            }
            Found::CompetitionAndDates { competition, dates } => {
                self.pending_dates.insert(competition.clone(), dates);
                self.set_competition(competition, None, None);
                None
            }
            Found::Competition(competition) => {
                self.set_competition(competition, None, None);
                None
            }
            Found::CompetitionRound { competition, round } => {
                self.set_competition(competition, None, Some(round));
                None
            }
            Found::CompetitionDate { competition, date }
            | Found::CompetitionGameDate {
                competition, date, ..
            } => {
                self.set_competition(competition, Some(date), None);
                None
            }
            Found::CompetitionRoundGameDate {
                competition,
                round,
                date,
            } => {
                self.set_competition(competition.clone(), Some(date), Some(round));
                self.route(Routed::RoundDate {
                    competition,
                    round,
                    date,
                })
            }
            Found::RoundHeader { round, date } => {
                self.round = Some(round);
                self.date = Some(date);
                match self.competition.clone() {
                    Some(competition) => self.route(Routed::RoundDate {
                        competition,
                        round,
                        date,
                    }),
                    None => None,
                }
            }
            Found::DateOnly { date, .. } => {
                self.date = Some(date);
                None
            }
            Found::RoundOnly(round) => {
                self.round = Some(round);
                None
            }
            Found::SwissPairingCard(card) => {
                let competition = self.current_competition(None);
                self.register(&competition);
                self.promote_pending(&competition);
                self.route(Routed::SwissCard { competition, card })
            }
            Found::AllPlayAllCard(card) => {
                let competition = self.current_competition(None);
                self.register(&competition);
                self.promote_pending(&competition);
                self.route(Routed::AllPlayAllCard { competition, card })
            }
            Found::Fixture(fixture) | Found::FixtureTeams(fixture) => {
                let competition = self.current_competition(fixture.competition.as_ref());
                self.register(&competition);
                self.promote_pending(&competition);
                let fixture = FixtureLine {
                    competition: Some(competition.clone()),
                    date: fixture.date.or(self.date),
                    round: fixture.round.or(self.round),
                    ..fixture
                };
                self.route(Routed::Fixture {
                    competition,
                    fixture,
                    tagger,
                })
            }
            Found::Result(line) | Found::Unfinished(line) => self.result(line, false, played_on, tagger),
            Found::ResultNames(line) => self.result(line, true, played_on, tagger),
            Found::CsvTabular(row) => {
                let named = Some(row.get("section").to_string()).filter(|s| !s.is_empty());
                let competition = self.current_competition(named.as_ref());
                self.register(&competition);
                let event = row.get("event");
                if !event.is_empty() && self.event_name.is_none() && self.possible_name.is_none() {
                    self.possible_name = Some(event.to_string());
                }
                let document = self.document.clone();
                self.route(Routed::Tabular {
                    competition,
                    row,
                    document,
                })
            }
            Found::Error(problem) => {
                self.diagnostics
                    .push(Diagnostic::error(problem, &tagger, text.clone()));
                None
            }
            Found::Ignore => None,
        };
        if routed.is_none() {
            debug!("{}: nothing routed for {:?}", origin, text);
        }
        (self, routed)
    }

    fn result(&mut self, line: ResultLine, joined: bool, played_on: bool, tagger: Tagger) -> Option<Routed> {
        let competition = self.current_competition(line.competition.as_ref());
        self.register(&competition);
        let line = ResultLine {
            competition: Some(competition.clone()),
            date: line.date.or(self.date),
            round: line.round.or(self.round),
            ..line
        };
        let entry = ResultEntry {
            line,
            joined,
            played_on,
            document: self.document.clone(),
            tagger,
        };
        self.route(Routed::Result { competition, entry })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Classifier, CompetitionNames};

    fn reduce_all(lines: &[&str]) -> EventContext {
        let classifier = Classifier::new(CompetitionNames::new(["Division 1", "Open"]));
        let mut context = EventContext::new().begin_document(DocumentSource {
            source: "email1".to_string(),
            received: None,
        });
        for (index, text) in lines.iter().enumerate() {
            let tagger = Tagger::for_line("email1", index + 1);
            let line = classifier.classify(text, &tagger, context.event_identified());
            context = context.reduce(line).0;
        }
        context
    }

    #[test]
    fn test_event_identity_is_frozen() {
        let context = reduce_all(&[
            "My League 2024 2024-09-01 2024-12-31",
            "Other League 2025-01-01 2025-02-01",
        ]);
        let identity = context.identity().unwrap();
        assert_eq!(identity.name, "My League 2024");
        assert_eq!(identity.start_date.to_string(), "2024-09-01");
    }

    #[test]
    fn test_possible_name_used_when_dates_arrive_without_one() {
        let context = reduce_all(&["Toytown Congress", "2024-09-01 2024-09-03"]);
        assert_eq!(context.identity().unwrap().name, "Toytown Congress");
    }

    #[test]
    fn test_results_take_competition_defaults() {
        let context = reduce_all(&[
            "My League 2024 2024-09-01 2024-12-31",
            "Division 1 2024-10-05",
            "Toytown A 3-2 Anytown B",
            "1 Smith 1-0 Jones",
        ]);
        let results: Vec<&ResultEntry> = context
            .items()
            .iter()
            .filter_map(|item| match item {
                Routed::Result { entry, .. } => Some(entry),
                _ => None,
            })
            .collect();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].line.competition.as_deref(), Some("Division 1"));
        assert_eq!(results[1].line.date.map(|d| d.to_string()).as_deref(), Some("2024-10-05"));
        assert_eq!(results[1].document.source, "email1");
    }

    #[test]
    fn test_competition_dates_promoted_on_first_card() {
        let context = reduce_all(&[
            "Congress 2024-10-01 2024-10-08",
            "Open 2024-10-01 2024-10-08",
            "1 b2+ w3-",
        ]);
        let rounds: Vec<(u32, String)> = context
            .items()
            .iter()
            .filter_map(|item| match item {
                Routed::RoundDate { round, date, .. } => Some((*round, date.to_string())),
                _ => None,
            })
            .collect();
        assert_eq!(
            rounds,
            vec![(1, "2024-10-01".to_string()), (2, "2024-10-08".to_string())]
        );
        assert!(matches!(context.items().last(), Some(Routed::SwissCard { competition, .. }) if competition == "Open"));
    }

    #[test]
    fn test_error_lines_become_diagnostics() {
        let context = reduce_all(&["Congress 2024-10-01 2024-10-08", "1 12 b2+ w3-"]);
        assert_eq!(context.diagnostics().len(), 1);
        assert!(context.items().is_empty());
    }
}
