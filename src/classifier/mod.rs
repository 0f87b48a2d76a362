//! Line classification: decide what one line of a report means.
//!
//! The checks run from the most specific shape to the least specific one and
//! the first that fits wins.

pub mod cards;
pub mod competitions;
pub mod defaults;
pub mod found;
pub mod results;

use chrono::{NaiveDate, Weekday};
use log::debug;

use crate::domain::{Problem, Score, Tagger};
use crate::lexical::dates;
use crate::lexical::patterns::{PLAYED_ON, RESULT_ONLY};
use crate::lexical::scanners::{day_name, round_reference, words, TEAM_SEPARATOR};
use crate::rules::TabularRow;

pub use competitions::CompetitionNames;
pub use found::{ClassifiedLine, FixtureLine, Found, ResultLine};

/// What is left of a line once dates, competition and markers are removed.
#[derive(Debug, Default)]
struct Residual {
    text: String,
    competition: Option<String>,
    date: Option<NaiveDate>,
    day: Option<Weekday>,
    round: Option<u32>,
    result_only: bool,
}

fn remove_range(text: &str, start: usize, end: usize) -> String {
    format!("{} {}", &text[..start], &text[end..])
}

/// `home v away` split at the first team separator with words both sides.
fn split_teams(text: &str) -> Option<(String, String)> {
    let found = words(text);
    let separator = found
        .iter()
        .enumerate()
        .find(|(index, word)| *index > 0 && *index + 1 < found.len() && TEAM_SEPARATOR.is_match(word.text))
        .map(|(_, word)| word)?;
    Some((
        text[..separator.start].trim().to_string(),
        text[separator.end..].trim().to_string(),
    ))
}

#[derive(Debug, Clone, Default)]
pub struct Classifier {
    competitions: CompetitionNames,
}

impl Classifier {
    pub fn new(competitions: CompetitionNames) -> Self {
        Self { competitions }
    }

    /// Make `name` recognisable as a competition in later lines.
    pub fn add_competition(&mut self, name: &str) {
        self.competitions.insert(name);
    }

    pub fn competitions(&self) -> &CompetitionNames {
        &self.competitions
    }

    pub fn classify(&self, text: &str, tagger: &Tagger, event_identified: bool) -> ClassifiedLine {
        let (found, played_on) = self.found(text, tagger, event_identified);
        debug!("{}: {} <- {:?}", tagger.describe(), found.label(), text.trim());
        ClassifiedLine {
            found,
            text: text.trim().to_string(),
            tagger: tagger.clone(),
            played_on,
        }
    }

    fn found(&self, text: &str, tagger: &Tagger, event_identified: bool) -> (Found, bool) {
        if text.trim().is_empty() {
            return (Found::Ignore, false);
        }
        if let Some(row) = TabularRow::parse_line(text) {
            return (Found::CsvTabular(row), false);
        }
        let text = text.trim();
        if let Some(card) = cards::swiss_card(text, tagger) {
            return (card.map_or_else(Found::Error, Found::SwissPairingCard), false);
        }
        if let Some(card) = cards::apa_card(text, tagger) {
            return (card.map_or_else(Found::Error, Found::AllPlayAllCard), false);
        }

        let (text, played_on) = match PLAYED_ON.find(text) {
            Some(marker) => (&text[marker.end()..], true),
            None => (text, false),
        };

        let found_dates = dates::find_all(text);
        if found_dates.len() >= 2 {
            return (self.dated_heading(text, &found_dates, event_identified), played_on);
        }

        let residual = self.residual(text, found_dates.first());
        if let Some(found) = self.result(&residual) {
            return (found, played_on);
        }
        (self.unscored(text, residual, event_identified), played_on)
    }

    /// A line carrying two or more dates names an event or a competition.
    fn dated_heading(&self, text: &str, found: &[dates::DateToken], event_identified: bool) -> Found {
        let fragments = dates::split(text);
        let all_dates: Vec<NaiveDate> = found.iter().map(|d| d.date).collect();
        if let [fragment] = fragments.as_slice() {
            if let Some(competition) = self.competitions.exact(fragment) {
                return Found::CompetitionAndDates {
                    competition,
                    dates: all_dates,
                };
            }
            if event_identified {
                return Found::CompetitionAndDates {
                    competition: fragment.to_string(),
                    dates: all_dates,
                };
            }
        }
        if found.len() > 2 {
            return Found::Error(Problem::MoreThanTwoDates);
        }
        let (first, second) = (found[0].date, found[1].date);
        Found::EventAndDates {
            name: match fragments.as_slice() {
                [name] => Some(name.to_string()),
                _ => None,
            },
            start: first.min(second),
            end: first.max(second),
        }
    }

    fn residual(&self, text: &str, date: Option<&dates::DateToken>) -> Residual {
        let mut residual = Residual::default();
        let mut text = text.to_string();
        if let Some(token) = date {
            residual.date = Some(token.date);
            text = remove_range(&text, token.start, token.end);
        }
        if let Some((name, start, end)) = self.competitions.find(&text) {
            residual.competition = Some(name);
            text = remove_range(&text, start, end);
        }
        if let Some(found) = RESULT_ONLY.find(&text) {
            residual.result_only = true;
            text = remove_range(&text, found.start(), found.end());
        }
        if let Some(first) = words(&text).first() {
            if let Some(day) = day_name(first.text) {
                residual.day = Some(day);
                text = remove_range(&text, first.start, first.end);
            }
        }
        if let Some((round, start, end)) = round_reference(&text) {
            residual.round = Some(round);
            text = remove_range(&text, start, end);
        }
        residual.text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        residual
    }

    fn result(&self, residual: &Residual) -> Option<Found> {
        let fill = |mut line: ResultLine| {
            line.competition = residual.competition.clone();
            line.date = residual.date;
            line.round = residual.round;
            line.result_only = residual.result_only;
            line
        };
        if let Some(line) = defaults::interpret(&residual.text) {
            let line = fill(line);
            return Some(if line.score == Some(Score::Unfinished) {
                Found::Unfinished(line)
            } else {
                Found::Result(line)
            });
        }
        let (line, joined) = results::interpret(&residual.text)?;
        let line = fill(line);
        Some(if joined {
            Found::ResultNames(line)
        } else {
            Found::Result(line)
        })
    }

    fn unscored(&self, text: &str, residual: Residual, event_identified: bool) -> Found {
        let Residual {
            text: rest,
            competition,
            date,
            day,
            round,
            ..
        } = residual;

        if rest.is_empty() {
            return match (competition, date, round) {
                (Some(competition), Some(date), Some(round)) => Found::CompetitionRoundGameDate {
                    competition,
                    round,
                    date,
                },
                (Some(competition), Some(date), None) => match day {
                    Some(day) => Found::CompetitionGameDate {
                        competition,
                        date,
                        day,
                    },
                    None => Found::CompetitionDate { competition, date },
                },
                (Some(competition), None, Some(round)) => {
                    Found::CompetitionRound { competition, round }
                }
                (Some(competition), None, None) => Found::Competition(competition),
                (None, Some(date), Some(round)) => Found::RoundHeader { round, date },
                (None, Some(date), None) => Found::DateOnly { date, day },
                (None, None, Some(round)) => Found::RoundOnly(round),
                (None, None, None) => Found::Ignore,
            };
        }

        let fixture = |home: String, away: Option<String>| FixtureLine {
            competition: competition.clone(),
            date,
            day,
            round,
            home,
            away,
        };
        match split_teams(&rest) {
            Some((home, away)) if date.is_some() || competition.is_some() || event_identified => {
                return Found::Fixture(fixture(home, Some(away)));
            }
            None if date.is_some() => return Found::FixtureTeams(fixture(rest.clone(), None)),
            _ => {}
        }

        if event_identified {
            Found::Ignore
        } else {
            Found::PossibleEventName(text.trim().to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Points;

    fn classifier() -> Classifier {
        Classifier::new(CompetitionNames::new(["Division 1", "Open"]))
    }

    fn found(text: &str, event_identified: bool) -> Found {
        classifier()
            .classify(text, &Tagger::for_line("doc", 1), event_identified)
            .found
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_oversized_score_is_not_a_result() {
        let found = found("Smith 1500000000-0 Jones", true);
        let scored = matches!(
            &found,
            Found::Result(line) if line.score.is_some_and(|score| score != Score::BadScore)
        );
        assert!(!scored, "{:?}", found);
    }

    #[test]
    fn test_event_and_dates() {
        assert_eq!(
            found("My League 2024 2024-09-01 2024-12-31", false),
            Found::EventAndDates {
                name: Some("My League 2024".to_string()),
                start: date(2024, 9, 1),
                end: date(2024, 12, 31),
            }
        );
        assert_eq!(
            found("1/9/2024 to 31/12/2024 and 5/1/2025", false),
            Found::Error(Problem::MoreThanTwoDates)
        );
    }

    #[test]
    fn test_competition_and_dates() {
        assert_eq!(
            found("Open 2024-10-01 2024-10-08", true),
            Found::CompetitionAndDates {
                competition: "Open".to_string(),
                dates: vec![date(2024, 10, 1), date(2024, 10, 8)],
            }
        );
    }

    #[test]
    fn test_result_with_board_and_date() {
        let Found::Result(line) = found("1 2024-10-05 Smith 1-0 Jones", true) else {
            panic!("expected a result");
        };
        assert_eq!(line.board.as_deref(), Some("1"));
        assert_eq!(line.date, Some(date(2024, 10, 5)));
        assert_eq!(line.nameone, "Smith");
        assert_eq!(line.nametwo.as_deref(), Some("Jones"));
        assert_eq!(line.score, Some(Score::HomeWin));
    }

    #[test]
    fn test_match_header_in_competition() {
        let Found::Result(line) = found("Division 1 Toytown A 3-2 Anytown B", true) else {
            panic!("expected a result");
        };
        assert_eq!(line.competition.as_deref(), Some("Division 1"));
        assert_eq!(
            line.score,
            Some(Score::Match(Points::from_halves(6), Points::from_halves(4)))
        );
    }

    #[test]
    fn test_default_and_unfinished_lines() {
        let Found::Result(line) = found("3 Smith 1 default", true) else {
            panic!("expected a result");
        };
        assert_eq!(line.board.as_deref(), Some("3"));
        assert_eq!(line.score, Some(Score::HomeWinDefault));

        assert!(matches!(
            found("4 Grey adjourned Pink", true),
            Found::Unfinished(_)
        ));
    }

    #[test]
    fn test_played_on_marker_is_stripped() {
        let line = classifier().classify(
            "Played on: 3 White 0-1 Black",
            &Tagger::for_line("doc", 1),
            true,
        );
        assert!(line.played_on);
        assert!(matches!(line.found, Found::Result(_)));
    }

    #[test]
    fn test_headings() {
        assert_eq!(found("Division 1", true), Found::Competition("Division 1".to_string()));
        assert_eq!(
            found("Division 1 round 3", true),
            Found::CompetitionRound {
                competition: "Division 1".to_string(),
                round: 3
            }
        );
        assert_eq!(
            found("Round 2 2024-10-08", true),
            Found::RoundHeader {
                round: 2,
                date: date(2024, 10, 8)
            }
        );
        assert_eq!(found("Rd 4", true), Found::RoundOnly(4));
        assert_eq!(
            found("Saturday 5 October 2024", true),
            Found::DateOnly {
                date: date(2024, 10, 5),
                day: Some(Weekday::Sat)
            }
        );
        assert_eq!(
            found("Division 1 Sat 2024-10-05", true),
            Found::CompetitionGameDate {
                competition: "Division 1".to_string(),
                date: date(2024, 10, 5),
                day: Weekday::Sat
            }
        );
    }

    #[test]
    fn test_fixtures() {
        let Found::Fixture(fixture) = found("2024-10-05 Toytown A v Anytown B", true) else {
            panic!("expected a fixture");
        };
        assert_eq!(fixture.home, "Toytown A");
        assert_eq!(fixture.away.as_deref(), Some("Anytown B"));

        let Found::FixtureTeams(fixture) = found("2024-10-05 Toytown A Anytown B", true) else {
            panic!("expected joined fixture teams");
        };
        assert_eq!(fixture.home, "Toytown A Anytown B");
        assert_eq!(fixture.away, None);
    }

    #[test]
    fn test_cards_and_tabular_rows() {
        assert!(matches!(found("1 b2+ w3-", true), Found::SwissPairingCard(_)));
        assert!(matches!(found("3 w+ b= ~ w- b+ w=", true), Found::AllPlayAllCard(_)));
        assert_eq!(
            found("1 12 b2+ w3-", true),
            Found::Error(Problem::ExtraPinSwissData)
        );

        let mut row = TabularRow::default();
        row.set("home_player", "Smith");
        assert_eq!(found(&row.to_line(), true), Found::CsvTabular(row));
    }

    #[test]
    fn test_unknown_text_before_the_event_is_a_possible_name() {
        assert_eq!(
            found("Toytown Chess Congress", false),
            Found::PossibleEventName("Toytown Chess Congress".to_string())
        );
        assert_eq!(found("Toytown Chess Congress", true), Found::Ignore);
    }
}
