//! Reconciles reported results with the schedule.
//!
//! Reports of the same match from different sources are merged into the most
//! recent one, checked against each other, cross-referenced to fixtures, and
//! played-on reports are matched to the unfinished games they complete.

pub mod consistency;
pub mod players;
pub mod reporting;

use chrono::{Duration, NaiveDateTime};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::config::CollationSettings;
use crate::domain::{
    has_errors, Diagnostic, FixtureKey, MatchReport, Problem, Score, Severity,
};
use crate::report::Report;
use crate::rules::ValueMap;
use crate::schedule::Schedule;

use players::{ClubPlayers, EventDetails, TeamPlayers};

pub use reporting::{validation_report, EventSummary};

/// A match report by section and position in that section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MatchRef {
    pub section: usize,
    pub index: usize,
}

/// A game inside a match report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GameRef {
    pub section: usize,
    pub match_index: usize,
    pub game: usize,
}

/// Every report of one match, oldest first. The last is the most recent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchGroup {
    pub competition: String,
    pub home_team: String,
    pub away_team: String,
    pub reports: Vec<MatchRef>,
    pub authorized: bool,
    pub problems: BTreeSet<Problem>,
}

impl MatchGroup {
    pub fn most_recent(&self) -> Option<MatchRef> {
        self.reports.last().copied()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Collation {
    pub groups: Vec<MatchGroup>,
    /// Fixture each accepted match was played as.
    pub matchesxref: BTreeMap<FixtureKey, MatchRef>,
    /// Accepted matches, ready to be stored.
    pub results: Vec<MatchRef>,
    pub not_on_fixture_list: Vec<MatchRef>,
    /// Unfinished game to played-on game and back; `None` when more than
    /// one played-on game claimed the same unfinished game.
    pub gamesxref: BTreeMap<GameRef, Option<GameRef>>,
    pub teamplayers: TeamPlayers,
    pub clubplayers: ClubPlayers,
}

impl Collation {
    /// Matches the update path stores: accepted results, whether or not they
    /// were on the fixture list.
    pub fn stored_matches(&self) -> &[MatchRef] {
        &self.results
    }
}

pub struct Collator<'a> {
    schedule: &'a Schedule,
    team_aliases: ValueMap,
    competition_aliases: ValueMap,
    authorization_delay_days: Option<i64>,
}

pub fn match_at(report: &Report, at: MatchRef) -> Option<&MatchReport> {
    report.sections.get(at.section)?.matches.get(at.index)
}

impl<'a> Collator<'a> {
    pub fn new(schedule: &'a Schedule, settings: &CollationSettings) -> Self {
        Self {
            schedule,
            team_aliases: ValueMap::default(),
            competition_aliases: ValueMap::default(),
            authorization_delay_days: settings.authorization_delay_days,
        }
    }

    pub fn with_aliases(mut self, teams: &ValueMap, competitions: &ValueMap) -> Self {
        self.team_aliases = teams.clone();
        self.competition_aliases = competitions.clone();
        self
    }

    pub fn with_authorization_delay(mut self, days: Option<i64>) -> Self {
        self.authorization_delay_days = days;
        self
    }

    /// Collate `report` against the schedule as of `now`.
    ///
    /// Data problems are appended to the report's diagnostics; the report's
    /// games are updated in place with played-on results, fixture dates and
    /// canonical players.
    pub fn collate(&self, report: &mut Report, now: NaiveDateTime) -> Collation {
        let mut collation = Collation {
            groups: self.group(report),
            ..Collation::default()
        };
        info!("  → Collating {} matches from {} reports", collation.groups.len(), report.match_count());

        let mut found = Vec::new();
        for group in collation.groups.iter_mut() {
            found.extend(self.check_group(report, group, now));
        }
        report.diagnostics.extend(found);

        self.cross_reference(report, &mut collation);
        self.played_on(report, &mut collation);
        self.round_dates(report);

        let identity = self.schedule.identity();
        let event = EventDetails {
            name: identity
                .as_ref()
                .map(|i| i.name.clone())
                .or_else(|| report.event_name.clone())
                .unwrap_or_default(),
            start_date: identity.as_ref().map(|i| i.start_date),
            end_date: identity.as_ref().map(|i| i.end_date),
        };
        players::unify_players(report, self.schedule, &event);
        let accepted: Vec<(usize, usize)> = collation.results.iter().map(|r| (r.section, r.index)).collect();
        let (teamplayers, clubplayers) = players::rosters(report, self.schedule, &accepted);
        collation.teamplayers = teamplayers;
        collation.clubplayers = clubplayers;

        info!(
            "  → Collated: {} accepted, {} not on fixture list, {} played-on links",
            collation.results.len(),
            collation.not_on_fixture_list.len(),
            collation.gamesxref.len()
        );
        if has_errors(&report.diagnostics) {
            warn!("Collation found {} problems", report.diagnostics.len());
        }
        collation
    }

    fn resolve_competition(&self, name: &str) -> String {
        self.competition_aliases.resolve(name)
    }

    fn resolve_team(&self, name: &str) -> String {
        self.team_aliases.resolve(name)
    }

    /// Group reports by competition and teams, in (order, source) order.
    /// Played-on reports are handled separately.
    fn group(&self, report: &Report) -> Vec<MatchGroup> {
        let mut groups: BTreeMap<(String, String, String), Vec<MatchRef>> = BTreeMap::new();
        for (section_index, section) in report.sections.iter().enumerate() {
            for (index, report_match) in section.matches.iter().enumerate() {
                if report_match.played_on {
                    continue;
                }
                let key = (
                    self.resolve_competition(&report_match.competition),
                    self.resolve_team(&report_match.home_team),
                    self.resolve_team(&report_match.away_team),
                );
                groups.entry(key).or_default().push(MatchRef {
                    section: section_index,
                    index,
                });
            }
        }
        groups
            .into_iter()
            .map(|((competition, home_team, away_team), mut reports)| {
                reports.sort_by_key(|at| {
                    match_at(report, *at).map(|m| (m.order, m.source.clone()))
                });
                MatchGroup {
                    competition,
                    home_team,
                    away_team,
                    reports,
                    authorized: false,
                    problems: BTreeSet::new(),
                }
            })
            .collect()
    }

    fn is_authorized(&self, reports: &[&MatchReport], now: NaiveDateTime) -> bool {
        let Some(days) = self.authorization_delay_days else {
            return true;
        };
        let cutoff = now - Duration::days(days);
        reports
            .iter()
            .any(|m| m.received.is_none_or(|received| received < cutoff))
    }

    fn check_group(&self, report: &Report, group: &mut MatchGroup, now: NaiveDateTime) -> Vec<Diagnostic> {
        let mut found = Vec::new();
        let reports: Vec<&MatchReport> = group.reports.iter().filter_map(|at| match_at(report, *at)).collect();
        let Some((latest, earlier)) = reports.split_last() else {
            return found;
        };
        let describe = format!("{} {} v {}", group.competition, group.home_team, group.away_team);

        if earlier.is_empty() {
            if !latest.is_score_consistent() {
                found.push(Diagnostic::warning(
                    Problem::OnlyReport,
                    &latest.tagger,
                    format!("{}: match score does not agree with the games", describe),
                ));
            }
        } else if !latest.is_score_consistent() {
            found.push(Diagnostic::error(
                Problem::MatchScore,
                &latest.tagger,
                format!("{}: most recent match score does not agree with the games", describe),
            ));
        } else if earlier.iter().any(|m| !m.is_score_consistent()) {
            found.push(Diagnostic::warning(
                Problem::MatchScore,
                &latest.tagger,
                format!("{}: an earlier report's match score did not agree with its games", describe),
            ));
        }

        for previous in earlier {
            if previous.games.len() != latest.games.len() {
                group.problems.insert(Problem::GameCount);
                found.push(Diagnostic::error(
                    Problem::GameCount,
                    &previous.tagger,
                    format!(
                        "{}: {} games from {} but {} from {}",
                        describe,
                        previous.games.len(),
                        previous.source,
                        latest.games.len(),
                        latest.source
                    ),
                ));
                continue;
            }
            for (index, old) in previous.games.iter().enumerate() {
                let new = old
                    .board
                    .as_ref()
                    .and_then(|board| latest.games.iter().find(|g| g.board.as_ref() == Some(board)))
                    .or_else(|| latest.games.get(index));
                let Some(new) = new else {
                    continue;
                };
                let mut problems = consistency::game_problems(report, new, old);
                problems.remove(&Problem::Source);
                for problem in problems {
                    group.problems.insert(problem);
                    found.push(Diagnostic::error(
                        problem,
                        &old.tagger,
                        format!(
                            "{}: board {} from {} disagrees with {}",
                            describe,
                            old.board.as_deref().unwrap_or("?"),
                            previous.source,
                            latest.source
                        ),
                    ));
                }
            }
        }

        group.authorized = self.is_authorized(&reports, now);
        if !group.authorized {
            group.problems.insert(Problem::Authorization);
            found.push(Diagnostic::error(
                Problem::Authorization,
                &latest.tagger,
                format!("{}: no report received long enough ago", describe),
            ));
        }
        group
            .problems
            .extend(found.iter().filter(|d| d.severity == Severity::Error).map(|d| d.problem));
        debug!("{} reports of {}: {:?}", reports.len(), describe, group.problems);
        found
    }

    /// Link each problem-free match to the first unused fixture, by date.
    fn cross_reference(&self, report: &mut Report, collation: &mut Collation) {
        let fixtures = self.schedule.fixtures();
        let mut used = BTreeSet::new();
        let mut unlisted = Vec::new();
        for group in &collation.groups {
            if !group.problems.is_empty() {
                continue;
            }
            let Some(latest) = group.most_recent() else {
                continue;
            };
            let fixture = fixtures.iter().find(|f| {
                !used.contains(&f.key())
                    && self.resolve_competition(&f.competition) == group.competition
                    && self.resolve_team(&f.home_team) == group.home_team
                    && self.resolve_team(&f.away_team) == group.away_team
            });
            collation.results.push(latest);
            match fixture {
                Some(fixture) => {
                    used.insert(fixture.key());
                    collation.matchesxref.insert(fixture.key(), latest);
                    if let Some(report_match) = report
                        .sections
                        .get_mut(latest.section)
                        .and_then(|s| s.matches.get_mut(latest.index))
                    {
                        report_match.date.get_or_insert(fixture.date);
                    }
                }
                None => {
                    collation.not_on_fixture_list.push(latest);
                    if let Some(report_match) = match_at(report, latest) {
                        unlisted.push(Diagnostic::warning(
                            Problem::NotOnFixtureList,
                            &report_match.tagger,
                            format!(
                                "{} {} v {} was played but is not on the fixture list",
                                group.competition, group.home_team, group.away_team
                            ),
                        ));
                    }
                }
            }
        }
        report.diagnostics.extend(unlisted);
    }

    /// Match the games of played-on reports to the unfinished games of the
    /// most recent report of the same match, and apply their results.
    fn played_on(&self, report: &mut Report, collation: &mut Collation) {
        let mut found = Vec::new();
        let mut updates: Vec<(GameRef, Score)> = Vec::new();
        for (section_index, section) in report.sections.iter().enumerate() {
            for (match_index, played_on) in section.matches.iter().enumerate() {
                if !played_on.played_on {
                    continue;
                }
                let key = (
                    self.resolve_competition(&played_on.competition),
                    self.resolve_team(&played_on.home_team),
                    self.resolve_team(&played_on.away_team),
                );
                let latest = collation
                    .groups
                    .iter()
                    .find(|g| (g.competition.as_str(), g.home_team.as_str(), g.away_team.as_str()) == (key.0.as_str(), key.1.as_str(), key.2.as_str()))
                    .and_then(MatchGroup::most_recent);

                for (game_index, game) in played_on.games.iter().enumerate() {
                    let here = GameRef {
                        section: section_index,
                        match_index,
                        game: game_index,
                    };
                    let names = (report.player_name(game.home_player), report.player_name(game.away_player));
                    let candidate = latest.and_then(|at| {
                        let unfinished = match_at(report, at)?;
                        unfinished.games.iter().position(|g| {
                            g.is_unfinished()
                                && (report.player_name(g.home_player), report.player_name(g.away_player)) == names
                        })
                        .map(|game| GameRef {
                            section: at.section,
                            match_index: at.index,
                            game,
                        })
                    });
                    let Some(unfinished) = candidate else {
                        found.push(Diagnostic::error(
                            Problem::UnmatchedPlayedOn,
                            &game.tagger,
                            format!("{} v {} matches no unfinished game", names.0, names.1),
                        ));
                        continue;
                    };
                    match collation.gamesxref.get(&unfinished) {
                        Some(_) => {
                            collation.gamesxref.insert(unfinished, None);
                            found.push(Diagnostic::error(
                                Problem::AmbiguousPlayedOn,
                                &game.tagger,
                                format!("{} v {} was played on more than once", names.0, names.1),
                            ));
                        }
                        None => {
                            collation.gamesxref.insert(unfinished, Some(here));
                            collation.gamesxref.insert(here, Some(unfinished));
                            if let Some(result) = game.result.filter(|r| !r.is_unfinished()) {
                                updates.push((unfinished, result));
                            }
                        }
                    }
                }
            }
        }

        let ambiguous: BTreeSet<GameRef> = collation
            .gamesxref
            .iter()
            .filter(|(_, target)| target.is_none())
            .map(|(game, _)| *game)
            .collect();
        for (at, result) in updates {
            if ambiguous.contains(&at) {
                continue;
            }
            if let Some(game) = report
                .sections
                .get_mut(at.section)
                .and_then(|s| s.matches.get_mut(at.match_index))
                .and_then(|m| m.games.get_mut(at.game))
            {
                debug!("Played-on result {} applied", result);
                game.result = Some(result);
            }
        }
        report.diagnostics.extend(found);
    }

    /// Date swiss and all-play-all games from the schedule's round dates and
    /// report rounds the schedule does not have.
    fn round_dates(&self, report: &mut Report) {
        let mut found = Vec::new();
        for section in report.sections.iter_mut().filter(|s| s.section_type.has_cards()) {
            let Some(scheduled) = self.schedule.section(&section.name) else {
                continue;
            };
            if scheduled.round_dates.is_empty() {
                continue;
            }
            for game in section.games.iter_mut() {
                let Some(round) = game.round else {
                    continue;
                };
                match scheduled.round_dates.get(&round) {
                    Some(date) => {
                        game.date.get_or_insert(*date);
                    }
                    None => found.push(Diagnostic::error(
                        Problem::RoundOutOfRange,
                        &game.tagger,
                        format!("round {} is not in the schedule of {}", round, section.name),
                    )),
                }
            }
        }
        report.diagnostics.extend(found);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::parse_report;
    use crate::schedule::parse_schedule;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 11, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap()
    }

    const SCHEDULE: &str = "My League 2024
2024-09-01 2024-12-31
league Division 1
Toytown A    Toytown
Anytown B    Anytown
matches
2024-10-05   Toytown A    Anytown B
";

    fn collate(results: &str) -> (Report, Collation) {
        let schedule = parse_schedule("schedule", SCHEDULE);
        let mut report = parse_report("results", results);
        let collation = Collator::new(&schedule, &CollationSettings::default()).collate(&mut report, now());
        (report, collation)
    }

    fn problems(report: &Report) -> Vec<Problem> {
        report.diagnostics.iter().map(|d| d.problem).collect()
    }

    #[test]
    fn test_duplicate_reports_merge_into_latest() {
        let (report, collation) = collate(
            "My League 2024
league Division 1
source email1
Toytown A 1-0 Anytown B
1 Smith 1-0 Jones
2 Brown unfinished Green
source email2
Toytown A 1-1 Anytown B
1 Smith 1-0 Jones
2 Brown 0-1 Green
",
        );
        assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
        assert_eq!(collation.groups.len(), 1);
        assert_eq!(collation.groups[0].reports.len(), 2);
        let latest = collation.results[0];
        let merged = match_at(&report, latest).unwrap();
        assert_eq!(merged.source, "email2");
        assert_eq!(merged.games[1].result, Some(Score::AwayWin));
        assert_eq!(merged.date, NaiveDate::from_ymd_opt(2024, 10, 5));
        assert_eq!(collation.matchesxref.len(), 1);
    }

    #[test]
    fn test_disagreeing_reports() {
        let (report, collation) = collate(
            "My League 2024
league Division 1
source email1
Toytown A 1-0 Anytown B
1 Smith 1-0 Jones
2 Brown 0-1 Green
source email2
Toytown A 1-1 Anytown B
1 Smith 1-0 Jones
2 Brown 0-1 Green
3 Grey draw Pink
",
        );
        assert!(problems(&report).contains(&Problem::GameCount));
        assert!(collation.results.is_empty());
        assert!(collation.matchesxref.is_empty());
    }

    #[test]
    fn test_result_conflict_and_only_report() {
        let (report, _) = collate(
            "My League 2024
league Division 1
source email1
Toytown A 1-0 Anytown B
1 Smith 1-0 Jones
source email2
Toytown A 0-1 Anytown B
1 Smith 0-1 Jones
Anytown B 2-0 Toytown A
1 Jones 1-0 Smith
",
        );
        let problems = problems(&report);
        assert!(problems.contains(&Problem::Result));
        assert!(problems.contains(&Problem::OnlyReport));
        assert!(problems.contains(&Problem::NotOnFixtureList));
    }

    #[test]
    fn test_authorization_delay() {
        let results = "My League 2024
league Division 1
source email1
dates 2024-10-30T10:00:00
Toytown A 1-0 Anytown B
1 Smith 1-0 Jones
";
        let (report, collation) = collate(results);
        assert_eq!(problems(&report), vec![Problem::Authorization]);
        assert!(!collation.groups[0].authorized);

        let schedule = parse_schedule("schedule", SCHEDULE);
        let mut report = parse_report("results", results);
        let collation = Collator::new(&schedule, &CollationSettings::default())
            .with_authorization_delay(Some(1))
            .collate(&mut report, now());
        assert!(collation.groups[0].authorized);
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn test_played_on_games() {
        let (report, collation) = collate(
            "My League 2024
league Division 1
source email1
Toytown A 1-0 Anytown B
1 Smith 1-0 Jones
2 Brown unfinished Green
source email2
played_on
Toytown A 1-0 Anytown B
2 Brown draw Green
played_on
Toytown A 1-0 Anytown B
1 Grey 1-0 Pink
",
        );
        assert_eq!(problems(&report), vec![Problem::UnmatchedPlayedOn]);
        let unfinished = GameRef { section: 0, match_index: 0, game: 1 };
        let played = GameRef { section: 0, match_index: 1, game: 0 };
        assert_eq!(collation.gamesxref.get(&unfinished), Some(&Some(played)));
        assert_eq!(collation.gamesxref.get(&played), Some(&Some(unfinished)));
        assert_eq!(report.sections[0].matches[0].games[1].result, Some(Score::Draw));
    }

    #[test]
    fn test_ambiguous_played_on() {
        let (report, collation) = collate(
            "My League 2024
league Division 1
Toytown A 1-0 Anytown B
1 Smith 1-0 Jones
2 Brown unfinished Green
played_on
Toytown A 1-0 Anytown B
2 Brown draw Green
played_on
Toytown A 1-0 Anytown B
2 Brown 1-0 Green
",
        );
        assert_eq!(problems(&report), vec![Problem::AmbiguousPlayedOn]);
        let unfinished = GameRef { section: 0, match_index: 0, game: 1 };
        assert_eq!(collation.gamesxref.get(&unfinished), Some(&None));
        assert_eq!(report.sections[0].matches[0].games[1].result, Some(Score::Unfinished));
    }

    #[test]
    fn test_swiss_rounds_take_schedule_dates() {
        let schedule = parse_schedule(
            "schedule",
            "Open\n2024-10-01 2024-10-31\nswiss Open\n1 2024-10-01\nplayers\n1 Alice\n2 Bob\n3 Carol\n",
        );
        let mut report = parse_report("results", "Open\nswiss Open\n1 b2+ w3=\n2 w1-\n");
        Collator::new(&schedule, &CollationSettings::default()).collate(&mut report, now());
        let games = &report.sections[0].games;
        assert_eq!(games[0].date, NaiveDate::from_ymd_opt(2024, 10, 1));
        assert_eq!(problems(&report), vec![Problem::RoundOutOfRange]);
    }
}
