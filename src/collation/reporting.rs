//! Validation report text and the JSON summary of a collated event.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

use super::{match_at, Collation, MatchRef};
use crate::domain::{Diagnostic, EventIdentity, Game, MatchReport, Problem, Severity};
use crate::report::Report;
use crate::schedule::Schedule;

fn game_line(report: &Report, game: &Game) -> String {
    let mut line = String::new();
    if let Some(board) = &game.board {
        let _ = write!(line, "{} ", board);
    }
    if let Some(round) = game.round {
        let _ = write!(line, "r{} ", round);
    }
    let result = game.result.map(|r| r.token()).unwrap_or_else(|| "?".to_string());
    let _ = write!(
        line,
        "{} {} {}",
        report.player_name(game.home_player),
        result,
        report.player_name(game.away_player)
    );
    if game.grading_only {
        line.push_str(" gradingonly");
    }
    line.trim_end().to_string()
}

fn match_block(out: &mut String, report: &Report, report_match: &MatchReport, label: &str) {
    let _ = writeln!(
        out,
        "  {} ({}): {} {} {}",
        label,
        report_match.source,
        report_match.home_team,
        report_match.header_score().token(),
        report_match.away_team
    );
    for game in &report_match.games {
        let _ = writeln!(out, "    {}", game_line(report, game));
    }
}

fn diagnostic_line(out: &mut String, diagnostic: &Diagnostic, texts: &BTreeMap<String, String>) {
    let _ = writeln!(out, "{}", diagnostic);
    let excerpt = texts
        .get(&diagnostic.tagger.source)
        .map(|text| diagnostic.tagger.excerpt(text).trim())
        .unwrap_or_default();
    if !excerpt.is_empty() {
        let _ = writeln!(out, "    | {}", excerpt);
    }
}

/// Human-readable report of everything wrong with an event.
///
/// `texts` maps each source name to the text its taggers point into, so
/// each diagnostic can quote the offending line.
pub fn validation_report(
    schedule: &Schedule,
    report: &Report,
    collation: &Collation,
    texts: &BTreeMap<String, String>,
) -> String {
    let mut out = String::new();
    let title = schedule
        .identity()
        .map(|identity| identity.to_string())
        .or_else(|| report.event_name.clone())
        .unwrap_or_else(|| "Unnamed event".to_string());
    let _ = writeln!(out, "Validation of {}", title);
    let _ = writeln!(
        out,
        "{} matches, {} games, {} players",
        report.match_count(),
        report.game_count(),
        report.players.len()
    );

    let diagnostics: Vec<&Diagnostic> = schedule.diagnostics.iter().chain(report.diagnostics.iter()).collect();
    let errors = diagnostics.iter().filter(|d| d.severity == Severity::Error).count();
    let _ = writeln!(out, "{} errors, {} warnings", errors, diagnostics.len() - errors);

    if !diagnostics.is_empty() {
        let _ = writeln!(out, "\nProblems");
        for diagnostic in &diagnostics {
            diagnostic_line(&mut out, diagnostic, texts);
        }
    }

    let problem_groups: Vec<_> = collation.groups.iter().filter(|g| !g.problems.is_empty()).collect();
    if !problem_groups.is_empty() {
        let _ = writeln!(out, "\nMatches with problems");
        for group in problem_groups {
            let problems: Vec<&str> = group.problems.iter().map(Problem::tag).collect();
            let _ = writeln!(
                out,
                "{} {} v {}: {}",
                group.competition,
                group.home_team,
                group.away_team,
                problems.join(", ")
            );
            if let Some((latest, earlier)) = group.reports.split_last() {
                if let Some(report_match) = match_at(report, *latest) {
                    match_block(&mut out, report, report_match, "most recent");
                }
                for at in earlier.iter().rev() {
                    if let Some(report_match) = match_at(report, *at) {
                        match_block(&mut out, report, report_match, "earlier");
                    }
                }
            }
        }
    }

    if !collation.not_on_fixture_list.is_empty() {
        let _ = writeln!(out, "\nPlayed but not on the fixture list");
        for at in &collation.not_on_fixture_list {
            if let Some(m) = match_at(report, *at) {
                let date = m.date.map(|d| d.to_string()).unwrap_or_default();
                let _ = writeln!(out, "  {} {} v {} {}", m.competition, m.home_team, m.away_team, date);
            }
        }
    }
    out
}

#[derive(Debug, Clone, Serialize)]
pub struct GameSummary {
    pub board: Option<String>,
    pub round: Option<u32>,
    pub date: Option<chrono::NaiveDate>,
    pub home_player: String,
    pub away_player: String,
    pub result: Option<String>,
    pub home_player_white: Option<bool>,
    pub grading_only: bool,
}

impl GameSummary {
    fn new(report: &Report, game: &Game) -> Self {
        Self {
            board: game.board.clone(),
            round: game.round,
            date: game.date,
            home_player: report.player_name(game.home_player).to_string(),
            away_player: report.player_name(game.away_player).to_string(),
            result: game.result.map(|r| r.token()),
            home_player_white: game.home_player_white,
            grading_only: game.grading_only,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchSummary {
    pub competition: String,
    pub home_team: String,
    pub away_team: String,
    pub score: String,
    pub date: Option<chrono::NaiveDate>,
    pub source: String,
    pub on_fixture_list: bool,
    pub games: Vec<GameSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionSummary {
    pub name: String,
    pub section_type: String,
    pub games: Vec<GameSummary>,
}

/// Accepted results of a collated event, as emitted by `validate --json`.
#[derive(Debug, Clone, Serialize)]
pub struct EventSummary {
    pub event: Option<EventIdentity>,
    pub matches: Vec<MatchSummary>,
    pub sections: Vec<SectionSummary>,
    pub players: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl EventSummary {
    pub fn new(schedule: &Schedule, report: &Report, collation: &Collation) -> Self {
        let unlisted = |at: &MatchRef| collation.not_on_fixture_list.contains(at);
        let matches = collation
            .results
            .iter()
            .filter_map(|at| {
                let m = match_at(report, *at)?;
                Some(MatchSummary {
                    competition: m.competition.clone(),
                    home_team: m.home_team.clone(),
                    away_team: m.away_team.clone(),
                    score: m.header_score().token(),
                    date: m.date,
                    source: m.source.clone(),
                    on_fixture_list: !unlisted(at),
                    games: m.games.iter().map(|g| GameSummary::new(report, g)).collect(),
                })
            })
            .collect();
        let sections = report
            .sections
            .iter()
            .filter(|s| !s.games.is_empty())
            .map(|s| SectionSummary {
                name: s.name.clone(),
                section_type: s.section_type.keyword().to_string(),
                games: s.games.iter().map(|g| GameSummary::new(report, g)).collect(),
            })
            .collect();
        let mut players: Vec<String> = collation
            .clubplayers
            .values()
            .flat_map(|players| players.keys().map(|p| p.name.clone()))
            .chain(report.sections.iter().flat_map(|s| {
                s.games
                    .iter()
                    .flat_map(|g| [g.home_player, g.away_player])
                    .map(|id| report.player_name(id).to_string())
            }))
            .filter(|name| !name.is_empty())
            .collect();
        players.sort();
        players.dedup();
        Self {
            event: schedule.identity(),
            matches,
            sections,
            players,
            diagnostics: schedule
                .diagnostics
                .iter()
                .chain(report.diagnostics.iter())
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collation::Collator;
    use crate::config::CollationSettings;
    use crate::report::parse_report;
    use crate::schedule::parse_schedule;
    use chrono::NaiveDate;

    const SCHEDULE: &str = "My League 2024\n2024-09-01 2024-12-31\nleague Division 1\nToytown A    Toytown\nAnytown B    Anytown\nmatches\n2024-10-05   Toytown A    Anytown B\n";

    fn collated(results: &str) -> (Schedule, Report, Collation, BTreeMap<String, String>) {
        let schedule = parse_schedule("schedule", SCHEDULE);
        let mut report = parse_report("results", results);
        let now = NaiveDate::from_ymd_opt(2024, 11, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        let collation = Collator::new(&schedule, &CollationSettings::default()).collate(&mut report, now);
        let texts = BTreeMap::from([
            ("schedule".to_string(), SCHEDULE.to_string()),
            ("results".to_string(), results.to_string()),
        ]);
        (schedule, report, collation, texts)
    }

    #[test]
    fn test_report_quotes_problem_lines() {
        let results = "My League 2024\nleague Division 1\nsource email1\nToytown A 1-0 Anytown B\n1 Smith 1-0 Jones\nsource email2\nToytown A 0-1 Anytown B\n1 Smith 0-1 Jones\n";
        let (schedule, report, collation, texts) = collated(results);
        let text = validation_report(&schedule, &report, &collation, &texts);

        assert!(text.starts_with("Validation of My League 2024 2024-09-01 2024-12-31\n"));
        assert!(text.contains("| 1 Smith 1-0 Jones"));
        assert!(text.contains("Matches with problems"));
        assert!(text.contains("  most recent (email2): Toytown A 0-1 Anytown B"));
        assert!(text.contains("  earlier (email1): Toytown A 1-0 Anytown B"));
    }

    #[test]
    fn test_clean_event_summary() {
        let results = "My League 2024\nleague Division 1\nToytown A 1-0 Anytown B\n1 Smith 1-0 Jones\n";
        let (schedule, report, collation, texts) = collated(results);
        let text = validation_report(&schedule, &report, &collation, &texts);
        assert!(text.contains("0 errors, 0 warnings"));
        assert!(!text.contains("Problems"));

        let summary = EventSummary::new(&schedule, &report, &collation);
        assert_eq!(summary.matches.len(), 1);
        assert!(summary.matches[0].on_fixture_list);
        assert_eq!(summary.matches[0].games[0].result.as_deref(), Some("1-0"));
        assert_eq!(summary.players, vec!["Jones".to_string(), "Smith".to_string()]);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["matches"][0]["home_team"], "Toytown A");
    }
}
