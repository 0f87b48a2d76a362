//! Replacing an event's records with a collated report.

use anyhow::{anyhow, bail, Context, Result};
use log::{error, info};
use serde::Serialize;
use std::collections::HashMap;

use super::adapter::{AliasRecord, EventRecord, GameRecord, PlayerRecord, Record, RecordFile, ResultsStore};
use crate::collation::{match_at, Collation};
use crate::domain::{Diagnostic, EventIdentity, Game, MatchReport, PlayerId};
use crate::report::Report;
use crate::schedule::Schedule;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateSummary {
    pub event_id: i64,
    pub replaced_events: usize,
    pub players: usize,
    pub games: usize,
}

/// Store the collated event, replacing any event with the same identity.
///
/// Nothing is written while the schedule or report lists any problem,
/// warnings included. All writes
/// happen in one transaction, backed out if any of them fails.
pub fn update_event<S: ResultsStore>(
    store: &mut S,
    schedule: &Schedule,
    report: &Report,
    collation: &Collation,
) -> Result<UpdateSummary> {
    let problems: Vec<&Diagnostic> = schedule.diagnostics.iter().chain(report.diagnostics.iter()).collect();
    if !problems.is_empty() {
        let errors = problems.iter().filter(|d| d.is_error()).count();
        bail!(
            "Update abandoned: {} problems must be fixed first ({} errors, {} warnings)",
            problems.len(),
            errors,
            problems.len() - errors
        );
    }
    let identity = schedule
        .identity()
        .ok_or_else(|| anyhow!("Update abandoned: the schedule has no event name and dates"))?;

    store.start_transaction()?;
    match replace_event(store, &identity, schedule, report, collation) {
        Ok(summary) => {
            store.commit()?;
            info!(
                "  → Stored {}: {} players, {} games",
                identity, summary.players, summary.games
            );
            Ok(summary)
        }
        Err(e) => {
            error!("Update of {} failed, backing out: {:#}", identity, e);
            store.backout().context("Failed to back out after a failed update")?;
            Err(e)
        }
    }
}

struct EventWriter<'a, S: ResultsStore> {
    store: &'a mut S,
    report: &'a Report,
    event_id: i64,
    players: HashMap<PlayerId, i64>,
    games: usize,
}

impl<S: ResultsStore> EventWriter<'_, S> {
    fn player(&mut self, id: Option<PlayerId>) -> Result<Option<i64>> {
        let Some(id) = id else {
            return Ok(None);
        };
        if let Some(stored) = self.players.get(&id) {
            return Ok(Some(*stored));
        }
        let Some(player) = self.report.player(id) else {
            return Ok(None);
        };
        let record = PlayerRecord {
            event_id: self.event_id,
            name: player.name.clone(),
            club: player.club.clone(),
            section: player.section.clone(),
            pin: player.pin,
            affiliation: player.affiliation.clone(),
            codes: player.reported_codes.iter().cloned().collect::<Vec<_>>().join(" "),
        };
        let stored = self.store.put_record(&Record::Player(record))?;
        self.players.insert(id, stored);
        Ok(Some(stored))
    }

    fn game(&mut self, section: &str, owner: Option<&MatchReport>, game: &Game) -> Result<()> {
        let record = GameRecord {
            event_id: self.event_id,
            section: section.to_string(),
            competition: owner.map(|m| m.competition.clone()),
            home_team: owner.map(|m| m.home_team.clone()),
            away_team: owner.map(|m| m.away_team.clone()),
            board: game.board.clone(),
            round: game.round,
            date: game.date.or(owner.and_then(|m| m.date)),
            home_player_id: self.player(game.home_player)?,
            away_player_id: self.player(game.away_player)?,
            result: game.result.map(|r| r.token()).unwrap_or_default(),
            home_player_white: game.home_player_white,
            grading_only: game.grading_only,
            source: owner.map(|m| m.source.clone()),
        };
        self.store.put_record(&Record::Game(record))?;
        self.games += 1;
        Ok(())
    }
}

fn replace_event<S: ResultsStore>(
    store: &mut S,
    identity: &EventIdentity,
    schedule: &Schedule,
    report: &Report,
    collation: &Collation,
) -> Result<UpdateSummary> {
    let existing = store.get_events_matching_event_identity(identity)?;
    for event_id in &existing.ids {
        for game_id in store.get_games_for_event(*event_id)?.ids {
            store.delete_record(RecordFile::Game, game_id)?;
        }
        for alias_id in store.get_aliases_for_event(*event_id)?.ids {
            store.delete_record(RecordFile::Alias, alias_id)?;
        }
        store.delete_record(RecordFile::Event, *event_id)?;
    }
    if !existing.is_empty() {
        info!("  → Removed {} earlier copies of {}", existing.len(), identity);
    }

    let event_id = store.put_record(&Record::Event(EventRecord::from(identity)))?;
    for section in &schedule.sections {
        for team in &section.teams {
            if let Some(club) = &team.club {
                let alias = AliasRecord {
                    event_id,
                    kind: "club".to_string(),
                    alias: team.name.clone(),
                    value: club.clone(),
                };
                store.put_record(&Record::Alias(alias))?;
            }
        }
    }

    let mut writer = EventWriter {
        store,
        report,
        event_id,
        players: HashMap::new(),
        games: 0,
    };
    for at in collation.stored_matches() {
        let Some(report_match) = match_at(report, *at) else {
            continue;
        };
        let section = &report.sections[at.section].name;
        for game in &report_match.games {
            writer.game(section, Some(report_match), game)?;
        }
    }
    for section in &report.sections {
        for game in &section.games {
            writer.game(&section.name, None, game)?;
        }
    }

    Ok(UpdateSummary {
        event_id,
        replaced_events: existing.len(),
        players: writer.players.len(),
        games: writer.games,
    })
}
