//! One canonical player per identity, and the rosters built from them.

use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::domain::{MatchKey, PlayerId, PlayerIdentity};
use crate::report::Report;
use crate::schedule::Schedule;

/// Club a team belongs to: the division's entry, else the team name without
/// a trailing single-letter team suffix (`Toytown A` is `Toytown`).
pub fn club_of_team(schedule: &Schedule, team: &str) -> String {
    if let Some(club) = schedule.club_of_team(team) {
        return club.to_string();
    }
    match team.trim().rsplit_once(' ') {
        Some((club, suffix)) if suffix.chars().count() == 1 && suffix.chars().all(char::is_alphabetic) => {
            club.trim().to_string()
        }
        _ => team.trim().to_string(),
    }
}

/// Where a player appeared: the team and club for match games, the section
/// for everything else.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Seat {
    Team { team: String, club: String },
    Section(String),
}

/// Event details copied onto every player.
pub struct EventDetails {
    pub name: String,
    pub start_date: Option<chrono::NaiveDate>,
    pub end_date: Option<chrono::NaiveDate>,
}

fn seats(report: &Report, schedule: &Schedule) -> Vec<(PlayerId, Seat)> {
    let mut seats = Vec::new();
    for section in &report.sections {
        for report_match in &section.matches {
            let home = Seat::Team {
                team: report_match.home_team.clone(),
                club: club_of_team(schedule, &report_match.home_team),
            };
            let away = Seat::Team {
                team: report_match.away_team.clone(),
                club: club_of_team(schedule, &report_match.away_team),
            };
            for game in &report_match.games {
                seats.extend(game.home_player.map(|id| (id, home.clone())));
                seats.extend(game.away_player.map(|id| (id, away.clone())));
            }
        }
        for game in &section.games {
            for id in [game.home_player, game.away_player].into_iter().flatten() {
                seats.push((id, Seat::Section(section.name.clone())));
            }
        }
    }
    seats
}

/// Enrich every referenced player and point each game at the first player
/// seen with the same identity. Reported codes are merged into that player.
pub fn unify_players(report: &mut Report, schedule: &Schedule, event: &EventDetails) {
    for (id, seat) in seats(report, schedule) {
        let Some(player) = report.players.get_mut(id.0) else {
            continue;
        };
        player.event = event.name.clone();
        player.start_date = event.start_date;
        player.end_date = event.end_date;
        match seat {
            Seat::Team { club, .. } => {
                player.affiliation = Some(club.clone());
                player.club = Some(club);
            }
            Seat::Section(section) => {
                if let Some(listed) = player
                    .pin
                    .and_then(|pin| schedule.section(&section)?.players.get(&pin))
                {
                    if !listed.name.is_empty() {
                        player.name = listed.name.clone();
                    }
                    player.reported_codes.extend(listed.codes.iter().cloned());
                }
                player.affiliation = Some(section.clone());
                player.section = Some(section);
            }
        }
    }

    let mut canonical: HashMap<PlayerIdentity, PlayerId> = HashMap::new();
    let mut rewrite: HashMap<PlayerId, PlayerId> = HashMap::new();
    for index in 0..report.players.len() {
        let identity = report.players[index].identity();
        let id = PlayerId(index);
        let first = *canonical.entry(identity).or_insert(id);
        if first != id {
            rewrite.insert(id, first);
            let codes = std::mem::take(&mut report.players[index].reported_codes);
            report.players[first.0].reported_codes.extend(codes);
        }
    }

    let resolve = |id: &mut Option<PlayerId>| {
        if let Some(target) = id.and_then(|current| rewrite.get(&current)) {
            *id = Some(*target);
        }
    };
    for section in report.sections.iter_mut() {
        for game in section
            .matches
            .iter_mut()
            .flat_map(|m| m.games.iter_mut())
            .chain(section.games.iter_mut())
        {
            resolve(&mut game.home_player);
            resolve(&mut game.away_player);
        }
    }
    debug!("Player aliases rewritten: {}", rewrite.len());
    info!("  → Unified {} player references into {} players", report.players.len(), canonical.len());
}

/// Matches each player appeared in, per team.
pub type TeamPlayers = BTreeMap<String, BTreeMap<PlayerIdentity, Vec<MatchKey>>>;
/// Reported codes of each player, per club.
pub type ClubPlayers = BTreeMap<String, BTreeMap<PlayerIdentity, BTreeSet<String>>>;

/// Rosters over the given matches, addressed by section and match index.
pub fn rosters(report: &Report, schedule: &Schedule, matches: &[(usize, usize)]) -> (TeamPlayers, ClubPlayers) {
    let mut teamplayers = TeamPlayers::new();
    let mut clubplayers = ClubPlayers::new();
    for &(section, index) in matches {
        let Some(report_match) = report.sections.get(section).and_then(|s| s.matches.get(index)) else {
            continue;
        };
        for game in &report_match.games {
            let sides = [
                (game.home_player, &report_match.home_team),
                (game.away_player, &report_match.away_team),
            ];
            for (id, team) in sides {
                let Some(player) = id.and_then(|id| report.player(id)) else {
                    continue;
                };
                let identity = player.identity();
                let appearances = teamplayers
                    .entry(team.clone())
                    .or_default()
                    .entry(identity.clone())
                    .or_default();
                if !appearances.contains(&report_match.key()) {
                    appearances.push(report_match.key());
                }
                clubplayers
                    .entry(club_of_team(schedule, team))
                    .or_default()
                    .entry(identity)
                    .or_default()
                    .extend(player.reported_codes.iter().cloned());
            }
        }
    }
    (teamplayers, clubplayers)
}
