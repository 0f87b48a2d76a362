//! Comparison of a game with an earlier report of the same game.

use std::collections::BTreeSet;

use crate::domain::{Game, Problem, UnfinishedContext};
use crate::report::Report;

/// Fields on which `latest` disagrees with `earlier`.
///
/// A field only counts when the earlier report said something about it, and
/// an earlier `unfinished` result is superseded by any later result.
pub fn game_problems(report: &Report, latest: &Game, earlier: &Game) -> BTreeSet<Problem> {
    let mut problems = BTreeSet::new();
    let names = |game: &Game| {
        (
            report.player_name(game.home_player),
            report.player_name(game.away_player),
        )
    };
    let (home, away) = names(latest);
    let (earlier_home, earlier_away) = names(earlier);

    if home != earlier_home && !earlier_home.is_empty() {
        problems.insert(Problem::HomePlayer);
    }
    if away != earlier_away && !earlier_away.is_empty() {
        problems.insert(Problem::AwayPlayer);
    }
    if latest.home_player_white != earlier.home_player_white && earlier.home_player_white.is_some() {
        problems.insert(Problem::HomePlayerWhite);
    }
    if latest.result != earlier.result && earlier.result.is_some() && !earlier.is_unfinished() {
        problems.insert(Problem::Result);
    }
    if latest.board != earlier.board && earlier.board.is_some() {
        problems.insert(Problem::Board);
    }
    if latest.grading_only != earlier.grading_only {
        problems.insert(Problem::GradingOnly);
    }
    if latest.round != earlier.round && earlier.round.is_some() {
        problems.insert(Problem::Round);
    }
    if let (Some(latest), Some(earlier)) = (&latest.unfinished, &earlier.unfinished) {
        problems.extend(context_problems(latest, earlier));
    }
    problems
}

/// Fields on which two unfinished-game contexts disagree.
pub fn context_problems(a: &UnfinishedContext, b: &UnfinishedContext) -> BTreeSet<Problem> {
    [
        (a.source != b.source, Problem::Source),
        (a.section != b.section, Problem::Section),
        (a.competition != b.competition, Problem::Competition),
        (a.home_team != b.home_team, Problem::HomeTeam),
        (a.away_team != b.away_team, Problem::AwayTeam),
    ]
    .into_iter()
    .filter(|(differs, _)| *differs)
    .map(|(_, problem)| problem)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Player, Score};

    fn report() -> (Report, Game, Game) {
        let mut report = Report::default();
        let smith = report.add_player(Player::new("Smith"));
        let jones = report.add_player(Player::new("Jones"));
        let earlier = Game {
            home_player: Some(smith),
            away_player: Some(jones),
            result: Some(Score::Unfinished),
            board: Some("3".to_string()),
            ..Game::default()
        };
        let latest = Game {
            result: Some(Score::AwayWin),
            ..earlier.clone()
        };
        (report, latest, earlier)
    }

    #[test]
    fn test_finished_result_supersedes_unfinished() {
        let (report, latest, earlier) = report();
        assert!(game_problems(&report, &latest, &earlier).is_empty());
        assert_eq!(
            game_problems(&report, &earlier, &latest),
            BTreeSet::from([Problem::Result])
        );
    }

    #[test]
    fn test_missing_earlier_fields_are_not_problems() {
        let (mut report, mut latest, mut earlier) = report();
        earlier.away_player = None;
        earlier.board = None;
        latest.home_player_white = Some(true);
        assert!(game_problems(&report, &latest, &earlier).is_empty());

        let brown = report.add_player(Player::new("Brown"));
        latest.home_player = Some(brown);
        latest.grading_only = true;
        assert_eq!(
            game_problems(&report, &latest, &earlier),
            BTreeSet::from([Problem::HomePlayer, Problem::GradingOnly])
        );
    }

    #[test]
    fn test_context_problems() {
        let a = UnfinishedContext {
            source: "email1".to_string(),
            section: "Division 1".to_string(),
            competition: "Division 1".to_string(),
            home_team: "Toytown A".to_string(),
            away_team: "Anytown B".to_string(),
        };
        let b = UnfinishedContext {
            source: "email2".to_string(),
            away_team: "Anytown C".to_string(),
            ..a.clone()
        };
        assert_eq!(
            context_problems(&a, &b),
            BTreeSet::from([Problem::Source, Problem::AwayTeam])
        );
    }
}
