use chrono::{NaiveDate, NaiveDateTime};

use chess_results::classifier::{Classifier, CompetitionNames, Found};
use chess_results::collation::{match_at, validation_report, Collator};
use chess_results::config::{AppConfig, CollationSettings, EventConfig, ParserSettings};
use chess_results::domain::{Problem, Score, Tagger};
use chess_results::names::{Disambiguator, KeepLongNames};
use chess_results::report::{parse_report, Report};
use chess_results::schedule::{parse_schedule, Schedule};
use chess_results::services::ingestion::SourceDocument;
use chess_results::services::processing::ProcessingService;

const LEAGUE_SCHEDULE: &str = "My League 2024
2024-09-01 2024-12-31
league Division 1
Toytown A    Toytown
Anytown B    Anytown
matches
2024-10-05   Toytown A    Anytown B
";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn now() -> NaiveDateTime {
    date(2024, 11, 1).and_hms_opt(12, 0, 0).unwrap()
}

fn collate(schedule: &str, results: &str) -> (Schedule, Report, chess_results::collation::Collation) {
    let schedule = parse_schedule("schedule", schedule);
    let mut report = parse_report("results", results);
    let collation = Collator::new(&schedule, &CollationSettings::default()).collate(&mut report, now());
    (schedule, report, collation)
}

#[test]
fn test_fixture_list_match_report() {
    let results = "My League 2024
fixturelist Division 1
blackonodd
Toytown A 3-2 Anytown B
1 2024-10-05 Smith 1-0 Jones
2 2024-10-05 Brown draw Green
3 2024-10-05 White 0-1 Black
4 2024-10-05 Grey 1-0 Pink
5 2024-10-05 Red draw Blue
";
    let (schedule, report, collation) = collate(LEAGUE_SCHEDULE, results);
    assert!(schedule.diagnostics.is_empty(), "{:?}", schedule.diagnostics);
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);

    assert_eq!(report.match_count(), 1);
    let fixture = schedule.fixtures()[0].key();
    let at = collation.matchesxref[&fixture];
    let report_match = match_at(&report, at).unwrap();
    assert_eq!(report_match.games.len(), 5);
    assert_eq!(report_match.home_score.map(|p| p.to_string()).as_deref(), Some("3"));
    assert_eq!(report_match.away_score.map(|p| p.to_string()).as_deref(), Some("2"));
    assert!(report_match.is_score_consistent());
    assert_eq!(report_match.games[0].home_player_white, Some(false));
    assert_eq!(report_match.games[1].home_player_white, Some(true));
}

#[test]
fn test_duplicate_report_completes_unfinished_game() {
    let results = "My League 2024
league Division 1
source email1
Toytown A 1-1 Anytown B
1 Smith 1-0 Jones
2 Brown 0-1 Green
3 White unfinished Black
source email2
Toytown A 1-2 Anytown B
1 Smith 1-0 Jones
2 Brown 0-1 Green
3 White 0-1 Black
";
    let (_, report, collation) = collate(LEAGUE_SCHEDULE, results);
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
    assert_eq!(collation.groups.len(), 1);
    assert_eq!(collation.results.len(), 1);

    let merged = match_at(&report, collation.results[0]).unwrap();
    assert_eq!(merged.source, "email2");
    assert_eq!(merged.games[2].board.as_deref(), Some("3"));
    assert_eq!(merged.games[2].result, Some(Score::AwayWin));
}

#[test]
fn test_swiss_pairing_cards() {
    let schedule = "Congress 2024
2024-10-01 2024-10-31
swiss Open
1 2024-10-01
2 2024-10-08
3 2024-10-15
players
1 Alice (12345A)
2 Bob
3 Carol
";
    let results = "Congress 2024
swiss Open
1 b2+ w3- *
2 w1- * b3=
3 * b1+ w2=
";
    let (schedule, report, _) = collate(schedule, results);
    assert!(schedule.diagnostics.is_empty(), "{:?}", schedule.diagnostics);
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);

    let open = schedule.section("Open").unwrap();
    assert_eq!(open.players.len(), 3);
    assert_eq!(open.round_dates[&2], date(2024, 10, 8));

    let games = &report.section("Open").unwrap().games;
    assert_eq!(games.len(), 3);
    let first = &games[0];
    assert_eq!(report.player_name(first.home_player), "Alice");
    assert_eq!(report.player_name(first.away_player), "Bob");
    assert_eq!(first.result, Some(Score::HomeWin));
    assert_eq!(first.date, Some(date(2024, 10, 1)));
    let alice = report.player(first.home_player.unwrap()).unwrap();
    assert_eq!(alice.pin, Some(1));
    assert!(alice.reported_codes.contains("12345A"));
}

#[test]
fn test_all_play_all_cross_table() {
    let report = parse_report("results", "Club Championship\nallplayall Club\n3 w+ b= ~ w- b+ w=\n");
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
    let games = &report.sections[0].games;
    assert_eq!(games.len(), 5);
    let rounds: Vec<u32> = games.iter().filter_map(|g| g.round).collect();
    assert_eq!(rounds, vec![3, 4, 1, 2, 5]);
    assert!(games.iter().all(|g| report.player_name(g.home_player) == "#3"));
}

#[test]
fn test_joined_team_names() {
    let joined = vec![
        "Toytown A v Anytown B".to_string(),
        "Anytown B v Toytown A".to_string(),
        "Toytown A Old Boys v Anytown B".to_string(),
    ];
    let splits = Disambiguator::new(&ParserSettings::default()).split_all(&joined, &KeepLongNames);
    let pair = |a: &str, b: &str| (a.to_string(), b.to_string());
    assert_eq!(
        splits,
        vec![
            pair("Toytown A", "Anytown B"),
            pair("Anytown B", "Toytown A"),
            pair("Toytown A Old Boys", "Anytown B"),
        ]
    );
}

#[test]
fn test_default_game_disambiguation() {
    let classifier = Classifier::new(CompetitionNames::new(["Division 1"]));
    let tagger = Tagger::for_line("email1", 1);

    let Found::Result(line) = classifier.classify("3 Smith 1 default", &tagger, true).found else {
        panic!("expected a result");
    };
    assert_eq!(line.board.as_deref(), Some("3"));
    assert_eq!(line.score, Some(Score::HomeWinDefault));
    assert_eq!(line.nameone, "Smith");

    let Found::Result(line) = classifier.classify("Smith 4 default", &tagger, true).found else {
        panic!("expected a result");
    };
    assert_eq!(line.score, Some(Score::BadScore));
}

#[test]
fn test_documents_to_collated_event() {
    let event = EventConfig {
        competitions: vec!["Division 1".to_string()],
        authorization_delay: None,
        ..EventConfig::default()
    };
    let service = ProcessingService::new(AppConfig::new(), event).unwrap();
    let documents = vec![
        SourceDocument::text(
            "fixtures",
            "My League 2024 2024-09-01 2024-12-31\nDivision 1\n2024-10-05 Toytown A v Anytown B\n",
        ),
        SourceDocument::text(
            "email1",
            "Division 1 2024-10-05\nToytown A 1.5-0.5 Anytown B\n1 Smith 1-0 Jones\n2 Brown draw Green\n",
        ),
    ];
    let extracted = service.extract(&documents);
    let validation = service.validate(
        "schedule",
        &extracted.schedule_text,
        "results",
        &extracted.results_text,
        now(),
    );
    assert!(!validation.has_errors(), "{:?}", validation.report.diagnostics);
    assert_eq!(validation.collation.matchesxref.len(), 1);
    assert!(!validation
        .report
        .diagnostics
        .iter()
        .any(|d| d.problem == Problem::NotOnFixtureList));
}

#[test]
fn test_same_player_is_one_identity() {
    let schedule = "My League 2024
2024-09-01 2024-12-31
league Division 1
Toytown A    Toytown
Anytown B    Anytown
Newtown C    Newtown
matches
2024-10-05   Toytown A    Anytown B
2024-10-12   Toytown A    Newtown C
";
    let results = "My League 2024
league Division 1
Toytown A 1-0 Anytown B
1 2024-10-05 Smith 1-0 Jones
Toytown A 0-1 Newtown C
1 2024-10-12 Smith 0-1 Brown
";
    let (_, report, collation) = collate(schedule, results);
    assert_eq!(collation.results.len(), 2);
    let first = match_at(&report, collation.results[0]).unwrap();
    let second = match_at(&report, collation.results[1]).unwrap();
    assert!(first.games[0].home_player.is_some());
    assert_eq!(first.games[0].home_player, second.games[0].home_player);
    assert_ne!(first.games[0].away_player, second.games[0].away_player);
}

#[test]
fn test_processing_same_documents_twice_is_stable() {
    let event = EventConfig {
        competitions: vec!["Division 1".to_string()],
        ..EventConfig::default()
    };
    let service = ProcessingService::new(AppConfig::new(), event).unwrap();
    let documents = vec![SourceDocument::text(
        "email1",
        "My League 2024 2024-09-01 2024-12-31\nDivision 1 2024-10-05\nToytown A 1-1 Anytown B\n1 Smith 1-0 Jones\n2 Brown 0-1 Green\n",
    )];

    let first = service.extract(&documents);
    let second = service.extract(&documents);
    assert_eq!(first.schedule_text, second.schedule_text);
    assert_eq!(first.results_text, second.results_text);

    let run = || {
        let validation = service.validate("schedule", &first.schedule_text, "results", &first.results_text, now());
        let text = validation_report(
            &validation.schedule,
            &validation.report,
            &validation.collation,
            &validation.texts,
        );
        (validation.report, text)
    };
    let (report_one, text_one) = run();
    let (report_two, text_two) = run();
    assert_eq!(report_one, report_two);
    assert_eq!(text_one, text_two);
}

#[test]
fn test_authorization_is_monotonic_in_delay() {
    let results = "My League 2024
league Division 1
source email1
dates 2024-10-28T10:00:00
Toytown A 1-0 Anytown B
1 Smith 1-0 Jones
";
    let schedule = parse_schedule("schedule", LEAGUE_SCHEDULE);
    let authorized: Vec<bool> = (0..10)
        .map(|days| {
            let mut report = parse_report("results", results);
            let collation = Collator::new(&schedule, &CollationSettings::default())
                .with_authorization_delay(Some(days))
                .collate(&mut report, now());
            collation.groups[0].authorized
        })
        .collect();
    assert!(authorized[0]);
    assert!(!authorized[9]);
    assert!(authorized.windows(2).all(|pair| pair[0] || !pair[1]));
}

#[test]
fn test_played_on_game_completes_unfinished_game() {
    let event = EventConfig {
        competitions: vec!["Division 1".to_string()],
        authorization_delay: None,
        ..EventConfig::default()
    };
    let service = ProcessingService::new(AppConfig::new(), event).unwrap();
    let documents = vec![SourceDocument::text(
        "email1",
        "My League 2024 2024-09-01 2024-12-31\nDivision 1 2024-10-05\nToytown A 1-1 Anytown B\n1 Smith 1-0 Jones\n2 Brown 0-1 Green\n3 White adjourned Black\nPlayed on: 3 White 0-1 Black\n",
    )];
    let extracted = service.extract(&documents);
    assert!(extracted.results_text.contains("played_on\n"), "{}", extracted.results_text);

    let validation = service.validate("schedule", &extracted.schedule_text, "results", &extracted.results_text, now());
    assert!(!validation.has_errors(), "{:?}", validation.report.diagnostics);
    let problems: Vec<Problem> = validation.report.diagnostics.iter().map(|d| d.problem).collect();
    assert!(!problems.contains(&Problem::UnmatchedPlayedOn), "{:?}", problems);
    assert!(validation.collation.gamesxref.values().all(Option::is_some));
    assert_eq!(validation.collation.gamesxref.len(), 2);

    let original = &validation.report.sections[0].matches[0];
    assert!(!original.played_on);
    assert_eq!(original.games[2].result, Some(Score::AwayWin));
}
