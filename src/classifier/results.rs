//! Interpretation of the text left on a line once dates, competition and
//! markers have been removed: `<nameone> <score> <nametwo>` with an optional
//! leading board number and colour.

use once_cell::sync::Lazy;
use regex::Regex;

use super::found::ResultLine;
use crate::domain::{Points, Score};
use crate::lexical::scanners::{is_board, is_number, score_word, words, COLOUR};

static SPACED_SCORE: Lazy<Regex> = Lazy::new(|| {
    let n = r"(?:\d+(?:\.5)?|\d*½|\.5)";
    Regex::new(&format!(r"(?P<home>{n})\s+[-:–]\s+(?P<away>{n})\b", n = n))
        .expect("static spaced score pattern")
});

/// `2.5 - 1.5` scans as one score word.
pub fn join_spaced_scores(text: &str) -> String {
    SPACED_SCORE.replace_all(text, "${home}-${away}").into_owned()
}

/// Where the score sits among the words of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScoreSpan {
    first: usize,
    last: usize,
    home: Points,
    away: Points,
}

/// Word indices of the score and, when present, the board.
fn locate_score(found: &[&str]) -> Option<(ScoreSpan, Option<usize>)> {
    let scores: Vec<usize> = (0..found.len())
        .filter(|i| score_word(found[*i]).is_some())
        .collect();
    if let [index] = scores.as_slice() {
        let (home, away) = score_word(found[*index])?;
        let board = (*index > 0 && is_board(found[0])).then_some(0);
        let span = ScoreSpan {
            first: *index,
            last: *index,
            home,
            away,
        };
        return Some((span, board));
    }
    if !scores.is_empty() {
        return None;
    }

    let numbers: Vec<usize> = (0..found.len())
        .filter(|i| is_number(found[*i]) || is_board(found[*i]))
        .collect();
    let (pair, board) = match numbers.as_slice() {
        [a, b] if a + 1 == *b => ((*a, *b), None),
        [a, b, c] if a + 1 == *b && b + 1 == *c => {
            // Prefer the reading whose pair is a single game's score.
            let leading_board = is_board(found[*a]) && game_pair(found[*b], found[*c]);
            if leading_board || !(is_board(found[*c]) && game_pair(found[*a], found[*b])) {
                ((*b, *c), Some(*a))
            } else {
                ((*a, *b), Some(*c))
            }
        }
        [a, b, c] if a + 1 == *b => ((*a, *b), Some(*c)),
        [a, b, c] if b + 1 == *c => ((*b, *c), Some(*a)),
        _ => return None,
    };
    if let Some(index) = board {
        if !is_board(found[index]) {
            return None;
        }
    }
    let span = ScoreSpan {
        first: pair.0,
        last: pair.1,
        home: Points::parse(found[pair.0])?,
        away: Points::parse(found[pair.1])?,
    };
    Some((span, board))
}

fn game_pair(home: &str, away: &str) -> bool {
    match (Points::parse(home), Points::parse(away)) {
        (Some(home), Some(away)) => Score::from_game_points(home, away).is_some(),
        _ => false,
    }
}

fn colour(word: &str) -> Option<bool> {
    if !COLOUR.is_match(word) {
        return None;
    }
    match word.to_lowercase().as_str() {
        "white" => Some(true),
        "black" => Some(false),
        _ => None,
    }
}

fn join(found: &[&str]) -> String {
    found.join(" ")
}

/// Interpret `text` as a result. The second value is true when the names
/// were found as one joined fragment.
pub fn interpret(text: &str) -> Option<(ResultLine, bool)> {
    let text = join_spaced_scores(text);
    let found: Vec<&str> = words(&text).into_iter().map(|w| w.text).collect();
    let (span, board) = locate_score(&found)?;

    let mut start = 0;
    let mut line = ResultLine::default();
    if board == Some(0) {
        line.board = Some(found[0].to_string());
        start = 1;
    }
    // A colour word needs a name after it; "White" is also a surname.
    if start + 1 < span.first && COLOUR.is_match(found[start]) {
        line.home_player_white = colour(found[start]);
        start += 1;
    }

    // A board away from the start of the line sits at one end of a name.
    let inner_board = board.filter(|i| *i > 0);
    let pick = |range: std::ops::Range<usize>| {
        range
            .filter(|i| Some(*i) != inner_board)
            .map(|i| found[i])
            .collect::<Vec<&str>>()
    };
    let before = pick(start.min(span.first)..span.first);
    let after = pick(span.last + 1..found.len());
    if let Some(index) = inner_board {
        line.board = Some(found[index].to_string());
    }

    line.score = Some(match Score::from_game_points(span.home, span.away) {
        Some(score) => score,
        None if line.board.is_none() => Score::Match(span.home, span.away),
        None => Score::BadScore,
    });

    match (before.is_empty(), after.is_empty()) {
        (false, false) => {
            line.nameone = join(&before);
            line.nametwo = Some(join(&after));
            Some((line, false))
        }
        (false, true) => {
            line.nameone = join(&before);
            Some((line, true))
        }
        (true, false) => {
            line.nameone = join(&after);
            Some((line, true))
        }
        (true, true) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1 Smith 1-0 Jones", Some("1"), "Smith", Score::HomeWin)]
    #[case("Brown draw Green", None, "Brown", Score::Draw)]
    #[case("3 White 0-1 Black", Some("3"), "White", Score::AwayWin)]
    #[case("2 Smith ½ ½ Jones", Some("2"), "Smith", Score::Draw)]
    #[case("Smith 1 0 Jones", None, "Smith", Score::HomeWin)]
    #[case("1.2 Smith 0 1 Jones", Some("1.2"), "Smith", Score::AwayWin)]
    fn test_game_results(
        #[case] text: &str,
        #[case] board: Option<&str>,
        #[case] nameone: &str,
        #[case] score: Score,
    ) {
        let (line, joined) = interpret(text).unwrap();
        assert!(!joined);
        assert_eq!(line.board.as_deref(), board);
        assert_eq!(line.nameone, nameone);
        assert_eq!(line.score, Some(score));
    }

    #[test]
    fn test_match_scores() {
        let (line, _) = interpret("Toytown A 3-2 Anytown B").unwrap();
        assert_eq!(
            line.score,
            Some(Score::Match(Points::from_halves(6), Points::from_halves(4)))
        );
        assert_eq!(line.nametwo.as_deref(), Some("Anytown B"));

        let (line, _) = interpret("Toytown A 2.5 - 1.5 Anytown B").unwrap();
        assert_eq!(
            line.score,
            Some(Score::Match(Points::from_halves(5), Points::from_halves(3)))
        );
    }

    #[test]
    fn test_board_after_adjacent_score() {
        let (line, _) = interpret("Smith 1 0 3 Jones").unwrap();
        assert_eq!(line.board.as_deref(), Some("3"));
        assert_eq!(line.nametwo.as_deref(), Some("Jones"));
        assert_eq!(line.score, Some(Score::HomeWin));
    }

    #[test]
    fn test_colour_after_board() {
        let (line, _) = interpret("4 black Grey 1-0 Pink").unwrap();
        assert_eq!(line.home_player_white, Some(false));
        assert_eq!(line.nameone, "Grey");
    }

    #[test]
    fn test_joined_names() {
        let (line, joined) = interpret("Toytown A Anytown B 3-2").unwrap();
        assert!(joined);
        assert_eq!(line.nameone, "Toytown A Anytown B");
        assert!(interpret("Smith Jones").is_none());
    }
}
