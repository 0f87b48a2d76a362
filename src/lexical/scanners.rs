use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

use super::patterns;
use crate::domain::{Points, Score};

/// A whitespace-delimited word and its byte range in the scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

pub fn words(text: &str) -> Vec<Word<'_>> {
    let mut found = Vec::new();
    let mut start = None;
    for (index, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(begin)) => {
                found.push(Word {
                    text: &text[begin..index],
                    start: begin,
                    end: index,
                });
                start = None;
            }
            (false, None) => start = Some(index),
            _ => {}
        }
    }
    if let Some(begin) = start {
        found.push(Word {
            text: &text[begin..],
            start: begin,
            end: text.len(),
        });
    }
    found
}

/// A named word pattern.
///
/// `find_all` returns the words that match in full and `split` returns the
/// text between them, trimmed, with empty fragments dropped.
#[derive(Clone, Copy)]
pub struct Matcher {
    pub name: &'static str,
    regex: &'static Lazy<Regex>,
}

impl Matcher {
    pub const fn new(name: &'static str, regex: &'static Lazy<Regex>) -> Self {
        Self { name, regex }
    }

    pub fn is_match(&self, word: &str) -> bool {
        self.regex.is_match(word)
    }

    pub fn find_all<'a>(&self, text: &'a str) -> Vec<Word<'a>> {
        words(text)
            .into_iter()
            .filter(|w| self.is_match(w.text))
            .collect()
    }

    pub fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut fragments = Vec::new();
        let mut from = 0;
        for word in self.find_all(text) {
            fragments.push(&text[from..word.start]);
            from = word.end;
        }
        fragments.push(&text[from..]);
        fragments
            .into_iter()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .collect()
    }
}

pub static DAY_NAME: Matcher = Matcher::new("day name", &patterns::DAY_NAME);
pub static NUMBER: Matcher = Matcher::new("number", &patterns::NUMBER_WORD);
pub static SEPARATOR_SCORE: Matcher = Matcher::new("score", &patterns::SEPARATOR_SCORE);
pub static DRAW: Matcher = Matcher::new("draw", &patterns::DRAW);
pub static BOARD: Matcher = Matcher::new("board", &patterns::BOARD);
pub static ROUND: Matcher = Matcher::new("round", &patterns::ROUND);
pub static COLOUR: Matcher = Matcher::new("colour", &patterns::COLOUR);
pub static SWISS_CELL: Matcher = Matcher::new("swiss cell", &patterns::SWISS_CELL);
pub static SWISS_DEFINITIVE: Matcher = Matcher::new("swiss cell", &patterns::SWISS_DEFINITIVE);
pub static APA_CELL: Matcher = Matcher::new("all-play-all cell", &patterns::APA_CELL);
pub static APA_DEFINITIVE: Matcher = Matcher::new("all-play-all cell", &patterns::APA_DEFINITIVE);
pub static TEAM_SEPARATOR: Matcher = Matcher::new("team separator", &patterns::TEAM_SEPARATOR);

/// Parse a weekday name, ignoring trailing punctuation.
pub fn day_name(word: &str) -> Option<chrono::Weekday> {
    use chrono::Weekday;
    let word = trim_punctuation(word);
    if !DAY_NAME.is_match(word) {
        return None;
    }
    let day = match word.get(..3)?.to_lowercase().as_str() {
        "mon" => Weekday::Mon,
        "tue" => Weekday::Tue,
        "wed" => Weekday::Wed,
        "thu" => Weekday::Thu,
        "fri" => Weekday::Fri,
        "sat" => Weekday::Sat,
        "sun" => Weekday::Sun,
        _ => return None,
    };
    Some(day)
}

pub fn trim_punctuation(word: &str) -> &str {
    word.trim_end_matches([',', '.', ':', ';'])
}

/// Game outcome expressed by a single score word, such as `1-0` or `draw`.
pub fn score_word(word: &str) -> Option<(Points, Points)> {
    if DRAW.is_match(word) {
        return Some((Points::HALF, Points::HALF));
    }
    let captures = patterns::SEPARATOR_SCORE.captures(word)?;
    let home = Points::parse(captures.name("home")?.as_str())?;
    let away = Points::parse(captures.name("away")?.as_str())?;
    Some((home, away))
}

/// A default-family marker and the score it implies on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultMarker {
    Default,
    HomeWinDefault,
    AwayWinDefault,
    DrawDefault,
    DoubleDefault,
    Unfinished,
    Void,
    MatchDefault,
}

impl DefaultMarker {
    pub fn score(&self) -> Score {
        match self {
            DefaultMarker::Default => Score::Default,
            DefaultMarker::HomeWinDefault => Score::HomeWinDefault,
            DefaultMarker::AwayWinDefault => Score::AwayWinDefault,
            DefaultMarker::DrawDefault => Score::DrawDefault,
            DefaultMarker::DoubleDefault => Score::DoubleDefault,
            DefaultMarker::Unfinished => Score::Unfinished,
            DefaultMarker::Void => Score::Void,
            DefaultMarker::MatchDefault => Score::MatchDefaulted,
        }
    }
}

pub fn default_marker(word: &str) -> Option<DefaultMarker> {
    let word = trim_punctuation(word);
    let marker = if patterns::DEFAULT.is_match(word) {
        DefaultMarker::Default
    } else if patterns::HOME_WIN_DEFAULT.is_match(word) {
        DefaultMarker::HomeWinDefault
    } else if patterns::AWAY_WIN_DEFAULT.is_match(word) {
        DefaultMarker::AwayWinDefault
    } else if patterns::DRAW_DEFAULT.is_match(word) {
        DefaultMarker::DrawDefault
    } else if patterns::DOUBLE_DEFAULT.is_match(word) {
        DefaultMarker::DoubleDefault
    } else if patterns::UNFINISHED.is_match(word) {
        DefaultMarker::Unfinished
    } else if patterns::VOID.is_match(word) {
        DefaultMarker::Void
    } else if patterns::MATCH_DEFAULT.is_match(word) {
        DefaultMarker::MatchDefault
    } else {
        return None;
    };
    Some(marker)
}

/// Join two-word markers so they scan as one word.
pub fn join_marker_phrases(text: &str) -> String {
    static PHRASES: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)\b(double|dbl|match)\s+(default(?:ed)?|def)\b").expect("static phrase pattern")
    });
    PHRASES.replace_all(text, "${1}-${2}").into_owned()
}

/// Round number written as `round 3`, `rd 3` or `r3`.
pub fn round_reference(text: &str) -> Option<(u32, usize, usize)> {
    let found = words(text);
    for (index, word) in found.iter().enumerate() {
        if let Some(captures) = patterns::ROUND_ABBREVIATION.captures(word.text) {
            let round = captures.name("round")?.as_str().parse().ok()?;
            return Some((round, word.start, word.end));
        }
        if patterns::ROUND_KEYWORD.is_match(word.text) {
            if let Some(next) = found.get(index + 1) {
                let number = trim_punctuation(next.text);
                if ROUND.is_match(number) {
                    return Some((number.parse().ok()?, word.start, next.end));
                }
            }
        }
    }
    None
}

pub fn is_board(word: &str) -> bool {
    BOARD.is_match(word)
}

/// Words that are a whole number or half-point value.
pub fn is_number(word: &str) -> bool {
    NUMBER.is_match(word)
}

/// Remove grading codes and membership numbers from a reported name.
///
/// Bracketed codes are kept without their brackets.
pub fn split_codes(text: &str) -> (String, BTreeSet<String>) {
    let mut codes = BTreeSet::new();
    for found in patterns::GRADING_CODE.find_iter(text) {
        let code = found
            .as_str()
            .trim_matches(|c| matches!(c, '(' | ')' | '[' | ']'))
            .trim();
        if !code.is_empty() {
            codes.insert(code.to_string());
        }
    }
    let name = patterns::GRADING_CODE
        .replace_all(text, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    (name, codes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_words_keep_byte_offsets() {
        let text = "  1 Smith\t1-0 ";
        let found = words(text);
        assert_eq!(found.len(), 3);
        assert_eq!(found[1].text, "Smith");
        assert_eq!(&text[found[2].start..found[2].end], "1-0");
    }

    #[test]
    fn test_split_on_matched_words() {
        assert_eq!(
            SWISS_CELL.split("1 Alice b2+ w3-"),
            vec!["1 Alice"]
        );
        assert_eq!(SWISS_CELL.split("b2+ 1 w3-"), vec!["1"]);
    }

    #[rstest]
    #[case("3", true)]
    #[case("1.2", true)]
    #[case("1.2.3", true)]
    #[case("03", false)]
    #[case("2.5", true)]
    #[case("0", false)]
    fn test_board_shapes(#[case] word: &str, #[case] expected: bool) {
        assert_eq!(is_board(word), expected);
    }

    #[rstest]
    #[case("1-0", Some((Points::ONE, Points::ZERO)))]
    #[case("½-½", Some((Points::HALF, Points::HALF)))]
    #[case("draw", Some((Points::HALF, Points::HALF)))]
    #[case("3.5-2.5", Some((Points::from_halves(7), Points::from_halves(5))))]
    #[case("Smith", None)]
    fn test_score_words(#[case] word: &str, #[case] expected: Option<(Points, Points)>) {
        assert_eq!(score_word(word), expected);
    }

    #[rstest]
    #[case("default", Some(DefaultMarker::Default))]
    #[case("def+", Some(DefaultMarker::HomeWinDefault))]
    #[case("def-", Some(DefaultMarker::AwayWinDefault))]
    #[case("dbldef", Some(DefaultMarker::DoubleDefault))]
    #[case("unfinished", Some(DefaultMarker::Unfinished))]
    #[case("void", Some(DefaultMarker::Void))]
    #[case("matchdefault", Some(DefaultMarker::MatchDefault))]
    #[case("def", None)]
    fn test_default_markers(#[case] word: &str, #[case] expected: Option<DefaultMarker>) {
        assert_eq!(default_marker(word), expected);
    }

    #[test]
    fn test_marker_phrases_join() {
        let text = join_marker_phrases("Toytown A match defaulted Anytown B");
        assert_eq!(text, "Toytown A match-defaulted Anytown B");
        assert_eq!(
            default_marker("match-defaulted"),
            Some(DefaultMarker::MatchDefault)
        );
        assert_eq!(
            default_marker(&join_marker_phrases("double default")),
            Some(DefaultMarker::DoubleDefault)
        );
    }

    #[test]
    fn test_day_names() {
        assert_eq!(day_name("Thurs"), Some(chrono::Weekday::Thu));
        assert_eq!(day_name("tues,"), Some(chrono::Weekday::Tue));
        assert_eq!(day_name("Thursday"), Some(chrono::Weekday::Thu));
        assert_eq!(day_name("Thor"), None);
    }

    #[test]
    fn test_round_references() {
        assert_eq!(round_reference("Division 1 round 3").map(|r| r.0), Some(3));
        assert_eq!(round_reference("Open r4").map(|r| r.0), Some(4));
        assert_eq!(round_reference("Open"), None);
    }

    #[test]
    fn test_codes_leave_the_name() {
        let (name, codes) = split_codes("Alice (12345A) Smith 998877");
        assert_eq!(name, "Alice Smith");
        assert_eq!(
            codes.into_iter().collect::<Vec<_>>(),
            vec!["12345A".to_string(), "998877".to_string()]
        );

        let (name, codes) = split_codes("Bob");
        assert_eq!(name, "Bob");
        assert!(codes.is_empty());
    }
}
