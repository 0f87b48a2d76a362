//! Compiled patterns shared by the scanners.
//!
//! Word patterns are anchored and matched against single whitespace-separated
//! words, so a token boundary is always a whitespace/non-whitespace transition.

use once_cell::sync::Lazy;
use regex::Regex;

pub const MONTH: &str = "jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t|tember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

const NUMBER: &str = r"(?:\d+(?:\.5)?|\d*½|\.5)";

fn anchored(pattern: &str) -> Regex {
    Regex::new(&format!("(?i)^(?:{})$", pattern)).expect("static word pattern")
}

/// Three date components separated by single non-word characters.
pub static DATE: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r"(?i)\b(?P<a>\d{{1,4}}|{month})(?P<s1>[^\w\n]|\s)(?P<b>\d{{1,2}}|{month})(?P<s2>[^\w\n]|\s)(?P<c>\d{{1,4}})\b",
        month = MONTH
    );
    Regex::new(&pattern).expect("static date pattern")
});

pub static MONTH_NAME: Lazy<Regex> = Lazy::new(|| anchored(MONTH));

pub static DAY_NAME: Lazy<Regex> = Lazy::new(|| {
    anchored("mon|monday|tue|tues|tuesday|wed|wednesday|thu|thur|thurs|thursday|fri|friday|sat|saturday|sun|sunday")
});

pub static NUMBER_WORD: Lazy<Regex> = Lazy::new(|| anchored(NUMBER));

pub static SEPARATOR_SCORE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        "(?i)^(?P<home>{n})\\s*[-:–]\\s*(?P<away>{n})$",
        n = NUMBER
    ))
    .expect("static score pattern")
});

pub static DRAW: Lazy<Regex> = Lazy::new(|| anchored("draw|drawn|drew|=|½-½|0\\.5-0\\.5"));

pub static DEFAULT: Lazy<Regex> = Lazy::new(|| anchored("default|defaulted"));
pub static HOME_WIN_DEFAULT: Lazy<Regex> = Lazy::new(|| anchored(r"def\+|\+def"));
pub static AWAY_WIN_DEFAULT: Lazy<Regex> = Lazy::new(|| anchored(r"def-|-def"));
pub static DOUBLE_DEFAULT: Lazy<Regex> = Lazy::new(|| anchored("dbldef|dbld|dbl-def|double-default"));
pub static DRAW_DEFAULT: Lazy<Regex> = Lazy::new(|| anchored("=d|=def|def="));
pub static UNFINISHED: Lazy<Regex> = Lazy::new(|| anchored("unfinished|adjourned|adj"));
pub static VOID: Lazy<Regex> = Lazy::new(|| anchored("void"));
pub static MATCH_DEFAULT: Lazy<Regex> =
    Lazy::new(|| anchored("matchdefault|matchdefaulted|match-default|match-defaulted"));

pub static BOARD: Lazy<Regex> = Lazy::new(|| anchored(r"[1-9][0-9]*(?:\.[1-9][0-9]*)*"));
pub static ROUND: Lazy<Regex> = Lazy::new(|| anchored("[1-9][0-9]*"));
pub static ROUND_KEYWORD: Lazy<Regex> = Lazy::new(|| anchored("round|rd|rnd"));
pub static ROUND_ABBREVIATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:r|rd|rnd|round)(?P<round>[1-9][0-9]*)$").expect("static round pattern"));

pub static COLOUR: Lazy<Regex> = Lazy::new(|| anchored("white|black|unknown"));

pub static SWISS_CELL: Lazy<Regex> = Lazy::new(|| {
    anchored(r"\*|--|bye[-=+]|def[-+]|[wb][0-9]+[-=+pme]|[-=+][wb][0-9]+")
});
/// Swiss cells that cannot be mistaken for other text.
pub static SWISS_DEFINITIVE: Lazy<Regex> =
    Lazy::new(|| anchored(r"bye[-=+]|[wb][0-9]+[-=+pme]|[-=+][wb][0-9]+"));

pub static APA_CELL: Lazy<Regex> = Lazy::new(|| anchored(r"~|--|[wb][-=+]|[-=+][wb]"));
pub static APA_DEFINITIVE: Lazy<Regex> = Lazy::new(|| anchored(r"~|[wb][-=+]|[-=+][wb]"));

pub static PLAYED_ON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*played[\s_-]?on\b[\s:]*").expect("static played-on pattern"));

pub static RESULT_ONLY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:results?|grading)[\s_-]?only\b").expect("static result-only pattern")
});

pub static TEAM_SEPARATOR: Lazy<Regex> = Lazy::new(|| anchored("v|vs|v\\.|vs\\.|versus|-"));

/// A grading code or membership number embedded in a name.
pub static GRADING_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\([^()]*[0-9][^()]*\)|\[[^\[\]]*[0-9][^\[\]]*\]|[^\s]*[0-9]{3}[^\s]*").expect("static code pattern"));
