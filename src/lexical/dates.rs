use chrono::{Datelike, NaiveDate};
use regex::Captures;

use super::patterns::{DATE, MONTH_NAME};

/// A date found in text, with its byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateToken {
    pub date: NaiveDate,
    pub start: usize,
    pub end: usize,
}

impl DateToken {
    pub fn iso(&self) -> String {
        iso(self.date)
    }
}

pub fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Every date in `text`, scanning left to right.
///
/// A candidate that fails validation only consumes its first component, so a
/// real date overlapping a rejected candidate is still found.
pub fn find_all(text: &str) -> Vec<DateToken> {
    let mut found = Vec::new();
    let mut position = 0;
    while position < text.len() {
        let Some(captures) = DATE.captures_at(text, position) else {
            break;
        };
        let (Some(whole), Some(first)) = (captures.get(0), captures.name("a")) else {
            break;
        };
        match interpret(&captures) {
            Some(date) => {
                found.push(DateToken {
                    date,
                    start: whole.start(),
                    end: whole.end(),
                });
                position = whole.end();
            }
            None => position = next_boundary(text, first.end()),
        }
    }
    found
}

/// Text with every date removed, split into trimmed non-empty fragments.
pub fn split(text: &str) -> Vec<&str> {
    let mut fragments = Vec::new();
    let mut from = 0;
    for token in find_all(text) {
        fragments.push(&text[from..token.start]);
        from = token.end;
    }
    fragments.push(&text[from..]);
    fragments
        .into_iter()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect()
}

/// Parse text that is exactly one date.
pub fn parse(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let found = find_all(text);
    match found.as_slice() {
        [token] if token.start == 0 && token.end == text.len() => Some(token.date),
        _ => None,
    }
}

fn next_boundary(text: &str, from: usize) -> usize {
    let mut index = from.max(1);
    while index < text.len() && !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

fn interpret(captures: &Captures<'_>) -> Option<NaiveDate> {
    let a = captures.name("a")?.as_str();
    let b = captures.name("b")?.as_str();
    let c = captures.name("c")?.as_str();
    let s1 = captures.name("s1")?.as_str();
    let s2 = captures.name("s2")?.as_str();

    let spaced = s1.trim().is_empty() || s2.trim().is_empty();
    if spaced {
        if !(s1.trim().is_empty() && s2.trim().is_empty()) {
            return None;
        }
    } else if s1 != s2 {
        return None;
    }
    let named = MONTH_NAME.is_match(a) || MONTH_NAME.is_match(b);
    if spaced && !named {
        return None;
    }

    if a.len() == 4 && is_digits(a) {
        // Y-M-D
        if c.len() > 2 {
            return None;
        }
        let month = month_number(b)?;
        return NaiveDate::from_ymd_opt(a.parse().ok()?, month, c.parse().ok()?);
    }

    let year = year_number(c)?;
    if MONTH_NAME.is_match(a) {
        // M-D-Y
        let month = month_number(a)?;
        return NaiveDate::from_ymd_opt(year, month, b.parse().ok()?);
    }
    if a.len() > 2 {
        return None;
    }
    let first: u32 = a.parse().ok()?;
    if MONTH_NAME.is_match(b) {
        return NaiveDate::from_ymd_opt(year, month_number(b)?, first);
    }
    let second: u32 = b.parse().ok()?;
    // D-M-Y unless that cannot be a date and M-D-Y can.
    NaiveDate::from_ymd_opt(year, second, first)
        .or_else(|| NaiveDate::from_ymd_opt(year, first, second))
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

fn month_number(text: &str) -> Option<u32> {
    if is_digits(text) {
        let month: u32 = text.parse().ok()?;
        return (1..=12).contains(&month).then_some(month);
    }
    let lower = text.to_lowercase();
    let month = match lower.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn year_number(text: &str) -> Option<i32> {
    match text.len() {
        4 => text.parse().ok(),
        2 => {
            let year: i32 = text.parse().ok()?;
            Some(if year < 70 { 2000 + year } else { 1900 + year })
        }
        _ => None,
    }
}

/// True when the date falls on the given weekday.
pub fn is_weekday(date: NaiveDate, day: chrono::Weekday) -> bool {
    date.weekday() == day
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("2024-10-05", "2024-10-05")]
    #[case("5/10/2024", "2024-10-05")]
    #[case("05.10.24", "2024-10-05")]
    #[case("5 Oct 2024", "2024-10-05")]
    #[case("5-October-2024", "2024-10-05")]
    #[case("Oct 5 2024", "2024-10-05")]
    #[case("12/25/2024", "2024-12-25")]
    #[case("1/2/99", "1999-02-01")]
    fn test_accepted_formats(#[case] text: &str, #[case] expected: &str) {
        let found = find_all(text);
        assert_eq!(found.len(), 1, "{}", text);
        assert_eq!(found[0].iso(), expected);
    }

    #[rstest]
    #[case("5-10/2024")]
    #[case("5 10 2024")]
    #[case("32/10/2024")]
    #[case("3 Smith 1 default")]
    fn test_rejected_candidates(#[case] text: &str) {
        assert!(find_all(text).is_empty(), "{}", text);
    }

    #[test]
    fn test_rejected_candidate_does_not_hide_a_date() {
        let found = find_all("1 12 2024-10-05 Smith");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].iso(), "2024-10-05");
    }

    #[test]
    fn test_split_removes_dates() {
        assert_eq!(
            split("Open 2024-10-01 2024-10-08"),
            vec!["Open"]
        );
        assert_eq!(
            split("1 2024-10-05 Smith 1-0 Jones"),
            vec!["1", "Smith 1-0 Jones"]
        );
    }

    proptest! {
        #[test]
        fn test_date_round_trip(year in 1970i32..2069, month in 1u32..=12, day in 1u32..=28, style in 0usize..4) {
            let date = NaiveDate::from_ymd_opt(year, month, day).unwrap();
            let text = match style {
                0 => date.format("%Y-%m-%d").to_string(),
                1 => date.format("%d/%m/%Y").to_string(),
                2 => date.format("%d %b %Y").to_string(),
                _ => date.format("%d.%m.%y").to_string(),
            };
            let parsed = parse(&text);
            prop_assert!(parsed.is_some(), "{}", text);
            let parsed = parsed.unwrap();
            prop_assert_eq!(parsed, date);
            let emitted = iso(parsed);
            prop_assert_eq!(parse(&emitted), Some(parsed));
        }
    }
}
