//! Splitting of joined name pairs such as `Toytown A v Anytown B` or
//! `Toytown A Anytown B`.
//!
//! Every joined string offers candidate splits made by removing a run of
//! inner words. Names that occur as a first part in one string and as a
//! second part in another are taken to be real names, and a split made of
//! two such names is preferred.

use log::{debug, info};
use std::collections::BTreeSet;

use crate::config::ParserSettings;
use crate::lexical::scanners::TEAM_SEPARATOR;

/// Decides whether an overlong joined string is cut down before splitting.
pub trait TruncationPolicy {
    fn truncate(&self, joined: &str, words: usize) -> bool;
}

impl<F> TruncationPolicy for F
where
    F: Fn(&str, usize) -> bool,
{
    fn truncate(&self, joined: &str, words: usize) -> bool {
        self(joined, words)
    }
}

pub struct KeepLongNames;

impl TruncationPolicy for KeepLongNames {
    fn truncate(&self, _joined: &str, _words: usize) -> bool {
        false
    }
}

pub struct TruncateLongNames;

impl TruncationPolicy for TruncateLongNames {
    fn truncate(&self, _joined: &str, _words: usize) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Candidate {
    first: String,
    second: String,
}

/// Splits made by removing a contiguous run of inner words, possibly empty.
/// A string with an explicit separator word only splits around it.
fn candidates(found: &[&str]) -> Vec<Candidate> {
    let count = found.len();
    let separated = (1..count.saturating_sub(1)).any(|i| TEAM_SEPARATOR.is_match(found[i]));
    let mut splits = Vec::new();
    for start in 1..count {
        for end in start..count {
            let removed = &found[start..end];
            if separated && !matches!(removed, [word] if TEAM_SEPARATOR.is_match(word)) {
                continue;
            }
            splits.push(Candidate {
                first: found[..start].join(" "),
                second: found[end..].join(" "),
            });
        }
    }
    splits
}

fn separator_split(found: &[&str]) -> Option<(String, String)> {
    let index = (1..found.len().saturating_sub(1)).find(|i| TEAM_SEPARATOR.is_match(found[*i]))?;
    Some((found[..index].join(" "), found[index + 1..].join(" ")))
}

fn strip_separator<'a>(found: &'a [&'a str]) -> &'a [&'a str] {
    let found = match found.first() {
        Some(word) if TEAM_SEPARATOR.is_match(word) => &found[1..],
        _ => found,
    };
    match found.last() {
        Some(word) if TEAM_SEPARATOR.is_match(word) => &found[..found.len() - 1],
        _ => found,
    }
}

pub struct Disambiguator {
    max_words: usize,
    truncated_words: usize,
    known: BTreeSet<String>,
}

impl Disambiguator {
    pub fn new(settings: &ParserSettings) -> Self {
        Self {
            max_words: settings.max_joined_words,
            truncated_words: settings.truncated_words,
            known: BTreeSet::new(),
        }
    }

    /// Names known from elsewhere, such as the teams of a division.
    pub fn with_known<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.known
            .extend(names.into_iter().map(|n| n.as_ref().trim().to_string()));
        self
    }

    /// Split each joined string into a `(first, second)` pair, in order.
    pub fn split_all(
        &self,
        joined: &[String],
        policy: &dyn TruncationPolicy,
    ) -> Vec<(String, String)> {
        let texts: Vec<String> = joined.iter().map(|j| self.limit(j, policy)).collect();
        let word_lists: Vec<Vec<&str>> = texts.iter().map(|t| t.split_whitespace().collect()).collect();
        let all: Vec<Vec<Candidate>> = word_lists.iter().map(|w| candidates(w)).collect();

        let firsts: BTreeSet<&str> = all.iter().flatten().map(|c| c.first.as_str()).collect();
        let seconds: BTreeSet<&str> = all.iter().flatten().map(|c| c.second.as_str()).collect();
        let consistent: BTreeSet<&str> = firsts
            .iter()
            .filter(|name| seconds.contains(*name) || self.known.contains(**name))
            .chain(seconds.iter().filter(|name| self.known.contains(**name)))
            .copied()
            .collect();
        debug!("Consistent names: {:?}", consistent);

        word_lists
            .iter()
            .zip(&all)
            .map(|(found, splits)| {
                splits
                    .iter()
                    .filter(|c| consistent.contains(c.first.as_str()) && consistent.contains(c.second.as_str()))
                    .next_back()
                    .map(|c| (c.first.clone(), c.second.clone()))
                    .unwrap_or_else(|| self.guess(found, &consistent))
            })
            .collect()
    }

    pub fn split(&self, joined: &str, policy: &dyn TruncationPolicy) -> (String, String) {
        self.split_all(&[joined.to_string()], policy)
            .pop()
            .unwrap_or_default()
    }

    fn limit(&self, joined: &str, policy: &dyn TruncationPolicy) -> String {
        let found: Vec<&str> = joined.split_whitespace().collect();
        if found.len() > self.max_words && policy.truncate(joined, found.len()) {
            info!(
                "  → Truncating joined names of {} words to {}",
                found.len(),
                self.truncated_words
            );
            return found[..self.truncated_words].join(" ");
        }
        found.join(" ")
    }

    fn guess(&self, found: &[&str], consistent: &BTreeSet<&str>) -> (String, String) {
        if let Some(split) = separator_split(found) {
            return split;
        }
        let is_known = |name: &str| consistent.contains(name) || self.known.contains(name);
        for end in (1..found.len()).rev() {
            let head = found[..end].join(" ");
            if is_known(&head) {
                return (head, strip_separator(&found[end..]).join(" "));
            }
        }
        for start in 1..found.len() {
            let tail = found[start..].join(" ");
            if is_known(&tail) {
                return (strip_separator(&found[..start]).join(" "), tail);
            }
        }
        let middle = found.len().div_ceil(2);
        (found[..middle].join(" "), found[middle..].join(" "))
    }
}
