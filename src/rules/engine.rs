//! Configured format rules: split a document into format blocks and
//! sections, then pull match, played-on and fixture items out of each
//! section and rewrite them as lines for the classifier.

use log::{debug, warn};
use regex::Regex;

use crate::config::{EventConfig, FormatRuleConfig};
use crate::domain::{tagged_lines, Diagnostic, Problem, Tagger};
use crate::errors::RuleError;
use crate::lexical::scanners::{words, TEAM_SEPARATOR};

/// A line ready for the classifier, with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLine {
    pub text: String,
    pub tagger: Tagger,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub lines: Vec<ExtractedLine>,
    /// Section names found by section prefixes.
    pub competitions: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Match,
    PlayedOn,
    Fixture,
}

#[derive(Debug, Clone)]
struct NamedRegex {
    name: String,
    regex: Regex,
}

impl NamedRegex {
    fn compile(name: &str, pattern: &str) -> Result<Self, RuleError> {
        let regex = Regex::new(pattern).map_err(|source| RuleError::Compile {
            name: name.to_string(),
            source,
        })?;
        Ok(Self {
            name: name.to_string(),
            regex,
        })
    }

    fn optional(rule: &FormatRuleConfig, key: &str) -> Result<Option<Self>, RuleError> {
        rule.pattern(key).map(|p| Self::compile(key, p)).transpose()
    }
}

#[derive(Debug, Clone)]
struct RoleRule {
    role: Role,
    body: NamedRegex,
    teams: Option<NamedRegex>,
    games: Option<NamedRegex>,
    finished: Option<NamedRegex>,
    unfinished: Option<NamedRegex>,
    default: Option<NamedRegex>,
    match_date: Option<NamedRegex>,
    match_default: Option<NamedRegex>,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    results_prefix: Option<NamedRegex>,
    section_prefix: Option<NamedRegex>,
    section_body: Option<NamedRegex>,
    roles: Vec<RoleRule>,
}

impl CompiledRule {
    fn compile(rule: &FormatRuleConfig) -> Result<Self, RuleError> {
        let results_prefix = rule
            .results_prefix
            .as_deref()
            .map(|p| NamedRegex::compile("results_prefix", p))
            .transpose()?;

        let mut roles = Vec::new();
        if let Some(body) = NamedRegex::optional(rule, "match_body")? {
            roles.push(RoleRule {
                role: Role::Match,
                body,
                teams: NamedRegex::optional(rule, "teams_body")?,
                games: NamedRegex::optional(rule, "games_body")?,
                finished: NamedRegex::optional(rule, "finished")?,
                unfinished: NamedRegex::optional(rule, "unfinished")?,
                default: NamedRegex::optional(rule, "default")?,
                match_date: NamedRegex::optional(rule, "match_date_body")?,
                match_default: NamedRegex::optional(rule, "match_default")?,
            });
        }
        if let Some(body) = NamedRegex::optional(rule, "played_on_body")? {
            roles.push(RoleRule {
                role: Role::PlayedOn,
                body,
                teams: NamedRegex::optional(rule, "teams_played_on_body")?,
                games: NamedRegex::optional(rule, "games_played_on_body")?,
                finished: NamedRegex::optional(rule, "finished_played_on")?,
                unfinished: NamedRegex::optional(rule, "unfinished_played_on")?,
                default: None,
                match_date: NamedRegex::optional(rule, "match_date_played_on_body")?,
                match_default: None,
            });
        }
        let fixture_key = if rule.pattern("fixture_body").is_some() {
            "fixture_body"
        } else {
            "schedule_body"
        };
        if let Some(body) = NamedRegex::optional(rule, fixture_key)? {
            roles.push(RoleRule {
                role: Role::Fixture,
                body,
                teams: None,
                games: None,
                finished: None,
                unfinished: None,
                default: None,
                match_date: None,
                match_default: None,
            });
        }

        Ok(Self {
            results_prefix,
            section_prefix: NamedRegex::optional(rule, "section_prefix")?,
            section_body: NamedRegex::optional(rule, "section_body")?,
            roles,
        })
    }
}

/// An item pattern matched without its first capture group.
#[derive(Debug)]
struct EngineFailure {
    pattern: String,
    excerpt: String,
}

fn group_one(pattern: &NamedRegex, text: &str) -> Result<Option<String>, EngineFailure> {
    let Some(captures) = pattern.regex.captures(text) else {
        return Ok(None);
    };
    match captures.get(1) {
        Some(group) => Ok(Some(group.as_str().trim().to_string())),
        None => Err(EngineFailure {
            pattern: pattern.name.clone(),
            excerpt: excerpt(text),
        }),
    }
}

fn excerpt(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(60) {
        Some((index, _)) => format!("{}...", &flat[..index]),
        None => flat,
    }
}

/// Group 1 of a body match when the pattern has one, else the whole match.
fn body_text(captures: &regex::Captures<'_>) -> String {
    captures
        .get(1)
        .or_else(|| captures.get(0))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// `Toytown A v Anytown B` becomes `Toytown A matchdefault Anytown B`.
fn match_default_line(teams: &str) -> String {
    let found = words(teams);
    match found.iter().find(|w| TEAM_SEPARATOR.is_match(w.text)) {
        Some(separator) => format!(
            "{} matchdefault {}",
            teams[..separator.start].trim(),
            teams[separator.end..].trim()
        ),
        None => format!("{} matchdefault", teams.trim()),
    }
}

/// Replace group 1 of `pattern` in `game` with `token`.
fn mark_game(pattern: &NamedRegex, game: &str, token: &str) -> Result<Option<String>, EngineFailure> {
    let Some(captures) = pattern.regex.captures(game) else {
        return Ok(None);
    };
    let Some(group) = captures.get(1) else {
        return Err(EngineFailure {
            pattern: pattern.name.clone(),
            excerpt: excerpt(game),
        });
    };
    Ok(Some(format!(
        "{} {} {}",
        game[..group.start()].trim(),
        token,
        game[group.end()..].trim()
    )
    .trim()
    .to_string()))
}

fn non_empty_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty())
}

pub struct RuleEngine {
    rules: Vec<CompiledRule>,
    forwarded: Option<Regex>,
    keep_word_splitters: String,
}

impl RuleEngine {
    /// Compile every pattern of the configuration once.
    pub fn compile(config: &EventConfig) -> Result<Self, RuleError> {
        let rules = config
            .rules
            .iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        let forwarded = config
            .drop_forwarded_markers
            .as_deref()
            .map(|p| NamedRegex::compile("drop_forwarded_markers", p).map(|n| n.regex))
            .transpose()?;
        Ok(Self {
            rules,
            forwarded,
            keep_word_splitters: config.keep_word_splitters.clone(),
        })
    }

    /// Replace characters that are neither alphanumeric, whitespace nor a
    /// kept word splitter with a space. A character between two digits is
    /// kept, so `5/10/2024` stays a date.
    pub fn normalise(&self, text: &str) -> String {
        let chars: Vec<char> = text.chars().collect();
        chars
            .iter()
            .enumerate()
            .map(|(index, &c)| {
                let between_digits = index > 0
                    && chars[index - 1].is_ascii_digit()
                    && chars.get(index + 1).is_some_and(char::is_ascii_digit);
                if c.is_alphanumeric()
                    || c.is_whitespace()
                    || self.keep_word_splitters.contains(c)
                    || (between_digits && c != '\n')
                {
                    c
                } else {
                    ' '
                }
            })
            .collect()
    }

    fn drop_forwarded(&self, text: &str) -> String {
        let Some(forwarded) = &self.forwarded else {
            return text.to_string();
        };
        text.split('\n')
            .map(|line| match forwarded.find(line) {
                Some(m) if m.start() == 0 => &line[m.end()..],
                _ => line,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn extract(&self, source: &str, text: &str) -> Extraction {
        let text = self.drop_forwarded(text);
        let mut extraction = Extraction::default();
        for rule in &self.rules {
            self.apply_rule(rule, source, &text, &mut extraction);
        }
        if extraction.lines.is_empty() {
            debug!("No format rule matched {}, classifying raw lines", source);
            extraction.lines = tagged_lines(source, &text)
                .filter(|(_, line)| !line.trim().is_empty())
                .map(|(tagger, line)| ExtractedLine {
                    text: line.trim().to_string(),
                    tagger,
                })
                .collect();
        }
        extraction
    }

    fn blocks<'a>(&self, rule: &CompiledRule, text: &'a str) -> Vec<(usize, &'a str)> {
        let Some(prefix) = &rule.results_prefix else {
            return vec![(0, text)];
        };
        let starts: Vec<(usize, usize)> = prefix
            .regex
            .find_iter(text)
            .map(|m| (m.start(), m.end()))
            .collect();
        starts
            .iter()
            .enumerate()
            .map(|(index, (_, end))| {
                let next = starts.get(index + 1).map(|s| s.0).unwrap_or(text.len());
                (*end, &text[*end..next])
            })
            .collect()
    }

    fn apply_rule(&self, rule: &CompiledRule, source: &str, text: &str, extraction: &mut Extraction) {
        for (offset, block) in self.blocks(rule, text) {
            let line = text[..offset].matches('\n').count() + 1;
            let tagger = Tagger::new(source, line, offset, offset + block.len());
            let normalised = self.normalise(block);
            if let Err(failure) = self.apply_block(rule, &normalised, &tagger, extraction) {
                warn!(
                    "Format rule {} failed in {}: {}",
                    failure.pattern, source, failure.excerpt
                );
                extraction.diagnostics.push(Diagnostic::error(
                    Problem::EngineFailure,
                    &tagger,
                    format!("{} has no group 1 in {:?}", failure.pattern, failure.excerpt),
                ));
            }
        }
    }

    fn sections(&self, rule: &CompiledRule, block: &str) -> Vec<(Option<String>, String)> {
        let Some(prefix) = &rule.section_prefix else {
            return vec![(None, block.to_string())];
        };
        let found: Vec<(String, usize, usize)> = prefix
            .regex
            .captures_iter(block)
            .filter_map(|c| {
                let whole = c.get(0)?;
                let name = c.get(1).unwrap_or(whole).as_str().trim().to_string();
                Some((name, whole.start(), whole.end()))
            })
            .collect();
        found
            .iter()
            .enumerate()
            .map(|(index, (name, _, end))| {
                let next = found.get(index + 1).map(|f| f.1).unwrap_or(block.len());
                (Some(name.clone()), block[*end..next].to_string())
            })
            .collect()
    }

    fn apply_block(
        &self,
        rule: &CompiledRule,
        block: &str,
        tagger: &Tagger,
        extraction: &mut Extraction,
    ) -> Result<(), EngineFailure> {
        let mut lines = Vec::new();
        for (name, body) in self.sections(rule, block) {
            let body = match &rule.section_body {
                Some(pattern) => match pattern.regex.captures(&body) {
                    Some(captures) => body_text(&captures),
                    None => continue,
                },
                None => body,
            };
            if let Some(name) = name.filter(|n| !n.is_empty()) {
                lines.push(name.clone());
                extraction.competitions.push(name);
            }
            for role in &rule.roles {
                for captures in role.body.regex.captures_iter(&body) {
                    let item = body_text(&captures);
                    lines.extend(self.role_lines(role, &item)?);
                }
            }
        }
        extraction.lines.extend(lines.into_iter().map(|text| ExtractedLine {
            text,
            tagger: tagger.clone(),
        }));
        Ok(())
    }

    fn role_lines(&self, role: &RoleRule, item: &str) -> Result<Vec<String>, EngineFailure> {
        if role.role == Role::Fixture {
            return Ok(non_empty_lines(item).map(str::to_string).collect());
        }

        let prefix = if role.role == Role::PlayedOn { "played on " } else { "" };
        let mut lines = Vec::new();
        if let Some(pattern) = &role.match_date {
            if let Some(date) = group_one(pattern, item)? {
                lines.push(date);
            }
        }

        let teams = match &role.teams {
            Some(pattern) => group_one(pattern, item)?,
            None => None,
        };
        if let Some(teams) = &teams {
            let defaulted = match &role.match_default {
                Some(pattern) => group_one(pattern, item)?.is_some(),
                None => false,
            };
            if defaulted {
                lines.push(match_default_line(teams));
            } else {
                lines.push(format!("{}{}", prefix, teams));
            }
        }

        let Some(games) = &role.games else {
            if teams.is_none() {
                lines.extend(non_empty_lines(item).map(|l| format!("{}{}", prefix, l)));
            }
            return Ok(lines);
        };
        for captures in games.regex.captures_iter(item) {
            let Some(game) = captures.get(1) else {
                return Err(EngineFailure {
                    pattern: games.name.clone(),
                    excerpt: excerpt(item),
                });
            };
            let game = game.as_str().trim();
            let marked = match (&role.unfinished, &role.default) {
                (Some(unfinished), _) if unfinished.regex.is_match(game) => {
                    mark_game(unfinished, game, "unfinished")?
                }
                (_, Some(default)) if default.regex.is_match(game) => {
                    mark_game(default, game, "default")?
                }
                _ => None,
            };
            if let Some(finished) = &role.finished {
                if marked.is_none() && !finished.regex.is_match(game) {
                    debug!("Game {:?} matches no result pattern", game);
                }
            }
            lines.push(format!("{}{}", prefix, marked.unwrap_or_else(|| game.to_string())));
        }
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(config: &str) -> RuleEngine {
        RuleEngine::compile(&EventConfig::parse(config).unwrap()).unwrap()
    }

    #[test]
    fn test_no_rules_yields_raw_lines() {
        let extraction = engine("").extract("doc", "My League\n\n  Smith 1-0 Jones \n");
        let lines: Vec<&str> = extraction.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(lines, vec!["My League", "Smith 1-0 Jones"]);
        assert_eq!(extraction.lines[1].tagger.line, 3);
    }

    #[test]
    fn test_sections_and_games() {
        let config = "\
results_prefix RESULTS
section_prefix (Division \\d+)
match_body (?s)(.+)
teams_body (?m)^(.+ v .+)$
games_body (?m)^(\\d+ .+)$
unfinished (adj)
";
        let text = "preamble\nRESULTS\nDivision 1\nToytown A v Anytown B\n1 Smith 1-0 Jones\n2 Brown adj Green\n";
        let extraction = engine(config).extract("email1", text);
        let lines: Vec<&str> = extraction.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(
            lines,
            vec![
                "Division 1",
                "Toytown A v Anytown B",
                "1 Smith 1-0 Jones",
                "2 Brown unfinished Green",
            ]
        );
        assert_eq!(extraction.competitions, vec!["Division 1"]);
        assert!(extraction.diagnostics.is_empty());
    }

    #[test]
    fn test_played_on_lines_are_marked() {
        let config = "\
played_on_body (?s)PLAYED ON(.+)
";
        let extraction = engine(config).extract("email2", "PLAYED ON\n3 White 0-1 Black\n");
        assert_eq!(extraction.lines[0].text, "played on 3 White 0-1 Black");
    }

    #[test]
    fn test_match_default_line() {
        assert_eq!(
            match_default_line("Toytown A v Anytown B"),
            "Toytown A matchdefault Anytown B"
        );
    }

    #[test]
    fn test_item_without_group_is_an_engine_failure() {
        let config = "\
match_body (?s)(.+)
teams_body .+ v .+
";
        let extraction = engine(config).extract("doc", "Toytown A v Anytown B\n");
        assert_eq!(extraction.diagnostics.len(), 1);
        assert_eq!(extraction.diagnostics[0].problem, Problem::EngineFailure);
        assert!(extraction.diagnostics[0].message.contains("teams_body"));
    }

    #[test]
    fn test_bad_pattern_names_the_key() {
        let config = EventConfig::parse("match_body (unclosed\n").unwrap();
        let error = RuleEngine::compile(&config).err().unwrap();
        assert!(error.to_string().contains("match_body"));
    }

    #[test]
    fn test_normalise_keeps_word_splitters() {
        let engine = engine("");
        assert_eq!(engine.normalise("Smith ½-½ Jones!"), "Smith ½-½ Jones ");
        assert_eq!(engine.normalise("a:b"), "a b");
        assert_eq!(engine.normalise("Date 5/10/2024!"), "Date 5/10/2024 ");
        assert_eq!(engine.normalise("19:30 / 20"), "19:30   20");
    }

    #[test]
    fn test_rule_extracted_date_survives_normalising() {
        let extraction = engine("match_date_body Date (.+)\n").extract("email1", "Date 5/10/2024\n");
        let lines: Vec<&str> = extraction.lines.iter().map(|l| l.text.as_str()).collect();
        assert!(lines.contains(&"5/10/2024"), "{:?}", lines);
        let expected = chrono::NaiveDate::from_ymd_opt(2024, 10, 5);
        assert_eq!(crate::lexical::dates::parse("5/10/2024"), expected);
    }
}
