//! CSV rows to classifier lines.
//!
//! A row whose columns cover a configured mapping becomes one tab-delimited
//! line of the standard report fields, wrapped in a leading and trailing tab.
//! Other rows become plain text.

use std::collections::{BTreeMap, BTreeSet};

use super::substitutions::Substitutions;

/// Standard report fields of a tabular line, in line order.
pub const FIELDS: [&str; 15] = [
    "section",
    "day",
    "date",
    "round",
    "home_team",
    "home_team_score",
    "home_player",
    "result",
    "away_player",
    "away_team_score",
    "away_team",
    "board",
    "home_player_colour",
    "event",
    "data_columns",
];

pub fn is_field(name: &str) -> bool {
    FIELDS.contains(&name)
}

/// One tabular line split into the standard fields. Empty fields are empty
/// strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabularRow {
    values: BTreeMap<&'static str, String>,
}

impl TabularRow {
    pub fn get(&self, field: &str) -> &str {
        self.values.get(field).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, field: &str, value: &str) {
        let Some(name) = FIELDS.iter().find(|f| **f == field) else {
            return;
        };
        let value = value.trim();
        if value.is_empty() {
            self.values.remove(*name);
        } else {
            self.values.insert(*name, value.to_string());
        }
    }

    /// The line form: a tab, the fields joined by tabs, a tab.
    pub fn to_line(&self) -> String {
        let joined: Vec<&str> = FIELDS.iter().map(|f| self.get(f)).collect();
        format!("\t{}\t", joined.join("\t"))
    }

    /// Parse a line in the form written by `to_line`.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let pieces: Vec<&str> = line.split('\t').collect();
        if pieces.len() != FIELDS.len() + 2 {
            return None;
        }
        if !pieces[0].trim().is_empty() || !pieces[FIELDS.len() + 1].trim().is_empty() {
            return None;
        }
        let mut row = Self::default();
        for (field, value) in FIELDS.iter().zip(&pieces[1..=FIELDS.len()]) {
            row.set(field, value);
        }
        Some(row)
    }
}

/// Column mappings and substitutions for CSV inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvMapping {
    /// Standard field to CSV column heading, for result sheets.
    pub report: BTreeMap<String, String>,
    /// Standard field to CSV column heading, for fixture sheets.
    pub schedule: BTreeMap<String, String>,
    /// Columns copied into plain text when a sheet matches no mapping.
    pub text_from_rows: BTreeSet<String>,
    pub substitutions: Substitutions,
}

impl CsvMapping {
    fn covering<'a>(&'a self, headers: &[String]) -> Option<&'a BTreeMap<String, String>> {
        let covers = |mapping: &BTreeMap<String, String>| {
            !mapping.is_empty()
                && mapping
                    .values()
                    .all(|column| headers.iter().any(|h| h.trim().eq_ignore_ascii_case(column)))
        };
        [&self.report, &self.schedule]
            .into_iter()
            .find(|mapping| covers(mapping))
    }

    /// Lines for the classifier from one sheet.
    pub fn transform(&self, headers: &[String], rows: &[Vec<String>]) -> Vec<String> {
        match self.covering(headers) {
            Some(mapping) => rows
                .iter()
                .map(|row| self.tabular_row(mapping, headers, row).to_line())
                .collect(),
            None => rows
                .iter()
                .map(|row| self.text_row(headers, row))
                .filter(|line| !line.is_empty())
                .collect(),
        }
    }

    fn tabular_row(
        &self,
        mapping: &BTreeMap<String, String>,
        headers: &[String],
        row: &[String],
    ) -> TabularRow {
        let mut tabular = TabularRow::default();
        for (field, column) in mapping {
            let cell = headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(column))
                .and_then(|index| row.get(index))
                .map(String::as_str)
                .unwrap_or("");
            tabular.set(field, &self.substitutions.apply(field, cell));
        }
        tabular
    }

    fn text_row(&self, headers: &[String], row: &[String]) -> String {
        let cells: Vec<&str> = row
            .iter()
            .enumerate()
            .filter(|(index, _)| {
                self.text_from_rows.is_empty()
                    || headers
                        .get(*index)
                        .is_some_and(|h| self.text_from_rows.contains(h.trim()))
            })
            .map(|(_, cell)| cell.trim())
            .filter(|cell| !cell.is_empty())
            .collect();
        cells.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_line_form_has_seventeen_pieces() {
        let mut row = TabularRow::default();
        row.set("home_player", "Smith");
        row.set("result", "1-0");
        let line = row.to_line();
        assert_eq!(line.split('\t').count(), 17);
        assert_eq!(TabularRow::parse_line(&line), Some(row));
        assert_eq!(TabularRow::parse_line("Smith\t1-0\tJones"), None);
    }

    #[test]
    fn test_mapped_sheet_becomes_tabular_lines() {
        let mut mapping = CsvMapping::default();
        mapping.report.insert("home_player".into(), "White".into());
        mapping.report.insert("away_player".into(), "Black".into());
        mapping.report.insert("result".into(), "Score".into());
        mapping.substitutions.add_replace("result", "1", "1-0");

        let headers = strings(&["White", "Score", "Black"]);
        let lines = mapping.transform(&headers, &[strings(&["Smith", "1", "Jones"])]);
        let row = TabularRow::parse_line(&lines[0]).unwrap();
        assert_eq!(row.get("home_player"), "Smith");
        assert_eq!(row.get("result"), "1-0");
        assert_eq!(row.get("away_player"), "Jones");
    }

    #[test]
    fn test_unmapped_sheet_becomes_text() {
        let mut mapping = CsvMapping::default();
        mapping.text_from_rows.insert("Game".into());
        let headers = strings(&["Note", "Game"]);
        let lines = mapping.transform(&headers, &[strings(&["ignored", "Smith 1-0 Jones"])]);
        assert_eq!(lines, vec!["Smith 1-0 Jones".to_string()]);
    }
}
