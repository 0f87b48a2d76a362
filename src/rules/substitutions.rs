use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Alias table such as team-name or competition-name substitutions.
/// Lookups ignore case and surrounding whitespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueMap {
    entries: BTreeMap<String, String>,
}

impl ValueMap {
    pub fn insert(&mut self, old: &str, new: &str) {
        self.entries
            .insert(old.trim().to_lowercase(), new.trim().to_string());
    }

    pub fn get(&self, value: &str) -> Option<&str> {
        self.entries
            .get(&value.trim().to_lowercase())
            .map(String::as_str)
    }

    /// The alias of `value`, or `value` itself.
    pub fn resolve(&self, value: &str) -> String {
        self.get(value)
            .map(str::to_string)
            .unwrap_or_else(|| value.trim().to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Per-column value replacements applied to CSV cells before assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitutions {
    whole: BTreeMap<String, ValueMap>,
    partial: BTreeMap<String, Vec<(String, String)>>,
}

impl Substitutions {
    pub fn add_replace(&mut self, field: &str, old: &str, new: &str) {
        self.whole
            .entry(field.to_string())
            .or_default()
            .insert(old, new);
    }

    pub fn add_partial_replace(&mut self, field: &str, old: &str, new: &str) {
        self.partial
            .entry(field.to_string())
            .or_default()
            .push((old.to_string(), new.to_string()));
    }

    pub fn apply(&self, field: &str, value: &str) -> String {
        let mut value = match self.whole.get(field).and_then(|m| m.get(value)) {
            Some(new) => new.to_string(),
            None => value.trim().to_string(),
        };
        for (old, new) in self.partial.get(field).into_iter().flatten() {
            value = value.replace(old.as_str(), new);
        }
        value
    }
}
