use regex::Regex;

/// Competition names the classifier recognises inside a line.
#[derive(Debug, Clone, Default)]
pub struct CompetitionNames {
    names: Vec<(String, Regex)>,
}

impl CompetitionNames {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut known = Self::default();
        for name in names {
            known.insert(name.as_ref());
        }
        known
    }

    pub fn insert(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() || self.contains(name) {
            return;
        }
        let pattern = format!(r"(?i)(?:^|\s)({})(?:$|\s)", regex::escape(name));
        match Regex::new(&pattern) {
            Ok(regex) => {
                self.names.push((name.to_string(), regex));
                // Longest first, so "Division 1A" wins over "Division 1".
                self.names.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(&b.0)));
            }
            Err(e) => log::warn!("Competition name {:?} not usable: {}", name, e),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|(known, _)| known.eq_ignore_ascii_case(name.trim()))
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|(name, _)| name.as_str())
    }

    /// First known competition in `text`, with its byte range.
    pub fn find(&self, text: &str) -> Option<(String, usize, usize)> {
        self.names.iter().find_map(|(name, regex)| {
            let found = regex.captures(text)?.get(1)?;
            Some((name.clone(), found.start(), found.end()))
        })
    }

    /// The known competition `text` consists of, if any.
    pub fn exact(&self, text: &str) -> Option<String> {
        let text = text.trim();
        self.names
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(text))
            .map(|(name, _)| name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_name_wins() {
        let names = CompetitionNames::new(["Division 1", "Division 1A"]);
        let (name, start, end) = names.find("Division 1A 2024-10-05").unwrap();
        assert_eq!(name, "Division 1A");
        assert_eq!((start, end), (0, 11));
    }

    #[test]
    fn test_names_match_whole_words() {
        let names = CompetitionNames::new(["Open"]);
        assert!(names.find("Openshaw 1-0 Smith").is_none());
        assert_eq!(names.find("the open round 2").map(|f| f.0), Some("Open".to_string()));
        assert_eq!(names.exact(" OPEN "), Some("Open".to_string()));
    }
}
