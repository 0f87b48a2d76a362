use serde::{Deserialize, Serialize};

/// Origin of a parsed item: the document it came from and the line and
/// character range inside that document's text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tagger {
    pub source: String,
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

impl Tagger {
    pub fn new(source: &str, line: usize, start: usize, end: usize) -> Self {
        Self {
            source: source.to_string(),
            line,
            start,
            end,
        }
    }

    /// Tagger for a whole line when character offsets are not tracked.
    pub fn for_line(source: &str, line: usize) -> Self {
        Self::new(source, line, 0, 0)
    }

    /// Text covered by this tagger, or an empty string when the range does
    /// not fall on character boundaries of `text`.
    pub fn excerpt<'a>(&self, text: &'a str) -> &'a str {
        if self.start >= self.end {
            return "";
        }
        text.get(self.start..self.end).unwrap_or("")
    }

    pub fn describe(&self) -> String {
        format!("{} line {}", self.source, self.line)
    }
}

/// Iterate the lines of `text` with a tagger for each, skipping nothing.
///
/// Line numbers start at 1; offsets are byte offsets into `text`.
pub fn tagged_lines<'a>(source: &'a str, text: &'a str) -> impl Iterator<Item = (Tagger, &'a str)> + 'a {
    let mut offset = 0;
    text.split('\n').enumerate().map(move |(idx, raw)| {
        let start = offset;
        offset += raw.len() + 1;
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        (Tagger::new(source, idx + 1, start, start + line.len()), line)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_lines_track_offsets() {
        let text = "first\r\nsecond line\nthird";
        let lines: Vec<_> = tagged_lines("doc", text).collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].1, "first");
        assert_eq!(lines[1].0.line, 2);
        assert_eq!(lines[1].0.excerpt(text), "second line");
        assert_eq!(lines[2].0.excerpt(text), "third");
    }
}
