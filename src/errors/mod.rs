use anyhow::Context as _;
use std::path::Path;
use thiserror::Error;

/// A line of an event configuration file that cannot be used.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("line {line}: {key} needs a value")]
    MissingValue { line: usize, key: String },
    #[error("line {line}: {key} value {value:?} is not of the form old=new")]
    BadMapping {
        line: usize,
        key: String,
        value: String,
    },
    #[error("line {line}: {key} names unknown field {field:?}")]
    UnknownField {
        line: usize,
        key: String,
        field: String,
    },
}

/// A format rule whose pattern does not compile.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("pattern {name} does not compile: {source}")]
    Compile {
        name: String,
        #[source]
        source: regex::Error,
    },
}

/// Add context to file read errors
pub fn read_context(path: &Path) -> String {
    format!("Failed to read {}", path.display())
}

/// Add context to parse errors
pub fn parse_context(what: &str, path: &Path) -> String {
    format!("Failed to parse {} from {}", what, path.display())
}

/// Read a whole file as text with the path in the error
pub fn read_to_string(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| read_context(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_names_the_path() {
        let error = read_to_string(Path::new("/no/such/event.conf")).unwrap_err();
        assert!(error.to_string().contains("/no/such/event.conf"));
    }

    #[test]
    fn test_config_error_messages() {
        let error = ConfigError::BadMapping {
            line: 4,
            key: "team_name".to_string(),
            value: "Toytown".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "line 4: team_name value \"Toytown\" is not of the form old=new"
        );
    }
}
