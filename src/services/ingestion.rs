use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use csv::ReaderBuilder;
use log::{debug, info};
use std::path::Path;

use crate::config::EventConfig;
use crate::errors::{parse_context, read_context, read_to_string};
use crate::rules::CsvMapping;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentContent {
    Text(String),
    Rows {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

/// One input file, ready for the format rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub source: String,
    /// When the document arrived; the file's modification time.
    pub received: Option<NaiveDateTime>,
    pub content: DocumentContent,
}

impl SourceDocument {
    pub fn text(source: &str, text: &str) -> Self {
        Self {
            source: source.to_string(),
            received: None,
            content: DocumentContent::Text(text.to_string()),
        }
    }

    /// Text for the format rules. CSV rows become tabular lines or plain
    /// text, as the mapping decides.
    pub fn lines(&self, mapping: &CsvMapping) -> String {
        match &self.content {
            DocumentContent::Text(text) => text.clone(),
            DocumentContent::Rows { headers, rows } => mapping.transform(headers, rows).join("\n"),
        }
    }
}

fn modified(path: &Path) -> Option<NaiveDateTime> {
    let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok()?;
    Some(DateTime::<Utc>::from(modified).naive_utc())
}

fn delimiter(path: &Path) -> Option<u8> {
    match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
        "csv" => Some(b','),
        "tsv" | "tab" => Some(b'\t'),
        _ => None,
    }
}

fn read_rows(path: &Path, delimiter: u8) -> Result<DocumentContent> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .with_context(|| read_context(path))?;
    let headers = reader
        .headers()
        .with_context(|| parse_context("headers", path))?
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
        .collect::<Result<Vec<Vec<String>>, _>>()
        .with_context(|| parse_context("rows", path))?;
    Ok(DocumentContent::Rows { headers, rows })
}

pub struct IngestionService<'a> {
    config: &'a EventConfig,
}

impl<'a> IngestionService<'a> {
    pub fn new(config: &'a EventConfig) -> Self {
        Self { config }
    }

    /// Read one file. The configured source replaces the file name.
    pub fn read(&self, path: &Path) -> Result<SourceDocument> {
        let content = match delimiter(path) {
            Some(delimiter) => read_rows(path, delimiter)?,
            None => DocumentContent::Text(read_to_string(path)?),
        };
        let source = self.config.source.clone().unwrap_or_else(|| {
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string())
        });
        let received = modified(path);
        debug!("Read {} as {} received {:?}", path.display(), source, received);
        Ok(SourceDocument {
            source,
            received,
            content,
        })
    }

    pub fn read_all<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<SourceDocument>> {
        let documents = paths
            .iter()
            .map(|path| self.read(path.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        info!("  → Read {} documents", documents.len());
        Ok(documents)
    }
}
