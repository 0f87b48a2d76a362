pub mod classifier;
pub mod cli;
pub mod collation;
pub mod config;
pub mod context;
pub mod database;
pub mod domain;
pub mod errors;
pub mod lexical;
pub mod names;
pub mod report;
pub mod rules;
pub mod schedule;
pub mod services;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use cli::Cli;
use std::path::{Path, PathBuf};

use crate::cli::Command;
use crate::collation::{validation_report, EventSummary};
use crate::config::settings::AppConfig;
use crate::config::EventConfig;
use crate::errors::read_to_string;
use crate::services::ingestion::IngestionService;
use crate::services::processing::{ProcessingService, Validation};

pub fn interpret() -> Command {
    let cli = Cli::parse();
    cli.command
}

fn load_event_config(path: Option<&Path>) -> Result<EventConfig> {
    match path {
        Some(path) => EventConfig::load(path),
        None => Ok(EventConfig::default()),
    }
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn validate_files(service: &ProcessingService, schedule: &Path, results: &Path) -> Result<Validation> {
    let schedule_text = read_to_string(schedule)?;
    let results_text = read_to_string(results)?;
    Ok(service.validate_now(
        &source_name(schedule),
        &schedule_text,
        &source_name(results),
        &results_text,
    ))
}

fn write_or_print(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display())),
        None => {
            print!("{}", text);
            Ok(())
        }
    }
}

pub fn handle_extract(
    config: Option<&Path>,
    schedule_out: Option<&Path>,
    results_out: Option<&Path>,
    inputs: &[PathBuf],
) -> Result<()> {
    let event = load_event_config(config)?;
    let documents = IngestionService::new(&event).read_all(inputs)?;
    let service = ProcessingService::new(AppConfig::new(), event)?;
    let extracted = service.extract(&documents);
    for diagnostic in &extracted.diagnostics {
        eprintln!("{}", diagnostic);
    }
    write_or_print(schedule_out, &extracted.schedule_text)?;
    write_or_print(results_out, &extracted.results_text)
}

pub fn handle_validate(schedule: &Path, results: &Path, config: Option<&Path>, json: bool) -> Result<()> {
    let service = ProcessingService::new(AppConfig::new(), load_event_config(config)?)?;
    let validation = validate_files(&service, schedule, results)?;
    if json {
        let summary = EventSummary::new(&validation.schedule, &validation.report, &validation.collation);
        let text = serde_json::to_string_pretty(&summary).context("Failed to serialize event summary")?;
        println!("{}", text);
    } else {
        print!(
            "{}",
            validation_report(
                &validation.schedule,
                &validation.report,
                &validation.collation,
                &validation.texts
            )
        );
    }
    Ok(())
}

pub fn handle_update(schedule: &Path, results: &Path, config: Option<&Path>, database: Option<&str>) -> Result<()> {
    let service = ProcessingService::new(AppConfig::new(), load_event_config(config)?)?;
    let validation = validate_files(&service, schedule, results)?;
    if validation.has_problems() {
        print!(
            "{}",
            validation_report(
                &validation.schedule,
                &validation.report,
                &validation.collation,
                &validation.texts
            )
        );
    }
    let summary = service.update(&validation, database)?;
    println!(
        "Stored event {}: {} players, {} games",
        summary.event_id, summary.players, summary.games
    );
    Ok(())
}

pub fn handle_completions(shell: Shell) -> Result<()> {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
    Ok(())
}
