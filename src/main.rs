use anyhow::Result;

use chess_results::cli::Command;
use chess_results::{handle_completions, handle_extract, handle_update, handle_validate, interpret};

fn main() {
    setup_logging();
    parse_and_execute().unwrap_or_else(|e| {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    });
}

fn setup_logging() {
    sensible_env_logger::init!();
}

fn parse_and_execute() -> Result<()> {
    let command = interpret();
    execute_command(&command)
}

fn execute_command(command: &Command) -> Result<()> {
    match command {
        Command::Extract {
            config,
            schedule_out,
            results_out,
            inputs,
        } => handle_extract(
            config.as_deref(),
            schedule_out.as_deref(),
            results_out.as_deref(),
            inputs,
        ),
        Command::Validate {
            schedule,
            results,
            config,
            json,
        } => handle_validate(schedule, results, config.as_deref(), *json),
        Command::Update {
            schedule,
            results,
            config,
            database,
        } => handle_update(schedule, results, config.as_deref(), database.as_deref()),
        Command::Completions { shell } => handle_completions(*shell),
    }
}
