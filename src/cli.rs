use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "chess event results parser and collator")]
pub struct Cli {
    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "lower_case")]
pub enum Command {
    /// Extract the schedule and results texts from report documents
    Extract {
        /// Event configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the schedule text here instead of standard output
        #[arg(long)]
        schedule_out: Option<PathBuf>,
        /// Write the results text here instead of standard output
        #[arg(long)]
        results_out: Option<PathBuf>,
        /// Report documents: text, CSV or TSV files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Collate a results text against a schedule text and report problems
    Validate {
        /// Schedule text
        #[arg(short, long)]
        schedule: PathBuf,
        /// Results text
        #[arg(short, long)]
        results: PathBuf,
        /// Event configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print the collated event as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate and store the event's results in the database
    Update {
        /// Schedule text
        #[arg(short, long)]
        schedule: PathBuf,
        /// Results text
        #[arg(short, long)]
        results: PathBuf,
        /// Event configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Database file (defaults to DATABASE_PATH or chess_results.db)
        #[arg(short, long)]
        database: Option<String>,
    },
    /// Print shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}
