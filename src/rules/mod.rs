pub mod csv_rows;
pub mod engine;
pub mod substitutions;

pub use csv_rows::{CsvMapping, TabularRow, FIELDS};
pub use engine::{ExtractedLine, Extraction, RuleEngine};
pub use substitutions::{Substitutions, ValueMap};
