pub mod adapter;
pub mod setup;
pub mod sqlite;
pub mod update;

pub use adapter::{EncodingPolicy, Record, RecordFile, RecordList, ResultsStore};
pub use sqlite::SqliteStore;
pub use update::{update_event, UpdateSummary};
