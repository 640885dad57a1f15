//! Permanent road counter data: reading, cleaning and enrichment

mod parser;
mod processor;
mod raw_types;

pub use parser::{load_observations, read_count_records, write_cleaned};
pub use processor::{CleaningStats, DropReason, clean_record, process_counts};
pub use raw_types::{CleanedCountRow, RawCountRecord};
