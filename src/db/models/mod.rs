pub mod log_entry;

pub use log_entry::{DayGroup, ImportSummary, LogEntry, StoreChange};
