//! Store-side grouping of readings: `env_logs/{day}/{entry_key}`.

use serde::{Deserialize, Serialize};

use crate::models::Reading;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub key: String,
    pub reading: Reading,
}

/// All entries of one day, ordered by entry key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayGroup {
    pub day: String,
    pub entries: Vec<LogEntry>,
}

/// Published to subscribers after every successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    Written { day: String, key: String },
    Imported { days: usize, entries: usize },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub days: usize,
    pub entries: usize,
    pub skipped: usize,
}
