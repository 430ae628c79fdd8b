use serde::Serialize;

use crate::db::Database;
use crate::error::ViewError;
use crate::models::Reading;

/// One line of the per-day table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailRow {
    pub key: String,
    /// `HH:MM:SS`, or `-` without a usable timestamp
    pub display_time: String,
    pub reading: Reading,
}

pub async fn load_date_detail(db: &Database, date: Option<&str>) -> Result<Vec<DetailRow>, ViewError> {
    let date = match date.map(str::trim) {
        Some(date) if !date.is_empty() => date,
        _ => return Err(ViewError::MissingDate),
    };

    let entries = db
        .get_day(date)
        .await
        .map_err(ViewError::Connection)?
        .ok_or_else(|| ViewError::DateNotFound {
            date: date.to_string(),
        })?;

    if entries.is_empty() {
        return Err(ViewError::NoRecords {
            date: date.to_string(),
        });
    }

    Ok(entries
        .into_iter()
        .map(|entry| DetailRow {
            display_time: entry.reading.display_time(),
            key: entry.key,
            reading: entry.reading,
        })
        .collect())
}
