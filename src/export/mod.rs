//! CSV downloads: one day, or every day matching a [`DateFilter`].
//!
//! Documents are fully rendered in memory before anything touches the disk,
//! so a failed export never leaves a partial file behind.

pub mod csv;
pub mod filter;

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::info;
use serde::Serialize;

use crate::db::{validate_day, Database};
use crate::error::ExportError;

pub use filter::DateFilter;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOutcome {
    pub path: PathBuf,
    pub rows: usize,
    pub days: usize,
}

pub fn day_file_name(date: &str) -> String {
    format!("env_data_{date}.csv")
}

pub fn range_file_name(filter: &DateFilter) -> String {
    if filter.has_range() {
        format!(
            "env_data_filtered_{}_to_{}.csv",
            filter.start.as_deref().unwrap_or("start"),
            filter.end.as_deref().unwrap_or("end")
        )
    } else {
        "env_data_all_records.csv".to_string()
    }
}

/// Available day keys, newest first, narrowed by `filter`.
pub async fn list_dates(db: &Database, filter: &DateFilter) -> Result<Vec<String>, ExportError> {
    let days = db.list_days().await.map_err(ExportError::Store)?;
    Ok(filter.apply(&days))
}

pub async fn export_day(db: &Database, date: &str, out_dir: &Path) -> Result<ExportOutcome, ExportError> {
    validate_day(date).map_err(|_| ExportError::InvalidDate(date.to_string()))?;

    let entries = db
        .get_day(date)
        .await
        .map_err(ExportError::Store)?
        .unwrap_or_default();
    if entries.is_empty() {
        return Err(ExportError::NoRecords {
            scope: date.to_string(),
        });
    }

    let content = csv::render_day(entries.iter().map(|entry| &entry.reading));
    let path = write_document(out_dir, &day_file_name(date), &content)?;
    info!("Exported {} records of {date} to {}", entries.len(), path.display());

    Ok(ExportOutcome {
        path,
        rows: entries.len(),
        days: 1,
    })
}

/// Every record of every matching day, newest day first. Days are fetched one
/// after another.
pub async fn export_range(
    db: &Database,
    filter: &DateFilter,
    out_dir: &Path,
) -> Result<ExportOutcome, ExportError> {
    let dates = list_dates(db, filter).await?;
    if dates.is_empty() {
        return Err(ExportError::NoMatchingDates);
    }

    let mut rows = Vec::new();
    for date in &dates {
        if let Some(entries) = db.get_day(date).await.map_err(ExportError::Store)? {
            rows.extend(csv::bulk_rows(date, entries.iter().map(|entry| &entry.reading)));
        }
    }

    if rows.is_empty() {
        return Err(ExportError::NoRecords {
            scope: format!("the {} selected days", dates.len()),
        });
    }

    let content = csv::render_bulk(&rows);
    let path = write_document(out_dir, &range_file_name(filter), &content)?;
    info!(
        "Exported {} records from {} days to {}",
        rows.len(),
        dates.len(),
        path.display()
    );

    Ok(ExportOutcome {
        path,
        rows: rows.len(),
        days: dates.len(),
    })
}

fn write_document(out_dir: &Path, file_name: &str, content: &str) -> Result<PathBuf, ExportError> {
    let path = out_dir.join(file_name);
    let io_err = |source| ExportError::Io {
        path: path.display().to_string(),
        source,
    };
    fs::create_dir_all(out_dir).map_err(io_err)?;
    fs::write(&path, content).map_err(io_err)?;
    Ok(path)
}
