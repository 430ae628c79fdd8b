// User-facing failure categories.
//
// Internals propagate `anyhow::Error`; these enums are what views and the CLI
// turn into messages. None of them is fatal: the caller reports and carries on.

use thiserror::Error;

/// Failures surfaced by the per-day detail view and other protected views.
#[derive(Debug, Error)]
pub enum ViewError {
    /// The view requires a signed-in profile.
    #[error("Please sign in to use this feature.")]
    Unauthenticated,

    /// No date was given; the caller should fall back to the date listing.
    #[error("No date selected.")]
    MissingDate,

    /// The date key does not exist in the store.
    #[error("Date not found in database: {date}")]
    DateNotFound { date: String },

    /// The date exists but holds no records.
    #[error("No data records found for {date}.")]
    NoRecords { date: String },

    /// The store could not be reached or returned garbage.
    #[error("Failed to connect to the database.")]
    Connection(#[source] anyhow::Error),
}

impl ViewError {
    /// Whether the caller should navigate back to the listing instead of
    /// showing a message.
    pub fn redirects_to_listing(&self) -> bool {
        matches!(self, ViewError::MissingDate)
    }
}

/// Failures of the CSV download flows.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No data records match the current filter criteria to download.")]
    NoMatchingDates,

    #[error("No records found for {scope}.")]
    NoRecords { scope: String },

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Failed to download data.")]
    Store(#[source] anyhow::Error),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
