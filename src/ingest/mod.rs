//! Data ingest bridge: turns the newest day groups of the store into the
//! reading list the dashboard pipeline consumes.

pub mod controller;
pub mod loop_worker;

use crate::db::DayGroup;
use crate::forecast::HistoryWindow;
use crate::models::Reading;

pub use controller::IngestController;

/// Readings of every group in day order, then entry-key order.
pub fn flatten(groups: &[DayGroup]) -> Vec<Reading> {
    groups
        .iter()
        .flat_map(|group| group.entries.iter().map(|entry| entry.reading.clone()))
        .collect()
}

/// pc0.1 values of the newest `capacity` readings that carry one.
pub fn pc01_history(readings: &[Reading], capacity: usize) -> HistoryWindow {
    HistoryWindow::from_values(capacity, readings.iter().filter_map(|r| r.pc0_1))
}
