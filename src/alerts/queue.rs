use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::forecast::{ForecastPoint, OffsetLabel};
use crate::status::StatusTier;

/// Default pc0.1 level above which a labeled value raises an alert.
pub const ALERT_THRESHOLD: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEvent {
    pub offset: OffsetLabel,
    pub value: f64,
    pub tier: StatusTier,
}

/// Alerts for every labeled value strictly above `threshold`, in
/// chronological order (current first, then each forecast).
pub fn derive_alerts(current: f64, forecast: &[ForecastPoint], threshold: f64) -> Vec<AlertEvent> {
    let labeled = std::iter::once((OffsetLabel::Current, current))
        .chain(forecast.iter().map(|point| (point.offset, point.value as f64)));

    labeled
        .filter(|(_, value)| *value > threshold)
        .map(|(offset, value)| AlertEvent {
            offset,
            value,
            tier: StatusTier::classify(value),
        })
        .collect()
}

/// Pending alerts awaiting acknowledgment.
///
/// Each ingest cycle replaces the whole queue; acknowledgment pops the head.
/// `revision` moves on every change so observers can detect a new head even
/// when the replacement is value-equal to what it replaced.
#[derive(Debug, Clone, Default)]
pub struct AlertQueue {
    events: VecDeque<AlertEvent>,
    revision: u64,
}

impl AlertQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest snapshot wins, including an empty one (clears pending alerts).
    pub fn replace(&mut self, events: Vec<AlertEvent>) {
        self.events = events.into();
        self.revision = self.revision.wrapping_add(1);
    }

    /// Remove the head; `None` (and no revision change) on an empty queue.
    pub fn acknowledge(&mut self) -> Option<AlertEvent> {
        let popped = self.events.pop_front()?;
        self.revision = self.revision.wrapping_add(1);
        Some(popped)
    }

    pub fn head(&self) -> Option<&AlertEvent> {
        self.events.front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn iter(&self) -> impl Iterator<Item = &AlertEvent> {
        self.events.iter()
    }

    pub fn to_vec(&self) -> Vec<AlertEvent> {
        self.events.iter().copied().collect()
    }
}
