//! Particle-count severity tiers.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusTier {
    Comfortable,
    Neutral,
    Uncomfortable,
    VeryUncomfortable,
}

/// Tiers in ascending bound order; classification scans this front to back.
pub const TIERS: [StatusTier; 4] = [
    StatusTier::Comfortable,
    StatusTier::Neutral,
    StatusTier::Uncomfortable,
    StatusTier::VeryUncomfortable,
];

impl StatusTier {
    /// Inclusive upper bound on pc0.1 (particles/cm³); `None` is unbounded.
    pub fn upper_bound(&self) -> Option<f64> {
        match self {
            StatusTier::Comfortable => Some(1_000.0),
            StatusTier::Neutral => Some(10_000.0),
            StatusTier::Uncomfortable => Some(50_000.0),
            StatusTier::VeryUncomfortable => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusTier::Comfortable => "Comfortable",
            StatusTier::Neutral => "Neutral",
            StatusTier::Uncomfortable => "Uncomfortable",
            StatusTier::VeryUncomfortable => "Very Uncomfortable",
        }
    }

    /// Icon name handed to the desktop notifier.
    pub fn icon(&self) -> &'static str {
        match self {
            StatusTier::Comfortable => "face-smile",
            StatusTier::Neutral => "face-plain",
            StatusTier::Uncomfortable => "face-worried",
            StatusTier::VeryUncomfortable => "face-sick",
        }
    }

    pub fn classify(value: f64) -> StatusTier {
        TIERS
            .iter()
            .copied()
            .find(|tier| match tier.upper_bound() {
                Some(bound) => value <= bound,
                None => true,
            })
            .unwrap_or(StatusTier::VeryUncomfortable)
    }
}
