pub mod config;
pub mod trend;
pub mod window;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use config::ForecastConfig;
pub use trend::{least_squares_slope, project};
pub use window::HistoryWindow;

/// Named horizon of a labeled value, in chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OffsetLabel {
    Current,
    In15Min,
    In30Min,
    In45Min,
    In60Min,
}

impl OffsetLabel {
    pub const ALL: [OffsetLabel; 5] = [
        OffsetLabel::Current,
        OffsetLabel::In15Min,
        OffsetLabel::In30Min,
        OffsetLabel::In45Min,
        OffsetLabel::In60Min,
    ];

    pub const FORECAST: [OffsetLabel; 4] = [
        OffsetLabel::In15Min,
        OffsetLabel::In30Min,
        OffsetLabel::In45Min,
        OffsetLabel::In60Min,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            OffsetLabel::Current => "Current",
            OffsetLabel::In15Min => "+15 min",
            OffsetLabel::In30Min => "+30 min",
            OffsetLabel::In45Min => "+45 min",
            OffsetLabel::In60Min => "+60 min",
        }
    }

    /// Multiplier applied to the per-step slope.
    pub fn step_multiplier(&self) -> u32 {
        match self {
            OffsetLabel::Current => 0,
            OffsetLabel::In15Min => 5,
            OffsetLabel::In30Min => 10,
            OffsetLabel::In45Min => 15,
            OffsetLabel::In60Min => 20,
        }
    }
}

impl fmt::Display for OffsetLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPoint {
    pub offset: OffsetLabel,
    pub value: u64,
}
