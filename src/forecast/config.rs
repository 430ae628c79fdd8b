/// Tunables for the short-horizon trend projection.
#[derive(Debug, Clone)]
pub struct ForecastConfig {
    /// Number of most recent pc0.1 values kept for the trend fit
    pub history_capacity: usize,

    /// Fitted slope is clamped to `[-max_abs_slope, max_abs_slope]` before extrapolating
    pub max_abs_slope: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            history_capacity: 10,
            max_abs_slope: 1_000.0,
        }
    }
}
