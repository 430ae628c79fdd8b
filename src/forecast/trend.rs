use crate::forecast::{config::ForecastConfig, ForecastPoint, OffsetLabel};

/// Ordinary least-squares slope of `history` against index positions 0..n-1.
///
/// Returns `None` for fewer than two points.
pub fn least_squares_slope(history: &[f64]) -> Option<f64> {
    let n = history.len();
    if n < 2 {
        return None;
    }

    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);
    for (x, &y) in history.iter().enumerate() {
        let x = x as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }

    let n = n as f64;
    let denominator = n * sum_xx - sum_x * sum_x;
    // Index positions are distinct, so this only trips on absurd lengths.
    if denominator == 0.0 {
        return None;
    }
    Some((n * sum_xy - sum_x * sum_y) / denominator)
}

/// Project the four forward points from `history` (oldest → newest).
///
/// Flat projection of the last value when fewer than two points exist.
pub fn project(history: &[f64], config: &ForecastConfig) -> [ForecastPoint; 4] {
    let last = history.last().copied().unwrap_or(0.0);
    let slope = least_squares_slope(history)
        .map(|b| b.clamp(-config.max_abs_slope, config.max_abs_slope))
        .unwrap_or(0.0);

    OffsetLabel::FORECAST.map(|offset| ForecastPoint {
        offset,
        value: extrapolate(last, slope, offset.step_multiplier()),
    })
}

fn extrapolate(last: f64, slope: f64, multiplier: u32) -> u64 {
    let projected = (last + slope * f64::from(multiplier)).round();
    if projected.is_finite() && projected > 0.0 {
        projected as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(points: &[ForecastPoint; 4]) -> [u64; 4] {
        points.map(|p| p.value)
    }

    #[test]
    fn short_history_projects_flat() {
        let config = ForecastConfig::default();
        assert_eq!(values(&project(&[], &config)), [0, 0, 0, 0]);
        assert_eq!(values(&project(&[4321.0], &config)), [4321; 4]);
    }

    #[test]
    fn linear_history_extrapolates_exactly() {
        let config = ForecastConfig::default();
        let history: Vec<f64> = (0..6).map(|i| 1_000.0 + 40.0 * i as f64).collect();
        // last = 1200, slope = 40
        assert_eq!(values(&project(&history, &config)), [1400, 1600, 1800, 2000]);
    }

    #[test]
    fn steep_slope_is_clamped() {
        let config = ForecastConfig::default();
        let history = [0.0, 5_000.0, 10_000.0];
        // slope 5000 clamps to 1000
        assert_eq!(
            values(&project(&history, &config)),
            [15_000, 20_000, 25_000, 30_000]
        );
    }

    #[test]
    fn falling_trend_floors_at_zero() {
        let config = ForecastConfig::default();
        let history = [9_000.0, 6_000.0, 3_000.0];
        // slope -3000 clamps to -1000; 3000 - 5000 < 0
        assert_eq!(values(&project(&history, &config)), [0, 0, 0, 0]);
    }

    #[test]
    fn rounds_half_up() {
        let config = ForecastConfig::default();
        // slope 0.5 -> 100 + 2.5 = 102.5 -> 103
        let history = [99.5, 100.0];
        assert_eq!(project(&history, &config)[0].value, 103);
    }

    #[test]
    fn labels_are_in_chronological_order() {
        let config = ForecastConfig::default();
        let labels = project(&[1.0, 2.0], &config).map(|p| p.offset);
        assert_eq!(labels, OffsetLabel::FORECAST);
    }

    #[test]
    fn slope_of_noisy_series_matches_closed_form() {
        let slope = least_squares_slope(&[1.0, 3.0, 2.0, 5.0]).unwrap();
        // n=4, Σx=6, Σy=11, Σxy=0+3+4+15=22, Σx²=14 -> (88-66)/(56-36) = 1.1
        assert!((slope - 1.1).abs() < 1e-9);
    }
}
