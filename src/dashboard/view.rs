use std::fmt::Write;

use crate::utils::{format_count, format_number};

use super::DashboardSnapshot;

fn measurement(value: Option<f64>, unit: &str) -> String {
    value
        .map(|v| format!("{}{unit}", format_number(v)))
        .unwrap_or_else(|| "-".to_string())
}

/// Plain-text rendering of a snapshot for the terminal.
pub fn render(snapshot: &DashboardSnapshot) -> String {
    if snapshot.loading {
        return "Loading readings...".to_string();
    }

    let mut out = String::new();
    let latest = snapshot.latest.clone().unwrap_or_default();

    let _ = writeln!(
        out,
        "PC0.1 {} particles/cm³  [{}] ({})",
        format_count(snapshot.current_pc01),
        snapshot.status.label(),
        latest.display_time()
    );
    let _ = writeln!(
        out,
        "PM2.5 {}  PM10 {}  Temp {}  Humidity {}  Wind {}",
        measurement(latest.pm2_5, " µg/m³"),
        measurement(latest.pm10, " µg/m³"),
        measurement(latest.temperature, "°C"),
        measurement(latest.humidity, "%"),
        measurement(latest.wind_speed, " m/s"),
    );

    let forecast: Vec<String> = snapshot
        .forecast
        .iter()
        .map(|f| format!("{} {} ({})", f.offset, format_count(f.value as f64), f.tier.label()))
        .collect();
    let _ = writeln!(out, "Forecast: {}", forecast.join(" | "));

    match snapshot.alerts.first() {
        Some(head) => {
            let _ = write!(
                out,
                "ALERT {} {}: {} pc/cm³ ({} pending, type 'ack' to acknowledge)",
                head.offset,
                head.tier.label().to_uppercase(),
                format_count(head.value),
                snapshot.alerts.len()
            );
        }
        None => {
            let _ = write!(out, "No alerts");
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertEvent;
    use crate::dashboard::ForecastView;
    use crate::forecast::OffsetLabel;
    use crate::models::Reading;
    use crate::status::StatusTier;

    fn snapshot() -> DashboardSnapshot {
        DashboardSnapshot {
            loading: false,
            authenticated: true,
            latest: Some(Reading {
                pc0_1: Some(12_000.0),
                temperature: Some(28.5),
                ..Reading::default()
            }),
            current_pc01: 12_000.0,
            status: StatusTier::Uncomfortable,
            forecast: OffsetLabel::FORECAST
                .iter()
                .map(|&offset| ForecastView {
                    offset,
                    value: 12_000,
                    tier: StatusTier::Uncomfortable,
                })
                .collect(),
            alerts: vec![AlertEvent {
                offset: OffsetLabel::Current,
                value: 12_000.0,
                tier: StatusTier::Uncomfortable,
            }],
            alert_revision: 1,
            updated_at: None,
        }
    }

    #[test]
    fn renders_reading_forecast_and_head() {
        let text = render(&snapshot());
        assert!(text.contains("PC0.1 12,000 particles/cm³  [Uncomfortable]"));
        assert!(text.contains("Temp 28.5°C"));
        assert!(text.contains("+60 min 12,000 (Uncomfortable)"));
        assert!(text.contains("ALERT Current UNCOMFORTABLE: 12,000 pc/cm³ (1 pending"));
    }

    #[test]
    fn loading_has_its_own_state() {
        let mut snap = snapshot();
        snap.loading = true;
        assert_eq!(render(&snap), "Loading readings...");
    }
}
