//! Sensor reading data model.
//!
//! A `Reading` is one timestamped sample as stored under
//! `env_logs/{date}/{key}`. Field names follow the store's record layout.

use std::fmt;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::format_number;

/// Record timestamp as written by the sensor gateway: epoch milliseconds
/// (integral or not) or a free-form text stamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Millis(i64),
    FractionalMillis(f64),
    Text(String),
}

impl Timestamp {
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::Millis(ms) => Utc.timestamp_millis_opt(*ms).single(),
            // Sub-millisecond digits are truncated.
            Timestamp::FractionalMillis(ms) if ms.is_finite() => {
                Utc.timestamp_millis_opt(ms.trunc() as i64).single()
            }
            Timestamp::FractionalMillis(_) => None,
            Timestamp::Text(raw) => {
                let raw = raw.trim();
                if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
                    return Some(dt.with_timezone(&Utc));
                }
                ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                    .and_then(|naive| Local.from_local_datetime(&naive).single())
                    .map(|dt| dt.with_timezone(&Utc))
            }
        }
    }

    /// `HH:MM:SS` in local time, or `-` when the stamp cannot be interpreted.
    pub fn display_time(&self) -> String {
        self.to_datetime()
            .map(|dt| dt.with_timezone(&Local).format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Millis(ms) => write!(f, "{ms}"),
            Timestamp::FractionalMillis(ms) => f.write_str(&format_number(*ms)),
            Timestamp::Text(raw) => f.write_str(raw),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
    #[serde(rename = "Pc0_1", default, skip_serializing_if = "Option::is_none")]
    pub pc0_1: Option<f64>,
    #[serde(rename = "PM2_5", default, skip_serializing_if = "Option::is_none")]
    pub pm2_5: Option<f64>,
    #[serde(rename = "PM10", default, skip_serializing_if = "Option::is_none")]
    pub pm10: Option<f64>,
    #[serde(rename = "Temperature", default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(rename = "Humidity", default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(rename = "Wind_speed", default, skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    /// Gateway-side forecasts, exported as-is.
    #[serde(rename = "Pc0_1_15min", default, skip_serializing_if = "Option::is_none")]
    pub pc0_1_15min: Option<f64>,
    #[serde(rename = "Pc0_1_30min", default, skip_serializing_if = "Option::is_none")]
    pub pc0_1_30min: Option<f64>,
    #[serde(rename = "Pc0_1_60min", default, skip_serializing_if = "Option::is_none")]
    pub pc0_1_60min: Option<f64>,
}

/// Export/detail columns in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingField {
    Time,
    Pm2_5,
    Pm10,
    Pc0_1,
    Temperature,
    Humidity,
    WindSpeed,
    Pc0_1In15,
    Pc0_1In30,
    Pc0_1In60,
}

impl ReadingField {
    pub const ALL: [ReadingField; 10] = [
        ReadingField::Time,
        ReadingField::Pm2_5,
        ReadingField::Pm10,
        ReadingField::Pc0_1,
        ReadingField::Temperature,
        ReadingField::Humidity,
        ReadingField::WindSpeed,
        ReadingField::Pc0_1In15,
        ReadingField::Pc0_1In30,
        ReadingField::Pc0_1In60,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ReadingField::Time => "Time",
            ReadingField::Pm2_5 => "PM2.5",
            ReadingField::Pm10 => "PM10",
            ReadingField::Pc0_1 => "Pc0.1 (Now)",
            ReadingField::Temperature => "Temp (°C)",
            ReadingField::Humidity => "Humidity (%)",
            ReadingField::WindSpeed => "Wind (m/s)",
            ReadingField::Pc0_1In15 => "+15m",
            ReadingField::Pc0_1In30 => "+30m",
            ReadingField::Pc0_1In60 => "+60m",
        }
    }
}

impl Reading {
    /// Raw string value of a column; `None` when the record lacks it.
    pub fn field(&self, field: ReadingField) -> Option<String> {
        let number = |value: Option<f64>| value.map(format_number);
        match field {
            ReadingField::Time => self.timestamp.as_ref().map(|ts| ts.to_string()),
            ReadingField::Pm2_5 => number(self.pm2_5),
            ReadingField::Pm10 => number(self.pm10),
            ReadingField::Pc0_1 => number(self.pc0_1),
            ReadingField::Temperature => number(self.temperature),
            ReadingField::Humidity => number(self.humidity),
            ReadingField::WindSpeed => number(self.wind_speed),
            ReadingField::Pc0_1In15 => number(self.pc0_1_15min),
            ReadingField::Pc0_1In30 => number(self.pc0_1_30min),
            ReadingField::Pc0_1In60 => number(self.pc0_1_60min),
        }
    }

    pub fn display_time(&self) -> String {
        self.timestamp
            .as_ref()
            .map(Timestamp::display_time)
            .unwrap_or_else(|| "-".to_string())
    }
}
