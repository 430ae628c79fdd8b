use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::RwLock,
};

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::alerts::ALERT_THRESHOLD;
use crate::forecast::ForecastConfig;

pub const DATA_DIR_ENV: &str = "PMWATCH_DATA_DIR";
pub const THRESHOLD_ENV: &str = "PMWATCH_THRESHOLD";
pub const DEBUG_ENV: &str = "PMWATCH_DEBUG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertSettings {
    /// pc0.1 level above which a labeled value raises an alert
    pub threshold: f64,
    pub voice_enabled: bool,
    pub title_blink_enabled: bool,
    pub blink_interval_ms: u64,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            threshold: ALERT_THRESHOLD,
            voice_enabled: true,
            title_blink_enabled: true,
            blink_interval_ms: 1_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    /// Day groups requested from the store per refresh
    pub day_groups: usize,
    /// pc0.1 values kept for the trend fit
    pub history_capacity: usize,
    pub max_abs_slope: f64,
}

impl Default for FeedSettings {
    fn default() -> Self {
        let forecast = ForecastConfig::default();
        Self {
            day_groups: 10,
            history_capacity: forecast.history_capacity,
            max_abs_slope: forecast.max_abs_slope,
        }
    }
}

impl FeedSettings {
    pub fn forecast_config(&self) -> ForecastConfig {
        ForecastConfig {
            history_capacity: self.history_capacity.max(1),
            max_abs_slope: self.max_abs_slope.abs(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub alerts: AlertSettings,
    pub feed: FeedSettings,
}

impl Settings {
    /// Environment overrides win over the file; malformed values are ignored.
    fn apply_env_overrides(&mut self) {
        if let Ok(raw) = env::var(THRESHOLD_ENV) {
            match raw.trim().parse::<f64>() {
                Ok(value) if value.is_finite() && value >= 0.0 => self.alerts.threshold = value,
                _ => warn!("Ignoring {THRESHOLD_ENV}={raw}: not a non-negative number"),
            }
        }
    }
}

pub fn debug_mode() -> bool {
    env::var(DEBUG_ENV)
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// `$PMWATCH_DATA_DIR`, else `$XDG_DATA_HOME/pmwatch`, else `~/.local/share/pmwatch`,
/// else `./.pmwatch`.
pub fn default_data_dir() -> PathBuf {
    if let Some(dir) = env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    if let Some(dir) = env::var_os("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(dir).join("pmwatch");
    }
    if let Some(home) = env::var_os("HOME").filter(|v| !v.is_empty()) {
        return Path::new(&home).join(".local").join("share").join("pmwatch");
    }
    PathBuf::from(".pmwatch")
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<Settings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let mut data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Using default settings, {} is invalid: {err}", path.display());
                Settings::default()
            })
        } else {
            Settings::default()
        };
        data.apply_env_overrides();

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn get(&self) -> Settings {
        self.data
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn update_alerts(&self, alerts: AlertSettings) -> Result<()> {
        let mut guard = self
            .data
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.alerts = alerts;
        self.persist(&guard)
    }

    fn persist(&self, data: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        let settings = store.get();
        assert_eq!(settings.feed.day_groups, 10);
        assert_eq!(settings.feed.history_capacity, 10);
        assert!(settings.alerts.voice_enabled);
    }

    #[test]
    fn partial_file_fills_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "alerts": { "voice_enabled": false } }"#).unwrap();
        let settings = SettingsStore::new(path).unwrap().get();
        assert!(!settings.alerts.voice_enabled);
        assert_eq!(settings.alerts.blink_interval_ms, 1_000);
        assert_eq!(settings.feed, FeedSettings::default());
    }

    #[test]
    fn updates_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();
        let alerts = AlertSettings {
            title_blink_enabled: false,
            ..AlertSettings::default()
        };
        store.update_alerts(alerts.clone()).unwrap();

        let reopened = SettingsStore::new(path).unwrap();
        assert_eq!(reopened.get().alerts.title_blink_enabled, alerts.title_blink_enabled);
    }

    #[test]
    fn forecast_config_sanitises_values() {
        let feed = FeedSettings {
            day_groups: 10,
            history_capacity: 0,
            max_abs_slope: -50.0,
        };
        let config = feed.forecast_config();
        assert_eq!(config.history_capacity, 1);
        assert_eq!(config.max_abs_slope, 50.0);
    }
}
