use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::alerts::Severity;

pub const DEFAULT_INTERVAL_MS: u64 = 3_000;
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Tunables for the monitor. Every field has a default so partial files load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MonitorSettings {
    /// Period between analysis cycles.
    pub interval_ms: u64,
    /// Upper bound on grabbing one frame.
    pub capture_timeout_ms: u64,
    /// Timeout applied to each remote model attempt. A timed-out attempt
    /// falls through to the next model.
    pub request_timeout_secs: u64,
    /// Model identifiers, most preferred first.
    pub models: Vec<String>,
    pub api_base: String,
    pub alert_severity: Severity,
    pub webhook_url: Option<String>,
    pub jpeg_quality: u8,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
            capture_timeout_ms: 10_000,
            request_timeout_secs: 10,
            models: vec![
                "gemini-2.0-flash".into(),
                "gemini-1.5-flash".into(),
                "gemini-pro-vision".into(),
                "gemini-pro".into(),
            ],
            api_base: DEFAULT_API_BASE.into(),
            alert_severity: Severity::High,
            webhook_url: None,
            jpeg_quality: 70,
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<MonitorSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!(
                    "Ignoring malformed settings file {}: {err}; using defaults",
                    path.display()
                );
                MonitorSettings::default()
            })
        } else {
            MonitorSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn settings(&self) -> MonitorSettings {
        self.read().clone()
    }

    pub fn update(&self, settings: MonitorSettings) -> Result<()> {
        let mut guard = self.write();
        *guard = settings;
        self.persist(&guard)
    }

    fn persist(&self, data: &MonitorSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, MonitorSettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, MonitorSettings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Reads the model API credential. Empty values count as absent.
pub fn api_key_from_env() -> Option<String> {
    ["HAWKWATCH_API_KEY", "GOOGLE_API_KEY"]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();

        let settings = store.settings();
        assert_eq!(settings.interval_ms, 3_000);
        assert_eq!(settings.models[0], "gemini-2.0-flash");
        assert_eq!(settings.models.last().map(String::as_str), Some("gemini-pro"));
        assert_eq!(settings.alert_severity, Severity::High);
    }

    #[test]
    fn partial_file_fills_remaining_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "intervalMs": 1500, "alertSeverity": "medium" }"#).unwrap();

        let settings = SettingsStore::new(path).unwrap().settings();
        assert_eq!(settings.interval_ms, 1500);
        assert_eq!(settings.alert_severity, Severity::Medium);
        assert_eq!(settings.jpeg_quality, 70);
        assert_eq!(settings.models.len(), 4);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        let settings = SettingsStore::new(path).unwrap().settings();
        assert_eq!(settings, MonitorSettings::default());
    }

    #[test]
    fn update_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();

        let mut changed = store.settings();
        changed.interval_ms = 5_000;
        changed.webhook_url = Some("http://localhost:9000/alerts".into());
        store.update(changed.clone()).unwrap();

        let reopened = SettingsStore::new(path).unwrap();
        assert_eq!(reopened.settings(), changed);
    }
}
