use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

/// Tunables for the tracker and the event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerSettings {
    /// Period of the partial-flush heartbeat while a session is open.
    pub heartbeat_interval_secs: u64,
    /// Spans shorter than this are dropped before they reach the store.
    pub min_event_duration_secs: u64,
    /// Events older than this are eligible for the retention purge.
    pub retention_days: u32,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: 30,
            min_event_duration_secs: 5,
            retention_days: 365,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct StoredSettings {
    tracker: TrackerSettings,
}

/// JSON-backed settings file. Reads once on construction; every update is
/// written through to disk.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<StoredSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            StoredSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn tracker(&self) -> TrackerSettings {
        self.data.read().unwrap().tracker.clone()
    }

    pub fn update_tracker(&self, settings: TrackerSettings) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        guard.tracker = settings;
        self.persist(&guard)
    }

    fn persist(&self, data: &StoredSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
