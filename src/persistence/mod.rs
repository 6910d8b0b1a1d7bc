//! Best-effort persistence
//!
//! Features:
//! - JSON values behind a pluggable [`Storage`] backend
//! - Reads fall back to defaults on any failure
//! - Write failures are logged and swallowed
//! - Export/import of everything as one JSON bundle

pub mod backend;
pub mod records;

use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub use backend::{FileStorage, MemoryStorage, Storage};
pub use records::{PlayerProgress, Statistics};

use crate::error::StorageError;
use crate::highscores::HighScores;
use crate::settings::Settings;

/// Storage keys
pub mod keys {
    pub const HIGH_SCORES: &str = "starrunner_highscores";
    pub const SETTINGS: &str = "starrunner_settings";
    pub const PLAYER_DATA: &str = "starrunner_playerdata";
    pub const STATISTICS: &str = "starrunner_stats";

    pub const ALL: [&str; 4] = [HIGH_SCORES, SETTINGS, PLAYER_DATA, STATISTICS];
}

/// Unix timestamp in milliseconds
pub fn now_millis() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// Everything persisted, as written by [`Persistence::export`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    #[serde(default)]
    pub high_scores: Option<HighScores>,
    #[serde(default)]
    pub settings: Option<Settings>,
    #[serde(default)]
    pub player_data: Option<PlayerProgress>,
    #[serde(default)]
    pub statistics: Option<Statistics>,
    /// Single best score, as written by older exports without a leaderboard
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_score: Option<u64>,
    /// Unix ms when written here; older exports use an ISO date string
    #[serde(default)]
    pub export_date: Option<serde_json::Value>,
}

/// Typed JSON access over a [`Storage`] backend
pub struct Persistence {
    storage: Box<dyn Storage>,
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence")
            .field("available", &self.is_available())
            .finish()
    }
}

impl Persistence {
    pub fn new(storage: impl Storage + 'static) -> Self {
        Self {
            storage: Box::new(storage),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    pub fn is_available(&self) -> bool {
        self.storage.is_available()
    }

    fn try_load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.storage.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Stored value, or `default` if missing, unreadable or storage is down
    pub fn load_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.try_load(key) {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(e) => {
                log::warn!("Failed to load '{}': {}", key, e);
                default
            }
        }
    }

    pub fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.load_or(key, T::default())
    }

    fn try_save<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(value)?;
        self.storage.set(key, &json)
    }

    /// Returns false (after logging) if the write failed
    pub fn save<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> bool {
        match self.try_save(key, value) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to save '{}': {}", key, e);
                false
            }
        }
    }

    /// Remove every known key
    pub fn clear_all(&mut self) -> bool {
        let mut ok = true;
        for key in keys::ALL {
            if let Err(e) = self.storage.remove(key) {
                log::warn!("Failed to clear '{}': {}", key, e);
                ok = false;
            }
        }
        if ok {
            log::info!("All game data cleared");
        }
        ok
    }

    /// Pretty JSON bundle of everything stored (defaults for missing keys)
    pub fn export(&self) -> Option<String> {
        let bundle = ExportBundle {
            high_scores: Some(self.load_or_default(keys::HIGH_SCORES)),
            settings: Some(self.load_or_default(keys::SETTINGS)),
            player_data: Some(self.load_or_default(keys::PLAYER_DATA)),
            statistics: Some(self.load_or_default(keys::STATISTICS)),
            high_score: None,
            export_date: Some(now_millis().into()),
        };
        match serde_json::to_string_pretty(&bundle) {
            Ok(json) => Some(json),
            Err(e) => {
                log::warn!("Failed to export data: {}", e);
                None
            }
        }
    }

    /// Store every section present in an exported bundle. High scores are
    /// merged into the existing leaderboard.
    pub fn import(&mut self, json: &str) -> bool {
        let bundle: ExportBundle = match serde_json::from_str(json) {
            Ok(bundle) => bundle,
            Err(e) => {
                log::warn!("Failed to import data: {}", e);
                return false;
            }
        };

        let mut ok = true;
        if bundle.high_scores.is_some() || bundle.high_score.is_some() {
            let mut scores: HighScores = self.load_or_default(keys::HIGH_SCORES);
            if let Some(imported) = &bundle.high_scores {
                scores.merge(imported);
            }
            if let Some(best) = bundle.high_score.filter(|&s| s > 0) {
                if scores.entries.iter().any(|e| e.score == best) {
                    log::info!("Imported high score {} already on the leaderboard", best);
                } else {
                    let level = bundle.player_data.as_ref().map_or(1, |p| p.level);
                    scores.add_score(best, level, now_millis());
                }
            }
            ok &= self.save(keys::HIGH_SCORES, &scores);
        }
        if let Some(settings) = bundle.settings {
            ok &= self.save(keys::SETTINGS, &settings);
        }
        if let Some(progress) = bundle.player_data {
            ok &= self.save(keys::PLAYER_DATA, &progress);
        }
        if let Some(statistics) = bundle.statistics {
            ok &= self.save(keys::STATISTICS, &statistics);
        }
        ok
    }
}
