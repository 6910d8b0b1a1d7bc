//! Game settings and preferences
//!
//! Persisted separately from statistics and progress.

use serde::{Deserialize, Serialize};

use crate::persistence::{Persistence, keys, now_millis};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QualityPreset {
    Low,
    Medium,
    #[default]
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "low",
            QualityPreset::Medium => "medium",
            QualityPreset::High => "high",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// Preferred input device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ControlScheme {
    #[default]
    Keyboard,
    Touch,
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub sound_enabled: bool,
    pub music_enabled: bool,
    pub difficulty: Difficulty,
    pub controls: ControlScheme,
    /// Graphics quality preset
    pub graphics: QualityPreset,
    /// Unix timestamp (ms) of the last save
    pub last_updated: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            music_enabled: true,
            difficulty: Difficulty::Normal,
            controls: ControlScheme::Keyboard,
            graphics: QualityPreset::High,
            last_updated: 0.0,
        }
    }
}

impl Settings {
    /// Stored settings, or defaults
    pub fn load(persistence: &Persistence) -> Self {
        let settings = persistence.load_or_default(keys::SETTINGS);
        log::info!("Loaded settings");
        settings
    }

    pub fn save(&mut self, persistence: &mut Persistence) -> bool {
        self.last_updated = now_millis();
        let saved = persistence.save(keys::SETTINGS, self);
        if saved {
            log::info!("Settings saved");
        }
        saved
    }
}
