//! Player settings and preferences
//!
//! Persisted as JSON in LocalStorage, separately from high scores.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::sim::GameConfig;

/// Difficulty preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DifficultyPreset {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl DifficultyPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyPreset::Easy => "Easy",
            DifficultyPreset::Normal => "Normal",
            DifficultyPreset::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(DifficultyPreset::Easy),
            "normal" | "medium" => Some(DifficultyPreset::Normal),
            "hard" => Some(DifficultyPreset::Hard),
            _ => None,
        }
    }

    /// Multiplier on the per-tick difficulty ramp
    pub fn ramp_scale(&self) -> f32 {
        match self {
            DifficultyPreset::Easy => 0.5,
            DifficultyPreset::Normal => 1.0,
            DifficultyPreset::Hard => 2.0,
        }
    }

    /// Multiplier on spawn intervals (smaller = more traffic)
    pub fn spawn_scale(&self) -> f32 {
        match self {
            DifficultyPreset::Easy => 1.4,
            DifficultyPreset::Normal => 1.0,
            DifficultyPreset::Hard => 0.7,
        }
    }
}

/// Player settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub difficulty: DifficultyPreset,
    /// Fixed run seed (reproducible runs); None = seed from the clock
    pub fixed_seed: Option<u64>,
    /// Show score and best score overlay
    pub show_hud: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: DifficultyPreset::Normal,
            fixed_seed: None,
            show_hud: true,
        }
    }
}

impl Settings {
    /// Create settings from a difficulty preset
    pub fn from_preset(preset: DifficultyPreset) -> Self {
        Self {
            difficulty: preset,
            ..Self::default()
        }
    }

    /// Scale a game's tuning by the difficulty preset
    pub fn apply_to(&self, config: &mut GameConfig) {
        let preset = self.difficulty;
        config.difficulty_ramp *= preset.ramp_scale();
        let spawn = &mut config.spawn;
        let scale = |ticks: u32| (ticks as f32 * preset.spawn_scale()).round() as u32;
        spawn.base_interval_ticks = scale(spawn.base_interval_ticks);
        spawn.min_interval_ticks = scale(spawn.min_interval_ticks);
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "mini_arcade_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            match self.to_json() {
                Ok(json) => {
                    if storage.set_item(Self::STORAGE_KEY, &json).is_err() {
                        log::warn!("Settings could not be written");
                    } else {
                        log::info!("Settings saved");
                    }
                }
                Err(e) => log::warn!("Settings could not be encoded: {}", e),
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_parse() {
        assert_eq!(DifficultyPreset::from_str("HARD"), Some(DifficultyPreset::Hard));
        assert_eq!(DifficultyPreset::from_str("medium"), Some(DifficultyPreset::Normal));
        assert_eq!(DifficultyPreset::from_str("nightmare"), None);
    }

    #[test]
    fn test_apply_hard_preset() {
        let mut config = GameConfig::default();
        let base_ramp = config.difficulty_ramp;
        let base_interval = config.spawn.base_interval_ticks;
        Settings::from_preset(DifficultyPreset::Hard).apply_to(&mut config);
        assert!((config.difficulty_ramp - base_ramp * 2.0).abs() < 1e-9);
        assert!(config.spawn.base_interval_ticks < base_interval);
    }

    #[test]
    fn test_normal_preset_is_identity() {
        let mut config = GameConfig::default();
        let before = config.clone();
        Settings::default().apply_to(&mut config);
        assert_eq!(config, before);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{"fixed_seed": 42}"#);
        let settings = settings.ok().unwrap_or_default();
        assert_eq!(settings.fixed_seed, Some(42));
        assert!(settings.show_hud);
        assert_eq!(settings.difficulty, DifficultyPreset::Normal);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(Settings::from_json("not json").is_err());
    }
}
