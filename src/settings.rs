//! Per-title settings
//!
//! Every tunable of a title (physics, collision rules, generation density,
//! enemy stats, camera) is data in [`Settings`], so each title is a JSON file
//! rather than a fork of the engine. Missing fields fall back to the stock
//! platformer tuning.

use serde::{Deserialize, Serialize};

use crate::sim::RunConfig;

/// Difficulty preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "norm" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Multiplier on the per-column enemy spawn chance
    pub fn spawn_rate(&self) -> f64 {
        match self {
            Difficulty::Easy => 0.6,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.5,
        }
    }

    /// Multiplier on enemy hit points
    pub fn enemy_hp(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.75,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.5,
        }
    }
}

/// Title configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Storage key prefix for this title
    pub title: String,
    pub difficulty: Difficulty,
    /// Fixed run seed; `None` picks a fresh one per run
    pub seed: Option<u64>,
    #[serde(flatten)]
    pub run: RunConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            title: "tilecade".to_string(),
            difficulty: Difficulty::Normal,
            seed: None,
            run: RunConfig::default(),
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Run configuration with the difficulty preset applied
    pub fn run_config(&self) -> RunConfig {
        let mut run = self.run.clone();
        let d = self.difficulty;
        run.generation.enemy_chance =
            (run.generation.enemy_chance * d.spawn_rate()).clamp(0.0, 1.0);
        for archetype in crate::sim::Archetype::ALL {
            let params = run.archetypes.get_mut(archetype);
            params.hp = ((params.hp as f32 * d.enemy_hp()).round() as i32).max(1);
        }
        run
    }

    /// Key the best score is stored under
    pub fn best_score_key(&self) -> String {
        format!("{}_best", self.title)
    }

    /// Key the settings are stored under
    pub fn storage_key(&self) -> String {
        format!("{}_settings", self.title)
    }

    /// Load settings from a JSON file, falling back to defaults
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Invalid settings in {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Could not read {}: {}; using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save settings as JSON
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self, path: &std::path::Path) {
        let result = self
            .to_json()
            .map_err(std::io::Error::other)
            .and_then(|json| std::fs::write(path, json));
        match result {
            Ok(()) => log::info!("Settings saved to {}", path.display()),
            Err(e) => log::warn!("Could not save settings to {}: {}", path.display(), e),
        }
    }

    /// Load settings for a title from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load(title: &str) -> Self {
        let key = format!("{}_settings", title);
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(&key) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Stored settings are invalid: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self {
            title: title.to_string(),
            ..Self::default()
        }
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(&self.storage_key(), &json);
                log::info!("Settings saved");
            }
        }
    }
}
