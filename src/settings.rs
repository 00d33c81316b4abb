//! Game settings and preferences
//!
//! Persisted in LocalStorage on the web, as a JSON file natively.

use serde::{Deserialize, Serialize};

use crate::consts::{FORMATION_ROWS, FORMATION_SPACING, LAUNCH_VELOCITY};
use crate::sim::launch::LaunchConfig;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Maximum snowflakes for this preset
    pub fn max_snow(&self) -> usize {
        match self {
            QualityPreset::Low => 60,
            QualityPreset::Medium => 250,
            QualityPreset::High => 800,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,

    // === Formation ===
    /// Row count minus one (0 = a single tree)
    pub formation_rows: u32,
    /// Distance between neighboring slots
    pub formation_spacing: f32,
    /// Decorate trees with an ornament
    pub ornaments: bool,

    // === Launch ===
    pub launch_velocity: f32,
    /// Only stylus releases launch the ball
    pub require_stylus: bool,

    // === Visuals ===
    /// Falling snow
    pub snow: bool,
    /// Show FPS counter
    pub show_fps: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,
    /// Seconds after a reset during which contacts stay silent while the
    /// trees settle onto the snow field
    pub settle_seconds: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,

            formation_rows: FORMATION_ROWS,
            formation_spacing: FORMATION_SPACING,
            ornaments: true,

            launch_velocity: LAUNCH_VELOCITY,
            require_stylus: true,

            snow: true,
            show_fps: false,

            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            settle_seconds: 0.5,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Effective snowflake cap
    pub fn max_snow(&self) -> usize {
        if !self.snow {
            0
        } else {
            self.quality.max_snow()
        }
    }

    pub fn launch_config(&self) -> LaunchConfig {
        LaunchConfig {
            velocity: self.launch_velocity,
            require_stylus: self.require_stylus,
        }
    }

    /// Clamp out-of-range values from hand-edited files
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        self.formation_rows = self.formation_rows.min(20);
        if !(self.formation_spacing.is_finite() && self.formation_spacing > 0.0) {
            self.formation_spacing = defaults.formation_spacing;
        }
        if !(self.launch_velocity.is_finite() && self.launch_velocity >= 0.0) {
            self.launch_velocity = defaults.launch_velocity;
        }
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);
        self.settle_seconds = self.settle_seconds.clamp(0.0, 5.0);
        self
    }

    /// Parse from JSON, falling back to defaults with a warning
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<Settings>(json) {
            Ok(settings) => settings.sanitized(),
            Err(e) => {
                log::warn!("Ignoring invalid settings: {}", e);
                Self::default()
            }
        }
    }

    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "tree_bowling_settings";

    /// Default settings file for native builds
    pub const DEFAULT_PATH: &'static str = "tree_bowling_settings.json";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                log::info!("Loaded settings from LocalStorage");
                return Self::from_json(&json);
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
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Load settings from a JSON file; missing or corrupt files give defaults
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => {
                log::info!("Loaded settings from {}", path.display());
                Self::from_json(&json)
            }
            Err(e) => {
                log::warn!("Using default settings ({}: {})", path.display(), e);
                Self::default()
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to(&self, path: impl AsRef<std::path::Path>) {
        let path = path.as_ref();
        let written = serde_json::to_string_pretty(self)
            .map_err(|e| e.to_string())
            .and_then(|json| std::fs::write(path, json).map_err(|e| e.to_string()));
        match written {
            Ok(()) => log::info!("Settings saved to {}", path.display()),
            Err(e) => log::warn!("Could not save settings to {}: {}", path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_scene_constants() {
        let settings = Settings::default();
        assert_eq!(settings.formation_rows, 6);
        assert_eq!(settings.formation_spacing, 2.5);
        assert_eq!(settings.launch_velocity, 40.0);
        assert!(settings.require_stylus);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings = Settings::from_json(r#"{"formation_rows": 2, "quality": "Low"}"#);
        assert_eq!(settings.formation_rows, 2);
        assert_eq!(settings.quality, QualityPreset::Low);
        assert_eq!(settings.launch_velocity, 40.0);
    }

    #[test]
    fn test_corrupt_json_gives_defaults() {
        assert_eq!(Settings::from_json("{not json"), Settings::default());
    }

    #[test]
    fn test_sanitize_clamps() {
        let settings = Settings::from_json(
            r#"{"formation_spacing": -1.0, "master_volume": 3.0, "formation_rows": 500}"#,
        );
        assert_eq!(settings.formation_spacing, 2.5);
        assert_eq!(settings.master_volume, 1.0);
        assert_eq!(settings.formation_rows, 20);
    }

    #[test]
    fn test_snow_toggle() {
        let mut settings = Settings::from_preset(QualityPreset::High);
        assert_eq!(settings.max_snow(), 800);
        settings.snow = false;
        assert_eq!(settings.max_snow(), 0);
    }

    #[test]
    fn test_preset_parse() {
        assert_eq!(QualityPreset::from_str("MED"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::from_str("ultra"), None);
        assert_eq!(QualityPreset::High.as_str(), "High");
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_file_round_trip_and_missing_file() {
        let dir = std::env::temp_dir().join(format!("tree_bowling_{}", std::process::id()));
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("settings.json");

        let settings = Settings {
            formation_rows: 3,
            muted: true,
            ..Settings::default()
        };
        settings.save_to(&path);
        assert_eq!(Settings::load_from(&path), settings);

        assert_eq!(
            Settings::load_from(dir.join("missing.json")),
            Settings::default()
        );
        let _ = std::fs::remove_dir_all(&dir);
    }
}
