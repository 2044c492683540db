//! Headless run settings with persistence
//!
//! Settings are saved to `~/.config/rampart/settings.toml`

use std::fs;
use std::path::PathBuf;

use rampart_game::{PlaceableItem, SimulationConfig};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// All settings for a headless run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub run: RunSettings,
    pub simulation: SimulationConfig,
    pub economy: EconomySettings,
    /// Consecutive waves; the first one is the build-up before any enemy arrives
    pub waves: Vec<WaveSettings>,
    /// Purchases made during the run, in time order
    pub placements: Vec<ScriptedPlacement>,
}

impl Settings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("rampart"))
    }

    /// Get the settings file path
    fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.toml"))
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            warn!("Could not determine config directory");
            return Self::default();
        };

        if !path.exists() {
            info!("No settings file found, using defaults");
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match Self::parse(&content) {
                Ok(settings) => {
                    info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse settings: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read settings file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Save settings to disk
    pub fn save(&self) -> anyhow::Result<()> {
        let Some(dir) = Self::config_dir() else {
            anyhow::bail!("Could not determine config directory");
        };

        let path = dir.join("settings.toml");

        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter, overridden by `RUST_LOG`
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Frame loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Maximum number of frames to simulate
    pub frames: u32,
    /// Seconds fed to the clock each frame
    pub frame_delta: f32,
    /// Log a progress line every this many frames (0 = never)
    pub report_every: u32,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            frames: 6000,
            frame_delta: 1.0 / 60.0,
            report_every: 600,
        }
    }
}

/// Economy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomySettings {
    pub starting_power: f32,
}

impl Default for EconomySettings {
    fn default() -> Self {
        Self {
            starting_power: 100.0,
        }
    }
}

/// One wave of the schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveSettings {
    /// Seconds until the next wave starts
    pub duration: f64,
    pub enemies: u32,
}

/// A purchase made at a fixed time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptedPlacement {
    /// Simulated seconds at which the pointer moves and the purchase is queued
    pub at: f64,
    pub item: PlaceableItem,
    /// Ground position as `[x, z]`
    pub cell: [f32; 2],
    pub cost: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            logging: LoggingSettings::default(),
            run: RunSettings::default(),
            simulation: SimulationConfig::default(),
            economy: EconomySettings::default(),
            waves: vec![
                WaveSettings { duration: 5.0, enemies: 0 },
                WaveSettings { duration: 20.0, enemies: 3 },
                WaveSettings { duration: 20.0, enemies: 5 },
                WaveSettings { duration: 25.0, enemies: 8 },
            ],
            placements: vec![
                ScriptedPlacement {
                    at: 0.5,
                    item: PlaceableItem::Collector,
                    cell: [0.0, 4.0],
                    cost: 50.0,
                },
                ScriptedPlacement {
                    at: 1.0,
                    item: PlaceableItem::TurretVehicle,
                    cell: [0.0, 2.0],
                    cost: 40.0,
                },
                ScriptedPlacement {
                    at: 8.0,
                    item: PlaceableItem::Turret,
                    cell: [-2.0, 3.0],
                    cost: 30.0,
                },
                ScriptedPlacement {
                    at: 10.0,
                    item: PlaceableItem::Turret,
                    cell: [2.0, 3.0],
                    cost: 30.0,
                },
            ],
        }
    }
}
