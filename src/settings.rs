//! Player preferences
//!
//! Persisted separately from high scores.

use serde::{Deserialize, Serialize};

use crate::consts::START_LIVES;
use crate::platform;
use crate::sim::{FailurePolicy, GameConfig};

/// How a run ends, as chosen in the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FailureMode {
    /// The first enemy to reach the bottom ends the run
    #[default]
    Instant,
    /// Each breach costs a life
    Lives,
}

impl FailureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureMode::Instant => "Instant",
            FailureMode::Lives => "Lives",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub failure_mode: FailureMode,
    /// Lives per run in `FailureMode::Lives`
    pub starting_lives: u8,

    // === Audio ===
    pub audio_enabled: bool,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Mute when window loses focus
    pub mute_on_blur: bool,

    // === Accessibility ===
    /// Skip explosion flashes and screen shake
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            failure_mode: FailureMode::Instant,
            starting_lives: START_LIVES,
            audio_enabled: true,
            master_volume: 0.8,
            mute_on_blur: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    const STORAGE_KEY: &'static str = "arbistrike_settings";

    /// Engine configuration for the next run
    pub fn game_config(&self) -> GameConfig {
        let policy = match self.failure_mode {
            FailureMode::Instant => FailurePolicy::SessionEnding,
            FailureMode::Lives => FailurePolicy::Lives(self.starting_lives.clamp(1, 9)),
        };
        GameConfig { policy }
    }

    /// Volume actually applied to sound effects
    pub fn effective_volume(&self) -> f32 {
        if self.audio_enabled {
            self.master_volume.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    fn parse(json: &str) -> Option<Self> {
        match serde_json::from_str(json) {
            Ok(settings) => Some(settings),
            Err(e) => {
                log::warn!("Ignoring unreadable settings: {}", e);
                None
            }
        }
    }

    pub fn load() -> Self {
        match platform::storage_get(Self::STORAGE_KEY).and_then(|j| Self::parse(&j)) {
            Some(settings) => {
                log::info!("Loaded settings");
                settings
            }
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self) {
        match serde_json::to_string(self) {
            Ok(json) => {
                if platform::storage_set(Self::STORAGE_KEY, &json) {
                    log::info!("Settings saved");
                }
            }
            Err(e) => log::warn!("Could not serialize settings: {}", e),
        }
    }
}
