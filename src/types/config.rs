//! Session configuration
//!
//! Loaded from TOML (every key optional), then overridden by CLI flags or a
//! reset request. `validate` runs before any engine sees the values.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{GameError, GameMode};
use crate::{
    DEFAULT_EVENT_WINDOW, DEFAULT_LANE_SPEED, DEFAULT_LIVES, DEFAULT_SCORE_TO_LEVEL,
    FLASH_DURATION_MS,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    pub mode: GameMode,
    /// Points per level, must be > 0
    pub score_to_level: u32,
    /// Levels `[start, end)` with a second, event-colored lane
    pub event_window: [u32; 2],
    /// Lives at session start
    pub lives: u32,
    /// Lane progress per simulated second
    pub lane_speed: f64,
    /// Hit flash duration (milliseconds)
    pub flash_ms: u64,
    /// Start Running instead of Paused
    pub start_running: bool,
    /// Seed for the letter sequence; random when absent
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            mode: GameMode::Learn,
            score_to_level: DEFAULT_SCORE_TO_LEVEL,
            event_window: DEFAULT_EVENT_WINDOW,
            lives: DEFAULT_LIVES,
            lane_speed: DEFAULT_LANE_SPEED,
            flash_ms: FLASH_DURATION_MS,
            start_running: false,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Check ranges; returns the first violation
    pub fn validate(&self) -> Result<(), GameError> {
        if self.score_to_level == 0 {
            return Err(GameError::InvalidConfig("score_to_level must be > 0".into()));
        }
        let [start, end] = self.event_window;
        if start == 0 || start > end {
            return Err(GameError::InvalidConfig(format!(
                "event_window [{}, {}) must satisfy 1 <= start <= end",
                start, end
            )));
        }
        if self.lives == 0 {
            return Err(GameError::InvalidConfig("lives must be > 0".into()));
        }
        if !(self.lane_speed.is_finite() && self.lane_speed > 0.0) {
            return Err(GameError::InvalidConfig(format!(
                "lane_speed must be a positive number, got {}",
                self.lane_speed
            )));
        }
        Ok(())
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self, GameError> {
        let config: GameConfig =
            toml::from_str(text).map_err(|e| GameError::ConfigIo(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GameError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| GameError::ConfigIo(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Copy with the three per-session parameters replaced
    pub fn with_session(&self, mode: GameMode, score_to_level: u32, event_window: [u32; 2]) -> Self {
        Self {
            mode,
            score_to_level,
            event_window,
            ..self.clone()
        }
    }

    /// Whether `level` falls inside the event window
    pub fn in_event_window(&self, level: u32) -> bool {
        let [start, end] = self.event_window;
        start <= level && level < end
    }
}
