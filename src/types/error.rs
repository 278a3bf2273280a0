//! Engine errors
//!
//! Gameplay outcomes (hit, timeout, level-up, game over) are events, not
//! errors. What lands here is either a caller bug or bad input.

use thiserror::Error;

/// Errors surfaced by the engine and its runtime
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Operation not allowed in the current phase or lane state
    #[error("invalid state for {action}: {detail}")]
    InvalidState {
        action: &'static str,
        detail: String,
    },

    /// Classifier label outside the playable alphabet
    #[error("malformed prediction label {label:?}")]
    MalformedPrediction { label: String },

    /// Configuration values out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read or parsed
    #[error("configuration file error: {0}")]
    ConfigIo(String),

    /// The game loop task is gone
    #[error("game loop closed")]
    LoopClosed,
}

impl GameError {
    pub fn invalid_state(action: &'static str, detail: impl Into<String>) -> Self {
        GameError::InvalidState {
            action,
            detail: detail.into(),
        }
    }

    /// Get the code string (for logging and API bodies)
    pub fn code(&self) -> &'static str {
        match self {
            GameError::InvalidState { .. } => "E101_INVALID_STATE",
            GameError::MalformedPrediction { .. } => "E201_MALFORMED_PREDICTION",
            GameError::InvalidConfig(_) => "E301_INVALID_CONFIG",
            GameError::ConfigIo(_) => "E302_CONFIG_IO",
            GameError::LoopClosed => "E401_LOOP_CLOSED",
        }
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, GameError::InvalidState { .. })
    }
}
