//! Session phase and game mode

use serde::{Deserialize, Serialize};

/// Lifecycle of a game session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPhase {
    /// Ticker stopped, predictions ignored
    Paused,
    /// Lanes fall, predictions are reconciled
    Running,
    /// Out of lives; only a reset leaves this phase
    GameOver,
}

impl SessionPhase {
    /// Get ANSI color code for terminal display
    pub fn color_code(&self) -> &'static str {
        match self {
            SessionPhase::Paused => "\x1b[90m",   // Gray
            SessionPhase::Running => "\x1b[32m",  // Green
            SessionPhase::GameOver => "\x1b[31m", // Red
        }
    }

    /// Reset ANSI color
    pub fn color_reset() -> &'static str {
        "\x1b[0m"
    }

    /// Get emoji for phase
    pub fn emoji(&self) -> &'static str {
        match self {
            SessionPhase::Paused => "⏸",
            SessionPhase::Running => "▶",
            SessionPhase::GameOver => "💀",
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self == SessionPhase::GameOver
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionPhase::Paused => "PAUSED",
            SessionPhase::Running => "RUNNING",
            SessionPhase::GameOver => "GAME_OVER",
        };
        write!(f, "{}", name)
    }
}

/// How the letters are presented to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Reference sign shown next to each falling letter
    #[default]
    Learn,
    /// Letter only, the player signs from memory
    Memorize,
}

impl GameMode {
    /// Whether presentation should show the reference sign
    pub fn shows_reference(&self) -> bool {
        matches!(self, GameMode::Learn)
    }
}

impl std::fmt::Display for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameMode::Learn => write!(f, "learn"),
            GameMode::Memorize => write!(f, "memorize"),
        }
    }
}

impl std::str::FromStr for GameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "learn" => Ok(GameMode::Learn),
            "memorize" => Ok(GameMode::Memorize),
            other => Err(format!("unknown mode '{}', expected learn or memorize", other)),
        }
    }
}
