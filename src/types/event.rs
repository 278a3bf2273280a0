//! One-shot signals emitted by the engine

use serde::{Deserialize, Serialize};

use crate::types::{LaneId, Letter};

/// Everything presentation may want to react to exactly once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// A prediction matched the lane's letter before its deadline.
    /// The lane shows `Flash` for `flash_ms`.
    Hit { lane_id: LaneId, letter: Letter, flash_ms: u64 },
    /// The lane reached its deadline unresolved and cost one life
    Timeout { lane_id: LaneId, letter: Letter, lives_left: u32 },
    /// Score crossed the next level threshold
    LevelUp { level: u32 },
    /// Last life lost
    GameOver { score: u32, level: u32 },
    /// A lane was added (event window opened)
    LaneSpawned { lane_id: LaneId },
    /// A lane was removed (event window closed)
    LaneDespawned { lane_id: LaneId },
    Paused,
    Resumed,
    Reset,
}

impl GameEvent {
    /// Short code for logs and terminal output
    pub fn code(&self) -> &'static str {
        match self {
            GameEvent::Hit { .. } => "HIT",
            GameEvent::Timeout { .. } => "TIMEOUT",
            GameEvent::LevelUp { .. } => "LEVEL_UP",
            GameEvent::GameOver { .. } => "GAME_OVER",
            GameEvent::LaneSpawned { .. } => "LANE_SPAWNED",
            GameEvent::LaneDespawned { .. } => "LANE_DESPAWNED",
            GameEvent::Paused => "PAUSED",
            GameEvent::Resumed => "RESUMED",
            GameEvent::Reset => "RESET",
        }
    }

    /// Hit or timeout (the outcomes that touch score or lives)
    pub fn is_resolution(&self) -> bool {
        matches!(self, GameEvent::Hit { .. } | GameEvent::Timeout { .. })
    }
}

impl std::fmt::Display for GameEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameEvent::Hit { lane_id, letter, .. } => write!(f, "HIT lane={} letter={}", lane_id, letter),
            GameEvent::Timeout { lane_id, letter, lives_left } => {
                write!(f, "TIMEOUT lane={} letter={} lives={}", lane_id, letter, lives_left)
            }
            GameEvent::LevelUp { level } => write!(f, "LEVEL_UP level={}", level),
            GameEvent::GameOver { score, level } => write!(f, "GAME_OVER score={} level={}", score, level),
            GameEvent::LaneSpawned { lane_id } => write!(f, "LANE_SPAWNED lane={}", lane_id),
            GameEvent::LaneDespawned { lane_id } => write!(f, "LANE_DESPAWNED lane={}", lane_id),
            other => write!(f, "{}", other.code()),
        }
    }
}
