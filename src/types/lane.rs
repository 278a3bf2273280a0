//! Lane identity and the per-lane view published to presentation

use serde::{Deserialize, Serialize};

use crate::types::Letter;

/// Index of a lane within the session (0 = primary, 1 = event lane)
pub type LaneId = usize;

/// Which role a lane plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneKind {
    /// Always running
    Primary,
    /// Only running inside the event window
    Event,
}

/// Color state of a lane as seen by presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorState {
    Normal,
    /// Positive feedback right after a hit
    Flash,
    /// Event lane coloring
    EventColor,
}

/// Base tint of the primary lane, alternating with level parity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneTint {
    Red,
    White,
    Yellow,
}

impl LaneTint {
    /// Tint for a lane of `kind` at `level`
    pub fn for_level(kind: LaneKind, level: u32) -> Self {
        match kind {
            LaneKind::Event => LaneTint::Yellow,
            LaneKind::Primary if level % 2 == 1 => LaneTint::Red,
            LaneKind::Primary => LaneTint::White,
        }
    }
}

/// Read-only view of one lane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneView {
    pub id: LaneId,
    pub kind: LaneKind,
    /// Active target, `None` only between resolution and respawn
    pub letter: Option<Letter>,
    /// 0.0 (just spawned) .. 1.0 (deadline)
    pub progress: f64,
    pub color_state: ColorState,
    pub tint: LaneTint,
}
