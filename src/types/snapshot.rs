//! Published engine state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ColorState, GameEvent, GameMode, LaneView, SessionPhase};

/// Read-only copy of the session, produced once per tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub timestamp: DateTime<Utc>,
    /// Ticks applied while Running since the last reset
    pub tick: u64,
    /// Simulated seconds since the last reset
    pub elapsed_secs: f64,
    pub lives: u32,
    pub score: u32,
    pub level: u32,
    pub mode: GameMode,
    pub phase: SessionPhase,
    pub lanes: Vec<LaneView>,
    /// Learn mode: presentation shows the reference sign for each letter
    pub show_reference: bool,
}

impl GameSnapshot {
    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let color = self.phase.color_code();
        let reset = SessionPhase::color_reset();

        let lanes: Vec<String> = self
            .lanes
            .iter()
            .map(|lane| {
                let letter = lane.letter.map(|l| l.as_char()).unwrap_or('-');
                let marker = match lane.color_state {
                    ColorState::Flash => "\x1b[1;32m",
                    ColorState::EventColor => "\x1b[33m",
                    ColorState::Normal => "",
                };
                format!("{}[{} {:>3.0}%]{}", marker, letter, lane.progress * 100.0, if marker.is_empty() { "" } else { reset })
            })
            .collect();

        format!(
            "{}{} {} | lives={} | score={} | level={} | {}{} {}",
            color,
            self.phase.emoji(),
            self.phase,
            self.lives,
            self.score,
            self.level,
            self.mode,
            reset,
            lanes.join(" ")
        )
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        let lanes: Vec<String> = self
            .lanes
            .iter()
            .map(|lane| {
                format!(
                    "{}:{}@{:.3}",
                    lane.id,
                    lane.letter.map(|l| l.as_char()).unwrap_or('-'),
                    lane.progress
                )
            })
            .collect();

        format!(
            "phase={} | lives={} | score={} | level={} | mode={} | lanes={}",
            self.phase,
            self.lives,
            self.score,
            self.level,
            self.mode,
            lanes.join(",")
        )
    }
}

/// Result of one tick: what happened, and the state afterwards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub events: Vec<GameEvent>,
    pub snapshot: GameSnapshot,
}

impl TickReport {
    pub fn hits(&self) -> usize {
        self.events.iter().filter(|e| matches!(e, GameEvent::Hit { .. })).count()
    }

    pub fn timeouts(&self) -> usize {
        self.events.iter().filter(|e| matches!(e, GameEvent::Timeout { .. })).count()
    }

    pub fn level_ups(&self) -> usize {
        self.events.iter().filter(|e| matches!(e, GameEvent::LevelUp { .. })).count()
    }
}
