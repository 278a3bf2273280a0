//! Progression controller: score, lives, level and the event window
//!
//! Level-ups are edge-triggered: the controller remembers the next threshold
//! (`level * score_to_level`) and fires once when score reaches it, then moves
//! the threshold up. Staying above a threshold never fires again, and a score
//! jump across several thresholds fires once per threshold.

use serde::Serialize;

use crate::types::{GameConfig, GameMode};

/// What a timeout did to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutOutcome {
    pub lives_left: u32,
    pub game_over: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Progression {
    lives: u32,
    score: u32,
    level: u32,
    mode: GameMode,
    score_to_level: u32,
    event_window: [u32; 2],
    /// Score at which the next level-up fires
    next_threshold: u32,
}

impl Progression {
    /// Fresh session state from a validated config
    pub fn new(config: &GameConfig) -> Self {
        Self {
            lives: config.lives,
            score: 0,
            level: 1,
            mode: config.mode,
            score_to_level: config.score_to_level,
            event_window: config.event_window,
            next_threshold: config.score_to_level,
        }
    }

    /// One point for a hit. Returns every level reached by this hit.
    pub fn on_hit(&mut self) -> Vec<u32> {
        self.add_points(1)
    }

    fn add_points(&mut self, points: u32) -> Vec<u32> {
        self.score = self.score.saturating_add(points);

        let mut reached = Vec::new();
        while self.score >= self.next_threshold {
            self.level += 1;
            self.next_threshold = self.level.saturating_mul(self.score_to_level);
            reached.push(self.level);
            if self.next_threshold == u32::MAX {
                break;
            }
        }
        reached
    }

    /// One life lost. Lives never go below zero.
    pub fn on_timeout(&mut self) -> TimeoutOutcome {
        self.lives = self.lives.saturating_sub(1);
        TimeoutOutcome {
            lives_left: self.lives,
            game_over: self.lives == 0,
        }
    }

    /// Whether the second lane should be running at the current level
    pub fn event_lane_active(&self) -> bool {
        let [start, end] = self.event_window;
        start <= self.level && self.level < end
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn score_to_level(&self) -> u32 {
        self.score_to_level
    }

    pub fn is_out_of_lives(&self) -> bool {
        self.lives == 0
    }
}
