//! Challenge lane: one falling letter with its own deadline
//!
//! Lifecycle per letter:
//! - `spawn` assigns a letter, progress back to 0
//! - `on_tick` moves progress toward the deadline; reaching it resolves the
//!   lane as a timeout
//! - `resolve_match` resolves it as a hit
//!
//! After either resolution the lane is empty until the engine spawns the next
//! letter. A lane never holds two letters.

use crate::types::{ColorState, GameError, LaneId, LaneKind, LaneTint, LaneView, Letter};
use crate::DEADLINE_PROGRESS;

/// What a tick did to a lane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneTick {
    /// No active letter
    Idle,
    /// Still falling
    Falling,
    /// Deadline reached; the lane is now empty
    TimedOut(Letter),
}

#[derive(Debug, Clone)]
pub struct ChallengeLane {
    id: LaneId,
    kind: LaneKind,
    active: Option<Letter>,
    /// Simulated time of the last spawn
    spawned_at: f64,
    progress: f64,
    /// Progress per simulated second
    speed: f64,
    deadline: f64,
    /// Simulated time until which the hit flash shows
    flash_until: f64,
}

impl ChallengeLane {
    pub fn new(id: LaneId, kind: LaneKind, speed: f64) -> Self {
        Self {
            id,
            kind,
            active: None,
            spawned_at: 0.0,
            progress: 0.0,
            speed,
            deadline: DEADLINE_PROGRESS,
            flash_until: f64::NEG_INFINITY,
        }
    }

    /// Put `letter` on the lane. Fails if a letter is still unresolved.
    pub fn spawn(&mut self, letter: Letter, now: f64) -> Result<(), GameError> {
        if let Some(current) = self.active {
            return Err(GameError::invalid_state(
                "spawn",
                format!("lane {} still holds {}", self.id, current),
            ));
        }
        self.active = Some(letter);
        self.progress = 0.0;
        self.spawned_at = now;
        Ok(())
    }

    /// Advance by `delta_secs`. Progress is clamped to `[0, deadline]`.
    pub fn on_tick(&mut self, delta_secs: f64) -> LaneTick {
        let Some(letter) = self.active else {
            return LaneTick::Idle;
        };

        self.progress = (self.progress + self.speed * delta_secs).clamp(0.0, self.deadline);
        if self.progress >= self.deadline {
            self.active = None;
            LaneTick::TimedOut(letter)
        } else {
            LaneTick::Falling
        }
    }

    /// Resolve the active letter as a hit and start the flash.
    pub fn resolve_match(&mut self, now: f64, flash_secs: f64) -> Result<Letter, GameError> {
        let letter = self.active.take().ok_or_else(|| {
            GameError::invalid_state("resolve_match", format!("lane {} has no active letter", self.id))
        })?;
        self.flash_until = now + flash_secs;
        Ok(letter)
    }

    /// Derived from the simulation clock; nothing has to switch it back.
    pub fn color_state(&self, now: f64) -> ColorState {
        if now < self.flash_until {
            ColorState::Flash
        } else if self.kind == LaneKind::Event {
            ColorState::EventColor
        } else {
            ColorState::Normal
        }
    }

    pub fn view(&self, now: f64, level: u32) -> LaneView {
        LaneView {
            id: self.id,
            kind: self.kind,
            letter: self.active,
            progress: self.progress,
            color_state: self.color_state(now),
            tint: LaneTint::for_level(self.kind, level),
        }
    }

    pub fn id(&self) -> LaneId {
        self.id
    }

    pub fn kind(&self) -> LaneKind {
        self.kind
    }

    pub fn letter(&self) -> Option<Letter> {
        self.active
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn spawned_at(&self) -> f64 {
        self.spawned_at
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Progress left before the deadline
    pub fn remaining(&self) -> f64 {
        self.deadline - self.progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letter(s: &str) -> Letter {
        Letter::parse(s).unwrap()
    }

    #[test]
    fn test_spawn_onto_occupied_lane_fails() {
        let mut lane = ChallengeLane::new(0, LaneKind::Primary, 0.5);
        lane.spawn(letter("A"), 0.0).unwrap();
        let err = lane.spawn(letter("B"), 0.0).unwrap_err();
        assert!(err.is_invalid_state());
        assert_eq!(lane.letter(), Some(letter("A")));
    }

    #[test]
    fn test_progress_advances_with_speed() {
        let mut lane = ChallengeLane::new(0, LaneKind::Primary, 0.5);
        lane.spawn(letter("A"), 0.0).unwrap();
        assert_eq!(lane.on_tick(0.5), LaneTick::Falling);
        assert!((lane.progress() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_timeout_clears_lane_once() {
        let mut lane = ChallengeLane::new(0, LaneKind::Primary, 1.0);
        lane.spawn(letter("C"), 0.0).unwrap();
        assert_eq!(lane.on_tick(0.6), LaneTick::Falling);
        assert_eq!(lane.on_tick(0.6), LaneTick::TimedOut(letter("C")));
        assert_eq!(lane.progress(), DEADLINE_PROGRESS);
        assert!(!lane.is_active());
        assert_eq!(lane.on_tick(0.6), LaneTick::Idle);
    }

    #[test]
    fn test_respawn_resets_progress() {
        let mut lane = ChallengeLane::new(0, LaneKind::Primary, 1.0);
        lane.spawn(letter("C"), 0.0).unwrap();
        lane.on_tick(2.0);
        lane.spawn(letter("D"), 2.0).unwrap();
        assert_eq!(lane.progress(), 0.0);
        assert_eq!(lane.spawned_at(), 2.0);
    }

    #[test]
    fn test_idle_lane_does_not_move() {
        let mut lane = ChallengeLane::new(0, LaneKind::Primary, 1.0);
        assert_eq!(lane.on_tick(0.5), LaneTick::Idle);
        assert_eq!(lane.progress(), 0.0);
    }

    #[test]
    fn test_resolve_empty_lane_fails() {
        let mut lane = ChallengeLane::new(0, LaneKind::Primary, 1.0);
        assert!(lane.resolve_match(0.0, 0.7).unwrap_err().is_invalid_state());
    }

    #[test]
    fn test_flash_is_derived_from_clock() {
        let mut lane = ChallengeLane::new(1, LaneKind::Event, 1.0);
        lane.spawn(letter("E"), 0.0).unwrap();
        assert_eq!(lane.color_state(0.0), ColorState::EventColor);

        lane.resolve_match(1.0, 0.7).unwrap();
        assert_eq!(lane.color_state(1.2), ColorState::Flash);
        assert_eq!(lane.color_state(1.7), ColorState::EventColor);
    }

    #[test]
    fn test_primary_tint_follows_level_parity() {
        let lane = ChallengeLane::new(0, LaneKind::Primary, 1.0);
        assert_eq!(lane.view(0.0, 1).tint, LaneTint::Red);
        assert_eq!(lane.view(0.0, 2).tint, LaneTint::White);
    }
}
