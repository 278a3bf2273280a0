//! Simulation clock
//!
//! `Clock` is the deterministic side: it only moves when `advance` is called.
//! `FrameTimer` measures wall-clock deltas for the real-time loop.

use std::time::Instant;

use crate::MAX_TICK_DELTA_SECS;

/// Simulated time, advanced tick by tick
#[derive(Debug, Clone, Default)]
pub struct Clock {
    elapsed: f64,
    ticks: u64,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by `delta_secs`, clamped to `[0, MAX_TICK_DELTA_SECS]`.
    /// Returns the delta actually applied.
    pub fn advance(&mut self, delta_secs: f64) -> f64 {
        let delta = if delta_secs.is_finite() {
            delta_secs.clamp(0.0, MAX_TICK_DELTA_SECS)
        } else {
            0.0
        };
        self.elapsed += delta;
        self.ticks += 1;
        delta
    }

    /// Simulated seconds since creation or reset
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Wall-clock delta between frames
#[derive(Debug)]
pub struct FrameTimer {
    last: Instant,
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTimer {
    pub fn new() -> Self {
        Self { last: Instant::now() }
    }

    /// Seconds since the previous call (or since creation)
    pub fn delta(&mut self) -> f64 {
        let now = Instant::now();
        let delta = now.duration_since(self.last).as_secs_f64();
        self.last = now;
        delta
    }

    /// Forget the time spent while not ticking
    pub fn restart(&mut self) {
        self.last = Instant::now();
    }
}
