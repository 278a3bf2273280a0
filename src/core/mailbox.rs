//! Prediction queue: a depth-1, latest-wins mailbox
//!
//! The capture task pushes, the simulation loop consumes. Neither side waits
//! for the other: a push replaces whatever is buffered, a consume takes it.
//! A consumed sample is gone, so the same prediction is never reconciled twice.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::Serialize;

use crate::types::PredictionSample;

/// Counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub pushed: u64,
    /// Pushes that replaced an unconsumed sample
    pub superseded: u64,
    pub consumed: u64,
    /// Samples discarded by `clear`
    pub dropped: u64,
}

#[derive(Debug, Default)]
pub struct PredictionQueue {
    slot: Mutex<Option<PredictionSample>>,
    pushed: AtomicU64,
    superseded: AtomicU64,
    consumed: AtomicU64,
    dropped: AtomicU64,
}

impl PredictionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer `sample`, replacing any unconsumed one.
    /// Returns true when an older sample was replaced.
    pub fn push(&self, sample: PredictionSample) -> bool {
        let previous = self.slot.lock().replace(sample);
        self.pushed.fetch_add(1, Ordering::Relaxed);
        if previous.is_some() {
            self.superseded.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Take the buffered sample; `None` until the next push
    pub fn consume_latest(&self) -> Option<PredictionSample> {
        let sample = self.slot.lock().take();
        if sample.is_some() {
            self.consumed.fetch_add(1, Ordering::Relaxed);
        }
        sample
    }

    /// Discard the buffered sample without consuming it
    pub fn clear(&self) -> Option<PredictionSample> {
        let sample = self.slot.lock().take();
        if sample.is_some() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        sample
    }

    pub fn is_empty(&self) -> bool {
        self.slot.lock().is_none()
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            pushed: self.pushed.load(Ordering::Relaxed),
            superseded: self.superseded.load(Ordering::Relaxed),
            consumed: self.consumed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}
