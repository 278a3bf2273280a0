//! Match reconciler
//!
//! Once per tick: take the latest prediction and resolve at most one lane.
//! - label matches one active lane → that lane is hit
//! - label matches several lanes → the lane closest to its deadline
//!   (highest progress) is hit, the others keep falling
//! - no match, empty label, malformed label → nothing happens
//!
//! Wrong guesses are never penalized; only timeouts cost lives.

use serde::Serialize;
use tracing::{debug, warn};

use crate::core::{ChallengeLane, PredictionQueue};
use crate::types::{GameError, LaneId, Letter, PredictionSample};

/// Result of one reconciliation pass
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// Queue was empty
    NoSample,
    /// Classifier saw nothing recognizable
    Unrecognized,
    /// Label outside the alphabet (logged, not scored)
    Malformed(GameError),
    /// Valid letter, but no active lane holds it
    NoMatch(Letter),
    /// Lane resolved as a hit
    Hit { lane_id: LaneId, letter: Letter },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    pub samples: u64,
    pub hits: u64,
    pub misses: u64,
    pub malformed: u64,
}

#[derive(Debug, Default)]
pub struct MatchReconciler {
    stats: ReconcileStats,
}

impl MatchReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the latest sample from `queue` and reconcile it against `lanes`.
    pub fn reconcile(
        &mut self,
        queue: &PredictionQueue,
        lanes: &mut [ChallengeLane],
        now: f64,
        flash_secs: f64,
    ) -> MatchOutcome {
        match queue.consume_latest() {
            Some(sample) => self.reconcile_sample(&sample, lanes, now, flash_secs),
            None => MatchOutcome::NoSample,
        }
    }

    /// Reconcile one sample against `lanes`.
    pub fn reconcile_sample(
        &mut self,
        sample: &PredictionSample,
        lanes: &mut [ChallengeLane],
        now: f64,
        flash_secs: f64,
    ) -> MatchOutcome {
        self.stats.samples += 1;

        let Some(label) = sample.label.as_deref() else {
            return MatchOutcome::Unrecognized;
        };

        let letter = match Letter::parse(label) {
            Ok(letter) => letter,
            Err(err) => {
                self.stats.malformed += 1;
                warn!(code = err.code(), label, "ignoring prediction outside the alphabet");
                return MatchOutcome::Malformed(err);
            }
        };

        let Some(index) = nearest_to_deadline(lanes, letter) else {
            self.stats.misses += 1;
            return MatchOutcome::NoMatch(letter);
        };

        let lane = &mut lanes[index];
        match lane.resolve_match(now, flash_secs) {
            Ok(letter) => {
                self.stats.hits += 1;
                debug!(lane = lane.id(), %letter, progress = lane.progress(), "prediction matched");
                MatchOutcome::Hit { lane_id: lane.id(), letter }
            }
            Err(err) => {
                self.stats.misses += 1;
                warn!(code = err.code(), error = %err, "matched lane could not be resolved");
                MatchOutcome::NoMatch(letter)
            }
        }
    }

    pub fn stats(&self) -> ReconcileStats {
        self.stats
    }
}

/// Index of the active lane holding `letter` with the highest progress.
/// Ties go to the lower lane id.
fn nearest_to_deadline(lanes: &[ChallengeLane], letter: Letter) -> Option<usize> {
    lanes
        .iter()
        .enumerate()
        .filter(|(_, lane)| lane.letter() == Some(letter))
        .fold(None, |best: Option<(usize, f64)>, (i, lane)| match best {
            Some((_, p)) if p >= lane.progress() => best,
            _ => Some((i, lane.progress())),
        })
        .map(|(i, _)| i)
}
