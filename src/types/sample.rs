//! Classifier output as delivered by the capture layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One classifier result. `label` is the raw string returned by the
/// classifier; it is only checked against the alphabet when reconciled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSample {
    /// Best-guess label, `None` when nothing was recognized
    pub label: Option<String>,
    /// When the result reached the engine
    pub received_at: DateTime<Utc>,
}

impl PredictionSample {
    /// Create a sample stamped with the current time
    pub fn new(label: Option<String>) -> Self {
        Self {
            label,
            received_at: Utc::now(),
        }
    }

    /// Sample carrying a recognized label
    pub fn labeled(label: impl Into<String>) -> Self {
        Self::new(Some(label.into()))
    }

    /// Sample for a frame where nothing was recognized
    pub fn empty() -> Self {
        Self::new(None)
    }

    /// Age in milliseconds
    pub fn age_ms(&self) -> i64 {
        (Utc::now() - self.received_at).num_milliseconds()
    }
}
