//! Capture + classify producer
//!
//! A background task that asks the classifier for a label, pushes the result
//! into the prediction queue, waits the capture delay and asks again. It never
//! waits on the simulation loop; the queue is the only thing the two share.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::core::PredictionQueue;
use crate::types::{GameSnapshot, Letter, PredictionSample};
use crate::CAPTURE_DELAY_MS;

/// Failure of one classification round trip
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifierError {
    #[error("classifier unavailable: {0}")]
    Unavailable(String),
    #[error("classification timed out after {0:?}")]
    TimedOut(Duration),
}

/// One call = one captured frame classified.
///
/// `Ok(None)` means the frame was processed but nothing was recognized.
pub trait Classifier: Send + 'static {
    fn classify(&mut self) -> impl Future<Output = Result<Option<String>, ClassifierError>> + Send;
}

#[derive(Debug, Clone, Copy)]
pub struct ProducerConfig {
    /// Pause after each round trip
    pub capture_delay: Duration,
    /// Upper bound for one classification call
    pub call_timeout: Option<Duration>,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            capture_delay: Duration::from_millis(CAPTURE_DELAY_MS),
            call_timeout: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProducerStats {
    pub calls: u64,
    pub pushed: u64,
    pub failures: u64,
}

/// Owner of a running producer task. Dropping it also stops the task.
#[derive(Debug)]
pub struct ProducerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<ProducerStats>,
}

impl ProducerHandle {
    /// Stop the task and wait for it. An in-flight call is abandoned.
    pub async fn stop(self) -> ProducerStats {
        let _ = self.shutdown.send(true);
        match self.task.await {
            Ok(stats) => stats,
            Err(err) => {
                warn!(error = %err, "producer task did not finish cleanly");
                ProducerStats::default()
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Start the capture loop on the current tokio runtime
pub fn spawn_producer<C: Classifier>(
    mut classifier: C,
    queue: Arc<PredictionQueue>,
    config: ProducerConfig,
) -> ProducerHandle {
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut stats = ProducerStats::default();
        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            let result = tokio::select! {
                _ = shutdown_rx.changed() => break,
                result = classify_once(&mut classifier, config.call_timeout) => result,
            };
            stats.calls += 1;

            match result {
                Ok(label) => {
                    if queue.push(PredictionSample::new(label)) {
                        debug!("unconsumed prediction superseded");
                    }
                    stats.pushed += 1;
                }
                Err(err) => {
                    stats.failures += 1;
                    warn!(error = %err, "classification failed");
                }
            }

            if config.capture_delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = tokio::time::sleep(config.capture_delay) => {}
                }
            }
        }
        debug!(calls = stats.calls, pushed = stats.pushed, "producer stopped");
        stats
    });

    ProducerHandle { shutdown, task }
}

async fn classify_once<C: Classifier>(
    classifier: &mut C,
    limit: Option<Duration>,
) -> Result<Option<String>, ClassifierError> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, classifier.classify())
            .await
            .map_err(|_| ClassifierError::TimedOut(limit))?,
        None => classifier.classify().await,
    }
}

// =============================================================================
// CLASSIFIERS
// =============================================================================

/// Replays a fixed list of labels, then reports nothing recognized
#[derive(Debug, Clone, Default)]
pub struct ScriptedClassifier {
    script: VecDeque<Option<String>>,
    latency: Duration,
}

impl ScriptedClassifier {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            script: labels.into_iter().map(|l| l.map(Into::into)).collect(),
            latency: Duration::ZERO,
        }
    }

    /// Simulated network round trip per call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Classifier for ScriptedClassifier {
    fn classify(&mut self) -> impl Future<Output = Result<Option<String>, ClassifierError>> + Send {
        async move {
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            Ok(self.script.pop_front().flatten())
        }
    }
}

/// Pretends to be a player in front of a camera: watches the published
/// snapshot and signs the letter closest to its deadline, getting it right
/// with probability `accuracy`.
#[derive(Debug)]
pub struct SimulatedPlayer {
    snapshots: watch::Receiver<GameSnapshot>,
    accuracy: f64,
    latency: Duration,
    rng: StdRng,
}

impl SimulatedPlayer {
    pub fn new(snapshots: watch::Receiver<GameSnapshot>, accuracy: f64, seed: Option<u64>) -> Self {
        Self {
            snapshots,
            accuracy: accuracy.clamp(0.0, 1.0),
            latency: Duration::from_millis(120),
            rng: match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            },
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn guess(&mut self) -> Option<String> {
        let target = {
            let snapshot = self.snapshots.borrow();
            snapshot
                .lanes
                .iter()
                .filter_map(|lane| lane.letter.map(|letter| (letter, lane.progress)))
                .max_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(letter, _)| letter)
        };

        match target {
            Some(letter) if self.rng.gen_bool(self.accuracy) => Some(letter.to_string()),
            _ if self.rng.gen_bool(0.5) => None,
            _ => Some(Letter::random(&mut self.rng).to_string()),
        }
    }
}

impl Classifier for SimulatedPlayer {
    fn classify(&mut self) -> impl Future<Output = Result<Option<String>, ClassifierError>> + Send {
        async move {
            tokio::time::sleep(self.latency).await;
            Ok(self.guess())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fails every other call
    struct Flaky {
        calls: u32,
    }

    impl Classifier for Flaky {
        fn classify(&mut self) -> impl Future<Output = Result<Option<String>, ClassifierError>> + Send {
            async move {
                self.calls += 1;
                if self.calls % 2 == 0 {
                    Err(ClassifierError::Unavailable("connection refused".into()))
                } else {
                    Ok(Some("A".to_string()))
                }
            }
        }
    }

    /// Never answers
    struct Stuck;

    impl Classifier for Stuck {
        fn classify(&mut self) -> impl Future<Output = Result<Option<String>, ClassifierError>> + Send {
            std::future::pending()
        }
    }

    fn fast() -> ProducerConfig {
        ProducerConfig {
            capture_delay: Duration::from_millis(1),
            call_timeout: None,
        }
    }

    #[tokio::test]
    async fn test_scripted_classifier_replays_labels() {
        let mut classifier = ScriptedClassifier::new([Some("A"), None, Some("b")]);
        assert_eq!(classifier.classify().await.unwrap().as_deref(), Some("A"));
        assert_eq!(classifier.classify().await.unwrap(), None);
        assert_eq!(classifier.classify().await.unwrap().as_deref(), Some("b"));
        assert_eq!(classifier.classify().await.unwrap(), None);
        assert_eq!(classifier.remaining(), 0);
    }

    #[tokio::test]
    async fn test_producer_pushes_latest() {
        let queue = Arc::new(PredictionQueue::new());
        let classifier = ScriptedClassifier::new([Some("A"), Some("B"), Some("C")]);
        let handle = spawn_producer(classifier, Arc::clone(&queue), fast());

        tokio::time::sleep(Duration::from_millis(50)).await;
        let stats = handle.stop().await;

        assert!(stats.calls >= 3);
        assert_eq!(stats.failures, 0);
        // script exhausted → later calls push "nothing recognized"
        assert!(queue.stats().superseded >= 2);
    }

    #[tokio::test]
    async fn test_producer_survives_failures() {
        let queue = Arc::new(PredictionQueue::new());
        let handle = spawn_producer(Flaky { calls: 0 }, Arc::clone(&queue), fast());

        tokio::time::sleep(Duration::from_millis(50)).await;
        let stats = handle.stop().await;

        assert!(stats.failures >= 1);
        assert!(stats.pushed >= 1);
        assert_eq!(stats.calls, stats.pushed + stats.failures);
    }

    #[tokio::test]
    async fn test_call_timeout_bounds_slow_classifier() {
        let queue = Arc::new(PredictionQueue::new());
        let config = ProducerConfig {
            capture_delay: Duration::from_millis(1),
            call_timeout: Some(Duration::from_millis(5)),
        };
        let handle = spawn_producer(Stuck, Arc::clone(&queue), config);

        tokio::time::sleep(Duration::from_millis(60)).await;
        let stats = handle.stop().await;

        assert!(stats.failures >= 1);
        assert_eq!(stats.pushed, 0);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_stop_interrupts_stuck_call() {
        let queue = Arc::new(PredictionQueue::new());
        let handle = spawn_producer(Stuck, queue, fast());
        tokio::time::sleep(Duration::from_millis(10)).await;

        let stats = tokio::time::timeout(Duration::from_secs(1), handle.stop())
            .await
            .expect("stop must not hang");
        assert_eq!(stats.calls, 0);
    }

    #[tokio::test]
    async fn test_simulated_player_targets_nearest_deadline() {
        use crate::core::GameEngine;
        use crate::types::GameConfig;

        let mut engine = GameEngine::standalone(GameConfig {
            seed: Some(3),
            ..GameConfig::default()
        })
        .unwrap();
        engine.spawn_lane().unwrap();
        let snapshot = engine.snapshot();
        let (_tx, rx) = watch::channel(snapshot.clone());

        let mut player = SimulatedPlayer::new(rx, 1.0, Some(1)).with_latency(Duration::ZERO);
        let label = player.classify().await.unwrap().unwrap();
        let expected = snapshot
            .lanes
            .iter()
            .max_by(|a, b| a.progress.total_cmp(&b.progress))
            .and_then(|lane| lane.letter)
            .unwrap();
        assert_eq!(label, expected.to_string());
    }
}
