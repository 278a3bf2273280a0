//! Core modules for Letterfall

pub mod clock;
pub mod lane;
pub mod mailbox;
pub mod reconciler;
pub mod progression;
pub mod engine;
pub mod producer;
pub mod game_loop;
pub mod api;

pub use clock::{Clock, FrameTimer};
pub use lane::{ChallengeLane, LaneTick};
pub use mailbox::{PredictionQueue, QueueStats};
pub use reconciler::{MatchReconciler, MatchOutcome, ReconcileStats};
pub use progression::{Progression, TimeoutOutcome};
pub use engine::{GameEngine, EVENT_LANE_ID};
pub use producer::{Classifier, ClassifierError, ScriptedClassifier, SimulatedPlayer, ProducerConfig, ProducerHandle, ProducerStats, spawn_producer};
pub use game_loop::{GameLoop, GameLoopHandle};
pub use api::{create_router, run_server};
