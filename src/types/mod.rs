//! Core types for Letterfall

mod letter;
mod phase;
mod lane;
mod sample;
mod event;
mod snapshot;
mod error;
mod config;

pub use letter::{Letter, ALPHABET};
pub use phase::{SessionPhase, GameMode};
pub use lane::{LaneId, LaneKind, ColorState, LaneTint, LaneView};
pub use sample::PredictionSample;
pub use event::GameEvent;
pub use snapshot::{GameSnapshot, TickReport};
pub use error::GameError;
pub use config::GameConfig;
