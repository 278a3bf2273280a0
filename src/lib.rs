//! Letterfall: game loop and prediction-matching engine
//!
//! A target letter falls down one or more lanes; an external classifier keeps
//! guessing which sign the player is holding up. The engine matches guesses
//! against the falling letters, awards hits, takes lives on timeouts and
//! levels the player up.

pub mod core;
pub mod types;

// =============================================================================
// SESSION DEFAULTS
// =============================================================================

/// Lives at the start of a session
pub const DEFAULT_LIVES: u32 = 3;

/// Points needed per level
pub const DEFAULT_SCORE_TO_LEVEL: u32 = 5;

/// Levels `[start, end)` during which the event lane runs
pub const DEFAULT_EVENT_WINDOW: [u32; 2] = [3, 5];

/// Lane progress per second (1.0 = deadline), five seconds per drop
pub const DEFAULT_LANE_SPEED: f64 = 0.2;

/// Progress value at which an unresolved lane times out
pub const DEADLINE_PROGRESS: f64 = 1.0;

/// How long a lane shows the hit flash (milliseconds)
pub const FLASH_DURATION_MS: u64 = 700;

// =============================================================================
// TIMING
// =============================================================================

/// Simulation tick rate
pub const TICK_HZ: u32 = 60;

/// Largest delta a single tick may apply (seconds); longer stalls are clamped
pub const MAX_TICK_DELTA_SECS: f64 = 0.25;

/// Pause between two capture+classify round trips (milliseconds)
pub const CAPTURE_DELAY_MS: u64 = 50;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
