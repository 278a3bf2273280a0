//! Game engine: session state machine around lanes, reconciler and progression
//!
//! Phase transitions:
//! - PAUSED → RUNNING: `resume` (buffered predictions dropped)
//! - RUNNING → PAUSED: `pause` (buffered predictions dropped)
//! - RUNNING → GAME_OVER: last life lost during `tick`
//! - any → PAUSED/RUNNING: `reset` with a fresh session
//!
//! One running tick:
//! 1. reconcile the latest prediction (at most one hit)
//! 2. advance lanes, resolve timeouts in lane order
//! 3. open or close the event lane for the current level

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::core::{ChallengeLane, Clock, LaneTick, MatchOutcome, MatchReconciler, PredictionQueue, Progression};
use crate::types::{
    GameConfig, GameError, GameEvent, GameMode, GameSnapshot, LaneId, LaneKind, Letter, SessionPhase,
    TickReport,
};

/// Lane id of the lane that only runs inside the event window
pub const EVENT_LANE_ID: LaneId = 1;

/// The engine is the only writer of lanes and session state.
#[derive(Debug)]
pub struct GameEngine {
    config: GameConfig,
    phase: SessionPhase,
    progression: Progression,
    lanes: Vec<ChallengeLane>,
    queue: Arc<PredictionQueue>,
    reconciler: MatchReconciler,
    clock: Clock,
    rng: StdRng,
    /// Events from control actions, reported with the next tick
    pending: Vec<GameEvent>,
}

impl GameEngine {
    /// Create an engine reading predictions from `queue`
    pub fn new(config: GameConfig, queue: Arc<PredictionQueue>) -> Result<Self, GameError> {
        config.validate()?;
        let mut engine = Self {
            phase: SessionPhase::Paused,
            progression: Progression::new(&config),
            lanes: Vec::new(),
            queue,
            reconciler: MatchReconciler::new(),
            clock: Clock::new(),
            rng: seeded_rng(config.seed),
            pending: Vec::new(),
            config,
        };
        engine.start_session()?;
        engine.pending.clear();
        Ok(engine)
    }

    /// Engine with its own fresh queue
    pub fn standalone(config: GameConfig) -> Result<Self, GameError> {
        Self::new(config, Arc::new(PredictionQueue::new()))
    }

    // =========================================================================
    // CONTROL SURFACE
    // =========================================================================

    /// RUNNING → PAUSED. Pausing a paused session is a no-op.
    pub fn pause(&mut self) -> Result<(), GameError> {
        match self.phase {
            SessionPhase::GameOver => Err(GameError::invalid_state("pause", "session is over")),
            SessionPhase::Paused => Ok(()),
            SessionPhase::Running => {
                self.phase = SessionPhase::Paused;
                self.drop_buffered("pause");
                self.pending.push(GameEvent::Paused);
                info!(score = self.progression.score(), "session paused");
                Ok(())
            }
        }
    }

    /// PAUSED → RUNNING. Anything that arrived while paused is discarded.
    pub fn resume(&mut self) -> Result<(), GameError> {
        match self.phase {
            SessionPhase::GameOver => Err(GameError::invalid_state("resume", "session is over")),
            SessionPhase::Running => Ok(()),
            SessionPhase::Paused => {
                self.drop_buffered("resume");
                self.phase = SessionPhase::Running;
                self.pending.push(GameEvent::Resumed);
                info!(level = self.progression.level(), "session resumed");
                Ok(())
            }
        }
    }

    /// Throw the session away and start a new one with the given parameters.
    /// On error the current session is left untouched.
    pub fn reset(&mut self, mode: GameMode, score_to_level: u32, event_window: [u32; 2]) -> Result<(), GameError> {
        let config = self.config.with_session(mode, score_to_level, event_window);
        config.validate()?;
        self.config = config;
        self.rng = seeded_rng(self.config.seed);
        self.start_session()?;
        info!(%mode, score_to_level, ?event_window, "session reset");
        Ok(())
    }

    /// Add the event lane. Fails if it is already running or the game is over.
    pub fn spawn_lane(&mut self) -> Result<LaneId, GameError> {
        if self.phase.is_terminal() {
            return Err(GameError::invalid_state("spawn_lane", "session is over"));
        }
        if self.lanes.len() > EVENT_LANE_ID {
            return Err(GameError::invalid_state("spawn_lane", "event lane already running"));
        }

        let mut lane = ChallengeLane::new(EVENT_LANE_ID, LaneKind::Event, self.config.lane_speed);
        lane.spawn(Letter::random(&mut self.rng), self.clock.elapsed())?;
        self.lanes.push(lane);
        self.pending.push(GameEvent::LaneSpawned { lane_id: EVENT_LANE_ID });
        debug!(lane = EVENT_LANE_ID, "event lane spawned");
        Ok(EVENT_LANE_ID)
    }

    /// Remove the event lane, discarding its letter unresolved. Fails if
    /// there is none or the game is over.
    pub fn despawn_lane(&mut self) -> Result<LaneId, GameError> {
        if self.phase.is_terminal() {
            return Err(GameError::invalid_state("despawn_lane", "session is over"));
        }
        if self.lanes.len() <= EVENT_LANE_ID {
            return Err(GameError::invalid_state("despawn_lane", "no event lane running"));
        }
        self.lanes.truncate(EVENT_LANE_ID);
        self.pending.push(GameEvent::LaneDespawned { lane_id: EVENT_LANE_ID });
        debug!(lane = EVENT_LANE_ID, "event lane despawned");
        Ok(EVENT_LANE_ID)
    }

    // =========================================================================
    // SIMULATION
    // =========================================================================

    /// Advance the session by `delta_secs`.
    ///
    /// Paused: no-op (pending control events are still reported).
    /// Game over: `InvalidState`, the caller should check `phase` first.
    pub fn tick(&mut self, delta_secs: f64) -> Result<TickReport, GameError> {
        match self.phase {
            SessionPhase::GameOver => return Err(GameError::invalid_state("tick", "session is over")),
            SessionPhase::Paused => return Ok(self.report(Vec::new())),
            SessionPhase::Running => {}
        }

        let delta = self.clock.advance(delta_secs);
        let now = self.clock.elapsed();
        let mut events = std::mem::take(&mut self.pending);

        // 1. Prediction
        let flash_secs = self.config.flash_ms as f64 / 1000.0;
        if let MatchOutcome::Hit { lane_id, letter } =
            self.reconciler.reconcile(&self.queue, &mut self.lanes, now, flash_secs)
        {
            events.push(GameEvent::Hit {
                lane_id,
                letter,
                flash_ms: self.config.flash_ms,
            });
            for level in self.progression.on_hit() {
                info!(level, score = self.progression.score(), "level up");
                events.push(GameEvent::LevelUp { level });
            }
            self.respawn(lane_id)?;
        }

        // 2. Deadlines
        for index in 0..self.lanes.len() {
            let LaneTick::TimedOut(letter) = self.lanes[index].on_tick(delta) else {
                continue;
            };
            let outcome = self.progression.on_timeout();
            debug!(lane = index, %letter, lives = outcome.lives_left, "lane timed out");
            events.push(GameEvent::Timeout {
                lane_id: index,
                letter,
                lives_left: outcome.lives_left,
            });
            self.respawn(index)?;

            if outcome.game_over {
                self.phase = SessionPhase::GameOver;
                self.queue.clear();
                info!(score = self.progression.score(), level = self.progression.level(), "game over");
                events.push(GameEvent::GameOver {
                    score: self.progression.score(),
                    level: self.progression.level(),
                });
                break;
            }
        }

        // 3. Event window
        if self.phase == SessionPhase::Running {
            self.sync_event_lane()?;
            events.append(&mut self.pending);
        }

        Ok(self.report(events))
    }

    /// Current state for presentation
    pub fn snapshot(&self) -> GameSnapshot {
        let now = self.clock.elapsed();
        let level = self.progression.level();
        GameSnapshot {
            timestamp: chrono::Utc::now(),
            tick: self.clock.ticks(),
            elapsed_secs: now,
            lives: self.progression.lives(),
            score: self.progression.score(),
            level,
            mode: self.progression.mode(),
            phase: self.phase,
            lanes: self.lanes.iter().map(|lane| lane.view(now, level)).collect(),
            show_reference: self.progression.mode().shows_reference(),
        }
    }

    /// Take events produced by control actions since the last tick
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending)
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn lanes(&self) -> &[ChallengeLane] {
        &self.lanes
    }

    pub fn lives(&self) -> u32 {
        self.progression.lives()
    }

    pub fn score(&self) -> u32 {
        self.progression.score()
    }

    pub fn level(&self) -> u32 {
        self.progression.level()
    }

    pub fn progression(&self) -> &Progression {
        &self.progression
    }

    pub fn reconciler(&self) -> &MatchReconciler {
        &self.reconciler
    }

    /// Handle for the capture side
    pub fn queue(&self) -> Arc<PredictionQueue> {
        Arc::clone(&self.queue)
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn start_session(&mut self) -> Result<(), GameError> {
        self.progression = Progression::new(&self.config);
        self.clock.reset();
        self.reconciler = MatchReconciler::new();
        self.queue.clear();
        self.pending.clear();

        let mut primary = ChallengeLane::new(0, LaneKind::Primary, self.config.lane_speed);
        primary.spawn(Letter::random(&mut self.rng), 0.0)?;
        self.lanes = vec![primary];

        self.phase = if self.config.start_running {
            SessionPhase::Running
        } else {
            SessionPhase::Paused
        };
        self.pending.push(GameEvent::Reset);
        self.sync_event_lane()
    }

    fn respawn(&mut self, lane_id: LaneId) -> Result<(), GameError> {
        let now = self.clock.elapsed();
        let letter = Letter::random(&mut self.rng);
        self.lanes[lane_id].spawn(letter, now)
    }

    fn sync_event_lane(&mut self) -> Result<(), GameError> {
        let running = self.lanes.len() > EVENT_LANE_ID;
        match (self.progression.event_lane_active(), running) {
            (true, false) => self.spawn_lane().map(|_| ()),
            (false, true) => self.despawn_lane().map(|_| ()),
            _ => Ok(()),
        }
    }

    fn drop_buffered(&self, action: &'static str) {
        if let Some(sample) = self.queue.clear() {
            debug!(action, label = ?sample.label, "dropped buffered prediction");
        }
    }

    fn report(&mut self, mut events: Vec<GameEvent>) -> TickReport {
        if events.is_empty() {
            events = self.drain_events();
        }
        TickReport {
            events,
            snapshot: self.snapshot(),
        }
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

// =============================================================================
// TESTS
// =============================================================================
