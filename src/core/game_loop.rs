//! Real-time driver for `GameEngine`
//!
//! The engine lives inside one tokio task and is never shared. Everything
//! else talks to it through a `GameLoopHandle`:
//! - control commands go in over an mpsc channel, each with a oneshot reply
//! - tick reports that carry events go out on a broadcast channel
//! - the latest snapshot is always available on a watch channel
//! - predictions go straight into the engine's queue

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::core::{FrameTimer, GameEngine, PredictionQueue};
use crate::types::{GameError, GameMode, GameSnapshot, PredictionSample, SessionPhase, TickReport};
use crate::TICK_HZ;

type Reply = oneshot::Sender<Result<GameSnapshot, GameError>>;

#[derive(Debug)]
enum Command {
    Pause(Reply),
    Resume(Reply),
    Reset {
        mode: GameMode,
        score_to_level: u32,
        event_window: [u32; 2],
        reply: Reply,
    },
    SpawnLane(Reply),
    DespawnLane(Reply),
    Snapshot(Reply),
    Shutdown,
}

/// Cloneable control surface of a running game loop
#[derive(Debug, Clone)]
pub struct GameLoopHandle {
    commands: mpsc::Sender<Command>,
    reports: broadcast::Sender<TickReport>,
    latest: watch::Receiver<GameSnapshot>,
    queue: Arc<PredictionQueue>,
}

impl GameLoopHandle {
    pub async fn pause(&self) -> Result<GameSnapshot, GameError> {
        self.request(Command::Pause).await
    }

    pub async fn resume(&self) -> Result<GameSnapshot, GameError> {
        self.request(Command::Resume).await
    }

    pub async fn reset(
        &self,
        mode: GameMode,
        score_to_level: u32,
        event_window: [u32; 2],
    ) -> Result<GameSnapshot, GameError> {
        self.request(|reply| Command::Reset {
            mode,
            score_to_level,
            event_window,
            reply,
        })
        .await
    }

    pub async fn spawn_lane(&self) -> Result<GameSnapshot, GameError> {
        self.request(Command::SpawnLane).await
    }

    pub async fn despawn_lane(&self) -> Result<GameSnapshot, GameError> {
        self.request(Command::DespawnLane).await
    }

    /// Snapshot taken by the loop itself (consistent with all prior commands)
    pub async fn snapshot(&self) -> Result<GameSnapshot, GameError> {
        self.request(Command::Snapshot).await
    }

    /// Most recently published snapshot, without a round trip
    pub fn latest(&self) -> GameSnapshot {
        self.latest.borrow().clone()
    }

    /// Watch the published snapshot
    pub fn watch(&self) -> watch::Receiver<GameSnapshot> {
        self.latest.clone()
    }

    /// Tick reports that carried at least one event
    pub fn subscribe(&self) -> broadcast::Receiver<TickReport> {
        self.reports.subscribe()
    }

    /// Deliver a classifier result (capture side)
    pub fn push_prediction(&self, sample: PredictionSample) {
        self.queue.push(sample);
    }

    pub fn queue(&self) -> Arc<PredictionQueue> {
        Arc::clone(&self.queue)
    }

    /// Ask the loop to stop; it exits after the current iteration
    pub async fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown).await;
    }

    async fn request(&self, make: impl FnOnce(Reply) -> Command) -> Result<GameSnapshot, GameError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| GameError::LoopClosed)?;
        rx.await.map_err(|_| GameError::LoopClosed)?
    }
}

pub struct GameLoop {
    engine: GameEngine,
    commands: mpsc::Receiver<Command>,
    reports: broadcast::Sender<TickReport>,
    latest: watch::Sender<GameSnapshot>,
    tick_period: Duration,
}

impl GameLoop {
    /// Move `engine` into a task ticking at `TICK_HZ`
    pub fn spawn(engine: GameEngine) -> (GameLoopHandle, JoinHandle<GameEngine>) {
        Self::spawn_with_rate(engine, TICK_HZ)
    }

    pub fn spawn_with_rate(engine: GameEngine, hz: u32) -> (GameLoopHandle, JoinHandle<GameEngine>) {
        let (command_tx, commands) = mpsc::channel(64);
        let (reports, _) = broadcast::channel(256);
        let (latest, latest_rx) = watch::channel(engine.snapshot());
        let queue = engine.queue();

        let handle = GameLoopHandle {
            commands: command_tx,
            reports: reports.clone(),
            latest: latest_rx,
            queue,
        };

        let game_loop = GameLoop {
            engine,
            commands,
            reports,
            latest,
            tick_period: Duration::from_secs_f64(1.0 / f64::from(hz.max(1))),
        };
        (handle, tokio::spawn(game_loop.run()))
    }

    /// Returns the engine when the loop stops, so callers can inspect it
    async fn run(mut self) -> GameEngine {
        let mut interval = tokio::time::interval(self.tick_period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut timer = FrameTimer::new();
        info!(period_ms = self.tick_period.as_millis() as u64, "game loop started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let delta = timer.delta();
                    if self.engine.phase() != SessionPhase::Running {
                        continue;
                    }
                    match self.engine.tick(delta) {
                        Ok(report) => self.publish(report),
                        Err(err) => warn!(code = err.code(), error = %err, "tick rejected"),
                    }
                }
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => {
                        self.handle(command);
                        timer.restart();
                    }
                },
            }
        }

        info!(score = self.engine.score(), "game loop stopped");
        self.engine
    }

    fn handle(&mut self, command: Command) {
        let (result, reply) = match command {
            Command::Pause(reply) => (self.engine.pause(), reply),
            Command::Resume(reply) => (self.engine.resume(), reply),
            Command::Reset {
                mode,
                score_to_level,
                event_window,
                reply,
            } => (self.engine.reset(mode, score_to_level, event_window), reply),
            Command::SpawnLane(reply) => (self.engine.spawn_lane().map(|_| ()), reply),
            Command::DespawnLane(reply) => (self.engine.despawn_lane().map(|_| ()), reply),
            Command::Snapshot(reply) => (Ok(()), reply),
            Command::Shutdown => return,
        };

        if let Err(err) = &result {
            debug!(code = err.code(), error = %err, "command rejected");
        }

        let events = self.engine.drain_events();
        let snapshot = self.engine.snapshot();
        if !events.is_empty() {
            self.publish(TickReport {
                events,
                snapshot: snapshot.clone(),
            });
        } else {
            self.latest.send_replace(snapshot.clone());
        }
        let _ = reply.send(result.map(|_| snapshot));
    }

    fn publish(&self, report: TickReport) {
        self.latest.send_replace(report.snapshot.clone());
        if !report.events.is_empty() {
            // no subscribers is fine
            let _ = self.reports.send(report);
        }
    }
}
