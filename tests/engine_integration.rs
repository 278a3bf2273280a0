//! Integration tests for the engine
//!
//! Full path: prediction queue → reconciler → progression → phase

use letterfall::core::{ChallengeLane, GameEngine, MatchOutcome, MatchReconciler, PredictionQueue};
use letterfall::types::{
    GameConfig, GameEvent, GameMode, LaneKind, Letter, PredictionSample, SessionPhase,
};
use pretty_assertions::assert_eq;

const DT: f64 = 1.0 / 60.0;

fn config() -> GameConfig {
    GameConfig {
        seed: Some(2024),
        lane_speed: 0.25,
        ..GameConfig::default()
    }
}

fn running(config: GameConfig) -> GameEngine {
    let mut engine = GameEngine::standalone(config).unwrap();
    engine.resume().unwrap();
    engine.drain_events();
    engine
}

/// Sign the primary lane's letter and tick once
fn hit_primary(engine: &mut GameEngine) -> Vec<GameEvent> {
    let letter = engine.lanes()[0].letter().unwrap();
    engine.queue().push(PredictionSample::labeled(letter.to_string()));
    engine.tick(DT).unwrap().events
}

#[test]
fn test_paused_session_is_frozen() {
    let mut engine = GameEngine::standalone(config()).unwrap();
    let before = engine.snapshot();

    for _ in 0..1000 {
        let report = engine.tick(DT).unwrap();
        assert!(report.events.is_empty());
    }

    let after = engine.snapshot();
    assert_eq!(before.lanes, after.lanes);
    assert_eq!(before.score, after.score);
    assert_eq!(before.lives, after.lives);
    assert_eq!(before.level, after.level);
    assert_eq!(after.tick, 0);
}

#[test]
fn test_timeout_takes_one_life_and_respawns() {
    let mut engine = running(config());
    let mut timeouts = Vec::new();

    // 0.25/s → 4 seconds per drop; run 4.5 seconds
    for _ in 0..270 {
        let report = engine.tick(DT).unwrap();
        timeouts.extend(report.events.into_iter().filter(|e| matches!(e, GameEvent::Timeout { .. })));
    }

    assert_eq!(timeouts.len(), 1);
    assert!(matches!(timeouts[0], GameEvent::Timeout { lane_id: 0, lives_left: 2, .. }));
    assert_eq!(engine.lives(), 2);
    let lane = &engine.lanes()[0];
    assert!(lane.is_active());
    assert!(lane.progress() < 0.2);
}

#[test]
fn test_lives_stop_at_zero_and_game_over_is_final() {
    let mut engine = running(config());
    let mut events = Vec::new();

    while engine.phase() == SessionPhase::Running {
        events.extend(engine.tick(0.2).unwrap().events);
    }

    assert_eq!(engine.lives(), 0);
    assert_eq!(engine.phase(), SessionPhase::GameOver);

    let timeouts = events.iter().filter(|e| matches!(e, GameEvent::Timeout { .. })).count();
    assert_eq!(timeouts, letterfall::DEFAULT_LIVES as usize);
    assert!(matches!(events.last(), Some(GameEvent::GameOver { score: 0, level: 1 })));

    // nothing moves after game over, even with a matching prediction waiting
    let letter = engine.lanes()[0].letter().unwrap();
    engine.queue().push(PredictionSample::labeled(letter.to_string()));
    for _ in 0..10 {
        assert!(engine.tick(DT).unwrap_err().is_invalid_state());
    }
    assert_eq!(engine.lives(), 0);
    assert_eq!(engine.score(), 0);
}

#[test]
fn test_correct_prediction_scores_once() {
    let mut engine = running(config());
    let events = hit_primary(&mut engine);

    assert_eq!(engine.score(), 1);
    assert!(matches!(events[0], GameEvent::Hit { lane_id: 0, flash_ms: 700, .. }));

    // the same sample is not reconciled again
    let report = engine.tick(DT).unwrap();
    assert_eq!(report.hits(), 0);
    assert_eq!(engine.score(), 1);
}

#[test]
fn test_hit_flash_shows_then_clears() {
    let mut engine = running(config());
    hit_primary(&mut engine);
    assert_eq!(engine.snapshot().lanes[0].color_state, letterfall::types::ColorState::Flash);

    // 700 ms later
    for _ in 0..45 {
        engine.tick(DT).unwrap();
    }
    assert_eq!(engine.snapshot().lanes[0].color_state, letterfall::types::ColorState::Normal);
}

#[test]
fn test_nearer_deadline_wins_tie() {
    let c = Letter::parse("C").unwrap();
    let mut slow = ChallengeLane::new(0, LaneKind::Primary, 1.0);
    let mut fast = ChallengeLane::new(1, LaneKind::Event, 1.0);
    slow.spawn(c, 0.0).unwrap();
    fast.spawn(c, 0.0).unwrap();
    slow.on_tick(0.3);
    fast.on_tick(0.7);
    let mut lanes = vec![slow, fast];

    let queue = PredictionQueue::new();
    queue.push(PredictionSample::labeled("c"));
    let outcome = MatchReconciler::new().reconcile(&queue, &mut lanes, 0.7, 0.7);

    assert_eq!(outcome, MatchOutcome::Hit { lane_id: 1, letter: c });
    assert_eq!(lanes[0].letter(), Some(c));
    assert!((lanes[0].progress() - 0.3).abs() < 1e-12);
    assert!(!lanes[1].is_active());
}

#[test]
fn test_level_up_exactly_once_per_threshold() {
    let mut engine = running(GameConfig {
        score_to_level: 5,
        ..config()
    });

    for _ in 0..4 {
        let events = hit_primary(&mut engine);
        assert!(!events.iter().any(|e| matches!(e, GameEvent::LevelUp { .. })));
    }

    let events = hit_primary(&mut engine);
    let level_ups: Vec<&GameEvent> = events.iter().filter(|e| matches!(e, GameEvent::LevelUp { .. })).collect();
    assert_eq!(level_ups, vec![&GameEvent::LevelUp { level: 2 }]);

    let events = hit_primary(&mut engine);
    assert!(!events.iter().any(|e| matches!(e, GameEvent::LevelUp { .. })));
    assert_eq!(engine.level(), 2);
    assert_eq!(engine.score(), 6);
}

#[test]
fn test_event_lane_follows_window() {
    let mut engine = running(GameConfig {
        score_to_level: 1,
        event_window: [3, 5],
        ..config()
    });

    let mut lanes_per_level = vec![(engine.level(), engine.lanes().len())];
    for _ in 0..4 {
        hit_primary(&mut engine);
        lanes_per_level.push((engine.level(), engine.lanes().len()));
    }

    assert_eq!(lanes_per_level, vec![(1, 1), (2, 1), (3, 2), (4, 2), (5, 1)]);
}

#[test]
fn test_event_lane_spawn_is_reported() {
    let mut engine = running(GameConfig {
        score_to_level: 1,
        event_window: [2, 3],
        ..config()
    });
    let events = hit_primary(&mut engine);
    assert!(events.contains(&GameEvent::LevelUp { level: 2 }));
    assert!(events.contains(&GameEvent::LaneSpawned { lane_id: 1 }));

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.lanes[1].kind, LaneKind::Event);
    assert_eq!(snapshot.lanes[1].color_state, letterfall::types::ColorState::EventColor);
}

#[test]
fn test_second_push_wins() {
    let mut engine = running(config());
    let letter = engine.lanes()[0].letter().unwrap();
    let decoy = Letter::all().find(|l| *l != letter).unwrap();

    engine.queue().push(PredictionSample::labeled(letter.to_string()));
    engine.queue().push(PredictionSample::labeled(decoy.to_string()));
    let report = engine.tick(DT).unwrap();

    assert_eq!(report.hits(), 0);
    assert_eq!(engine.score(), 0);
}

#[test]
fn test_pause_resume_drops_stale_prediction() {
    let mut engine = running(config());
    let letter = engine.lanes()[0].letter().unwrap();

    engine.queue().push(PredictionSample::labeled(letter.to_string()));
    engine.pause().unwrap();
    engine.resume().unwrap();
    let report = engine.tick(DT).unwrap();

    assert_eq!(report.hits(), 0);
    assert_eq!(engine.score(), 0);
    assert_eq!(report.events, vec![GameEvent::Paused, GameEvent::Resumed]);
}

#[test]
fn test_malformed_prediction_is_ignored() {
    let mut engine = running(config());
    engine.queue().push(PredictionSample::labeled("J"));
    let report = engine.tick(DT).unwrap();
    assert!(report.events.is_empty());
    assert_eq!(engine.reconciler().stats().malformed, 1);
}

#[test]
fn test_long_silence_only_times_out() {
    let mut engine = running(GameConfig { lives: 10, ..config() });
    let mut hits = 0;
    let mut timeouts = 0;
    // 20.5 simulated seconds without a single prediction
    for _ in 0..1230 {
        let report = engine.tick(DT).unwrap();
        hits += report.hits();
        timeouts += report.timeouts();
    }
    assert_eq!(hits, 0);
    assert_eq!(timeouts, 5);
    assert_eq!(engine.lives(), 5);
}

#[test]
fn test_reset_after_game_over() {
    let mut engine = running(GameConfig { lives: 1, ..config() });
    while engine.phase() == SessionPhase::Running {
        engine.tick(0.2).unwrap();
    }

    engine.reset(GameMode::Memorize, 2, [1, 2]).unwrap();
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Paused);
    assert_eq!(snapshot.lives, 1);
    assert_eq!(snapshot.level, 1);
    assert_eq!(snapshot.mode, GameMode::Memorize);
    // level 1 is inside [1, 2)
    assert_eq!(snapshot.lanes.len(), 2);
}

#[test]
fn test_snapshot_json_round_trip() {
    let engine = GameEngine::standalone(config()).unwrap();
    let snapshot = engine.snapshot();
    let json = serde_json::to_string(&snapshot).unwrap();
    assert!(json.contains("\"phase\":\"PAUSED\""));
    assert!(json.contains("\"mode\":\"learn\""));
    let back: letterfall::types::GameSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back, snapshot);
}

#[test]
fn test_game_over_stops_the_tick_with_two_lanes() {
    let mut engine = running(GameConfig {
        lives: 1,
        event_window: [1, 3],
        lane_speed: 1.0,
        ..config()
    });
    assert_eq!(engine.lanes().len(), 2);

    let last = (0..4).map(|_| engine.tick(0.25).unwrap().events).last().unwrap();

    assert_eq!(engine.phase(), SessionPhase::GameOver);
    assert_eq!(last.len(), 2);
    assert!(matches!(last[0], GameEvent::Timeout { lane_id: 0, lives_left: 0, .. }));
    assert!(matches!(last[1], GameEvent::GameOver { score: 0, level: 1 }));

    // lane 1 was not advanced on the losing tick
    let event_lane = &engine.lanes()[1];
    assert!(event_lane.is_active());
    assert!(event_lane.progress() < 1.0);
}

#[test]
fn test_window_reverts_manual_spawn() {
    let mut engine = running(config());
    engine.spawn_lane().unwrap();
    assert_eq!(engine.lanes().len(), 2);

    let report = engine.tick(DT).unwrap();
    assert_eq!(
        report.events,
        vec![GameEvent::LaneSpawned { lane_id: 1 }, GameEvent::LaneDespawned { lane_id: 1 }]
    );
    assert_eq!(engine.lanes().len(), 1);
}

#[test]
fn test_window_reverts_manual_despawn() {
    let mut engine = running(GameConfig {
        event_window: [1, 3],
        ..config()
    });
    engine.tick(DT).unwrap();
    engine.despawn_lane().unwrap();
    assert_eq!(engine.lanes().len(), 1);

    let report = engine.tick(DT).unwrap();
    assert_eq!(
        report.events,
        vec![GameEvent::LaneDespawned { lane_id: 1 }, GameEvent::LaneSpawned { lane_id: 1 }]
    );
    assert_eq!(engine.lanes().len(), 2);
    assert_eq!(engine.lanes()[1].progress(), 0.0);
}
