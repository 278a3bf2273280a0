//! Letterfall CLI
//!
//! Usage:
//!   letterfall                                  # Headless demo with a simulated player
//!   letterfall --mode memorize --accuracy 0.6   # Demo with a sloppier player
//!   letterfall --serve                          # HTTP API server
//!   letterfall --serve --simulate               # Server with a simulated player attached
//!   letterfall --config game.toml --json        # File config, JSON output

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use letterfall::core::{
    run_server, spawn_producer, GameEngine, GameLoop, GameLoopHandle, PredictionQueue, ProducerConfig,
    SimulatedPlayer,
};
use letterfall::types::{GameConfig, GameError, GameEvent, GameMode, SessionPhase, TickReport};
use letterfall::{CAPTURE_DELAY_MS, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "letterfall",
    version = VERSION,
    about = "Letterfall - sign the falling letter before it lands",
    long_about = "Letterfall runs the game loop of a sign-language letter game.\n\n\
                  A letter falls down a lane; a classifier keeps guessing which sign\n\
                  the player shows. A matching guess before the letter lands scores a\n\
                  point, a letter that lands costs a life.\n\n\
                  Modes:\n  \
                  (default)  Headless demo with a simulated player\n  \
                  --serve    HTTP API server (predictions via POST /prediction)\n\n\
                  Phases:\n  \
                  PAUSED     - Nothing moves\n  \
                  RUNNING    - Letters fall, guesses are matched\n  \
                  GAME_OVER  - Out of lives, reset to play again"
)]
struct Args {
    /// TOML config file (flags override its values)
    #[arg(short, long)]
    config: Option<String>,

    /// learn or memorize
    #[arg(short, long)]
    mode: Option<GameMode>,

    /// Points per level
    #[arg(long)]
    score_to_level: Option<u32>,

    /// Levels [START, END) with a second lane
    #[arg(long, num_args = 2, value_names = ["START", "END"])]
    event_window: Option<Vec<u32>>,

    /// Lives at session start
    #[arg(long)]
    lives: Option<u32>,

    /// Lane progress per second (1.0 = a letter lands in one second)
    #[arg(long)]
    lane_speed: Option<f64>,

    /// Seed for letters and the simulated player
    #[arg(long)]
    seed: Option<u64>,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// Attach a simulated player when serving
    #[arg(long)]
    simulate: bool,

    /// Probability that the simulated player signs the right letter
    #[arg(long, default_value_t = 0.8)]
    accuracy: f64,

    /// Stop the demo after this many seconds
    #[arg(long, default_value_t = 120)]
    max_secs: u64,

    /// Delay between classification calls (milliseconds)
    #[arg(long, default_value_t = CAPTURE_DELAY_MS)]
    capture_delay_ms: u64,

    /// Give up on a classification call after this long (milliseconds)
    #[arg(long)]
    classifier_timeout_ms: Option<u64>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Debug logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", e.code(), e);
            return ExitCode::FAILURE;
        }
    };

    let result = if args.serve {
        run_serve(&args, config).await
    } else {
        run_demo(&args, config).await
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "letterfall=debug" } else { "letterfall=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// File config (or defaults) with CLI overrides applied
fn build_config(args: &Args) -> Result<GameConfig, GameError> {
    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };

    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    if let Some(score_to_level) = args.score_to_level {
        config.score_to_level = score_to_level;
    }
    if let Some(window) = &args.event_window {
        if let [start, end] = window[..] {
            config.event_window = [start, end];
        }
    }
    if let Some(lives) = args.lives {
        config.lives = lives;
    }
    if let Some(speed) = args.lane_speed {
        config.lane_speed = speed;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    config.validate()?;
    Ok(config)
}

fn producer_config(args: &Args) -> ProducerConfig {
    ProducerConfig {
        capture_delay: Duration::from_millis(args.capture_delay_ms),
        call_timeout: args.classifier_timeout_ms.map(Duration::from_millis),
    }
}

fn start_game(config: GameConfig) -> Result<(GameLoopHandle, tokio::task::JoinHandle<GameEngine>), GameError> {
    let engine = GameEngine::new(config, Arc::new(PredictionQueue::new()))?;
    Ok(GameLoop::spawn(engine))
}

/// Run a headless session with a simulated player
async fn run_demo(args: &Args, config: GameConfig) -> Result<(), Box<dyn std::error::Error>> {
    let seed = config.seed;
    let (game, task) = start_game(config)?;
    let mut reports = game.subscribe();

    let player = SimulatedPlayer::new(game.watch(), args.accuracy, seed);
    let producer = spawn_producer(player, game.queue(), producer_config(args));

    print_header(&game, args.no_color);
    game.resume().await?;

    let deadline = tokio::time::sleep(Duration::from_secs(args.max_secs));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            report = reports.recv() => match report {
                Ok(report) => {
                    print_report(&report, args);
                    if report.snapshot.phase == SessionPhase::GameOver {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = &mut deadline => {
                println!("Time limit reached.");
                break;
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let stats = producer.stop().await;
    game.shutdown().await;
    let engine = task.await?;

    let reconciled = engine.reconciler().stats();
    println!();
    println!(
        "Session ended. Score: {} | Level: {} | Lives: {}",
        engine.score(),
        engine.level(),
        engine.lives()
    );
    println!(
        "Classifier calls: {} | Predictions matched: {} | Unmatched: {} | Malformed: {}",
        stats.calls, reconciled.hits, reconciled.misses, reconciled.malformed
    );
    Ok(())
}

/// Run HTTP API server
async fn run_serve(args: &Args, config: GameConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!();
    println!("========================================");
    println!("  Letterfall v{} - API Server", VERSION);
    println!("========================================");
    println!();

    let seed = config.seed;
    let (game, _task) = start_game(config)?;

    let producer = if args.simulate {
        let player = SimulatedPlayer::new(game.watch(), args.accuracy, seed);
        Some(spawn_producer(player, game.queue(), producer_config(args)))
    } else {
        None
    };

    let result = run_server(&args.addr, game.clone()).await;

    if let Some(producer) = producer {
        producer.stop().await;
    }
    game.shutdown().await;
    result
}

fn print_header(game: &GameLoopHandle, no_color: bool) {
    let snapshot = game.latest();
    let title = format!("Letterfall v{} - {} mode", VERSION, snapshot.mode);
    if no_color {
        println!("========================================");
        println!("  {}", title);
        println!("========================================");
    } else {
        println!("{}", "========================================".bold());
        println!("  {}", title.bold());
        println!("{}", "========================================".bold());
    }
    println!();
}

fn print_report(report: &TickReport, args: &Args) {
    if args.json {
        println!("{}", serde_json::to_string(report).unwrap_or_default());
        return;
    }

    for event in &report.events {
        let line = format!("  {}", event);
        if args.no_color {
            println!("{}", line);
            continue;
        }
        let line = match event {
            GameEvent::Hit { .. } => line.green(),
            GameEvent::Timeout { .. } => line.red(),
            GameEvent::LevelUp { .. } => line.yellow().bold(),
            GameEvent::GameOver { .. } => line.red().bold(),
            _ => line.dimmed(),
        };
        println!("{}", line);
    }

    if args.no_color {
        println!("{}", report.snapshot.to_parseable_string());
    } else {
        println!("{}", report.snapshot.to_terminal_string());
    }
}
