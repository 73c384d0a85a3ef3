//! Realtime Chess Demo
//!
//! Headless match on the classic layout. Two scripted producer threads play
//! an opening for each side while the tick loop runs; afterwards the match
//! is replayed from the recorded command schedule and the final snapshot
//! hashes are compared.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use realtime_chess::{
    Cell, EngineConfig, VERSION,
    game::{
        clock::SimClock,
        command::{Command, TimeMs},
        events::GameEvent,
        factory::{UnitFactory, STANDARD_LAYOUT},
        state::Game,
        tick::{replay_match, tick},
    },
    input::{spawn_producer, CommandSource, SourcePoll},
};

/// Simulated milliseconds per tick (before the time factor).
const TICK_STEP_MS: TimeMs = 20;

/// Wall time between ticks.
const TICK_SLEEP: Duration = Duration::from_millis(1);

/// Tick cap when the config leaves it unbounded.
const DEMO_TICK_LIMIT: u64 = 5000;

fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).context("setting tracing subscriber")?;

    info!("Realtime Chess v{}", VERSION);

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::from_path(&path).with_context(|| format!("loading config {path}"))?,
        None => EngineConfig::default(),
    }
    .with_env_overrides();
    config.validate().context("validating config")?;

    demo_match(&config)
}

/// Scripted opening stamped with the live simulation time.
struct Opening {
    started: Instant,
    sim_now: Arc<AtomicI64>,
    moves: Vec<(Duration, &'static str, Cell, Cell)>,
}

impl Opening {
    fn new(sim_now: Arc<AtomicI64>, mut moves: Vec<(Duration, &'static str, Cell, Cell)>) -> Self {
        moves.reverse();
        Self {
            started: Instant::now(),
            sim_now,
            moves,
        }
    }
}

impl CommandSource for Opening {
    fn poll_command(&mut self, timeout: Duration) -> SourcePoll {
        let Some(&(offset, unit, src, dst)) = self.moves.last() else {
            return SourcePoll::Exhausted;
        };
        let elapsed = self.started.elapsed();
        if elapsed < offset {
            thread::sleep((offset - elapsed).min(timeout));
            return SourcePoll::Pending;
        }
        self.moves.pop();
        let now = self.sim_now.load(Ordering::Acquire);
        SourcePoll::Ready(Command::move_to(now, unit, src, dst))
    }
}

fn new_game(factory: &UnitFactory, step: TimeMs) -> Result<Game> {
    let units = factory.spawn_layout(STANDARD_LAYOUT).context("spawning layout")?;
    let mut game = Game::new(units, factory.geometry(), SimClock::stepped(0, step))
        .context("validating roster")?;
    game.start();
    Ok(game)
}

/// Run the demo match, then verify it replays identically.
fn demo_match(config: &EngineConfig) -> Result<()> {
    info!("=== Starting Demo Match ===");

    let factory = config.unit_factory().context("building unit templates")?;
    let step = TICK_STEP_MS * config.clock.time_factor;
    let mut game = new_game(&factory, step)?;
    info!("{} units on the board, {}ms per tick", game.unit_count(), step);

    let sim_now = Arc::new(AtomicI64::new(game.now_ms()));
    let ms = Duration::from_millis;
    let white = Opening::new(
        Arc::clone(&sim_now),
        vec![
            (ms(0), "PW_6_4", Cell::new(6, 4), Cell::new(4, 4)),
            (ms(400), "QW_7_3", Cell::new(7, 3), Cell::new(3, 7)),
            (ms(1600), "QW_7_3", Cell::new(3, 7), Cell::new(1, 5)),
            (ms(2400), "QW_7_3", Cell::new(1, 5), Cell::new(0, 4)),
        ],
    );
    let black = Opening::new(
        Arc::clone(&sim_now),
        vec![
            (ms(200), "PB_1_0", Cell::new(1, 0), Cell::new(3, 0)),
            (ms(800), "PB_1_7", Cell::new(1, 7), Cell::new(2, 7)),
            (ms(1400), "PB_1_3", Cell::new(1, 3), Cell::new(3, 3)),
        ],
    );

    let poll = ms(10);
    let producers = vec![
        spawn_producer("white", white, game.command_sender(), poll).context("spawning white producer")?,
        spawn_producer("black", black, game.command_sender(), poll).context("spawning black producer")?,
    ];

    let limit = if config.max_iterations > 0 { config.max_iterations } else { DEMO_TICK_LIMIT };
    let mut schedule: BTreeMap<u64, Vec<Command>> = BTreeMap::new();
    let mut applied = 0;
    let mut rejected = 0;

    while game.tick_count() < limit {
        let result = tick(&mut game);
        sim_now.store(result.now_ms, Ordering::Release);
        applied += result.applied;
        rejected += result.rejected + result.ignored;

        if !result.commands.is_empty() {
            schedule.insert(result.tick, result.commands.clone());
        }

        for event in &result.events {
            match event {
                GameEvent::UnitCaptured { captured, captor, cell, .. } => {
                    info!("t={}ms {} takes {} on {}", result.now_ms, captor, captured, cell);
                }
                GameEvent::MatchEnded { outcome, .. } => {
                    info!("Match ended at tick {}: {:?}", result.tick, outcome);
                }
            }
        }

        if result.match_ended() {
            break;
        }
        thread::sleep(TICK_SLEEP);
    }

    for producer in producers {
        let name = producer.name().to_string();
        let stats = producer.shutdown();
        info!("Producer {}: {} commands sent", name, stats.sent);
    }

    // Print final results
    info!("=== Match Results ===");
    let snapshot = game.snapshot();
    info!("Ticks: {}, sim time {}ms", snapshot.tick, snapshot.now_ms);
    info!("Commands applied: {}, refused: {}", applied, rejected);
    match snapshot.outcome {
        Some(outcome) => info!("Outcome: {:?}", outcome),
        None => warn!("No decision within {} ticks", limit),
    }
    let hash = snapshot.hash();
    info!("Final Snapshot Hash: {}", hex::encode(hash));

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let mut replay = new_game(&factory, step)?;
    replay_match(&mut replay, &schedule, game.tick_count());
    let replay_hash = replay.snapshot().hash();
    info!("Replay Snapshot Hash: {}", hex::encode(replay_hash));

    if hash != replay_hash {
        bail!("determinism failure: replay diverged");
    }
    info!("DETERMINISM VERIFIED: Hashes match!");
    Ok(())
}
