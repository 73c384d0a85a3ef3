//! Authoritative Simulation Tick
//!
//! One pass of the game loop. With a stepped clock and the same command
//! stream, two runs produce identical rosters and events.
//!
//! ```text
//! now = clock
//! update every unit (may fire internal `done` transitions)
//! rebuild occupancy index
//! drain queued commands, apply against the fresh index
//! resolve collisions
//! decide outcome
//! ```

use std::collections::BTreeMap;
use tracing::{debug, info, trace};

use crate::game::collision::find_captures;
use crate::game::command::{Command, TimeMs};
use crate::game::events::GameEvent;
use crate::game::machine::CommandOutcome;
use crate::game::state::{Game, Outcome};

/// Result of a tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickResult {
    /// Tick number (1-based)
    pub tick: u64,
    /// Simulation time the tick ran at
    pub now_ms: TimeMs,
    /// Commands that caused a transition
    pub applied: usize,
    /// Commands refused by validation
    pub rejected: usize,
    /// Commands for unknown units or with no matching transition
    pub ignored: usize,
    /// Commands drained this tick, in the order they were applied
    pub commands: Vec<Command>,
    /// Events generated this tick
    pub events: Vec<GameEvent>,
    /// Outcome, if the match is decided
    pub outcome: Option<Outcome>,
}

impl TickResult {
    /// Did the match end this tick?
    pub fn match_ended(&self) -> bool {
        self.events.iter().any(|e| matches!(e, GameEvent::MatchEnded { .. }))
    }
}

/// Totals over a `run`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Ticks executed by this run
    pub ticks: u64,
    /// Simulation time at the end
    pub now_ms: TimeMs,
    /// Commands applied
    pub applied: usize,
    /// Commands rejected
    pub rejected: usize,
    /// Commands ignored
    pub ignored: usize,
    /// All events, in order
    pub events: Vec<GameEvent>,
    /// Final outcome, if decided
    pub outcome: Option<Outcome>,
}

impl RunSummary {
    fn absorb(&mut self, result: TickResult) {
        self.ticks += 1;
        self.now_ms = result.now_ms;
        self.applied += result.applied;
        self.rejected += result.rejected;
        self.ignored += result.ignored;
        self.events.extend(result.events);
        self.outcome = result.outcome;
    }

    /// Number of captures.
    pub fn captures(&self) -> usize {
        self.events.iter().filter(|e| e.is_capture()).count()
    }
}

/// Run one simulation tick.
///
/// A decided game is left untouched.
pub fn tick(game: &mut Game) -> TickResult {
    if game.outcome.is_some() {
        return TickResult {
            tick: game.tick,
            now_ms: game.now_ms,
            outcome: game.outcome,
            ..TickResult::default()
        };
    }

    // 0. Advance tick counter and clock
    game.tick += 1;
    let now = game.clock.now_ms();
    game.now_ms = now;
    let mut result = TickResult {
        tick: game.tick,
        now_ms: now,
        ..TickResult::default()
    };

    // 1. Advance every unit
    for unit in game.units.values_mut() {
        let outcome = unit.update(now);
        if cfg!(feature = "debug-tracing") && outcome.is_transition() {
            trace!("{} -> {} at t={}", unit.id(), unit.state_name(), now);
        }
    }

    // 2. Rebuild occupancy
    game.index.rebuild(game.units.values());

    // 3. Apply the commands queued so far
    let drained = game.commands.drain_snapshot();
    for cmd in &drained {
        apply_command(game, cmd, &mut result);
    }
    result.commands = drained;

    // 4. Collisions
    for capture in find_captures(&game.units) {
        if game.units.remove(&capture.captured).is_none() {
            continue;
        }
        info!("{} captured {} at {}", capture.captor, capture.captured, capture.cell);
        result.events.push(GameEvent::UnitCaptured {
            tick: game.tick,
            cell: capture.cell,
            captured: capture.captured,
            captor: capture.captor,
        });
    }
    if result.events.iter().any(GameEvent::is_capture) {
        game.index.rebuild(game.units.values());
    }

    // 5. End condition
    if let Some(outcome) = Outcome::from_units(game.units.values()) {
        info!("Match ended at tick {}: {:?}", game.tick, outcome);
        game.outcome = Some(outcome);
        result.events.push(GameEvent::MatchEnded {
            tick: game.tick,
            outcome,
        });
    }
    result.outcome = game.outcome;

    result
}

/// Route one command to its unit.
fn apply_command(game: &mut Game, cmd: &Command, result: &mut TickResult) {
    let Some(unit) = cmd.unit_id.as_deref().and_then(|id| game.units.get_mut(id)) else {
        debug!("Ignoring {} for unknown unit {:?}", cmd.kind, cmd.unit_id);
        result.ignored += 1;
        return;
    };

    match unit.on_command(cmd, Some(&game.index)) {
        CommandOutcome::Transitioned { .. } => result.applied += 1,
        CommandOutcome::Rejected(reason) => {
            debug!("Rejected {} for {}: {:?}", cmd.kind, unit.id(), reason);
            result.rejected += 1;
        }
        CommandOutcome::NoTransition => result.ignored += 1,
    }
}

/// Tick until the match is decided or `max_iterations` ticks ran
/// (0 = no limit).
pub fn run(game: &mut Game, max_iterations: u64) -> RunSummary {
    let mut summary = RunSummary {
        now_ms: game.now_ms,
        outcome: game.outcome,
        ..RunSummary::default()
    };

    while !game.is_over() {
        summary.absorb(tick(game));
        if max_iterations > 0 && summary.ticks >= max_iterations {
            break;
        }
    }

    summary
}

/// Replay a match from a command schedule.
///
/// `schedule` maps a tick number to the commands enqueued just before that
/// tick runs. With a stepped clock the result is reproducible.
pub fn replay_match(
    game: &mut Game,
    schedule: &BTreeMap<u64, Vec<Command>>,
    max_ticks: u64,
) -> RunSummary {
    let mut summary = RunSummary {
        now_ms: game.now_ms,
        outcome: game.outcome,
        ..RunSummary::default()
    };

    while !game.is_over() && summary.ticks < max_ticks {
        if let Some(commands) = schedule.get(&(game.tick + 1)) {
            for cmd in commands {
                game.push_command(cmd.clone());
            }
        }
        summary.absorb(tick(game));
    }

    summary
}
