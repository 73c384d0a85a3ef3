//! Commands
//!
//! Immutable instructions addressed to a unit. Produced by input sources or
//! synthesized by physics when a timed behavior completes.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::cell::Cell;

/// Simulation time in milliseconds.
pub type TimeMs = i64;

/// Command kind.
///
/// The engine only interprets `Move` (legality checks) and `Done` (emitted
/// by physics). Every other kind is just a transition label on the state
/// graph, so templates may define their own via `Custom`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CommandKind {
    /// Settle at a cell
    Idle,
    /// Travel between two cells
    Move,
    /// Short airborne hop at one cell
    Jump,
    /// Cooldown at one cell
    Rest,
    /// Synthetic completion of a timed behavior
    Done,
    /// Template-defined label
    Custom(String),
}

impl CommandKind {
    /// Canonical lowercase name.
    pub fn as_str(&self) -> &str {
        match self {
            CommandKind::Idle => "idle",
            CommandKind::Move => "move",
            CommandKind::Jump => "jump",
            CommandKind::Rest => "rest",
            CommandKind::Done => "done",
            CommandKind::Custom(name) => name,
        }
    }

    /// Parse a kind name, case-insensitively.
    pub fn parse(name: &str) -> Self {
        let lower = name.trim().to_ascii_lowercase();
        match lower.as_str() {
            "idle" => CommandKind::Idle,
            "move" => CommandKind::Move,
            "jump" => CommandKind::Jump,
            "rest" => CommandKind::Rest,
            "done" => CommandKind::Done,
            _ => CommandKind::Custom(lower),
        }
    }
}

impl From<String> for CommandKind {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<CommandKind> for String {
    fn from(kind: CommandKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An instruction for one unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Simulation time the command was issued at
    pub timestamp_ms: TimeMs,
    /// Target unit (None for internal commands)
    pub unit_id: Option<String>,
    /// What to do
    pub kind: CommandKind,
    /// Ordered cell parameters
    #[serde(default)]
    pub params: Vec<Cell>,
}

impl Command {
    /// Create a command addressed to a unit.
    pub fn new(timestamp_ms: TimeMs, unit_id: impl Into<String>, kind: CommandKind, params: Vec<Cell>) -> Self {
        Self {
            timestamp_ms,
            unit_id: Some(unit_id.into()),
            kind,
            params,
        }
    }

    /// `move` from `src` to `dst`.
    pub fn move_to(timestamp_ms: TimeMs, unit_id: impl Into<String>, src: Cell, dst: Cell) -> Self {
        Self::new(timestamp_ms, unit_id, CommandKind::Move, vec![src, dst])
    }

    /// `jump` in place at `cell`.
    pub fn jump(timestamp_ms: TimeMs, unit_id: impl Into<String>, cell: Cell) -> Self {
        Self::new(timestamp_ms, unit_id, CommandKind::Jump, vec![cell])
    }

    /// `rest` at `cell`.
    pub fn rest(timestamp_ms: TimeMs, unit_id: impl Into<String>, cell: Cell) -> Self {
        Self::new(timestamp_ms, unit_id, CommandKind::Rest, vec![cell])
    }

    /// `idle` at `cell`.
    pub fn idle(timestamp_ms: TimeMs, unit_id: impl Into<String>, cell: Cell) -> Self {
        Self::new(timestamp_ms, unit_id, CommandKind::Idle, vec![cell])
    }

    /// Internal completion signal. Carries the cell the behavior ended on.
    pub fn done(timestamp_ms: TimeMs, cell: Cell) -> Self {
        Self {
            timestamp_ms,
            unit_id: None,
            kind: CommandKind::Done,
            params: vec![cell],
        }
    }

    /// First cell parameter, if any.
    #[inline]
    pub fn first_cell(&self) -> Option<Cell> {
        self.params.first().copied()
    }
}
