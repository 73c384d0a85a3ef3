//! Board Snapshots
//!
//! Between-tick copies of everything a renderer or replay checker needs.
//! Readers never touch the live roster; they take a snapshot after a tick.

use serde::{Serialize, Deserialize};

use crate::core::cell::Cell;
use crate::core::hash::{StateHash, StateHasher};
use crate::core::vec2::FixedVec2;
use crate::game::command::TimeMs;
use crate::game::physics::Capabilities;
use crate::game::state::{Game, Outcome};
use crate::game::unit::{Side, Unit, UnitId};

/// One unit as seen between ticks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    /// Identifier
    pub id: UnitId,
    /// Current state name
    pub state: String,
    /// Current cell
    pub cell: Cell,
    /// Metric position (Q16.16)
    pub position: FixedVec2,
    /// Pixel position
    pub pixel: (i32, i32),
    /// Capability flags
    pub capabilities: Capabilities,
    /// Start of the current state
    pub start_ms: TimeMs,
}

impl UnitSnapshot {
    /// Capture one unit.
    pub fn of(unit: &Unit) -> Self {
        Self {
            id: unit.id().clone(),
            state: unit.state_name().to_string(),
            cell: unit.current_cell(),
            position: unit.position(),
            pixel: unit.pixel(),
            capabilities: unit.capabilities(),
            start_ms: unit.start_ms(),
        }
    }
}

/// The whole board as seen between ticks. Units are in id order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Ticks run
    pub tick: u64,
    /// Simulation time of the last tick
    pub now_ms: TimeMs,
    /// Live units
    pub units: Vec<UnitSnapshot>,
    /// Outcome, if decided
    pub outcome: Option<Outcome>,
}

impl GameSnapshot {
    /// Units belonging to `side`.
    pub fn side(&self, side: Side) -> impl Iterator<Item = &UnitSnapshot> {
        self.units.iter().filter(move |u| u.id.side() == Some(side))
    }

    /// Unit by id.
    pub fn unit(&self, id: &str) -> Option<&UnitSnapshot> {
        self.units.iter().find(|u| u.id.as_str() == id)
    }

    /// Deterministic hash of the snapshot.
    ///
    /// Pixel positions are derived from metric ones and are left out.
    pub fn hash(&self) -> StateHash {
        let mut hasher = StateHasher::for_snapshot();
        hasher.update_u64(self.tick);
        hasher.update_i64(self.now_ms);
        hasher.update_u64(self.units.len() as u64);
        for unit in &self.units {
            hasher.update_str(unit.id.as_str());
            hasher.update_str(&unit.state);
            hasher.update_cell(unit.cell);
            hasher.update_vec2(unit.position);
            hasher.update_i64(unit.start_ms);
            hasher.update_bool(unit.capabilities.capturable);
            hasher.update_bool(unit.capabilities.can_capture);
            hasher.update_bool(unit.capabilities.blocks_movement);
        }
        match self.outcome {
            None => hasher.update_u8(0),
            Some(Outcome::Winner(Side::White)) => hasher.update_u8(1),
            Some(Outcome::Winner(Side::Black)) => hasher.update_u8(2),
            Some(Outcome::Draw) => hasher.update_u8(3),
        }
        hasher.finalize()
    }

    /// Hex-encoded hash, for logs.
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash())
    }

    /// JSON for rendering consumers.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Game {
    /// Snapshot the board. Call between ticks.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            tick: self.tick,
            now_ms: self.now_ms,
            units: self.units.values().map(UnitSnapshot::of).collect(),
            outcome: self.outcome,
        }
    }
}
