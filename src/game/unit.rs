//! Units
//!
//! A unit is an identifier plus its own state machine. Identifiers follow the
//! board convention `<type><side>_<row>_<col>` (e.g. `PW_6_0`): the first
//! character names the unit type, the second its side.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::cell::Cell;
use crate::core::vec2::FixedVec2;
use crate::game::command::{Command, TimeMs};
use crate::game::machine::{CommandOutcome, StateMachine};
use crate::game::physics::Capabilities;
use crate::game::rules::{Occupancy, UnitType};

// =============================================================================
// SIDE
// =============================================================================

/// Which army a unit belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    /// `W`
    White,
    /// `B`
    Black,
}

impl Side {
    /// Both sides, white first.
    pub const BOTH: [Side; 2] = [Side::White, Side::Black];

    /// Side for an id character.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'W' => Some(Side::White),
            'B' => Some(Side::Black),
            _ => None,
        }
    }

    /// Id character.
    pub const fn as_char(self) -> char {
        match self {
            Side::White => 'W',
            Side::Black => 'B',
        }
    }

    /// Row direction pawns of this side advance in.
    pub const fn forward(self) -> i32 {
        match self {
            Side::White => -1,
            Side::Black => 1,
        }
    }

    /// The other side.
    pub const fn opponent(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => f.write_str("white"),
            Side::Black => f.write_str("black"),
        }
    }
}

// =============================================================================
// UNIT ID
// =============================================================================

/// Unit identifier.
///
/// Wraps the external id string; side and type are derived from it rather
/// than stored, so the string stays the single source of truth.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(String);

impl UnitId {
    /// Wrap an id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id for a unit of type `code` spawned on `cell`.
    pub fn for_spawn(code: &str, cell: Cell) -> Self {
        Self(format!("{}_{}_{}", code, cell.row, cell.col))
    }

    /// Raw id string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Side from the second character.
    pub fn side(&self) -> Option<Side> {
        self.0.chars().nth(1).and_then(Side::from_char)
    }

    /// Unit type from the first character.
    pub fn unit_type(&self) -> Option<UnitType> {
        self.0.chars().next().and_then(UnitType::from_prefix)
    }

    /// Is this a King?
    #[inline]
    pub fn is_king(&self) -> bool {
        self.0.starts_with(UnitType::King.prefix())
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for UnitId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::borrow::Borrow<str> for UnitId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// UNIT
// =============================================================================

/// A live unit on the board.
#[derive(Clone, Debug)]
pub struct Unit {
    id: UnitId,
    machine: StateMachine,
}

impl Unit {
    /// Create a unit from a spawned machine.
    pub fn new(id: UnitId, machine: StateMachine) -> Self {
        Self { id, machine }
    }

    /// Identifier.
    #[inline]
    pub fn id(&self) -> &UnitId {
        &self.id
    }

    /// Side, if the id encodes one.
    #[inline]
    pub fn side(&self) -> Option<Side> {
        self.id.side()
    }

    /// Is this a King?
    #[inline]
    pub fn is_king(&self) -> bool {
        self.id.is_king()
    }

    /// Feed an external command.
    pub fn on_command(&mut self, cmd: &Command, occupancy: Option<&dyn Occupancy>) -> CommandOutcome {
        self.machine.on_command(cmd, occupancy)
    }

    /// Advance time.
    pub fn update(&mut self, now_ms: TimeMs) -> CommandOutcome {
        self.machine.update(now_ms)
    }

    /// Re-arm the current state at the current cell, stamped `start_ms`.
    pub fn reset(&mut self, start_ms: TimeMs) {
        let cell = self.current_cell();
        let cmd = Command::idle(start_ms, self.id.as_str(), cell);
        self.machine.reset(&cmd);
    }

    /// Cell the unit is on.
    #[inline]
    pub fn current_cell(&self) -> Cell {
        self.machine.current_cell()
    }

    /// Metric position.
    #[inline]
    pub fn position(&self) -> FixedVec2 {
        self.machine.position()
    }

    /// Pixel position.
    #[inline]
    pub fn pixel(&self) -> (i32, i32) {
        self.machine.physics().pixel()
    }

    /// Capabilities of the current state.
    #[inline]
    pub fn capabilities(&self) -> Capabilities {
        self.machine.capabilities()
    }

    /// Name of the current state.
    #[inline]
    pub fn state_name(&self) -> &str {
        self.machine.current_name()
    }

    /// Start timestamp of the current state.
    #[inline]
    pub fn start_ms(&self) -> TimeMs {
        self.machine.start_ms()
    }

    /// Underlying machine.
    #[inline]
    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    /// Mutable machine, for tests and replay tooling.
    #[inline]
    pub fn machine_mut(&mut self) -> &mut StateMachine {
        &mut self.machine
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_convention() {
        let king = UnitId::new("KB_0_4");
        assert_eq!(king.side(), Some(Side::Black));
        assert!(king.is_king());
        assert_eq!(king.unit_type(), Some(UnitType::King));

        let pawn = UnitId::for_spawn("PW", Cell::new(6, 2));
        assert_eq!(pawn.as_str(), "PW_6_2");
        assert_eq!(pawn.side(), Some(Side::White));
        assert!(!pawn.is_king());
        assert_eq!(pawn.unit_type(), Some(UnitType::Pawn));
    }

    #[test]
    fn test_id_without_side() {
        let odd = UnitId::new("X");
        assert_eq!(odd.side(), None);
        assert_eq!(odd.unit_type(), None);
        assert!(!odd.is_king());
    }

    #[test]
    fn test_side_helpers() {
        assert_eq!(Side::White.opponent(), Side::Black);
        assert_eq!(Side::White.forward(), -1);
        assert_eq!(Side::Black.forward(), 1);
        assert_eq!(Side::from_char(Side::Black.as_char()), Some(Side::Black));
    }

    #[test]
    fn test_unit_id_json_is_plain_string() {
        let id = UnitId::new("QW_7_3");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"QW_7_3\"");
    }
}
