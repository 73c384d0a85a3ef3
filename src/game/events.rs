//! Game Events
//!
//! Events generated during simulation for replay and inspection.

use serde::{Serialize, Deserialize};

use crate::core::cell::Cell;
use crate::game::state::Outcome;
use crate::game::unit::UnitId;

/// Something that happened during a tick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// A unit was removed by collision resolution
    UnitCaptured {
        /// Tick of the capture
        tick: u64,
        /// Contested cell
        cell: Cell,
        /// Removed unit
        captured: UnitId,
        /// Surviving unit that captured it
        captor: UnitId,
    },

    /// The match was decided
    MatchEnded {
        /// Tick the outcome was reached
        tick: u64,
        /// Result
        outcome: Outcome,
    },
}

impl GameEvent {
    /// Tick the event belongs to.
    pub fn tick(&self) -> u64 {
        match self {
            GameEvent::UnitCaptured { tick, .. } | GameEvent::MatchEnded { tick, .. } => *tick,
        }
    }

    /// Is this a capture?
    pub fn is_capture(&self) -> bool {
        matches!(self, GameEvent::UnitCaptured { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::unit::Side;

    #[test]
    fn test_event_json_is_tagged() {
        let ev = GameEvent::UnitCaptured {
            tick: 3,
            cell: Cell::new(4, 4),
            captured: UnitId::new("RB_4_4"),
            captor: UnitId::new("QW_7_3"),
        };
        let json = serde_json::to_string(&ev).unwrap();
        assert!(json.contains("\"type\":\"unit_captured\""));
        assert!(json.contains("\"captured\":\"RB_4_4\""));
        assert!(ev.is_capture());
        assert_eq!(ev.tick(), 3);
    }

    #[test]
    fn test_match_ended_round_trip() {
        let ev = GameEvent::MatchEnded { tick: 9, outcome: Outcome::Winner(Side::White) };
        let back: GameEvent = serde_json::from_str(&serde_json::to_string(&ev).unwrap()).unwrap();
        assert_eq!(back, ev);
    }
}
