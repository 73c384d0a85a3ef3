//! Collision Resolution
//!
//! End-of-tick capture rules for units sharing a cell. The occupant whose
//! current state started most recently is the arriving unit and wins the
//! cell; equal start times go to the smallest unit id. A winner that cannot
//! capture in its current state leaves the cell contested. Otherwise every
//! other occupant that is capturable right now is removed.

use std::collections::BTreeMap;

use crate::core::cell::Cell;
use crate::game::occupancy::OccupancyIndex;
use crate::game::unit::{Unit, UnitId};

/// One removal decided by collision resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Capture {
    /// Contested cell
    pub cell: Cell,
    /// Surviving unit
    pub captor: UnitId,
    /// Removed unit
    pub captured: UnitId,
}

/// Pick the winner among the occupants of one cell.
///
/// `occupants` must be non-empty and refer to units in `units`.
pub fn cell_winner<'a>(units: &'a BTreeMap<UnitId, Unit>, occupants: &[UnitId]) -> Option<&'a Unit> {
    occupants
        .iter()
        .filter_map(|id| units.get(id))
        .max_by(|a, b| {
            a.start_ms()
                .cmp(&b.start_ms())
                .then_with(|| b.id().cmp(a.id()))
        })
}

/// Decide all captures for the current roster.
///
/// Groups units by their current cell afresh; does not mutate anything.
/// Captures are returned in cell order, then id order.
pub fn find_captures(units: &BTreeMap<UnitId, Unit>) -> Vec<Capture> {
    let index = OccupancyIndex::build(units.values());
    let mut captures = Vec::new();

    for (cell, occupants) in index.contested() {
        let Some(winner) = cell_winner(units, occupants) else {
            continue;
        };
        if !winner.capabilities().can_capture {
            continue;
        }

        for id in occupants {
            if id == winner.id() {
                continue;
            }
            let capturable = units.get(id).is_some_and(|u| u.capabilities().capturable);
            if capturable {
                captures.push(Capture {
                    cell,
                    captor: winner.id().clone(),
                    captured: id.clone(),
                });
            }
        }
    }

    captures
}
