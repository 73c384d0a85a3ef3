//! Occupancy Index
//!
//! Per-tick map from cell to the units standing on it. Always rebuilt from
//! scratch, never patched, so it can't drift from the roster.

use std::collections::BTreeMap;

use crate::core::cell::Cell;
use crate::game::rules::Occupancy;
use crate::game::unit::{Unit, UnitId};

/// Cell -> unit ids, in id order within a cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccupancyIndex {
    cells: BTreeMap<Cell, Vec<UnitId>>,
}

impl OccupancyIndex {
    /// Empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from units, read in the order given.
    pub fn build<'a>(units: impl IntoIterator<Item = &'a Unit>) -> Self {
        let mut index = Self::new();
        index.rebuild(units);
        index
    }

    /// Overwrite with the current cells of `units`.
    pub fn rebuild<'a>(&mut self, units: impl IntoIterator<Item = &'a Unit>) {
        self.cells.clear();
        for unit in units {
            self.cells
                .entry(unit.current_cell())
                .or_default()
                .push(unit.id().clone());
        }
    }

    /// Units on `cell`.
    pub fn at(&self, cell: Cell) -> &[UnitId] {
        self.cells.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Occupied cells with their units, in cell order.
    pub fn iter(&self) -> impl Iterator<Item = (Cell, &[UnitId])> {
        self.cells.iter().map(|(cell, ids)| (*cell, ids.as_slice()))
    }

    /// Cells holding two or more units.
    pub fn contested(&self) -> impl Iterator<Item = (Cell, &[UnitId])> {
        self.iter().filter(|(_, ids)| ids.len() >= 2)
    }

    /// Number of occupied cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// No occupied cells?
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Occupancy for OccupancyIndex {
    fn is_occupied(&self, cell: Cell) -> bool {
        self.cells.get(&cell).is_some_and(|ids| !ids.is_empty())
    }
}
