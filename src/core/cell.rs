//! Board Cell Coordinates

use std::fmt;
use serde::{Serialize, Deserialize};

/// Integer board coordinate.
///
/// Implements Ord (row-major) so it can key a BTreeMap with deterministic
/// iteration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Cell {
    /// Row index, 0 at the top
    pub row: i32,
    /// Column index, 0 at the left
    pub col: i32,
}

impl Cell {
    /// Top-left cell
    pub const ORIGIN: Self = Self { row: 0, col: 0 };

    /// Create a cell from row and column.
    #[inline]
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Cell displaced by `(dr, dc)`.
    #[inline]
    pub const fn offset(self, dr: i32, dc: i32) -> Self {
        Self { row: self.row + dr, col: self.col + dc }
    }

    /// Displacement `(dr, dc)` from this cell to `other`.
    #[inline]
    pub const fn delta_to(self, other: Self) -> (i32, i32) {
        (other.row - self.row, other.col - self.col)
    }

    /// Chebyshev (king-move) distance to `other`.
    #[inline]
    pub fn chebyshev(self, other: Self) -> i32 {
        let (dr, dc) = self.delta_to(other);
        dr.abs().max(dc.abs())
    }
}

impl From<(i32, i32)> for Cell {
    fn from((row, col): (i32, i32)) -> Self {
        Self::new(row, col)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}
