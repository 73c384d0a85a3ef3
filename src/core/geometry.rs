//! Board Geometry
//!
//! Conversions between cell, metric and pixel coordinates.
//! Metric space places cell `(r, c)` at its top-left corner `(c * w, r * h)`.

use serde::{Serialize, Deserialize};

use super::cell::Cell;
use super::fixed::{Fixed, DEFAULT_CELL_SIZE, fixed_div, fixed_round};
use super::vec2::FixedVec2;

/// Board dimensions and per-cell physical/pixel size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    /// Number of rows
    pub rows: i32,
    /// Number of columns
    pub cols: i32,
    /// Cell width in metres (Q16.16)
    pub cell_w: Fixed,
    /// Cell height in metres (Q16.16)
    pub cell_h: Fixed,
    /// Cell width in pixels
    pub cell_w_px: i32,
    /// Cell height in pixels
    pub cell_h_px: i32,
}

impl Default for Geometry {
    fn default() -> Self {
        Self::square(8, DEFAULT_CELL_SIZE, 64)
    }
}

impl Geometry {
    /// Square board of `cells x cells` with square cells.
    pub const fn square(cells: i32, cell_size: Fixed, cell_px: i32) -> Self {
        Self {
            rows: cells,
            cols: cells,
            cell_w: cell_size,
            cell_h: cell_size,
            cell_w_px: cell_px,
            cell_h_px: cell_px,
        }
    }

    /// Is the cell on the board?
    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        cell.row >= 0 && cell.row < self.rows && cell.col >= 0 && cell.col < self.cols
    }

    /// Top-left corner of a cell in metres.
    #[inline]
    pub fn cell_to_metric(&self, cell: Cell) -> FixedVec2 {
        FixedVec2::new(
            cell.col.wrapping_mul(self.cell_w),
            cell.row.wrapping_mul(self.cell_h),
        )
    }

    /// Nearest cell to a metric position.
    #[inline]
    pub fn metric_to_cell(&self, pos: FixedVec2) -> Cell {
        let col = fixed_round(fixed_div(pos.x, self.cell_w));
        let row = fixed_round(fixed_div(pos.y, self.cell_h));
        Cell::new(row, col)
    }

    /// Pixel position of a metric position, rounded to the nearest pixel.
    #[inline]
    pub fn metric_to_pixel(&self, pos: FixedVec2) -> (i32, i32) {
        (
            scale_round(pos.x, self.cell_w_px, self.cell_w),
            scale_round(pos.y, self.cell_h_px, self.cell_h),
        )
    }
}

/// `round(value * px / size)` without leaving integer arithmetic.
fn scale_round(value: Fixed, px: i32, size: Fixed) -> i32 {
    if size == 0 {
        return 0;
    }
    let num = 2 * (value as i64) * (px as i64) + size as i64;
    num.div_euclid(2 * size as i64) as i32
}
