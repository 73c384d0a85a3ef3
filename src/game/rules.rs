//! Movement Rule Tables
//!
//! Per-unit-type table of legal relative displacements. Built once per type
//! and shared read-only (behind an `Arc`) by every unit of that type.

use std::collections::{BTreeMap, BTreeSet};
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::cell::Cell;

/// Occupancy-conditioned legality of one displacement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveTag {
    /// Legal whether or not the destination is occupied
    Always,
    /// Legal only onto an occupied cell
    CaptureOnly,
    /// Legal only onto an empty cell
    NonCaptureOnly,
}

impl MoveTag {
    /// Does this tag permit the move given destination occupancy?
    #[inline]
    pub fn permits(self, dest_occupied: bool) -> bool {
        match self {
            MoveTag::Always => true,
            MoveTag::CaptureOnly => dest_occupied,
            MoveTag::NonCaptureOnly => !dest_occupied,
        }
    }
}

/// Read access to "is anything standing on this cell".
///
/// Side-agnostic: capture legality is decided by tags, not by colour.
pub trait Occupancy {
    /// Is the cell occupied by at least one unit?
    fn is_occupied(&self, cell: Cell) -> bool;
}

impl Occupancy for BTreeSet<Cell> {
    fn is_occupied(&self, cell: Cell) -> bool {
        self.contains(&cell)
    }
}

/// Error parsing a textual rule table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleParseError {
    /// Line is not `dr,dc[:tag]`
    #[error("line {line}: expected `dr,dc[:tag]`, got `{text}`")]
    Malformed {
        /// 1-based line number
        line: usize,
        /// Offending text
        text: String,
    },

    /// Tag is not one of the known tags
    #[error("line {line}: unknown move tag `{tag}`")]
    UnknownTag {
        /// 1-based line number
        line: usize,
        /// Offending tag
        tag: String,
    },
}

/// Legal displacements for one unit type on a board of fixed size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleTable {
    rows: i32,
    cols: i32,
    moves: BTreeMap<(i32, i32), MoveTag>,
}

impl RuleTable {
    /// Empty table for a `rows x cols` board.
    pub fn new(rows: i32, cols: i32) -> Self {
        Self {
            rows,
            cols,
            moves: BTreeMap::new(),
        }
    }

    /// Add (or replace) one displacement.
    pub fn insert(&mut self, dr: i32, dc: i32, tag: MoveTag) {
        self.moves.insert((dr, dc), tag);
    }

    /// Builder-style `insert`.
    pub fn with(mut self, dr: i32, dc: i32, tag: MoveTag) -> Self {
        self.insert(dr, dc, tag);
        self
    }

    /// Add every multiple of `(dr, dc)` that fits on the board.
    pub fn with_ray(mut self, dr: i32, dc: i32, tag: MoveTag) -> Self {
        let reach = self.rows.max(self.cols) - 1;
        for k in 1..=reach {
            self.insert(dr * k, dc * k, tag);
        }
        self
    }

    /// Number of displacements in the table.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Is the table empty?
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Tag for a displacement, if it is in the table.
    pub fn tag(&self, dr: i32, dc: i32) -> Option<MoveTag> {
        self.moves.get(&(dr, dc)).copied()
    }

    /// Is a displacement legal given whether its destination is occupied?
    ///
    /// Absent displacement is illegal.
    pub fn is_legal_destination(&self, dr: i32, dc: i32, dest_occupied: bool) -> bool {
        self.tag(dr, dc).is_some_and(|tag| tag.permits(dest_occupied))
    }

    /// Full legality check for `src -> dst` against current occupancy.
    ///
    /// Destination must be on the board and permitted by its tag. Moves of
    /// Chebyshev distance > 1 also need every intermediate cell on the
    /// straight-line rasterization to be empty.
    pub fn is_valid_move<O: Occupancy + ?Sized>(&self, src: Cell, dst: Cell, occupied: &O) -> bool {
        if dst.row < 0 || dst.row >= self.rows || dst.col < 0 || dst.col >= self.cols {
            return false;
        }

        let (dr, dc) = src.delta_to(dst);
        if !self.is_legal_destination(dr, dc, occupied.is_occupied(dst)) {
            return false;
        }

        path_is_clear(src, dst, occupied)
    }

    /// Parse the `dr,dc[:tag]` line format.
    ///
    /// Blank lines and lines starting with `#` are skipped. Tags:
    /// empty = always, `capture`, `non_capture`.
    pub fn parse(text: &str, rows: i32, cols: i32) -> Result<Self, RuleParseError> {
        let mut table = Self::new(rows, cols);

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let malformed = || RuleParseError::Malformed {
                line: idx + 1,
                text: line.to_string(),
            };

            let (coords, tag) = match line.split_once(':') {
                Some((coords, tag)) => (coords, tag.trim()),
                None => (line, ""),
            };
            let (dr, dc) = coords.split_once(',').ok_or_else(malformed)?;
            let dr: i32 = dr.trim().parse().map_err(|_| malformed())?;
            let dc: i32 = dc.trim().parse().map_err(|_| malformed())?;

            let tag = match tag {
                "" => MoveTag::Always,
                "capture" => MoveTag::CaptureOnly,
                "non_capture" => MoveTag::NonCaptureOnly,
                other => {
                    return Err(RuleParseError::UnknownTag {
                        line: idx + 1,
                        tag: other.to_string(),
                    })
                }
            };
            table.insert(dr, dc, tag);
        }

        Ok(table)
    }
}

/// Every cell strictly between `src` and `dst` on the rasterized line is empty.
///
/// Adjacent moves have nothing in between and skip the check.
fn path_is_clear<O: Occupancy + ?Sized>(src: Cell, dst: Cell, occupied: &O) -> bool {
    let (dr, dc) = src.delta_to(dst);
    let steps = dr.abs().max(dc.abs());
    if steps <= 1 {
        return true;
    }

    (1..steps).all(|i| {
        let cell = src.offset(round_div(i * dr, steps), round_div(i * dc, steps));
        !occupied.is_occupied(cell)
    })
}

/// `round(num / den)` for `den > 0`, halves rounding toward +inf.
#[inline]
fn round_div(num: i32, den: i32) -> i32 {
    (2 * num + den).div_euclid(2 * den)
}

// =============================================================================
// STANDARD TABLES
// =============================================================================

/// Standard unit types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnitType {
    /// K
    King,
    /// Q
    Queen,
    /// R
    Rook,
    /// B
    Bishop,
    /// N
    Knight,
    /// P
    Pawn,
}

impl UnitType {
    /// All standard types.
    pub const ALL: [UnitType; 6] = [
        UnitType::King,
        UnitType::Queen,
        UnitType::Rook,
        UnitType::Bishop,
        UnitType::Knight,
        UnitType::Pawn,
    ];

    /// Type prefix used in unit ids.
    pub const fn prefix(self) -> char {
        match self {
            UnitType::King => 'K',
            UnitType::Queen => 'Q',
            UnitType::Rook => 'R',
            UnitType::Bishop => 'B',
            UnitType::Knight => 'N',
            UnitType::Pawn => 'P',
        }
    }

    /// Type for a prefix character.
    pub fn from_prefix(prefix: char) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.prefix() == prefix)
    }
}

const ORTHOGONAL: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const DIAGONAL: [(i32, i32); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
const KNIGHT: [(i32, i32); 8] = [
    (-2, -1), (-2, 1), (-1, -2), (-1, 2),
    (1, -2), (1, 2), (2, -1), (2, 1),
];

/// Standard table for a unit type.
///
/// `forward` is the row direction pawns advance in (-1 for white, +1 for
/// black); other types ignore it.
pub fn standard_table(unit_type: UnitType, forward: i32, rows: i32, cols: i32) -> RuleTable {
    let table = RuleTable::new(rows, cols);
    match unit_type {
        UnitType::King => ORTHOGONAL
            .iter()
            .chain(DIAGONAL.iter())
            .fold(table, |t, &(dr, dc)| t.with(dr, dc, MoveTag::Always)),
        UnitType::Queen => ORTHOGONAL
            .iter()
            .chain(DIAGONAL.iter())
            .fold(table, |t, &(dr, dc)| t.with_ray(dr, dc, MoveTag::Always)),
        UnitType::Rook => ORTHOGONAL
            .iter()
            .fold(table, |t, &(dr, dc)| t.with_ray(dr, dc, MoveTag::Always)),
        UnitType::Bishop => DIAGONAL
            .iter()
            .fold(table, |t, &(dr, dc)| t.with_ray(dr, dc, MoveTag::Always)),
        UnitType::Knight => KNIGHT
            .iter()
            .fold(table, |t, &(dr, dc)| t.with(dr, dc, MoveTag::Always)),
        UnitType::Pawn => table
            .with(forward, 0, MoveTag::NonCaptureOnly)
            .with(2 * forward, 0, MoveTag::NonCaptureOnly)
            .with(forward, -1, MoveTag::CaptureOnly)
            .with(forward, 1, MoveTag::CaptureOnly),
    }
}
