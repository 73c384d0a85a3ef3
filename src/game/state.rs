//! Game State
//!
//! The orchestrator: roster, occupancy index, command queue and clock.
//! Uses BTreeMap for deterministic iteration order. Only the tick loop
//! mutates anything here; producers talk to it through the queue.

use std::collections::{BTreeMap, BTreeSet};
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::info;

use crate::core::cell::Cell;
use crate::core::geometry::Geometry;
use crate::core::vec2::FixedVec2;
use crate::game::clock::SimClock;
use crate::game::command::{Command, TimeMs};
use crate::game::occupancy::OccupancyIndex;
use crate::game::physics::Capabilities;
use crate::game::unit::{Side, Unit, UnitId};
use crate::input::queue::{command_channel, CommandReceiver, CommandSender};

// =============================================================================
// OUTCOME
// =============================================================================

/// How a match ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Exactly one side still has its King
    Winner(Side),
    /// Both Kings fell in the same tick
    Draw,
}

impl Outcome {
    /// Decide from the roster, or `None` while both Kings stand.
    pub fn from_units<'a>(units: impl IntoIterator<Item = &'a Unit>) -> Option<Self> {
        let mut white = false;
        let mut black = false;
        for unit in units.into_iter().filter(|u| u.is_king()) {
            match unit.side() {
                Some(Side::White) => white = true,
                Some(Side::Black) => black = true,
                None => {}
            }
        }
        match (white, black) {
            (true, true) => None,
            (true, false) => Some(Outcome::Winner(Side::White)),
            (false, true) => Some(Outcome::Winner(Side::Black)),
            (false, false) => Some(Outcome::Draw),
        }
    }
}

// =============================================================================
// SETUP VALIDATION
// =============================================================================

/// Invalid starting roster.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    /// Two units share an id
    #[error("duplicate unit id `{0}`")]
    DuplicateId(UnitId),

    /// Id does not encode a side
    #[error("unit id `{0}` has no side")]
    UnknownSide(UnitId),

    /// Unit placed outside the board
    #[error("unit `{id}` placed off the board at {cell}")]
    OffBoard {
        /// Unit
        id: UnitId,
        /// Placement
        cell: Cell,
    },

    /// Two units of one side share a cell
    #[error("`{first}` and `{second}` share {cell}")]
    SameSideCollision {
        /// Shared cell
        cell: Cell,
        /// Unit already there
        first: UnitId,
        /// Unit placed on top
        second: UnitId,
    },

    /// A side has no King
    #[error("{0} has no King")]
    MissingKing(Side),

    /// A side has more than one King
    #[error("{side} has {count} Kings")]
    ExtraKing {
        /// Side
        side: Side,
        /// Kings found
        count: usize,
    },
}

/// Check a starting roster.
pub fn validate_roster(units: &[Unit], geometry: &Geometry) -> Result<(), SetupError> {
    let mut seen: BTreeSet<&UnitId> = BTreeSet::new();
    let mut placed: BTreeMap<(Cell, Side), &UnitId> = BTreeMap::new();
    let mut kings: BTreeMap<Side, usize> = BTreeMap::new();

    for unit in units {
        let id = unit.id();
        if !seen.insert(id) {
            return Err(SetupError::DuplicateId(id.clone()));
        }

        let side = unit.side().ok_or_else(|| SetupError::UnknownSide(id.clone()))?;

        let cell = unit.current_cell();
        if !geometry.contains(cell) {
            return Err(SetupError::OffBoard { id: id.clone(), cell });
        }

        if let Some(first) = placed.insert((cell, side), id) {
            return Err(SetupError::SameSideCollision {
                cell,
                first: first.clone(),
                second: id.clone(),
            });
        }

        if unit.is_king() {
            *kings.entry(side).or_default() += 1;
        }
    }

    for side in Side::BOTH {
        match kings.get(&side).copied().unwrap_or(0) {
            0 => return Err(SetupError::MissingKing(side)),
            1 => {}
            count => return Err(SetupError::ExtraKing { side, count }),
        }
    }
    Ok(())
}

// =============================================================================
// GAME
// =============================================================================

/// A running match.
#[derive(Debug)]
pub struct Game {
    pub(crate) geometry: Geometry,
    pub(crate) units: BTreeMap<UnitId, Unit>,
    pub(crate) index: OccupancyIndex,
    pub(crate) commands: CommandReceiver,
    pub(crate) sender: CommandSender,
    pub(crate) clock: SimClock,
    pub(crate) tick: u64,
    pub(crate) now_ms: TimeMs,
    pub(crate) outcome: Option<Outcome>,
}

impl Game {
    /// Validate `units` and set up a match.
    ///
    /// Fails before any simulation runs if the roster is invalid.
    pub fn new(units: Vec<Unit>, geometry: Geometry, clock: SimClock) -> Result<Self, SetupError> {
        validate_roster(&units, &geometry)?;

        let units: BTreeMap<UnitId, Unit> = units.into_iter().map(|u| (u.id().clone(), u)).collect();
        let index = OccupancyIndex::build(units.values());
        let (sender, commands) = command_channel();
        let now_ms = clock.peek_ms();

        info!("Game created with {} units on a {}x{} board", units.len(), geometry.rows, geometry.cols);

        Ok(Self {
            geometry,
            units,
            index,
            commands,
            sender,
            clock,
            tick: 0,
            now_ms,
            outcome: None,
        })
    }

    /// Reset every unit to the current simulation time.
    pub fn start(&mut self) {
        self.now_ms = self.clock.peek_ms();
        for unit in self.units.values_mut() {
            unit.reset(self.now_ms);
        }
        self.index.rebuild(self.units.values());
        info!("Game started at t={}ms", self.now_ms);
    }

    /// New handle for enqueueing commands.
    pub fn command_sender(&self) -> CommandSender {
        self.sender.clone()
    }

    /// Enqueue a command from the owning thread.
    pub fn push_command(&self, cmd: Command) {
        self.sender.send(cmd);
    }

    /// Commands waiting for the next tick.
    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }

    /// Board geometry.
    #[inline]
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Ticks run so far.
    #[inline]
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Simulation time of the last tick.
    #[inline]
    pub fn now_ms(&self) -> TimeMs {
        self.now_ms
    }

    /// Result, once decided.
    #[inline]
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Has the match been decided?
    #[inline]
    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Live units in id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Number of live units.
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Live unit by id.
    pub fn unit(&self, id: &str) -> Option<&Unit> {
        self.units.get(id)
    }

    /// Mutable unit by id, for tests and replay tooling.
    pub fn unit_mut(&mut self, id: &str) -> Option<&mut Unit> {
        self.units.get_mut(id)
    }

    /// Cell of a live unit.
    pub fn current_cell(&self, id: &str) -> Option<Cell> {
        self.unit(id).map(Unit::current_cell)
    }

    /// Metric position of a live unit.
    pub fn position(&self, id: &str) -> Option<FixedVec2> {
        self.unit(id).map(Unit::position)
    }

    /// Pixel position of a live unit.
    pub fn pixel_position(&self, id: &str) -> Option<(i32, i32)> {
        self.unit(id).map(Unit::pixel)
    }

    /// Capabilities of a live unit.
    pub fn capabilities(&self, id: &str) -> Option<Capabilities> {
        self.unit(id).map(Unit::capabilities)
    }

    /// Occupancy index as of the last rebuild.
    pub fn occupancy(&self) -> &OccupancyIndex {
        &self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::factory::UnitFactory;
    use crate::game::physics::PhysicsProfile;

    fn factory() -> UnitFactory {
        UnitFactory::standard(Geometry::default(), &PhysicsProfile::default()).unwrap()
    }

    fn kings(f: &UnitFactory) -> Vec<Unit> {
        vec![
            f.spawn("KW", Cell::new(7, 4)).unwrap(),
            f.spawn("KB", Cell::new(0, 4)).unwrap(),
        ]
    }

    #[test]
    fn test_valid_roster() {
        let f = factory();
        let game = Game::new(kings(&f), Geometry::default(), SimClock::stepped(0, 10)).unwrap();
        assert_eq!(game.unit_count(), 2);
        assert_eq!(game.current_cell("KW_7_4"), Some(Cell::new(7, 4)));
        assert!(game.outcome().is_none());
    }

    #[test]
    fn test_missing_king() {
        let f = factory();
        let units = vec![f.spawn("KW", Cell::new(7, 4)).unwrap()];
        let err = Game::new(units, Geometry::default(), SimClock::stepped(0, 10)).unwrap_err();
        assert_eq!(err, SetupError::MissingKing(Side::Black));
    }

    #[test]
    fn test_extra_king() {
        let f = factory();
        let mut units = kings(&f);
        units.push(f.spawn("KB", Cell::new(0, 3)).unwrap());
        let err = Game::new(units, Geometry::default(), SimClock::stepped(0, 10)).unwrap_err();
        assert_eq!(err, SetupError::ExtraKing { side: Side::Black, count: 2 });
    }

    #[test]
    fn test_same_side_collision() {
        let f = factory();
        let mut units = kings(&f);
        units.push(f.spawn("PW", Cell::new(6, 0)).unwrap());
        units.push(f.spawn("RW", Cell::new(6, 0)).unwrap());
        assert!(matches!(
            Game::new(units, Geometry::default(), SimClock::stepped(0, 10)),
            Err(SetupError::SameSideCollision { .. })
        ));
    }

    #[test]
    fn test_opposite_sides_may_share_a_cell() {
        let f = factory();
        let mut units = kings(&f);
        units.push(f.spawn("PW", Cell::new(4, 4)).unwrap());
        units.push(f.spawn("PB", Cell::new(4, 4)).unwrap());
        assert!(Game::new(units, Geometry::default(), SimClock::stepped(0, 10)).is_ok());
    }

    #[test]
    fn test_duplicate_and_off_board() {
        let f = factory();
        let mut units = kings(&f);
        units.push(f.spawn("KW", Cell::new(7, 4)).unwrap());
        assert!(matches!(
            Game::new(units, Geometry::default(), SimClock::stepped(0, 10)),
            Err(SetupError::DuplicateId(_))
        ));

        let mut units = kings(&f);
        units.push(f.spawn("QW", Cell::new(9, 0)).unwrap());
        assert!(matches!(
            Game::new(units, Geometry::default(), SimClock::stepped(0, 10)),
            Err(SetupError::OffBoard { .. })
        ));
    }

    #[test]
    fn test_outcome_from_kings() {
        let f = factory();
        let both = kings(&f);
        assert_eq!(Outcome::from_units(&both), None);
        assert_eq!(Outcome::from_units(&both[..1]), Some(Outcome::Winner(Side::White)));
        assert_eq!(Outcome::from_units(&both[1..]), Some(Outcome::Winner(Side::Black)));
        assert_eq!(Outcome::from_units(std::iter::empty::<&Unit>()), Some(Outcome::Draw));
    }

    #[test]
    fn test_start_resets_timing() {
        let f = factory();
        let mut game = Game::new(kings(&f), Geometry::default(), SimClock::stepped(500, 10)).unwrap();
        game.start();
        assert!(game.units().all(|u| u.start_ms() == 500));
        assert_eq!(game.now_ms(), 500);
    }
}
