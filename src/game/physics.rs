//! Unit Physics
//!
//! Continuous-time behavior bound to a machine state. Each variant owns a
//! unit's position-over-time and its capability flags, and reports
//! completion of a timed behavior by returning a synthetic `done` command
//! exactly once per reset.

use serde::{Serialize, Deserialize};

use crate::core::cell::Cell;
use crate::core::fixed::{
    Fixed, FIXED_ONE,
    DEFAULT_JUMP_MS, DEFAULT_MOVE_SPEED, DEFAULT_REST_MS,
};
use crate::core::geometry::Geometry;
use crate::core::vec2::FixedVec2;
use crate::game::command::{Command, TimeMs};

/// What a state's physics is, before it is bound to a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhysicsSpec {
    /// Stationary, never completes
    Idle,
    /// Straight-line travel at `speed` (m/s, Q16.16)
    Move {
        /// Metres per second
        speed: Fixed,
    },
    /// Short airborne hop in place
    Jump {
        /// Duration in ms
        duration_ms: TimeMs,
    },
    /// Cooldown in place
    Rest {
        /// Duration in ms
        duration_ms: TimeMs,
    },
}

/// Tunables for the standard move/jump/rest states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicsProfile {
    /// Move speed in m/s (Q16.16)
    pub move_speed: Fixed,
    /// Jump duration in ms
    pub jump_duration_ms: TimeMs,
    /// Rest duration in ms
    pub rest_duration_ms: TimeMs,
}

impl Default for PhysicsProfile {
    fn default() -> Self {
        Self {
            move_speed: DEFAULT_MOVE_SPEED,
            jump_duration_ms: DEFAULT_JUMP_MS,
            rest_duration_ms: DEFAULT_REST_MS,
        }
    }
}

impl PhysicsProfile {
    /// Spec for the move state.
    pub fn move_spec(&self) -> PhysicsSpec {
        PhysicsSpec::Move { speed: self.move_speed }
    }

    /// Spec for the jump state.
    pub fn jump_spec(&self) -> PhysicsSpec {
        PhysicsSpec::Jump { duration_ms: self.jump_duration_ms }
    }

    /// Spec for the rest state.
    pub fn rest_spec(&self) -> PhysicsSpec {
        PhysicsSpec::Rest { duration_ms: self.rest_duration_ms }
    }
}

/// Capability flags of a unit in its current state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// May be removed by a capturing unit sharing its cell
    pub capturable: bool,
    /// Removes capturable units sharing its cell
    pub can_capture: bool,
    /// Counts as an obstacle for movement
    pub blocks_movement: bool,
}

/// Variant-specific trajectory data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Behavior {
    Idle,
    Move {
        speed: Fixed,
        /// Metric displacement start -> end
        delta: FixedVec2,
        /// Metric distance; 1.0 when start == end
        distance: Fixed,
    },
    Jump { duration_ms: TimeMs },
    Rest { duration_ms: TimeMs },
}

/// Live physics instance, one per state node per unit.
#[derive(Clone, Debug)]
pub struct Physics {
    behavior: Behavior,
    geometry: Geometry,
    start_cell: Cell,
    end_cell: Option<Cell>,
    position: FixedVec2,
    start_ms: TimeMs,
    completed: bool,
}

impl Physics {
    /// Bind a spec to a unit standing on `cell`.
    pub fn new(spec: PhysicsSpec, geometry: Geometry, cell: Cell) -> Self {
        let behavior = match spec {
            PhysicsSpec::Idle => Behavior::Idle,
            PhysicsSpec::Move { speed } => Behavior::Move {
                speed,
                delta: FixedVec2::ZERO,
                distance: FIXED_ONE,
            },
            PhysicsSpec::Jump { duration_ms } => Behavior::Jump { duration_ms },
            PhysicsSpec::Rest { duration_ms } => Behavior::Rest { duration_ms },
        };
        Self {
            behavior,
            geometry,
            start_cell: cell,
            end_cell: Some(cell),
            position: geometry.cell_to_metric(cell),
            start_ms: 0,
            completed: false,
        }
    }

    /// Re-initialize from a command's parameters and timestamp.
    pub fn reset(&mut self, cmd: &Command) {
        self.start_ms = cmd.timestamp_ms;
        self.completed = false;

        match &mut self.behavior {
            Behavior::Move { delta, distance, .. } => {
                let start = cmd.first_cell().unwrap_or_else(|| self.geometry.metric_to_cell(self.position));
                let end = cmd.params.get(1).copied().unwrap_or(start);

                let start_pos = self.geometry.cell_to_metric(start);
                *delta = self.geometry.cell_to_metric(end) - start_pos;
                let len = delta.length();
                // Zero-length moves complete after one metre's worth of time.
                *distance = if len == 0 { FIXED_ONE } else { len };

                self.start_cell = start;
                self.end_cell = Some(end);
                self.position = start_pos;
            }
            Behavior::Idle | Behavior::Jump { .. } | Behavior::Rest { .. } => {
                let cell = cmd
                    .first_cell()
                    .or(self.end_cell)
                    .unwrap_or(Cell::ORIGIN);
                self.start_cell = cell;
                self.end_cell = Some(cell);
                self.position = self.geometry.cell_to_metric(cell);
            }
        }
    }

    /// Advance to `now_ms`.
    ///
    /// Returns the synthetic `done` command the first time the behavior's
    /// temporal condition holds; `None` otherwise and on every later call
    /// until the next reset.
    pub fn update(&mut self, now_ms: TimeMs) -> Option<Command> {
        if self.completed {
            return None;
        }
        // Garbage timestamps saturate instead of overflowing.
        let elapsed = now_ms.saturating_sub(self.start_ms).max(0);

        match self.behavior {
            Behavior::Idle => None,
            Behavior::Move { speed, delta, distance } => {
                let end = self.end_cell.unwrap_or(self.start_cell);
                // metres travelled * 1000 = speed * elapsed_ms
                let travelled_k = (speed as i64).saturating_mul(elapsed);
                let distance_k = distance as i64 * 1000;

                if speed > 0 && travelled_k >= distance_k {
                    self.position = self.geometry.cell_to_metric(end);
                    self.completed = true;
                    return Some(Command::done(now_ms, end));
                }

                let start_pos = self.geometry.cell_to_metric(self.start_cell);
                // travelled_k < distance_k here, so the quotient fits in a Fixed;
                // the product needs i128 on large boards.
                let frac = |component: Fixed| -> Fixed {
                    (component as i128 * travelled_k as i128 / distance_k as i128) as Fixed
                };
                self.position = start_pos + FixedVec2::new(frac(delta.x), frac(delta.y));
                None
            }
            Behavior::Jump { duration_ms } | Behavior::Rest { duration_ms } => {
                if elapsed >= duration_ms {
                    self.completed = true;
                    Some(Command::done(now_ms, self.start_cell))
                } else {
                    None
                }
            }
        }
    }

    /// Capability flags for this variant.
    pub fn capabilities(&self) -> Capabilities {
        match self.behavior {
            Behavior::Idle => Capabilities {
                capturable: true,
                can_capture: true,
                blocks_movement: true,
            },
            Behavior::Move { .. } => Capabilities {
                capturable: true,
                can_capture: true,
                blocks_movement: false,
            },
            Behavior::Jump { .. } => Capabilities {
                capturable: false,
                can_capture: true,
                blocks_movement: false,
            },
            Behavior::Rest { .. } => Capabilities {
                capturable: true,
                can_capture: false,
                blocks_movement: true,
            },
        }
    }

    /// Nominal length of the behavior in ms (0 for idle).
    pub fn duration_ms(&self) -> TimeMs {
        match self.behavior {
            Behavior::Idle => 0,
            Behavior::Move { speed, distance, .. } => {
                if speed <= 0 {
                    return TimeMs::MAX;
                }
                let num = distance as i64 * 1000;
                (num + speed as i64 - 1) / speed as i64
            }
            Behavior::Jump { duration_ms } | Behavior::Rest { duration_ms } => duration_ms,
        }
    }

    /// Current metric position.
    #[inline]
    pub fn position(&self) -> FixedVec2 {
        self.position
    }

    /// Nearest cell to the current position.
    #[inline]
    pub fn current_cell(&self) -> Cell {
        self.geometry.metric_to_cell(self.position)
    }

    /// Current position in pixels.
    #[inline]
    pub fn pixel(&self) -> (i32, i32) {
        self.geometry.metric_to_pixel(self.position)
    }

    /// Timestamp of the last reset.
    #[inline]
    pub fn start_ms(&self) -> TimeMs {
        self.start_ms
    }

    /// Cell the current trajectory started from.
    #[inline]
    pub fn start_cell(&self) -> Cell {
        self.start_cell
    }

    /// Cell the current trajectory ends on.
    #[inline]
    pub fn end_cell(&self) -> Option<Cell> {
        self.end_cell
    }

    /// Has `done` fired since the last reset?
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::to_fixed;
    use crate::game::command::CommandKind;

    fn geo() -> Geometry {
        Geometry::default()
    }

    #[test]
    fn test_idle_properties() {
        let mut phys = Physics::new(PhysicsSpec::Idle, geo(), Cell::ORIGIN);
        phys.reset(&Command::idle(0, "P", Cell::new(2, 3)));

        assert_eq!(phys.current_cell(), Cell::new(2, 3));
        assert!(phys.update(100).is_none());
        assert!(phys.update(1_000_000).is_none());

        let caps = phys.capabilities();
        assert!(caps.can_capture);
        assert!(caps.capturable);
        assert!(caps.blocks_movement);
    }

    #[test]
    fn test_idle_fallback_to_previous_end_cell() {
        let mut phys = Physics::new(PhysicsSpec::Idle, geo(), Cell::new(5, 5));
        phys.reset(&Command::idle(0, "P", Cell::new(1, 2)));

        let bare = Command::new(10, "P", CommandKind::Idle, vec![]);
        phys.reset(&bare);
        assert_eq!(phys.current_cell(), Cell::new(1, 2));
    }

    #[test]
    fn test_move_full_cycle() {
        // 1 m/s over 2 cells of 1 m
        let mut phys = Physics::new(PhysicsSpec::Move { speed: FIXED_ONE }, geo(), Cell::ORIGIN);
        phys.reset(&Command::move_to(0, "P", Cell::new(0, 0), Cell::new(0, 2)));

        assert_eq!(phys.position(), geo().cell_to_metric(Cell::new(0, 0)));
        assert_eq!(phys.duration_ms(), 2000);

        assert!(phys.update(1000).is_none());
        assert_eq!(phys.position(), FixedVec2::new(FIXED_ONE, 0));

        assert!(phys.update(1999).is_none(), "must not complete early");

        let done = phys.update(2000).expect("done at duration");
        assert_eq!(done.kind, CommandKind::Done);
        assert_eq!(done.first_cell(), Some(Cell::new(0, 2)));
        assert_eq!(phys.current_cell(), Cell::new(0, 2));

        // Never re-fires until the next reset
        assert!(phys.is_completed());
        assert!(phys.update(2100).is_none());
        assert!(phys.update(5000).is_none());
    }

    #[test]
    fn test_move_diagonal_duration() {
        let mut phys = Physics::new(PhysicsSpec::Move { speed: to_fixed(2.0) }, geo(), Cell::ORIGIN);
        phys.reset(&Command::move_to(500, "P", Cell::new(0, 0), Cell::new(3, 4)));

        // 5 m at 2 m/s
        assert_eq!(phys.duration_ms(), 2500);
        assert!(phys.update(2999).is_none());
        assert!(phys.update(3000).is_some());
        assert_eq!(phys.position(), geo().cell_to_metric(Cell::new(3, 4)));
    }

    #[test]
    fn test_move_zero_distance_uses_unit_length() {
        let mut phys = Physics::new(PhysicsSpec::Move { speed: to_fixed(4.0) }, geo(), Cell::ORIGIN);
        phys.reset(&Command::move_to(0, "P", Cell::new(2, 2), Cell::new(2, 2)));

        assert_eq!(phys.duration_ms(), 250);
        assert!(phys.update(249).is_none());
        assert!(phys.update(250).is_some());
        assert_eq!(phys.current_cell(), Cell::new(2, 2));
    }

    #[test]
    fn test_jump_and_rest() {
        let mut jump = Physics::new(PhysicsSpec::Jump { duration_ms: 50 }, geo(), Cell::ORIGIN);
        let mut rest = Physics::new(PhysicsSpec::Rest { duration_ms: 50 }, geo(), Cell::ORIGIN);
        let start = Command::jump(0, "J", Cell::new(1, 1));
        jump.reset(&start);
        rest.reset(&start);

        assert!(jump.update(20).is_none());
        assert!(rest.update(20).is_none());
        assert_eq!(jump.update(100).map(|c| c.kind), Some(CommandKind::Done));
        assert_eq!(rest.update(100).map(|c| c.kind), Some(CommandKind::Done));
        assert!(jump.update(200).is_none());

        assert!(!jump.capabilities().capturable);
        assert!(jump.capabilities().can_capture);
        assert!(!jump.capabilities().blocks_movement);

        assert!(!rest.capabilities().can_capture);
        assert!(rest.capabilities().capturable);
        assert!(rest.capabilities().blocks_movement);
    }

    #[test]
    fn test_timed_reset_without_params_keeps_cell() {
        let mut rest = Physics::new(PhysicsProfile::default().rest_spec(), geo(), Cell::new(4, 4));
        rest.reset(&Command::new(0, "R", CommandKind::Rest, vec![]));
        assert_eq!(rest.current_cell(), Cell::new(4, 4));
        assert_eq!(rest.duration_ms(), DEFAULT_REST_MS);
    }

    #[test]
    fn test_extreme_timestamps_do_not_overflow() {
        let mut phys = Physics::new(PhysicsSpec::Move { speed: FIXED_ONE }, geo(), Cell::ORIGIN);

        // Start far in the past: elapsed saturates and the move completes.
        phys.reset(&Command::move_to(i64::MIN, "RW", Cell::new(0, 0), Cell::new(0, 2)));
        assert!(phys.update(100).is_some());
        assert_eq!(phys.current_cell(), Cell::new(0, 2));

        // Start far in the future: elapsed clamps to zero and nothing moves.
        phys.reset(&Command::move_to(i64::MAX, "RW", Cell::new(0, 0), Cell::new(0, 2)));
        assert!(phys.update(i64::MIN).is_none());
        assert_eq!(phys.current_cell(), Cell::new(0, 0));

        let mut rest = Physics::new(PhysicsSpec::Rest { duration_ms: 50 }, geo(), Cell::ORIGIN);
        rest.reset(&Command::rest(i64::MIN, "RW", Cell::new(1, 1)));
        assert!(rest.update(i64::MAX).is_some());
    }

    #[test]
    fn test_move_interpolates_on_largest_board() {
        // 64x64 cells of 100 m at 1000 m/s
        let geo = Geometry::square(64, to_fixed(100.0), 64);
        let speed = to_fixed(1000.0);
        let mut phys = Physics::new(PhysicsSpec::Move { speed }, geo, Cell::ORIGIN);
        phys.reset(&Command::move_to(0, "RW", Cell::new(0, 0), Cell::new(0, 63)));

        let duration = phys.duration_ms();
        assert_eq!(duration, 6300);
        assert!(phys.update(duration / 2).is_none());
        let half = phys.position();
        assert_eq!(half.y, 0);
        assert_eq!(half.x, geo.cell_to_metric(Cell::new(0, 63)).x / 2);

        assert!(phys.update(duration).is_some());
        assert_eq!(phys.current_cell(), Cell::new(0, 63));
    }
}
