//! Property-based tests for geometry, physics timing and setup validation.

#![allow(missing_docs)]

use std::collections::BTreeSet;

use proptest::prelude::*;

use realtime_chess::core::fixed::to_fixed;
use realtime_chess::game::clock::SimClock;
use realtime_chess::game::command::Command;
use realtime_chess::game::factory::UnitFactory;
use realtime_chess::game::physics::{Physics, PhysicsProfile, PhysicsSpec};
use realtime_chess::game::unit::{Side, Unit};
use realtime_chess::{Cell, Game, Geometry, SetupError};

const NON_KING: [char; 5] = ['Q', 'R', 'B', 'N', 'P'];

fn cell_sizes() -> impl Strategy<Value = f64> {
    prop::sample::select(vec![0.25, 0.5, 1.0, 1.5, 2.0, 3.0])
}

fn side_cells() -> impl Strategy<Value = Vec<(i32, i32)>> {
    prop::collection::btree_set((0..8i32, 0..8i32), 1..12).prop_map(|s| s.into_iter().collect())
}

/// One King on the first cell, assorted other units on the rest.
fn army(factory: &UnitFactory, side: char, cells: &[(i32, i32)], picks: &[usize]) -> Vec<Unit> {
    cells
        .iter()
        .enumerate()
        .map(|(i, &(r, c))| {
            let prefix = if i == 0 { 'K' } else { NON_KING[picks[i % picks.len()] % NON_KING.len()] };
            factory.spawn(&format!("{prefix}{side}"), Cell::new(r, c)).unwrap()
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Every on-board cell survives cell -> metric -> cell.
    #[test]
    fn prop_geometry_round_trip(
        rows in 1..16i32,
        cols in 1..16i32,
        size in cell_sizes(),
        px in 8..128i32,
    ) {
        let geo = Geometry { rows, cols, cell_w: to_fixed(size), cell_h: to_fixed(size), cell_w_px: px, cell_h_px: px };
        for r in 0..rows {
            for c in 0..cols {
                let cell = Cell::new(r, c);
                prop_assert_eq!(geo.metric_to_cell(geo.cell_to_metric(cell)), cell);
                prop_assert_eq!(geo.metric_to_pixel(geo.cell_to_metric(cell)), (c * px, r * px));
            }
        }
    }

    /// Move completes exactly at its computed duration, starts at A, ends at B.
    #[test]
    fn prop_move_timing(
        a in (0..8i32, 0..8i32),
        b in (0..8i32, 0..8i32),
        quarter_speed in 1..16i32,
        t0 in 0..100_000i64,
    ) {
        let geo = Geometry::default();
        let speed = quarter_speed * (to_fixed(1.0) / 4);
        let (a, b) = (Cell::from(a), Cell::from(b));

        let mut phys = Physics::new(PhysicsSpec::Move { speed }, geo, a);
        phys.reset(&Command::move_to(t0, "QW", a, b));
        prop_assert_eq!(phys.position(), geo.cell_to_metric(a));

        let duration = phys.duration_ms();
        prop_assert!(duration >= 1);
        prop_assert!(phys.update(t0 + duration - 1).is_none());

        let done = phys.update(t0 + duration);
        prop_assert!(done.is_some());
        prop_assert_eq!(phys.position(), geo.cell_to_metric(b));
        prop_assert!(phys.update(t0 + duration + 1).is_none());
    }

    /// Jump and Rest fire at their configured duration, never before.
    #[test]
    fn prop_timed_states(duration in 1..10_000i64, t0 in 0..100_000i64, jump in any::<bool>()) {
        let spec = if jump { PhysicsSpec::Jump { duration_ms: duration } } else { PhysicsSpec::Rest { duration_ms: duration } };
        let mut phys = Physics::new(spec, Geometry::default(), Cell::new(3, 3));
        phys.reset(&Command::jump(t0, "NW", Cell::new(3, 3)));

        prop_assert!(phys.update(t0 + duration - 1).is_none());
        let caps = phys.capabilities();
        if jump {
            prop_assert!(!caps.capturable);
        } else {
            prop_assert!(caps.blocks_movement);
            prop_assert!(!caps.can_capture);
        }
        prop_assert!(phys.update(t0 + duration).is_some());
    }

    /// One King per side and no same-side stacking is exactly what setup accepts.
    #[test]
    fn prop_setup_validation(
        white in side_cells(),
        black in side_cells(),
        picks in prop::collection::vec(0..5usize, 1..8),
        stack_on in any::<prop::sample::Index>(),
    ) {
        let factory = UnitFactory::standard(Geometry::default(), &PhysicsProfile::default()).unwrap();
        let whites = army(&factory, 'W', &white, &picks);
        let blacks = army(&factory, 'B', &black, &picks);

        let all: Vec<Unit> = whites.iter().chain(&blacks).cloned().collect();
        prop_assert!(Game::new(all, Geometry::default(), SimClock::stepped(0, 10)).is_ok());

        // Without the white King
        let headless: Vec<Unit> = whites[1..].iter().chain(&blacks).cloned().collect();
        prop_assert_eq!(
            Game::new(headless, Geometry::default(), SimClock::stepped(0, 10)).unwrap_err(),
            SetupError::MissingKing(Side::White)
        );

        // A second black unit on an occupied black cell
        let occupied: BTreeSet<(i32, i32)> = black.iter().copied().collect();
        let &(r, c) = stack_on.get(&black);
        prop_assert!(occupied.contains(&(r, c)));
        let mut stacked: Vec<Unit> = whites.iter().chain(&blacks).cloned().collect();
        stacked.push(factory.spawn("QB", Cell::new(r, c)).unwrap());
        let stacked_code_is_queen = blacks.iter().any(|u| u.id().as_str() == format!("QB_{r}_{c}"));
        let err = Game::new(stacked, Geometry::default(), SimClock::stepped(0, 10)).unwrap_err();
        if stacked_code_is_queen {
            prop_assert!(matches!(err, SetupError::DuplicateId(_)));
        } else {
            let is_same_side_collision = matches!(err, SetupError::SameSideCollision { .. });
            prop_assert!(is_same_side_collision);
        }
    }
}
