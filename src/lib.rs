//! # Realtime Chess Engine
//!
//! Deterministic rules engine for a turnless chess variant: every unit may
//! act at any time, moves take real (simulated) time, and captures happen
//! when units meet on a cell.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    REALTIME CHESS                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/            - Deterministic primitives                 │
//! │  ├── fixed.rs     - Q16.16 fixed-point arithmetic            │
//! │  ├── vec2.rs      - 2D vector with fixed-point               │
//! │  ├── cell.rs      - Board coordinates                        │
//! │  ├── geometry.rs  - Cell / metric / pixel conversions        │
//! │  └── hash.rs      - Snapshot hashing for verification        │
//! │                                                              │
//! │  game/            - Game logic (deterministic)               │
//! │  ├── rules.rs     - Movement rule tables                     │
//! │  ├── physics.rs   - Idle / move / jump / rest behaviors      │
//! │  ├── machine.rs   - Per-unit state graphs                    │
//! │  ├── factory.rs   - Templates and board layouts              │
//! │  ├── state.rs     - Roster, validation, queries              │
//! │  ├── tick.rs      - Authoritative simulation loop            │
//! │  ├── collision.rs - Capture resolution                       │
//! │  └── snapshot.rs  - Between-tick views                       │
//! │                                                              │
//! │  input/           - Command intake (threads)                 │
//! │  ├── queue.rs     - MPSC command channel                     │
//! │  └── producer.rs  - Producer threads                         │
//! │                                                              │
//! │  config.rs        - JSON engine configuration                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are deterministic:
//! - No floating-point arithmetic in game logic
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - Time comes only from `SimClock`
//!
//! Given the same roster, a stepped clock and the same commands drained on
//! the same ticks, the simulation produces **identical snapshots**.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod input;
pub mod config;

// Re-export commonly used types
pub use core::fixed::{Fixed, FIXED_ONE, FIXED_HALF, FIXED_SCALE};
pub use core::vec2::FixedVec2;
pub use core::cell::Cell;
pub use core::geometry::Geometry;
pub use game::command::{Command, CommandKind};
pub use game::state::{Game, Outcome, SetupError};
pub use game::unit::{Side, UnitId};
pub use config::EngineConfig;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
