//! Game Logic Module
//!
//! All simulation code. Deterministic under a stepped clock.
//!
//! ## Module Structure
//!
//! - `command`: Commands addressed to units
//! - `rules`: Movement rule tables and the occupancy trait
//! - `physics`: Idle/move/jump/rest behaviors
//! - `machine`: State graph templates and per-unit machines
//! - `unit`: Unit ids, sides, live units
//! - `factory`: Template registry and board layouts
//! - `occupancy`: Per-tick cell index
//! - `collision`: Capture resolution
//! - `clock`: Simulation time source
//! - `state`: The orchestrator and setup validation
//! - `tick`: Authoritative simulation loop
//! - `snapshot`: Between-tick views and hashes
//! - `events`: Game events for replay/inspection

pub mod command;
pub mod rules;
pub mod physics;
pub mod machine;
pub mod unit;
pub mod factory;
pub mod occupancy;
pub mod collision;
pub mod clock;
pub mod state;
pub mod tick;
pub mod snapshot;
pub mod events;

// Re-export key types
pub use command::{Command, CommandKind, TimeMs};
pub use rules::{MoveTag, Occupancy, RuleTable, UnitType};
pub use physics::{Capabilities, PhysicsProfile, PhysicsSpec};
pub use machine::{CommandOutcome, Rejection, StateGraph, StateGraphBuilder, StateMachine};
pub use unit::{Side, Unit, UnitId};
pub use factory::{UnitFactory, STANDARD_LAYOUT};
pub use clock::SimClock;
pub use state::{Game, Outcome, SetupError};
pub use tick::{RunSummary, TickResult};
pub use snapshot::{GameSnapshot, UnitSnapshot};
pub use events::GameEvent;
