//! Core deterministic primitives.
//!
//! Fixed-point arithmetic, board coordinates and geometry, and state hashing.
//! Nothing in here reads the system clock or allocates per tick.

pub mod fixed;
pub mod vec2;
pub mod cell;
pub mod geometry;
pub mod hash;

// Re-export core types
pub use fixed::{Fixed, FIXED_ONE, FIXED_HALF, FIXED_SCALE};
pub use vec2::FixedVec2;
pub use cell::Cell;
pub use geometry::Geometry;
pub use hash::{StateHash, StateHasher};
