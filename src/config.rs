//! Engine Configuration
//!
//! Board, physics and clock settings. Loaded from JSON; every field has a
//! default so partial files work. Defaults reproduce the classic setup:
//! 8x8 board of 1 m cells drawn at 64 px, 1 m/s moves, 100 ms jumps and
//! 3 s rests.

use std::path::Path;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::fixed::{to_fixed, FIXED_ONE};
use crate::core::geometry::Geometry;
use crate::game::clock::SimClock;
use crate::game::factory::{FactoryError, UnitFactory};
use crate::game::physics::PhysicsProfile;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("reading {path}: {source}")]
    Io {
        /// Path that failed
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// JSON is malformed or has wrong types
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of range
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong
        reason: String,
    },
}

/// Board settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Rows
    pub rows: i32,
    /// Columns
    pub cols: i32,
    /// Cell edge in metres
    pub cell_size_m: f64,
    /// Cell edge in pixels
    pub cell_px: i32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            rows: 8,
            cols: 8,
            cell_size_m: 1.0,
            cell_px: 64,
        }
    }
}

/// Standard state physics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Move speed in m/s
    pub move_speed_m_per_s: f64,
    /// Jump duration in ms
    pub jump_duration_ms: i64,
    /// Rest duration in ms
    pub rest_duration_ms: i64,
    /// Send units through `rest` after every move
    pub cooldown_after_move: bool,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        let profile = PhysicsProfile::default();
        Self {
            move_speed_m_per_s: profile.move_speed as f64 / FIXED_ONE as f64,
            jump_duration_ms: profile.jump_duration_ms,
            rest_duration_ms: profile.rest_duration_ms,
            cooldown_after_move: false,
        }
    }
}

/// Clock settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Integer speed-up of simulation time over wall time
    pub time_factor: i64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self { time_factor: 1 }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Board
    pub board: BoardConfig,
    /// Physics
    pub physics: PhysicsConfig,
    /// Clock
    pub clock: ClockConfig,
    /// Tick cap for `run` (0 = until decided)
    pub max_iterations: u64,
}

impl EngineConfig {
    /// Parse and validate JSON.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Apply `CHESS_TIME_FACTOR` and `CHESS_MAX_ITERATIONS` when set and
    /// parseable.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(factor) = std::env::var("CHESS_TIME_FACTOR").ok().and_then(|v| v.parse().ok()) {
            self.clock.time_factor = factor;
        }
        if let Some(cap) = std::env::var("CHESS_MAX_ITERATIONS").ok().and_then(|v| v.parse().ok()) {
            self.max_iterations = cap;
        }
        self
    }

    /// Range checks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
            ConfigError::Invalid { field, reason: reason.into() }
        }

        if !(1..=64).contains(&self.board.rows) {
            return Err(invalid("board.rows", format!("{} not in 1..=64", self.board.rows)));
        }
        if !(1..=64).contains(&self.board.cols) {
            return Err(invalid("board.cols", format!("{} not in 1..=64", self.board.cols)));
        }
        if !(self.board.cell_size_m <= 100.0 && to_fixed(self.board.cell_size_m) > 0) {
            return Err(invalid("board.cell_size_m", "must be in [1/65536, 100]"));
        }
        if self.board.cell_px <= 0 {
            return Err(invalid("board.cell_px", "must be positive"));
        }
        if !(self.physics.move_speed_m_per_s <= 1000.0 && to_fixed(self.physics.move_speed_m_per_s) > 0) {
            return Err(invalid("physics.move_speed_m_per_s", "must be in [1/65536, 1000]"));
        }
        if self.physics.jump_duration_ms < 0 {
            return Err(invalid("physics.jump_duration_ms", "must not be negative"));
        }
        if self.physics.rest_duration_ms < 0 {
            return Err(invalid("physics.rest_duration_ms", "must not be negative"));
        }
        if self.clock.time_factor < 1 {
            return Err(invalid("clock.time_factor", "must be at least 1"));
        }
        Ok(())
    }

    /// Board geometry. Metric sizes are converted to fixed-point here.
    pub fn geometry(&self) -> Geometry {
        let size = to_fixed(self.board.cell_size_m);
        Geometry {
            rows: self.board.rows,
            cols: self.board.cols,
            cell_w: size,
            cell_h: size,
            cell_w_px: self.board.cell_px,
            cell_h_px: self.board.cell_px,
        }
    }

    /// Physics for the standard states.
    pub fn physics_profile(&self) -> PhysicsProfile {
        PhysicsProfile {
            move_speed: to_fixed(self.physics.move_speed_m_per_s),
            jump_duration_ms: self.physics.jump_duration_ms,
            rest_duration_ms: self.physics.rest_duration_ms,
        }
    }

    /// Template registry for the configured board and physics.
    pub fn unit_factory(&self) -> Result<UnitFactory, FactoryError> {
        let (geometry, profile) = (self.geometry(), self.physics_profile());
        if self.physics.cooldown_after_move {
            UnitFactory::cooldown(geometry, &profile)
        } else {
            UnitFactory::standard(geometry, &profile)
        }
    }

    /// Wall-clock simulation clock.
    pub fn clock(&self) -> SimClock {
        SimClock::monotonic(self.clock.time_factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cell::Cell;
    use crate::game::command::CommandKind;

    #[test]
    fn test_defaults_match_classic_setup() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.geometry(), Geometry::default());
        assert_eq!(config.physics_profile(), PhysicsProfile::default());
        assert_eq!(config.max_iterations, 0);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = EngineConfig::from_json_str(
            r#"{ "physics": { "move_speed_m_per_s": 2.5 }, "clock": { "time_factor": 10 } }"#,
        )
        .unwrap();
        assert_eq!(config.board, BoardConfig::default());
        assert_eq!(config.physics.rest_duration_ms, 3000);
        assert_eq!(config.physics_profile().move_speed, to_fixed(2.5));
        assert_eq!(config.clock.time_factor, 10);
    }

    #[test]
    fn test_validation_errors() {
        let err = EngineConfig::from_json_str(r#"{ "board": { "rows": 0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "board.rows", .. }));

        let err = EngineConfig::from_json_str(r#"{ "clock": { "time_factor": 0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "clock.time_factor", .. }));

        let err = EngineConfig::from_json_str(r#"{ "board": { "cell_size_m": 0.000001 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "board.cell_size_m", .. }));

        let err = EngineConfig::from_json_str(r#"{ "physics": { "move_speed_m_per_s": 0.00001 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "physics.move_speed_m_per_s", .. }));

        let err = EngineConfig::from_json_str(r#"{ "board": "wide" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::from_path("/nonexistent/engine.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_cooldown_flag_selects_templates() {
        let config = EngineConfig::from_json_str(r#"{ "physics": { "cooldown_after_move": true } }"#).unwrap();
        let unit = config.unit_factory().unwrap().spawn("RW", Cell::new(7, 0)).unwrap();
        let graph = unit.machine().graph();
        let moving = graph.node(graph.find("move").unwrap());
        assert_eq!(moving.successor(&CommandKind::Done), graph.find("rest"));

        let plain = EngineConfig::default().unit_factory().unwrap().spawn("RW", Cell::new(7, 0)).unwrap();
        let graph = plain.machine().graph();
        let moving = graph.node(graph.find("move").unwrap());
        assert_eq!(moving.successor(&CommandKind::Done), graph.find("idle"));
    }
}
