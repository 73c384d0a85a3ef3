//! Unit Factory
//!
//! Registry of state graph templates keyed by type code (`KW`, `PB`, ...)
//! plus the board layout reader. Spawning clones a template into a fresh
//! per-unit machine rebased to the spawn cell.

use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::core::cell::Cell;
use crate::core::geometry::Geometry;
use crate::game::machine::{cooldown_graph, standard_graph, GraphError, StateGraph, StateMachine};
use crate::game::physics::PhysicsProfile;
use crate::game::rules::{standard_table, RuleTable, UnitType};
use crate::game::unit::{Side, Unit, UnitId};

/// Error spawning units.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactoryError {
    /// No template registered under this code
    #[error("unknown unit type `{0}`")]
    UnknownType(String),

    /// A template failed to build
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Layout text is malformed
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Error reading a board layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// More rows than the board has
    #[error("layout has {found} rows, board has {max}")]
    TooManyRows {
        /// Rows in the layout
        found: usize,
        /// Board rows
        max: i32,
    },

    /// A row has more fields than the board has columns
    #[error("layout row {row} has {found} columns, board has {max}")]
    TooManyCols {
        /// 0-based row
        row: usize,
        /// Fields in the row
        found: usize,
        /// Board columns
        max: i32,
    },

    /// Field is not a `<type><side>` code
    #[error("bad unit code `{code}` at ({row},{col})")]
    BadCode {
        /// 0-based row
        row: usize,
        /// 0-based column
        col: usize,
        /// Offending field
        code: String,
    },
}

/// Read a layout: one comma-separated line per board row, each field a type
/// code or empty.
///
/// ```
/// use realtime_chess::game::factory::parse_layout;
///
/// let placements = parse_layout("KB,,\n,,\n,PW,KW\n", 8, 8).unwrap();
/// assert_eq!(placements.len(), 3);
/// assert_eq!(placements[1].0, "PW");
/// ```
pub fn parse_layout(text: &str, rows: i32, cols: i32) -> Result<Vec<(String, Cell)>, LayoutError> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() > rows.max(0) as usize {
        return Err(LayoutError::TooManyRows { found: lines.len(), max: rows });
    }

    let mut placements = Vec::new();
    for (row, line) in lines.iter().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() > cols.max(0) as usize {
            return Err(LayoutError::TooManyCols { row, found: fields.len(), max: cols });
        }
        for (col, field) in fields.iter().enumerate() {
            let code = field.trim();
            if code.is_empty() {
                continue;
            }
            let mut chars = code.chars();
            let well_formed = code.chars().count() == 2
                && chars.next().is_some_and(|c| c.is_ascii_uppercase())
                && chars.next().and_then(Side::from_char).is_some();
            if !well_formed {
                return Err(LayoutError::BadCode { row, col, code: code.to_string() });
            }
            placements.push((code.to_string(), Cell::new(row as i32, col as i32)));
        }
    }
    Ok(placements)
}

/// Template registry.
#[derive(Debug, Clone)]
pub struct UnitFactory {
    geometry: Geometry,
    templates: BTreeMap<String, Arc<StateGraph>>,
}

impl UnitFactory {
    /// Empty registry on `geometry`.
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            templates: BTreeMap::new(),
        }
    }

    /// Registry with all twelve standard codes.
    pub fn standard(geometry: Geometry, profile: &PhysicsProfile) -> Result<Self, FactoryError> {
        Self::with_graph(geometry, profile, standard_graph)
    }

    /// Standard codes whose units rest after every move.
    pub fn cooldown(geometry: Geometry, profile: &PhysicsProfile) -> Result<Self, FactoryError> {
        Self::with_graph(geometry, profile, cooldown_graph)
    }

    /// Standard codes and rule tables, with `build` making each template.
    pub fn with_graph(
        geometry: Geometry,
        profile: &PhysicsProfile,
        build: fn(Arc<RuleTable>, &PhysicsProfile) -> Result<Arc<StateGraph>, GraphError>,
    ) -> Result<Self, FactoryError> {
        let mut factory = Self::new(geometry);
        for side in Side::BOTH {
            for unit_type in UnitType::ALL {
                let table = standard_table(unit_type, side.forward(), geometry.rows, geometry.cols);
                let graph = build(Arc::new(table), profile)?;
                let code = format!("{}{}", unit_type.prefix(), side.as_char());
                factory.register(&code, graph);
            }
        }
        Ok(factory)
    }

    /// Register (or replace) a template.
    pub fn register(&mut self, code: &str, graph: Arc<StateGraph>) {
        self.templates.insert(code.to_string(), graph);
    }

    /// Registered codes, sorted.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Board geometry units are spawned on.
    #[inline]
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Spawn one unit of type `code` on `cell`.
    pub fn spawn(&self, code: &str, cell: Cell) -> Result<Unit, FactoryError> {
        let graph = self
            .templates
            .get(code)
            .ok_or_else(|| FactoryError::UnknownType(code.to_string()))?;
        let machine = StateMachine::spawn(Arc::clone(graph), self.geometry, cell);
        let id = UnitId::for_spawn(code, cell);
        debug!("Spawned {} at {}", id, cell);
        Ok(Unit::new(id, machine))
    }

    /// Parse `layout` and spawn every placement.
    pub fn spawn_layout(&self, layout: &str) -> Result<Vec<Unit>, FactoryError> {
        parse_layout(layout, self.geometry.rows, self.geometry.cols)?
            .into_iter()
            .map(|(code, cell)| self.spawn(&code, cell))
            .collect()
    }
}

/// The classic starting position.
pub const STANDARD_LAYOUT: &str = "\
RB,NB,BB,QB,KB,BB,NB,RB
PB,PB,PB,PB,PB,PB,PB,PB
,,,,,,,
,,,,,,,
,,,,,,,
,,,,,,,
PW,PW,PW,PW,PW,PW,PW,PW
RW,NW,BW,QW,KW,BW,NW,RW
";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::command::CommandKind;

    fn factory() -> UnitFactory {
        UnitFactory::standard(Geometry::default(), &PhysicsProfile::default()).unwrap()
    }

    #[test]
    fn test_standard_registers_twelve_codes() {
        let f = factory();
        let codes: Vec<&str> = f.codes().collect();
        assert_eq!(codes.len(), 12);
        assert!(codes.contains(&"KW"));
        assert!(codes.contains(&"NB"));
    }

    #[test]
    fn test_spawn_assigns_convention_id() {
        let unit = factory().spawn("PB", Cell::new(1, 3)).unwrap();
        assert_eq!(unit.id().as_str(), "PB_1_3");
        assert_eq!(unit.current_cell(), Cell::new(1, 3));
        assert_eq!(unit.state_name(), "idle");
    }

    #[test]
    fn test_spawn_unknown_code() {
        let err = factory().spawn("ZW", Cell::ORIGIN).unwrap_err();
        assert_eq!(err, FactoryError::UnknownType("ZW".into()));
    }

    #[test]
    fn test_spawned_units_share_template() {
        let f = factory();
        let a = f.spawn("RW", Cell::new(7, 0)).unwrap();
        let b = f.spawn("RW", Cell::new(7, 7)).unwrap();
        assert!(Arc::ptr_eq(a.machine().graph(), b.machine().graph()));
        assert_ne!(a.current_cell(), b.current_cell());
    }

    #[test]
    fn test_cooldown_templates() {
        let f = UnitFactory::cooldown(Geometry::default(), &PhysicsProfile::default()).unwrap();
        assert_eq!(f.codes().count(), 12);

        let unit = f.spawn("NW", Cell::new(7, 1)).unwrap();
        let graph = unit.machine().graph();
        let moving = graph.node(graph.find("move").unwrap());
        assert_eq!(moving.successor(&CommandKind::Done), graph.find("rest"));
    }

    #[test]
    fn test_standard_layout() {
        let units = factory().spawn_layout(STANDARD_LAYOUT).unwrap();
        assert_eq!(units.len(), 32);
        assert_eq!(units.iter().filter(|u| u.is_king()).count(), 2);
    }

    #[test]
    fn test_layout_errors() {
        assert!(matches!(
            parse_layout("KW,,X\n", 8, 8),
            Err(LayoutError::BadCode { row: 0, col: 2, .. })
        ));
        assert!(matches!(
            parse_layout("KZ\n", 8, 8),
            Err(LayoutError::BadCode { .. })
        ));
        assert!(matches!(
            parse_layout(",,,\n", 2, 3),
            Err(LayoutError::TooManyCols { row: 0, found: 4, max: 3 })
        ));
        assert!(matches!(
            parse_layout("\n\n\n", 2, 2),
            Err(LayoutError::TooManyRows { found: 3, max: 2 })
        ));
    }
}
