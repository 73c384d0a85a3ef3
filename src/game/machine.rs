//! Unit State Machines
//!
//! A unit type's behavior is a directed graph of named states. The graph is
//! built once per type as an immutable template (`StateGraph`) and shared by
//! every unit of that type. Each unit owns a `StateMachine`: a reference to
//! the shared topology plus one private `Physics` per node.
//!
//! Nodes live in an arena and refer to each other by `StateId`, so the cyclic
//! transition structure (idle -> move -> idle) needs no shared ownership.

use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use crate::core::cell::Cell;
use crate::core::geometry::Geometry;
use crate::core::vec2::FixedVec2;
use crate::game::command::{Command, CommandKind, TimeMs};
use crate::game::physics::{Capabilities, Physics, PhysicsProfile, PhysicsSpec};
use crate::game::rules::{Occupancy, RuleTable};

/// Index of a node in a `StateGraph`.
pub type StateId = usize;

/// Name of the conventional entry state.
pub const IDLE_STATE: &str = "idle";

/// One node of a state graph template.
#[derive(Debug, Clone)]
pub struct StateNode {
    /// State name (for logging and snapshots)
    pub name: String,
    /// Physics bound to this state
    pub physics: PhysicsSpec,
    /// Legal moves checked when this state receives `move`
    pub rules: Option<Arc<RuleTable>>,
    transitions: BTreeMap<CommandKind, StateId>,
}

impl StateNode {
    /// Successor for a command kind.
    #[inline]
    pub fn successor(&self, kind: &CommandKind) -> Option<StateId> {
        self.transitions.get(kind).copied()
    }

    /// All outgoing transitions, ordered by kind.
    pub fn transitions(&self) -> impl Iterator<Item = (&CommandKind, StateId)> {
        self.transitions.iter().map(|(k, v)| (k, *v))
    }
}

/// Immutable state graph template for one unit type.
#[derive(Debug, Clone)]
pub struct StateGraph {
    nodes: Vec<StateNode>,
    entry: StateId,
}

impl StateGraph {
    /// Node by id.
    ///
    /// Ids handed out by the graph itself are always in range.
    #[inline]
    pub fn node(&self, id: StateId) -> &StateNode {
        &self.nodes[id]
    }

    /// Entry state (where spawned units start).
    #[inline]
    pub fn entry(&self) -> StateId {
        self.entry
    }

    /// Number of states.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Is the graph empty? (Never true for a built graph.)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a state by name.
    pub fn find(&self, name: &str) -> Option<StateId> {
        self.nodes.iter().position(|n| n.name == name)
    }
}

/// Error building a state graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Graph has no states
    #[error("state graph has no states")]
    Empty,

    /// Two states share a name
    #[error("duplicate state `{0}`")]
    DuplicateState(String),

    /// Transition references an undeclared state
    #[error("transition `{from}` --{kind}--> `{to}` references unknown state")]
    UnknownState {
        /// Source state
        from: String,
        /// Command kind
        kind: String,
        /// Target state
        to: String,
    },

    /// Entry state is not declared
    #[error("entry state `{0}` is not declared")]
    MissingEntry(String),
}

/// Builder for `StateGraph`.
///
/// ```
/// use realtime_chess::game::machine::StateGraphBuilder;
/// use realtime_chess::game::command::CommandKind;
/// use realtime_chess::game::physics::PhysicsSpec;
///
/// let graph = StateGraphBuilder::new()
///     .state("idle", PhysicsSpec::Idle, None)
///     .state("jump", PhysicsSpec::Jump { duration_ms: 100 }, None)
///     .transition("idle", CommandKind::Jump, "jump")
///     .transition("jump", CommandKind::Done, "idle")
///     .build()
///     .unwrap();
/// assert_eq!(graph.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct StateGraphBuilder {
    states: Vec<(String, PhysicsSpec, Option<Arc<RuleTable>>)>,
    transitions: Vec<(String, CommandKind, String)>,
    entry: Option<String>,
}

impl StateGraphBuilder {
    /// Empty builder; entry defaults to `idle`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a state.
    pub fn state(mut self, name: &str, physics: PhysicsSpec, rules: Option<Arc<RuleTable>>) -> Self {
        self.states.push((name.to_string(), physics, rules));
        self
    }

    /// Declare a transition `from --kind--> to`.
    pub fn transition(mut self, from: &str, kind: CommandKind, to: &str) -> Self {
        self.transitions.push((from.to_string(), kind, to.to_string()));
        self
    }

    /// Override the entry state.
    pub fn entry(mut self, name: &str) -> Self {
        self.entry = Some(name.to_string());
        self
    }

    /// Validate and freeze the graph.
    ///
    /// An `idle` state declared without outgoing transitions gets `move`
    /// and `jump` edges to same-named states when they exist.
    pub fn build(self) -> Result<Arc<StateGraph>, GraphError> {
        if self.states.is_empty() {
            return Err(GraphError::Empty);
        }

        let mut index: BTreeMap<String, StateId> = BTreeMap::new();
        let mut nodes = Vec::with_capacity(self.states.len());
        for (name, physics, rules) in self.states {
            if index.insert(name.clone(), nodes.len()).is_some() {
                return Err(GraphError::DuplicateState(name));
            }
            nodes.push(StateNode {
                name,
                physics,
                rules,
                transitions: BTreeMap::new(),
            });
        }

        for (from, kind, to) in self.transitions {
            let (Some(&src), Some(&dst)) = (index.get(&from), index.get(&to)) else {
                return Err(GraphError::UnknownState {
                    from,
                    kind: kind.to_string(),
                    to,
                });
            };
            nodes[src].transitions.insert(kind, dst);
        }

        if let Some(&idle) = index.get(IDLE_STATE) {
            if nodes[idle].transitions.is_empty() {
                for kind in [CommandKind::Move, CommandKind::Jump] {
                    if let Some(&dst) = index.get(kind.as_str()) {
                        nodes[idle].transitions.insert(kind, dst);
                    }
                }
            }
        }

        let entry_name = self.entry.unwrap_or_else(|| IDLE_STATE.to_string());
        let entry = *index
            .get(&entry_name)
            .ok_or(GraphError::MissingEntry(entry_name))?;

        Ok(Arc::new(StateGraph { nodes, entry }))
    }
}

/// The standard idle/move/jump/rest graph.
///
/// ```text
/// idle --move--> move --done--> idle
/// idle --jump--> jump --done--> idle
/// idle --rest--> rest --done--> idle
/// ```
///
/// Every state carries `rules`; only states with a `move` edge consult them.
pub fn standard_graph(rules: Arc<RuleTable>, profile: &PhysicsProfile) -> Result<Arc<StateGraph>, GraphError> {
    let r = || Some(Arc::clone(&rules));
    StateGraphBuilder::new()
        .state(IDLE_STATE, PhysicsSpec::Idle, r())
        .state("move", profile.move_spec(), r())
        .state("jump", profile.jump_spec(), r())
        .state("rest", profile.rest_spec(), r())
        .transition(IDLE_STATE, CommandKind::Move, "move")
        .transition(IDLE_STATE, CommandKind::Jump, "jump")
        .transition(IDLE_STATE, CommandKind::Rest, "rest")
        .transition("move", CommandKind::Done, IDLE_STATE)
        .transition("jump", CommandKind::Done, IDLE_STATE)
        .transition("rest", CommandKind::Done, IDLE_STATE)
        .build()
}

/// Standard graph with a cooldown after every move.
///
/// ```text
/// idle --move--> move --done--> rest --done--> idle
/// idle --jump--> jump --done--> idle
/// idle --rest--> rest
/// ```
///
/// The `done` that ends a move carries the arrival cell, so the rest
/// starts where the move finished.
pub fn cooldown_graph(rules: Arc<RuleTable>, profile: &PhysicsProfile) -> Result<Arc<StateGraph>, GraphError> {
    let r = || Some(Arc::clone(&rules));
    StateGraphBuilder::new()
        .state(IDLE_STATE, PhysicsSpec::Idle, r())
        .state("move", profile.move_spec(), r())
        .state("jump", profile.jump_spec(), r())
        .state("rest", profile.rest_spec(), r())
        .transition(IDLE_STATE, CommandKind::Move, "move")
        .transition(IDLE_STATE, CommandKind::Jump, "jump")
        .transition(IDLE_STATE, CommandKind::Rest, "rest")
        .transition("move", CommandKind::Done, "rest")
        .transition("jump", CommandKind::Done, IDLE_STATE)
        .transition("rest", CommandKind::Done, IDLE_STATE)
        .build()
}

/// Why a command was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// `move` without exactly two cells
    MalformedParams,
    /// `move` source is not where the unit actually is
    StaleSource {
        /// Where the unit is
        actual: Cell,
        /// What the command claimed
        claimed: Cell,
    },
    /// Rule table refused the displacement or the path is blocked
    IllegalMove,
}

/// Result of feeding a command to a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Current state has no edge for this kind
    NoTransition,
    /// Edge exists but the command failed validation
    Rejected(Rejection),
    /// Entered `to` (possibly the same state, re-armed)
    Transitioned {
        /// Previous state
        from: StateId,
        /// New state
        to: StateId,
    },
}

impl CommandOutcome {
    /// Did the machine change (or re-arm) its state?
    #[inline]
    pub fn is_transition(&self) -> bool {
        matches!(self, CommandOutcome::Transitioned { .. })
    }
}

/// Per-unit instance of a state graph.
#[derive(Debug, Clone)]
pub struct StateMachine {
    graph: Arc<StateGraph>,
    physics: Vec<Physics>,
    current: StateId,
}

impl StateMachine {
    /// Clone a template for a unit standing on `cell`.
    ///
    /// Topology and rule tables are shared; every node gets fresh physics
    /// rebased to `cell`.
    pub fn spawn(graph: Arc<StateGraph>, geometry: Geometry, cell: Cell) -> Self {
        let physics = graph
            .nodes
            .iter()
            .map(|node| Physics::new(node.physics, geometry, cell))
            .collect();
        let current = graph.entry;
        Self {
            graph,
            physics,
            current,
        }
    }

    /// Process a command.
    ///
    /// `occupancy` is `None` for internal transitions, which bypass legality
    /// checks.
    pub fn on_command(&mut self, cmd: &Command, occupancy: Option<&dyn Occupancy>) -> CommandOutcome {
        let node = self.graph.node(self.current);
        let Some(next) = node.successor(&cmd.kind) else {
            return CommandOutcome::NoTransition;
        };

        if cmd.kind == CommandKind::Move {
            let [src, dst] = cmd.params[..] else {
                return CommandOutcome::Rejected(Rejection::MalformedParams);
            };

            let actual = self.current_cell();
            if src != actual {
                return CommandOutcome::Rejected(Rejection::StaleSource {
                    actual,
                    claimed: src,
                });
            }

            if let (Some(rules), Some(occupied)) = (&node.rules, occupancy) {
                if !rules.is_valid_move(src, dst, occupied) {
                    return CommandOutcome::Rejected(Rejection::IllegalMove);
                }
            }
        }

        let from = self.current;
        self.physics[next].reset(cmd);
        self.current = next;
        CommandOutcome::Transitioned { from, to: next }
    }

    /// Advance the current state's physics; follow `done` if it fires.
    pub fn update(&mut self, now_ms: TimeMs) -> CommandOutcome {
        match self.physics[self.current].update(now_ms) {
            Some(internal) => self.on_command(&internal, None),
            None => CommandOutcome::NoTransition,
        }
    }

    /// Re-arm the current state's physics without transitioning.
    pub fn reset(&mut self, cmd: &Command) {
        self.physics[self.current].reset(cmd);
    }

    /// Shared template.
    #[inline]
    pub fn graph(&self) -> &Arc<StateGraph> {
        &self.graph
    }

    /// Current state id.
    #[inline]
    pub fn current(&self) -> StateId {
        self.current
    }

    /// Current state name.
    #[inline]
    pub fn current_name(&self) -> &str {
        &self.graph.node(self.current).name
    }

    /// Physics of the current state.
    #[inline]
    pub fn physics(&self) -> &Physics {
        &self.physics[self.current]
    }

    /// Cell reported by the current physics.
    #[inline]
    pub fn current_cell(&self) -> Cell {
        self.physics().current_cell()
    }

    /// Metric position reported by the current physics.
    #[inline]
    pub fn position(&self) -> FixedVec2 {
        self.physics().position()
    }

    /// Capability flags of the current state.
    #[inline]
    pub fn capabilities(&self) -> Capabilities {
        self.physics().capabilities()
    }

    /// Start timestamp of the current physics.
    #[inline]
    pub fn start_ms(&self) -> TimeMs {
        self.physics().start_ms()
    }
}
