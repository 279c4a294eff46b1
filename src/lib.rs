//! A Conflict-Based Search (CBS) solver for Multi-Agent Path Finding on a
//! shared 4-connected grid.
//!
//! Two cooperating searches make up the core: [`lowlevel::plan_single`], a
//! space-time A* that plans one agent under a set of constraints, and
//! [`highlevel::plan`], a best-first search over a Constraint Tree that
//! discovers inter-agent conflicts and resolves them by branching. The crate
//! is synchronous and single-threaded; a `Grid` is read-only during planning
//! and may be shared across independent solver calls.

pub mod domain;
pub mod grid;
pub mod highlevel;
pub mod lowlevel;

pub use domain::{Agent, Conflict, Constraint, Path, Position};
pub use grid::Grid;
pub use highlevel::{first_conflict, plan, Limits};
pub use lowlevel::plan_single;

/// Why [`plan`] could not produce a solution.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanFailure {
    #[error("agent {agent} has no path even without constraints")]
    NoRootPath { agent: usize },
    #[error("node budget of {max_nodes} exhausted")]
    NodeBudgetExhausted { max_nodes: usize },
    #[error("open set emptied without a solution")]
    OpenEmpty,
    #[error("invalid agents: {0}")]
    InvalidAgents(String),
}

/// Search-progress counters reported alongside both success and failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolveStats {
    pub nodes_expanded: usize,
    pub nodes_generated: usize,
}

/// A conflict-free joint plan, indexed by agent id.
#[derive(Debug, Clone)]
pub struct PlanSuccess {
    pub paths: Vec<Path>,
    pub cost: i64,
    pub stats: SolveStats,
}

/// A failed [`plan`] call: the reason, plus the counters accumulated before
/// giving up.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct PlanError {
    pub reason: PlanFailure,
    pub stats: SolveStats,
}

impl PlanError {
    fn new(reason: PlanFailure, stats: SolveStats) -> Self {
        PlanError { reason, stats }
    }
}
