//! Conflict-Based Search (CBS): a best-first search over a Constraint Tree
//! that repeatedly detects the first conflict in a joint plan and branches
//! on it, replanning one agent per child via [`crate::lowlevel::plan_single`].

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::debug;

use crate::domain::{Agent, Conflict, Constraint, Path};
use crate::grid::Grid;
use crate::lowlevel::plan_single;
use crate::{PlanError, PlanFailure, PlanSuccess, SolveStats};

/// Search budget for a [`crate::plan`] call.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Upper bound on CT nodes expanded before giving up.
    pub max_nodes: usize,
    /// Upper bound on timesteps the low-level planner may search.
    pub max_time_low_level: i64,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_nodes: usize::MAX,
            max_time_low_level: 200,
        }
    }
}

/// A node of the Constraint Tree: an accumulated constraint set, one path
/// per agent satisfying it, and the summed cost of those paths.
#[derive(Debug, Clone)]
struct CtNode {
    constraints: Vec<Constraint>,
    paths: Vec<Path>,
    cost: i64,
}

impl CtNode {
    fn recompute_cost(&mut self) {
        self.cost = self.paths.iter().map(Path::cost).sum();
    }
}

// Ordered by cost only; CT-level tie-breaking is intentionally unspecified.
impl PartialEq for CtNode {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost
    }
}
impl Eq for CtNode {}
impl PartialOrd for CtNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for CtNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; invert so the lowest-cost node pops first.
        other.cost.cmp(&self.cost)
    }
}

/// Find the first conflict in a joint plan under the scan order: agent pairs
/// `(a1 < a2)` outer, timestep inner. Returns the lexicographically first
/// vertex or swap conflict, or `None` if the plan is conflict-free.
pub fn first_conflict(paths: &[Path]) -> Option<Conflict> {
    let max_t = paths.iter().map(Path::len).max().unwrap_or(0) as i64;

    for a1 in 0..paths.len() {
        for a2 in (a1 + 1)..paths.len() {
            for t in 0..max_t {
                let p1 = paths[a1].at(t);
                let p2 = paths[a2].at(t);

                if p1 == p2 {
                    return Some(Conflict::Vertex {
                        a1,
                        a2,
                        loc: p1,
                        t,
                    });
                }

                if t + 1 < max_t {
                    let p1_next = paths[a1].at(t + 1);
                    let p2_next = paths[a2].at(t + 1);
                    if p1 == p2_next && p2 == p1_next {
                        return Some(Conflict::Edge {
                            a1,
                            a2,
                            loc1: p1,
                            loc2: p2,
                            t: t + 1,
                        });
                    }
                }
            }
        }
    }
    None
}

/// Build the two constraints a conflict branches into, one per child,
/// targeting `conflict.a1` and `conflict.a2` respectively.
fn branch_constraints(conflict: &Conflict) -> [Constraint; 2] {
    match *conflict {
        Conflict::Vertex { a1, a2, loc, t } => [
            Constraint::Vertex { agent: a1, loc, t },
            Constraint::Vertex { agent: a2, loc, t },
        ],
        Conflict::Edge {
            a1,
            a2,
            loc1,
            loc2,
            t,
        } => [
            Constraint::Edge {
                agent: a1,
                from: loc1,
                to: loc2,
                t,
            },
            Constraint::Edge {
                agent: a2,
                from: loc2,
                to: loc1,
                t,
            },
        ],
    }
}

/// Run Conflict-Based Search: plan all of `agents` on `grid` so that no two
/// collide, within `limits`.
pub fn plan(
    grid: &Grid,
    agents: &[Agent],
    limits: Limits,
) -> Result<PlanSuccess, PlanError> {
    grid.validate_agents(agents)
        .map_err(|reason| PlanError::new(reason, SolveStats::default()))?;

    let mut stats = SolveStats::default();

    let mut paths = Vec::with_capacity(agents.len());
    for agent in agents {
        match plan_single(grid, agent, &[], limits.max_time_low_level) {
            Some(path) => paths.push(path),
            None => {
                return Err(PlanError::new(
                    PlanFailure::NoRootPath { agent: agent.id },
                    stats,
                ))
            }
        }
    }

    let mut root = CtNode {
        constraints: Vec::new(),
        paths,
        cost: 0,
    };
    root.recompute_cost();
    stats.nodes_generated += 1;

    let mut open: BinaryHeap<CtNode> = BinaryHeap::new();
    open.push(root);

    while let Some(node) = open.pop() {
        if stats.nodes_expanded >= limits.max_nodes {
            return Err(PlanError::new(
                PlanFailure::NodeBudgetExhausted {
                    max_nodes: limits.max_nodes,
                },
                stats,
            ));
        }
        stats.nodes_expanded += 1;
        debug!(nodes_expanded = stats.nodes_expanded, cost = node.cost, "pop CT node");

        let Some(conflict) = first_conflict(&node.paths) else {
            debug!(cost = node.cost, "conflict-free solution found");
            return Ok(PlanSuccess {
                paths: node.paths,
                cost: node.cost,
                stats,
            });
        };
        debug!(?conflict, "branching");

        for new_constraint in branch_constraints(&conflict) {
            let agent_id = new_constraint.agent();
            let mut child_constraints = node.constraints.clone();
            child_constraints.push(new_constraint);

            if let Some(new_path) = plan_single(
                grid,
                &agents[agent_id],
                &child_constraints,
                limits.max_time_low_level,
            ) {
                let mut child_paths = node.paths.clone();
                child_paths[agent_id] = new_path;
                let mut child = CtNode {
                    constraints: child_constraints,
                    paths: child_paths,
                    cost: 0,
                };
                child.recompute_cost();
                stats.nodes_generated += 1;
                open.push(child);
            }
            // replanning failure: prune this child silently
        }

        if stats.nodes_expanded >= limits.max_nodes {
            return Err(PlanError::new(
                PlanFailure::NodeBudgetExhausted {
                    max_nodes: limits.max_nodes,
                },
                stats,
            ));
        }
    }

    Err(PlanError::new(PlanFailure::OpenEmpty, stats))
}
