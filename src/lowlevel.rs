//! Space-Time A*: plans one agent's shortest path under a set of
//! vertex/edge constraints, searching over `(position, timestep)` states.

use std::collections::{BinaryHeap, HashMap};

use tracing::{debug, instrument, trace};

use crate::domain::{Agent, Constraint, OpenEntry, Path, Position};
use crate::grid::Grid;

type State = (Position, i64);

/// Plan `agent`'s path on `grid` respecting every constraint in
/// `constraints` that targets `agent.id`, within `max_time` timesteps.
/// Returns `None` if no such path exists within the bound.
#[instrument(skip_all, name = "plan_single", fields(agent = agent.id, start = ?agent.start, goal = ?agent.goal), level = "debug")]
pub fn plan_single(
    grid: &Grid,
    agent: &Agent,
    constraints: &[Constraint],
    max_time: i64,
) -> Option<Path> {
    let own_constraints: Vec<&Constraint> = constraints
        .iter()
        .filter(|c| c.agent() == agent.id)
        .collect();

    let mut open: BinaryHeap<OpenEntry<State>> = BinaryHeap::new();
    let mut best_g: HashMap<State, i64> = HashMap::new();
    let mut parent: HashMap<State, State> = HashMap::new();

    let start_state: State = (agent.start, 0);
    best_g.insert(start_state, 0);
    open.push(OpenEntry {
        f: agent.start.manhattan(agent.goal),
        g: 0,
        state: start_state,
    });

    // The agent is physically at `start` at t=0 regardless of constraints,
    // but a vertex constraint forbidding (start, 0) means it may not settle
    // there: it must move away and come back, not be accepted as a
    // zero-length goal arrival.
    let start_forbidden = own_constraints
        .iter()
        .any(|c| c.forbids(agent.start, agent.start, 0));

    while let Some(OpenEntry { g, state, .. }) = open.pop() {
        let (pos, t) = state;
        trace!(?pos, t, g, "expand");

        if g > *best_g.get(&state).unwrap_or(&i64::MAX) {
            continue; // stale entry, a cheaper g was already found for this state
        }

        if pos == agent.goal && !(t == 0 && start_forbidden) {
            debug!(cost = g, "path found");
            return Some(reconstruct(&parent, state));
        }

        if t >= max_time {
            continue;
        }

        for next_pos in grid.neighbors(pos) {
            let next_t = t + 1;
            let next_state = (next_pos, next_t);

            if own_constraints
                .iter()
                .any(|c| c.forbids(pos, next_pos, next_t))
            {
                continue;
            }

            let next_g = g + 1;
            if next_g < *best_g.get(&next_state).unwrap_or(&i64::MAX) {
                best_g.insert(next_state, next_g);
                parent.insert(next_state, state);
                open.push(OpenEntry {
                    f: next_g + next_pos.manhattan(agent.goal),
                    g: next_g,
                    state: next_state,
                });
            }
        }
    }

    debug!("no path within max_time");
    None
}

fn reconstruct(parent: &HashMap<State, State>, goal_state: State) -> Path {
    let mut steps = vec![goal_state.0];
    let mut cur = goal_state;
    while let Some(&prev) = parent.get(&cur) {
        steps.push(prev.0);
        cur = prev;
    }
    steps.reverse();
    Path::new(steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: usize, start: (i32, i32), goal: (i32, i32)) -> Agent {
        Agent {
            id,
            start: Position::new(start.0, start.1),
            goal: Position::new(goal.0, goal.1),
        }
    }

    #[test]
    fn start_equals_goal_with_no_constraint() {
        let grid = Grid::new(3, 3);
        let a = agent(0, (1, 1), (1, 1));
        let path = plan_single(&grid, &a, &[], 200).unwrap();
        assert_eq!(path.steps(), &[Position::new(1, 1)]);
        assert_eq!(path.cost(), 0);
    }

    #[test]
    fn start_equals_goal_but_constrained_must_move_and_return() {
        let grid = Grid::new(3, 3);
        let a = agent(0, (1, 1), (1, 1));
        let constraints = vec![Constraint::Vertex {
            agent: 0,
            loc: Position::new(1, 1),
            t: 0,
        }];
        let path = plan_single(&grid, &a, &constraints, 200).unwrap();
        assert_eq!(path.at(0), Position::new(1, 1));
        assert!(path.len() > 1);
        assert_eq!(path.at(path.len() as i64 - 1), Position::new(1, 1));
    }

    #[test]
    fn simple_straight_line() {
        let grid = Grid::new(5, 1);
        let a = agent(0, (0, 0), (4, 0));
        let path = plan_single(&grid, &a, &[], 200).unwrap();
        assert_eq!(path.cost(), 4);
    }

    #[test]
    fn around_obstacle() {
        let mut grid = Grid::new(3, 3);
        grid.set_obstacle(Position::new(1, 1));
        let a = agent(0, (0, 0), (2, 2));
        let path = plan_single(&grid, &a, &[], 200).unwrap();
        assert_eq!(path.cost(), 4);
        assert_eq!(path.len(), 5);
    }

    #[test]
    fn goal_temporarily_constrained_forces_detour() {
        let grid = Grid::new(1, 3);
        let a = agent(0, (0, 0), (0, 2));
        let constraints = vec![Constraint::Vertex {
            agent: 0,
            loc: Position::new(0, 2),
            t: 2,
        }];
        let path = plan_single(&grid, &a, &constraints, 200).unwrap();
        assert_eq!(path.at(path.len() as i64 - 1), Position::new(0, 2));
        assert_ne!(path.at(2), Position::new(0, 2));
    }

    #[test]
    fn unreachable_goal_returns_none() {
        let mut grid = Grid::new(3, 3);
        grid.set_obstacle(Position::new(1, 0));
        grid.set_obstacle(Position::new(1, 1));
        grid.set_obstacle(Position::new(1, 2));
        let a = agent(0, (0, 0), (2, 0));
        assert!(plan_single(&grid, &a, &[], 200).is_none());
    }

    #[test]
    fn max_time_bound_can_cause_failure() {
        let grid = Grid::new(5, 1);
        let a = agent(0, (0, 0), (4, 0));
        assert!(plan_single(&grid, &a, &[], 2).is_none());
    }

    #[test]
    fn edge_constraint_blocks_specific_swap_direction() {
        let grid = Grid::new(2, 1);
        let a = agent(0, (0, 0), (1, 0));
        let constraints = vec![Constraint::Edge {
            agent: 0,
            from: Position::new(0, 0),
            to: Position::new(1, 0),
            t: 1,
        }];
        // direct move forbidden, but waiting one step then moving is fine
        let path = plan_single(&grid, &a, &constraints, 200).unwrap();
        assert!(path.cost() > 1);
    }
}
