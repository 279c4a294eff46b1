//! Manual smoke-test driver for the CBS library. Not part of the core
//! contract (the command-line driver is an external collaborator per the
//! library's scope) — it only wires together the public API for inspection.

use mapf_cbs::{first_conflict, plan, Agent, Grid, Limits, Position};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let grid = Grid::from_rows(&[".....", ".....", ".....", ".....", "....."]);
    let agents = vec![
        Agent {
            id: 0,
            start: Position::new(0, 2),
            goal: Position::new(4, 2),
        },
        Agent {
            id: 1,
            start: Position::new(2, 0),
            goal: Position::new(2, 4),
        },
    ];

    match plan(&grid, &agents, Limits::default()) {
        Ok(solution) => {
            println!("solved: cost = {}", solution.cost);
            for (id, path) in solution.paths.iter().enumerate() {
                println!("  agent {id}: {:?}", path.steps());
            }
            assert!(first_conflict(&solution.paths).is_none());
        }
        Err(err) => {
            println!("no solution: {} (stats: {:?})", err.reason, err.stats);
        }
    }
}
