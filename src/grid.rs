//! The rectangular occupancy grid agents move on.

use crate::domain::{Agent, Position};
use crate::PlanFailure;

/// Fixed neighbor-enumeration order: the wait action plus the four
/// cardinal moves, matching the original source's `{(1,0),(-1,0),(0,1),(0,-1),(0,0)}`
/// so that low-level search expansion order is deterministic.
const DIRECTIONS: [(i32, i32); 5] = [(0, 0), (1, 0), (-1, 0), (0, 1), (0, -1)];

/// A rectangular `width x height` occupancy map. Immutable once built for
/// planning (the `set_obstacle` mutator is only meant for grid construction).
#[derive(Debug, Clone)]
pub struct Grid {
    width: i32,
    height: i32,
    obstacles: Vec<bool>,
}

impl Grid {
    /// An all-free grid of the given dimensions.
    pub fn new(width: i32, height: i32) -> Self {
        assert!(width > 0 && height > 0, "grid dimensions must be positive");
        Grid {
            width,
            height,
            obstacles: vec![false; (width * height) as usize],
        }
    }

    /// Parse a grid from textual rows, `.` free and anything else (`#` by
    /// convention) an obstacle. All rows must share the same length.
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len() as i32;
        let width = rows.first().map_or(0, |r| r.chars().count() as i32);
        let mut grid = Grid::new(width.max(1), height.max(1));
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                if ch != '.' {
                    grid.set_obstacle(Position::new(x as i32, y as i32));
                }
            }
        }
        grid
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn set_obstacle(&mut self, p: Position) {
        if let Some(idx) = self.index(p) {
            self.obstacles[idx] = true;
        }
    }

    fn index(&self, p: Position) -> Option<usize> {
        if self.in_bounds(p) {
            Some((p.y * self.width + p.x) as usize)
        } else {
            None
        }
    }

    pub fn in_bounds(&self, p: Position) -> bool {
        p.x >= 0 && p.x < self.width && p.y >= 0 && p.y < self.height
    }

    pub fn is_free(&self, p: Position) -> bool {
        self.index(p).is_some_and(|idx| !self.obstacles[idx])
    }

    /// Free cells reachable from `p` in one step, including `p` itself
    /// (the wait action). Empty if `p` itself is not free.
    pub fn neighbors(&self, p: Position) -> Vec<Position> {
        if !self.is_free(p) {
            return Vec::new();
        }
        DIRECTIONS
            .iter()
            .map(|&(dx, dy)| Position::new(p.x + dx, p.y + dy))
            .filter(|&next| self.is_free(next))
            .collect()
    }

    /// Reject agents with out-of-bounds or obstacle start/goal cells, or
    /// duplicate ids — a caller-boundary precondition, not a search failure.
    pub(crate) fn validate_agents(&self, agents: &[Agent]) -> Result<(), PlanFailure> {
        let mut seen_ids = std::collections::HashSet::new();
        for agent in agents {
            if !seen_ids.insert(agent.id) {
                return Err(PlanFailure::InvalidAgents(format!(
                    "duplicate agent id {}",
                    agent.id
                )));
            }
            for (label, cell) in [("start", agent.start), ("goal", agent.goal)] {
                if !self.is_free(cell) {
                    return Err(PlanFailure::InvalidAgents(format!(
                        "agent {} has {} {:?} outside the grid or on an obstacle",
                        agent.id, label, cell
                    )));
                }
            }
        }
        Ok(())
    }
}
