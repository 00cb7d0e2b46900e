#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Breadth-first path finder over the fixed battlefield grid.
//!
//! Paths use 8-directional adjacency where every step costs the same, so the
//! first path found is a minimum-hop path. Neighbours are expanded in
//! [`NEIGHBOR_OFFSETS`](skirmish_core::NEIGHBOR_OFFSETS) order; among several
//! shortest paths the one returned is whichever that order reaches first.

use std::collections::VecDeque;

use skirmish_core::{Coordinate, Unit, CELL_COUNT};

/// Path finder that reuses dense scratch grids between searches.
#[derive(Debug)]
pub struct PathFinder {
    blocked: Vec<bool>,
    visited: Vec<bool>,
    predecessors: Vec<Option<usize>>,
    frontier: VecDeque<usize>,
}

impl PathFinder {
    /// Creates a path finder with scratch grids sized for the battlefield.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes a shortest path from `attacker` to `target`.
    ///
    /// Every living unit in `units` blocks its cell, except the attacker and
    /// the target themselves. The returned path starts on the attacker's cell
    /// and ends on the target's cell. It is empty when either endpoint lies
    /// off the battlefield or when obstacles wall the target off.
    pub fn find_path<'a, I>(&mut self, attacker: &Unit, target: &Unit, units: I) -> Vec<Coordinate>
    where
        I: IntoIterator<Item = &'a Unit>,
    {
        let (Some(start), Some(goal)) = (attacker.cell().index(), target.cell().index()) else {
            return Vec::new();
        };

        self.reset();

        for unit in units {
            if !unit.is_alive() || unit.id() == attacker.id() || unit.id() == target.id() {
                continue;
            }
            if let Some(index) = unit.cell().index() {
                self.blocked[index] = true;
            }
        }

        self.search(start, goal)
    }

    fn reset(&mut self) {
        self.blocked.fill(false);
        self.visited.fill(false);
        self.predecessors.fill(None);
        self.frontier.clear();
    }

    fn search(&mut self, start: usize, goal: usize) -> Vec<Coordinate> {
        self.visited[start] = true;
        self.frontier.push_back(start);

        let mut reached = false;
        while let Some(current) = self.frontier.pop_front() {
            if current == goal {
                reached = true;
                break;
            }

            let Some(cell) = Coordinate::from_index(current) else {
                continue;
            };

            for neighbor in cell.neighbors() {
                let Some(index) = neighbor.index() else {
                    continue;
                };
                if self.visited[index] {
                    continue;
                }
                if self.blocked[index] && index != goal {
                    continue;
                }

                self.visited[index] = true;
                self.predecessors[index] = Some(current);
                self.frontier.push_back(index);
            }
        }

        if !reached {
            return Vec::new();
        }

        self.trace_back(start, goal)
    }

    fn trace_back(&self, start: usize, goal: usize) -> Vec<Coordinate> {
        let mut path = Vec::new();
        let mut cursor = goal;

        loop {
            let Some(cell) = Coordinate::from_index(cursor) else {
                return Vec::new();
            };
            path.push(cell);

            if cursor == start {
                break;
            }

            match self.predecessors[cursor] {
                Some(previous) => cursor = previous,
                None => return Vec::new(),
            }
        }

        path.reverse();
        path
    }
}

impl Default for PathFinder {
    fn default() -> Self {
        Self {
            blocked: vec![false; CELL_COUNT],
            visited: vec![false; CELL_COUNT],
            predecessors: vec![None; CELL_COUNT],
            frontier: VecDeque::with_capacity(CELL_COUNT),
        }
    }
}
