use std::ops::Add;
use std::rc::Rc;

use crate::deadlock::{DeadlockTable, MatchMode};
use crate::hungarian::hungarian_algorithm;
use crate::position::Position;
use crate::sokoban::Sokoban;

/// A push-count lower bound, or "unsolvable from here" (`Cost::INFINITE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cost(pub u32);

impl Cost {
    pub const INFINITE: Cost = Cost(u32::MAX);

    pub fn is_finite(self) -> bool {
        self != Cost::INFINITE
    }
}

impl Add for Cost {
    type Output = Cost;

    fn add(self, other: Cost) -> Cost {
        if self == Cost::INFINITE || other == Cost::INFINITE {
            Cost::INFINITE
        } else {
            Cost(self.0.saturating_add(other.0))
        }
    }
}

impl From<Cost> for usize {
    fn from(cost: Cost) -> usize {
        cost.0 as usize
    }
}

fn manhattan(a: Position, b: Position) -> u32 {
    a.row.abs_diff(b.row) + a.col.abs_diff(b.col)
}

/// A closed set of admissible (or, for `RemainingBoxes`, tie-breaking-only)
/// lower-bound heuristics, combined by pointwise maximum — which preserves
/// admissibility, since the max of admissible lower bounds is itself a
/// lower bound on the true cost.
///
/// `.max(other)` builds a `MaxOf` variant rather than mutating a hidden
/// list: the combined heuristic is a new value, not a stateful wrapper
/// around the originals.
#[derive(Debug, Clone)]
pub enum Heuristic {
    NoHeuristic,
    /// Number of boxes not currently resting on a goal. Used as the default
    /// tie-breaker for greedy search. NOT a sound admissible bound under
    /// unit push cost (a box can be pushed onto and back off a goal), so it
    /// must not be relied on for A* optimality — only `MaxOf` components
    /// that are individually admissible guarantee an admissible combination.
    RemainingBoxes,
    /// Sum, over boxes, of the Manhattan distance to the nearest goal.
    ManhattanDist,
    /// Optimal box-to-goal assignment cost (Hungarian algorithm) using
    /// Manhattan distance as the per-pair cost — strictly tighter than
    /// `ManhattanDist`'s independent nearest-goal sum.
    MinMatching,
    /// Two-valued {0, +inf} heuristic: +inf exactly when the current board
    /// matches a known deadlock pattern.
    Deadlock(Rc<DeadlockTable>, MatchMode),
    MaxOf(Vec<Heuristic>),
}

impl Heuristic {
    pub fn evaluate(&self, state: &Sokoban) -> Cost {
        match self {
            Heuristic::NoHeuristic => Cost(0),
            Heuristic::RemainingBoxes => {
                let misplaced = state
                    .board()
                    .box_positions()
                    .filter(|p| !state.goals().contains(p))
                    .count();
                Cost(misplaced as u32)
            }
            Heuristic::ManhattanDist => {
                let boxes: Vec<Position> = state.board().box_positions().collect();
                if state.goals().is_empty() {
                    return if boxes.is_empty() { Cost(0) } else { Cost::INFINITE };
                }
                let mut total = 0u32;
                for b in boxes {
                    let best = state.goals().iter().map(|&g| manhattan(b, g)).min().unwrap();
                    total += best;
                }
                Cost(total)
            }
            Heuristic::MinMatching => {
                let boxes: Vec<Position> = state.board().box_positions().collect();
                if boxes.is_empty() {
                    return Cost(0);
                }
                if state.goals().len() != boxes.len() {
                    return Cost::INFINITE;
                }
                let matrix: Vec<Vec<u32>> = boxes
                    .iter()
                    .map(|&b| state.goals().iter().map(|&g| manhattan(b, g)).collect())
                    .collect();
                Cost(hungarian_algorithm(&matrix))
            }
            Heuristic::Deadlock(table, mode) => {
                if table.matches(state.board(), state.goals(), *mode) {
                    Cost::INFINITE
                } else {
                    Cost(0)
                }
            }
            Heuristic::MaxOf(list) => list
                .iter()
                .map(|h| h.evaluate(state))
                .max()
                .unwrap_or(Cost(0)),
        }
    }

    /// Builds the pointwise maximum of `self` and `other`, flattening
    /// nested `MaxOf`s rather than nesting them.
    pub fn max(self, other: Heuristic) -> Heuristic {
        match (self, other) {
            (Heuristic::MaxOf(mut a), Heuristic::MaxOf(b)) => {
                a.extend(b);
                Heuristic::MaxOf(a)
            }
            (Heuristic::MaxOf(mut a), other) => {
                a.push(other);
                Heuristic::MaxOf(a)
            }
            (this, Heuristic::MaxOf(mut b)) => {
                b.insert(0, this);
                Heuristic::MaxOf(b)
            }
            (a, b) => Heuristic::MaxOf(vec![a, b]),
        }
    }
}
