use std::collections::{HashMap, HashSet, VecDeque};

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::action::Push;
use crate::bits::LazyBitboard;
use crate::heuristic::{Cost, Heuristic};
use crate::pqueue::PriorityQueue;
use crate::sokoban::Sokoban;

/// One step of a solution: the push applied, and the state it leads to.
#[derive(Debug, Clone)]
pub struct SolutionStep {
    pub action: Push,
    pub state: Sokoban,
}

/// The four search engines from the component design: uninformed
/// breadth/depth-first search, and heuristic-guided greedy/A* search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchEngine {
    Bfs,
    Dfs,
    Greedy,
    AStar,
}

/// Reconstructs the push sequence from `start` to `goal` by walking `prev`
/// backwards.
fn reconstruct(prev: &HashMap<Sokoban, (Sokoban, Push)>, goal: &Sokoban) -> Vec<SolutionStep> {
    let mut steps = Vec::new();
    let mut current = goal.clone();
    while let Some((parent, action)) = prev.get(&current) {
        steps.push(SolutionStep {
            action: *action,
            state: current.clone(),
        });
        current = parent.clone();
    }
    steps.reverse();
    steps
}

impl SearchEngine {
    /// Searches from `start` for a solved state, expanding at most
    /// `max_nodes` states. Returns `None` both when the budget is exhausted
    /// and when the puzzle is genuinely unsolvable — the engine has no way
    /// to tell those apart, since its successor function is exhaustive and
    /// sound but gives no proof of infeasibility short of exploring
    /// everything.
    pub fn solve(
        &self,
        start: &Sokoban,
        heuristic: &Heuristic,
        allow_off_board: bool,
        max_nodes: usize,
        seed: Option<u64>,
    ) -> Option<Vec<SolutionStep>> {
        let mut scratch = LazyBitboard::new();
        let start = start.normalize(&mut scratch);
        let mut rng = seed.map(ChaCha8Rng::seed_from_u64);

        match self {
            SearchEngine::Bfs => {
                self.solve_fifo_lifo(&start, allow_off_board, max_nodes, &mut scratch, rng.as_mut(), true)
            }
            SearchEngine::Dfs => {
                self.solve_fifo_lifo(&start, allow_off_board, max_nodes, &mut scratch, rng.as_mut(), false)
            }
            SearchEngine::Greedy => self.solve_greedy(&start, heuristic, allow_off_board, max_nodes, &mut scratch),
            SearchEngine::AStar => self.solve_astar(&start, heuristic, allow_off_board, max_nodes, &mut scratch),
        }
    }

    fn solve_fifo_lifo(
        &self,
        start: &Sokoban,
        allow_off_board: bool,
        max_nodes: usize,
        scratch: &mut LazyBitboard,
        mut rng: Option<&mut ChaCha8Rng>,
        fifo: bool,
    ) -> Option<Vec<SolutionStep>> {
        let mut visited: HashSet<Sokoban> = HashSet::new();
        let mut prev: HashMap<Sokoban, (Sokoban, Push)> = HashMap::new();
        let mut frontier: VecDeque<Sokoban> = VecDeque::new();

        visited.insert(start.clone());
        frontier.push_back(start.clone());
        let mut expanded = 0usize;

        while let Some(current) = if fifo { frontier.pop_front() } else { frontier.pop_back() } {
            if current.solved() {
                return Some(reconstruct(&prev, &current));
            }
            expanded += 1;
            if expanded > max_nodes {
                return None;
            }

            let mut successors = current.neighbors(allow_off_board, scratch);
            if let Some(rng) = rng.as_deref_mut() {
                successors.shuffle(rng);
            }
            for (next, action) in successors {
                if visited.insert(next.clone()) {
                    prev.insert(next.clone(), (current.clone(), action));
                    frontier.push_back(next);
                }
            }
        }
        None
    }

    fn solve_greedy(
        &self,
        start: &Sokoban,
        heuristic: &Heuristic,
        allow_off_board: bool,
        max_nodes: usize,
        scratch: &mut LazyBitboard,
    ) -> Option<Vec<SolutionStep>> {
        let mut visited: HashSet<Sokoban> = HashSet::new();
        let mut prev: HashMap<Sokoban, (Sokoban, Push)> = HashMap::new();
        let mut frontier: Vec<Sokoban> = vec![start.clone()];
        visited.insert(start.clone());
        let mut expanded = 0usize;

        while let Some(current) = frontier.pop() {
            if current.solved() {
                return Some(reconstruct(&prev, &current));
            }
            expanded += 1;
            if expanded > max_nodes {
                return None;
            }

            let mut successors = current.neighbors(allow_off_board, scratch);
            // descending by heuristic value, so the lowest-h (best) successor
            // ends up last in the list and is popped first
            successors.sort_by(|(a, _), (b, _)| heuristic.evaluate(b).cmp(&heuristic.evaluate(a)));
            for (next, action) in successors {
                if visited.insert(next.clone()) {
                    prev.insert(next.clone(), (current.clone(), action));
                    frontier.push(next);
                }
            }
        }
        None
    }

    fn solve_astar(
        &self,
        start: &Sokoban,
        heuristic: &Heuristic,
        allow_off_board: bool,
        max_nodes: usize,
        scratch: &mut LazyBitboard,
    ) -> Option<Vec<SolutionStep>> {
        let mut prev: HashMap<Sokoban, (Sokoban, Push)> = HashMap::new();
        let mut g_map: HashMap<Sokoban, u32> = HashMap::new();
        let mut f_map: HashMap<Sokoban, u32> = HashMap::new();
        let mut visited: HashSet<Sokoban> = HashSet::new();
        let mut open: PriorityQueue<Sokoban> = PriorityQueue::new();

        g_map.insert(start.clone(), 0);
        let h0 = heuristic.evaluate(start);
        if h0 == Cost::INFINITE {
            return None;
        }
        f_map.insert(start.clone(), h0.0);
        open.push(h0.0 as usize, start.clone());

        let mut expanded = 0usize;
        while let Some(current) = open.pop_min() {
            // stale entry: a cheaper path to `current` was found after this
            // one was enqueued
            let current_g = *g_map.get(&current).unwrap_or(&u32::MAX);
            let current_f = current_g.saturating_add(heuristic.evaluate(&current).0);
            if f_map.get(&current).copied() != Some(current_f) {
                continue;
            }
            if visited.contains(&current) {
                continue;
            }
            if expanded >= max_nodes {
                return None;
            }
            expanded += 1;
            visited.insert(current.clone());

            if current.solved() {
                return Some(reconstruct(&prev, &current));
            }

            for (next, action) in current.neighbors(allow_off_board, scratch) {
                let h = heuristic.evaluate(&next);
                if h == Cost::INFINITE {
                    continue;
                }
                let tentative_g = current_g + 1;
                let better = tentative_g < *g_map.get(&next).unwrap_or(&u32::MAX);
                if !better {
                    continue;
                }
                g_map.insert(next.clone(), tentative_g);
                let f = tentative_g + h.0;
                f_map.insert(next.clone(), f);
                prev.insert(next.clone(), (current.clone(), action));
                open.push(f as usize, next);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{cell, Board};
    use crate::position::Position;

    fn one_push_puzzle() -> Sokoban {
        let board = Board::from_rows(&[
            vec![cell::WALL, cell::WALL, cell::WALL, cell::WALL, cell::WALL],
            vec![cell::WALL, cell::SPACE, cell::BOX, cell::SPACE, cell::WALL],
            vec![cell::WALL, cell::WALL, cell::WALL, cell::WALL, cell::WALL],
        ]);
        Sokoban::new(board, Position::new(1, 1), vec![Position::new(1, 3)])
    }

    fn already_solved() -> Sokoban {
        let board = Board::from_rows(&[
            vec![cell::WALL, cell::WALL, cell::WALL, cell::WALL],
            vec![cell::WALL, cell::SPACE, cell::BOX, cell::WALL],
            vec![cell::WALL, cell::WALL, cell::WALL, cell::WALL],
        ]);
        Sokoban::new(board, Position::new(1, 1), vec![Position::new(1, 2)])
    }

    fn impossible_puzzle() -> Sokoban {
        // box in a corner with no goal it could ever reach
        let board = Board::from_rows(&[
            vec![cell::WALL, cell::WALL, cell::WALL, cell::WALL],
            vec![cell::WALL, cell::BOX, cell::SPACE, cell::WALL],
            vec![cell::WALL, cell::SPACE, cell::SPACE, cell::WALL],
            vec![cell::WALL, cell::WALL, cell::WALL, cell::WALL],
        ]);
        Sokoban::new(board, Position::new(2, 2), vec![Position::new(2, 1)])
    }

    /// A box one step from the padded board's open edge, with no goal at
    /// all. Only reachable as "solved" (zero boxes remaining) if a push is
    /// allowed to carry the box off the board entirely.
    fn box_escapable_off_board() -> Sokoban {
        let board = Board::from_rows(&[
            vec![cell::WALL, cell::WALL, cell::WALL],
            vec![cell::WALL, cell::SPACE, cell::BOX],
            vec![cell::WALL, cell::WALL, cell::WALL],
        ]);
        Sokoban::new(board, Position::new(1, 1), vec![])
    }

    #[test]
    fn bfs_solves_one_push_puzzle() {
        let solution = SearchEngine::Bfs
            .solve(&one_push_puzzle(), &Heuristic::NoHeuristic, false, 1_000, None)
            .unwrap();
        assert_eq!(solution.len(), 2);
        assert!(solution.last().unwrap().state.solved());
    }

    #[test]
    fn already_solved_returns_empty_path() {
        let solution = SearchEngine::Bfs
            .solve(&already_solved(), &Heuristic::NoHeuristic, false, 1_000, None)
            .unwrap();
        assert!(solution.is_empty());
    }

    #[test]
    fn dfs_finds_a_solution() {
        let solution =
            SearchEngine::Dfs.solve(&one_push_puzzle(), &Heuristic::NoHeuristic, false, 1_000, None);
        assert!(solution.is_some());
    }

    #[test]
    fn greedy_finds_a_solution() {
        let solution = SearchEngine::Greedy.solve(
            &one_push_puzzle(),
            &Heuristic::RemainingBoxes,
            false,
            1_000,
            None,
        );
        assert!(solution.is_some());
    }

    #[test]
    fn astar_finds_optimal_solution() {
        let solution = SearchEngine::AStar
            .solve(&one_push_puzzle(), &Heuristic::ManhattanDist, false, 1_000, None)
            .unwrap();
        assert_eq!(solution.len(), 2);
    }

    #[test]
    fn impossible_puzzle_returns_none() {
        let solution =
            SearchEngine::Bfs.solve(&impossible_puzzle(), &Heuristic::NoHeuristic, false, 10_000, None);
        assert!(solution.is_none());
    }

    #[test]
    fn budget_exhaustion_returns_none() {
        let solution = SearchEngine::Bfs.solve(&one_push_puzzle(), &Heuristic::NoHeuristic, false, 0, None);
        assert!(solution.is_none());
    }

    #[test]
    fn seeded_bfs_is_deterministic() {
        let a = SearchEngine::Bfs.solve(&one_push_puzzle(), &Heuristic::NoHeuristic, false, 1_000, Some(7));
        let b = SearchEngine::Bfs.solve(&one_push_puzzle(), &Heuristic::NoHeuristic, false, 1_000, Some(7));
        assert_eq!(a.map(|s| s.len()), b.map(|s| s.len()));
    }

    #[test]
    fn off_board_push_is_unreachable_without_the_flag() {
        let solution =
            SearchEngine::Bfs.solve(&box_escapable_off_board(), &Heuristic::NoHeuristic, false, 1_000, None);
        assert!(solution.is_none());
    }

    #[test]
    fn off_board_push_solves_when_allowed() {
        let solution =
            SearchEngine::Bfs.solve(&box_escapable_off_board(), &Heuristic::NoHeuristic, true, 1_000, None);
        assert!(solution.is_some());
    }
}
