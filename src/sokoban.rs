use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use arrayvec::ArrayVec;

use crate::action::Push;
use crate::bits::{LazyBitboard, MAX_SIZE};
use crate::board::{cell, Board};
use crate::direction::ALL_DIRECTIONS;
use crate::position::Position;
use crate::zobrist;

const MAX_CELLS: usize = MAX_SIZE * MAX_SIZE;

/// A canonical Sokoban puzzle state: a fixed board, the player's position,
/// and the (fixed, for the lifetime of one puzzle) set of goal cells.
///
/// States handed out by `neighbors` are always in canonical form: the
/// player has been repositioned to the lexicographically-smallest cell in
/// its reachable region, so that two states differing only in which
/// reachable cell the player happens to stand on compare equal.
#[derive(Debug, Clone)]
pub struct Sokoban {
    board: Board,
    player: Position,
    goals: Vec<Position>,
}

impl Sokoban {
    pub fn new(board: Board, player: Position, mut goals: Vec<Position>) -> Self {
        goals.sort();
        Sokoban { board, player, goals }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn player(&self) -> Position {
        self.player
    }

    pub fn goals(&self) -> &[Position] {
        &self.goals
    }

    pub fn solved(&self) -> bool {
        self.board.box_positions().all(|p| self.goals.contains(&p))
    }

    /// Marks every cell reachable from `self.player` without crossing a
    /// wall or a box into `scratch`. `scratch` is caller-owned so that one
    /// buffer can be reused across every successor expansion in a solve
    /// instead of allocating a fresh bitboard per call.
    pub fn reachable_region(&self, scratch: &mut LazyBitboard) {
        scratch.reset();
        let height = self.board.height() as i32;
        let width = self.board.width() as i32;

        let mut stack: ArrayVec<Position, MAX_CELLS> = ArrayVec::new();
        stack.push(self.player);
        scratch.set(self.player.col as u8, self.player.row as u8);

        while let Some(pos) = stack.pop() {
            for dir in ALL_DIRECTIONS {
                let next = pos + dir;
                if !next.in_bounds(height, width) {
                    continue;
                }
                if scratch.get(next.col as u8, next.row as u8) {
                    continue;
                }
                let c = self.board.get(next);
                if c == cell::WALL || c == cell::BOX {
                    continue;
                }
                scratch.set(next.col as u8, next.row as u8);
                stack.push(next);
            }
        }
    }

    /// Returns a copy of this state with the player moved to the
    /// lexicographically-smallest `(row, col)` cell in its reachable
    /// region.
    pub fn normalize(&self, scratch: &mut LazyBitboard) -> Sokoban {
        self.reachable_region(scratch);
        let canonical = self
            .board
            .positions()
            .find(|p| scratch.get(p.col as u8, p.row as u8))
            .expect("player's own cell is always reachable");
        Sokoban {
            board: self.board.clone(),
            player: canonical,
            goals: self.goals.clone(),
        }
    }

    /// Enumerates every legal push from this state, each paired with the
    /// resulting (already normalized) successor state.
    ///
    /// `allow_off_board`: when true, a push whose destination falls outside
    /// the board is legal and removes the box from play instead of being
    /// rejected. Used only by the deadlock basis generator's padded
    /// sub-board search, where "push the box off the frame" is the win
    /// condition being tested; normal play and all search engines pass
    /// `false`.
    pub fn neighbors(&self, allow_off_board: bool, scratch: &mut LazyBitboard) -> Vec<(Sokoban, Push)> {
        self.reachable_region(scratch);
        let height = self.board.height() as i32;
        let width = self.board.width() as i32;

        let mut out = Vec::new();
        for box_pos in self.board.box_positions().collect::<Vec<_>>() {
            for dir in ALL_DIRECTIONS {
                let player_origin = box_pos - dir;
                if !player_origin.in_bounds(height, width) {
                    continue;
                }
                if !scratch.get(player_origin.col as u8, player_origin.row as u8) {
                    continue;
                }

                let dest = box_pos + dir;
                let dest_in_bounds = dest.in_bounds(height, width);
                if dest_in_bounds {
                    if self.board.get(dest) != cell::SPACE {
                        continue;
                    }
                } else if !allow_off_board {
                    continue;
                }

                let mut new_board = self.board.clone();
                new_board.set(box_pos, cell::SPACE);
                if dest_in_bounds {
                    new_board.set(dest, cell::BOX);
                }
                let new_state = Sokoban {
                    board: new_board,
                    player: box_pos,
                    goals: self.goals.clone(),
                };
                out.push((new_state.normalize(scratch), Push::new(box_pos, dir)));
            }
        }
        out
    }
}

impl PartialEq for Sokoban {
    fn eq(&self, other: &Self) -> bool {
        self.board == other.board && self.player == other.player && self.goals == other.goals
    }
}

impl Eq for Sokoban {}

/// Hashed via XOR of per-position Zobrist values rather than the raw board
/// bytes: box/goal membership is a set, not a sequence, so the hash must not
/// depend on iteration order (and `goals` is already kept sorted, but this
/// makes the invariant structural rather than incidental).
impl Hash for Sokoban {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let table = zobrist::table();
        let mut acc = table.player_hash(self.player);
        for pos in self.board.box_positions() {
            acc ^= table.box_hash(pos);
        }
        for &goal in &self.goals {
            acc ^= table.goal_hash(goal);
        }
        acc.hash(state);
    }
}

/// Total order used to break ties in a priority queue deterministically:
/// compares by board encoding, then player, then goal list.
impl PartialOrd for Sokoban {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Sokoban {
    fn cmp(&self, other: &Self) -> Ordering {
        self.board
            .encode()
            .cmp(&other.board.encode())
            .then_with(|| self.player.cmp(&other.player))
            .then_with(|| self.goals.cmp(&other.goals))
    }
}

impl fmt::Display for Sokoban {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.board.height() {
            let mut row = String::with_capacity(self.board.width());
            for c in 0..self.board.width() {
                let pos = Position::new(r as i32, c as i32);
                let is_player = pos == self.player;
                let is_goal = self.goals.contains(&pos);
                let glyph = match (self.board.get(pos), is_player, is_goal) {
                    (cell::WALL, _, _) => '#',
                    (cell::BOX, _, true) => '*',
                    (cell::BOX, _, false) => '$',
                    (cell::SPACE, true, true) => '&',
                    (cell::SPACE, true, false) => '@',
                    (cell::SPACE, false, true) => '.',
                    (cell::SPACE, false, false) => ' ',
                    _ => unreachable!(),
                };
                row.push(glyph);
            }
            writeln!(f, "{}", row.trim_end())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::Direction;

    fn board(rows: &[&str]) -> (Board, Position, Vec<Position>) {
        let mut cells = Vec::new();
        let mut player = Position::new(0, 0);
        let mut goals = Vec::new();
        for (r, line) in rows.iter().enumerate() {
            let mut row = Vec::new();
            for (c, ch) in line.chars().enumerate() {
                let pos = Position::new(r as i32, c as i32);
                match ch {
                    '#' => row.push(cell::WALL),
                    '$' => row.push(cell::BOX),
                    '.' => {
                        row.push(cell::SPACE);
                        goals.push(pos);
                    }
                    '@' => {
                        row.push(cell::SPACE);
                        player = pos;
                    }
                    _ => row.push(cell::SPACE),
                }
            }
            cells.push(row);
        }
        (Board::from_rows(&cells), player, goals)
    }

    #[test]
    fn solved_detects_all_boxes_on_goals() {
        let (b, p, g) = board(&["#####", "#@$.#", "#####"]);
        let mut scratch = LazyBitboard::new();
        let state = Sokoban::new(b, p, g).normalize(&mut scratch);
        let mut successors = state.neighbors(false, &mut scratch);
        let (next, _) = successors
            .iter()
            .position(|(_, push)| push.direction == Direction::Right)
            .map(|i| successors.remove(i))
            .expect("pushing the box right should be a legal move");
        assert!(next.solved());
    }

    #[test]
    fn normalize_is_idempotent() {
        let (b, p, g) = board(&["#####", "#@ $.#", "#####"]);
        let mut scratch = LazyBitboard::new();
        let state = Sokoban::new(b, p, g);
        let once = state.normalize(&mut scratch);
        let twice = once.normalize(&mut scratch);
        assert_eq!(once, twice);
    }

    #[test]
    fn push_is_deterministic() {
        let (b, p, g) = board(&["#####", "#@$.#", "#####"]);
        let mut scratch = LazyBitboard::new();
        let state = Sokoban::new(b, p, g).normalize(&mut scratch);
        let first = state.neighbors(false, &mut scratch);
        let second = state.neighbors(false, &mut scratch);
        assert_eq!(first.len(), second.len());
        for ((s1, a1), (s2, a2)) in first.iter().zip(second.iter()) {
            assert_eq!(s1, s2);
            assert_eq!(a1, a2);
        }
    }

    #[test]
    fn off_board_push_removes_box_when_allowed() {
        // box at the right edge, pushed right off the padded frame
        let (b, p, g) = board(&["#####", "#@ $ ", "#####"]);
        let mut scratch = LazyBitboard::new();
        let state = Sokoban::new(b, p, g).normalize(&mut scratch);
        let without_flag = state.neighbors(false, &mut scratch);
        let with_flag = state.neighbors(true, &mut scratch);
        assert!(with_flag.len() >= without_flag.len());
    }

    #[test]
    fn equal_states_have_equal_hash() {
        use std::collections::hash_map::DefaultHasher;
        let (b, p, g) = board(&["#####", "#@$.#", "#####"]);
        let mut scratch = LazyBitboard::new();
        let a = Sokoban::new(b.clone(), p, g.clone()).normalize(&mut scratch);
        let b2 = Sokoban::new(b, p, g).normalize(&mut scratch);
        assert_eq!(a, b2);
        let mut h1 = DefaultHasher::new();
        a.hash(&mut h1);
        let mut h2 = DefaultHasher::new();
        b2.hash(&mut h2);
        assert_eq!(h1.finish(), h2.finish());
    }
}
