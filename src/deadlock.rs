use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use crate::board::Board;
use crate::error::ParseError;
use crate::position::Position;

/// Which boxes-on-goals context a sub-board match is evaluated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Skip any sliding window that overlaps a goal cell — a box resting on
    /// a goal inside the window may be intentionally stuck there, so the
    /// pattern can't be trusted against the puzzle's actual goal set.
    Dynamic,
    /// Skip the whole check if any box anywhere is already on a goal — the
    /// static table assumes every free cell is a goal, which stops being a
    /// safe comparison once a box has already been delivered.
    Static,
    /// No skipping; match unconditionally.
    Unmodified,
}

/// A deadlock pattern table: for each sub-board shape, the set of
/// ternary-encoded boards known to be unsolvable once reached.
#[derive(Debug, Default, Clone)]
pub struct DeadlockTable {
    patterns: HashMap<(u8, u8), HashSet<u64>>,
}

impl DeadlockTable {
    pub fn new() -> Self {
        DeadlockTable { patterns: HashMap::new() }
    }

    pub fn insert(&mut self, area: (u8, u8), board: &Board) {
        self.patterns.entry(area).or_default().insert(board.encode());
    }

    pub fn areas(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.patterns.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.patterns.values().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Expands `board`'s isometric orbit, don't-care-substituting every
    /// originally-`SPACE` cell with `{SPACE, WALL, BOX}`, and inserts every
    /// resulting sub-board. Mirrors
    /// `gen_deadlock_table_from_basis_same_size`.
    pub fn add_basis_pattern(&mut self, board: &Board) {
        let area = (board.height() as u8, board.width() as u8);
        for variant in board.isometric_boards() {
            let spaces: Vec<Position> = variant
                .positions()
                .filter(|&p| variant.get(p) == crate::board::cell::SPACE)
                .collect();
            let n = spaces.len();
            for config in 0..3u32.pow(n as u32) {
                let mut filled = variant.clone();
                let mut rem = config;
                for &pos in &spaces {
                    let digit = rem % 3;
                    rem /= 3;
                    let value = match digit {
                        0 => crate::board::cell::SPACE,
                        1 => crate::board::cell::WALL,
                        2 => crate::board::cell::BOX,
                        _ => unreachable!(),
                    };
                    filled.set(pos, value);
                }
                self.insert(area, &filled);
            }
        }
    }

    /// Sliding-window sub-board match against `board`, honoring `mode`'s
    /// goal-overlap skipping rules.
    pub fn matches(&self, board: &Board, goals: &[Position], mode: MatchMode) -> bool {
        if mode == MatchMode::Static && board.box_positions().any(|p| goals.contains(&p)) {
            return false;
        }

        for (&(h, w), patterns) in &self.patterns {
            let (h, w) = (h as usize, w as usize);
            if h > board.height() || w > board.width() {
                continue;
            }
            for dy in 0..=(board.height() - h) {
                for dx in 0..=(board.width() - w) {
                    if mode == MatchMode::Dynamic
                        && goals.iter().any(|g| {
                            let row = g.row;
                            let col = g.col;
                            row >= dy as i32 && row < (dy + h) as i32 && col >= dx as i32 && col < (dx + w) as i32
                        })
                    {
                        continue;
                    }
                    let sub = board.sub(dy, dx, h, w);
                    if patterns.contains(&sub.encode()) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Writes every pattern of a single `area` shape as little-endian `u32`
    /// ternary encodings, prefixed by the `(height, width)` area shape.
    pub fn write_binary(&self, area: (u8, u8), path: impl AsRef<Path>) -> Result<(), ParseError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&[area.0, area.1])?;
        if let Some(patterns) = self.patterns.get(&area) {
            for &code in patterns {
                let value = u32::try_from(code).expect("ternary code exceeds u32 range");
                writer.write_all(&value.to_le_bytes())?;
            }
        }
        Ok(())
    }

    /// Reads a table file, optionally checking its declared `(height,
    /// width)` area header against `expected_area` before trusting its
    /// contents.
    pub fn read_binary(
        path: impl AsRef<Path>,
        expected_area: Option<(u8, u8)>,
    ) -> Result<(DeadlockTable, (u8, u8)), ParseError> {
        let mut file = File::open(path)?;
        let mut header = [0u8; 2];
        file.read_exact(&mut header).map_err(|_| ParseError::TruncatedTable)?;
        let area = (header[0], header[1]);
        if let Some(expected) = expected_area {
            if expected != area {
                return Err(ParseError::AreaMismatch { expected, found: area });
            }
        }

        let mut rest = Vec::new();
        file.read_to_end(&mut rest)?;
        if rest.len() % 4 != 0 {
            return Err(ParseError::TruncatedTable);
        }

        let mut table = DeadlockTable::new();
        for chunk in rest.chunks_exact(4) {
            let code = u32::from_le_bytes(chunk.try_into().unwrap());
            table.patterns.entry(area).or_default().insert(code as u64);
        }
        Ok((table, area))
    }
}

/// Parses the original Python-style nested-list basis text format: each
/// board occupies a run of lines between one starting `[[` and the matching
/// `]]`, with whitespace and brackets stripped and each remaining character
/// a single cell-value digit (`0` = SPACE, `1` = WALL, `4` = BOX).
pub fn load_basis(text: &str) -> Result<Vec<Board>, ParseError> {
    let mut boards = Vec::new();
    let mut current_rows: Vec<Vec<u8>> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with("[[") {
            current_rows.clear();
        }
        let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
        let row: Vec<u8> = digits
            .chars()
            .map(|c| c.to_digit(10).unwrap() as u8)
            .collect();
        for &v in &row {
            if v != crate::board::cell::SPACE && v != crate::board::cell::WALL && v != crate::board::cell::BOX {
                return Err(ParseError::InvalidBasis(format!("unexpected cell value {v}")));
            }
        }
        current_rows.push(row);
        if trimmed.ends_with("]]") {
            boards.push(Board::from_rows(&current_rows));
        }
    }
    Ok(boards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::cell;

    fn pattern() -> Board {
        Board::from_rows(&[vec![cell::WALL, cell::BOX], vec![cell::SPACE, cell::WALL]])
    }

    #[test]
    fn insert_and_match_exact_pattern() {
        let mut table = DeadlockTable::new();
        table.insert((2, 2), &pattern());
        assert!(table.matches(&pattern(), &[], MatchMode::Unmodified));
    }

    #[test]
    fn basis_expansion_covers_dont_care_substitutions() {
        let board = Board::from_rows(&[vec![cell::WALL, cell::BOX]]);
        let mut table = DeadlockTable::new();
        table.add_basis_pattern(&board);
        // the only SPACE cell isn't present here (both cells are set), so
        // the basis pattern itself must be one of the inserted patterns.
        assert!(table.matches(&board, &[], MatchMode::Unmodified));
    }

    #[test]
    fn dynamic_mode_skips_windows_overlapping_goals() {
        let mut table = DeadlockTable::new();
        table.insert((2, 2), &pattern());
        let goals = vec![Position::new(0, 0)];
        assert!(!table.matches(&pattern(), &goals, MatchMode::Dynamic));
    }

    #[test]
    fn static_mode_skips_once_any_box_is_on_a_goal() {
        let mut table = DeadlockTable::new();
        table.insert((2, 2), &pattern());
        let goals = vec![Position::new(0, 1)]; // the BOX cell in `pattern`
        assert!(!table.matches(&pattern(), &goals, MatchMode::Static));
    }

    #[test]
    fn binary_round_trip() {
        let mut table = DeadlockTable::new();
        table.insert((2, 2), &pattern());
        let dir = std::env::temp_dir().join("sokoban_engine_deadlock_test.bin");
        table.write_binary((2, 2), &dir).unwrap();
        let (loaded, area) = DeadlockTable::read_binary(&dir, Some((2, 2))).unwrap();
        assert_eq!(area, (2, 2));
        assert!(loaded.matches(&pattern(), &[], MatchMode::Unmodified));
        let _ = std::fs::remove_file(&dir);
    }

    #[test]
    fn read_binary_rejects_an_area_mismatch() {
        let mut table = DeadlockTable::new();
        table.insert((2, 2), &pattern());
        let dir = std::env::temp_dir().join("sokoban_engine_deadlock_area_mismatch_test.bin");
        table.write_binary((2, 2), &dir).unwrap();

        let err = DeadlockTable::read_binary(&dir, Some((3, 3))).unwrap_err();
        assert!(matches!(
            err,
            ParseError::AreaMismatch {
                expected: (3, 3),
                found: (2, 2)
            }
        ));
        let _ = std::fs::remove_file(&dir);
    }

    #[test]
    fn load_basis_parses_single_digit_nested_list_format() {
        let text = "[[01\n14]]\n";
        let boards = load_basis(text).unwrap();
        assert_eq!(boards.len(), 1);
        assert_eq!(boards[0].height(), 2);
        assert_eq!(boards[0].width(), 2);
    }
}
