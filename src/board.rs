use std::fmt;

use crate::position::Position;

/// Bit flags for a single cell. A `Board` only ever stores `SPACE`, `WALL`,
/// or `BOX` — player and goal are tracked separately by `Sokoban` and never
/// set on the board itself.
pub mod cell {
    pub const SPACE: u8 = 0b0000;
    pub const WALL: u8 = 0b0001;
    pub const PLAYER: u8 = 0b0010;
    pub const BOX: u8 = 0b0100;
    pub const GOAL: u8 = 0b1000;
}

/// Dense row-major grid of cell bytes restricted to `{SPACE, WALL, BOX}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    cells: Vec<u8>,
    height: usize,
    width: usize,
}

impl Board {
    pub fn new(height: usize, width: usize) -> Self {
        Board {
            cells: vec![cell::SPACE; height * width],
            height,
            width,
        }
    }

    pub fn from_rows(rows: &[Vec<u8>]) -> Self {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.len());
        let mut cells = Vec::with_capacity(height * width);
        for row in rows {
            assert_eq!(row.len(), width, "ragged board rows");
            for &c in row {
                assert!(
                    c == cell::SPACE || c == cell::WALL || c == cell::BOX,
                    "board cells must be SPACE, WALL, or BOX"
                );
                cells.push(c);
            }
        }
        Board { cells, height, width }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    fn index(&self, pos: Position) -> usize {
        assert!(pos.in_bounds(self.height as i32, self.width as i32));
        pos.row as usize * self.width + pos.col as usize
    }

    pub fn get(&self, pos: Position) -> u8 {
        self.cells[self.index(pos)]
    }

    pub fn set(&mut self, pos: Position, value: u8) {
        assert!(value == cell::SPACE || value == cell::WALL || value == cell::BOX);
        let idx = self.index(pos);
        self.cells[idx] = value;
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        let width = self.width;
        (0..self.height).flat_map(move |r| (0..width).map(move |c| Position::new(r as i32, c as i32)))
    }

    pub fn box_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.positions().filter(move |&p| self.get(p) == cell::BOX)
    }

    pub fn box_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c == cell::BOX).count()
    }

    /// Extracts the `height` x `width` sub-board whose top-left corner is
    /// `(row, col)` in this board.
    pub fn sub(&self, row: usize, col: usize, height: usize, width: usize) -> Board {
        assert!(row + height <= self.height && col + width <= self.width);
        let mut rows = Vec::with_capacity(height);
        for r in 0..height {
            let mut out_row = Vec::with_capacity(width);
            for c in 0..width {
                out_row.push(self.get(Position::new((row + r) as i32, (col + c) as i32)));
            }
            rows.push(out_row);
        }
        Board::from_rows(&rows)
    }

    /// `SPACE` cells in `pattern` are "don't care"; every `WALL`/`BOX` cell
    /// in `pattern` must match the corresponding cell in `self` exactly.
    /// Equivalent to the bitwise `(sub | pattern) == sub` containment test,
    /// since the only cell values ever stored are `0`, `WALL`, or `BOX` and
    /// none of those share set bits.
    pub fn covers(&self, pattern: &Board) -> bool {
        if self.height != pattern.height || self.width != pattern.width {
            return false;
        }
        self.cells
            .iter()
            .zip(pattern.cells.iter())
            .all(|(&s, &p)| (s | p) == s)
    }

    /// Ternary row-major encoding: `sum(code(cell_i) * 3^i)`, with
    /// `code = {SPACE: 0, WALL: 1, BOX: 2}`. Bijective for a fixed shape.
    pub fn encode(&self) -> u64 {
        let mut acc: u64 = 0;
        let mut place: u64 = 1;
        for &c in &self.cells {
            let digit = match c {
                cell::SPACE => 0,
                cell::WALL => 1,
                cell::BOX => 2,
                _ => unreachable!(),
            };
            acc += digit * place;
            place *= 3;
        }
        acc
    }

    pub fn decode(height: usize, width: usize, mut code: u64) -> Board {
        let mut cells = vec![cell::SPACE; height * width];
        for slot in cells.iter_mut() {
            let digit = code % 3;
            code /= 3;
            *slot = match digit {
                0 => cell::SPACE,
                1 => cell::WALL,
                2 => cell::BOX,
                _ => unreachable!(),
            };
        }
        Board { cells, height, width }
    }

    fn flip_rows(&self) -> Board {
        let mut rows: Vec<Vec<u8>> = (0..self.height)
            .map(|r| self.cells[r * self.width..(r + 1) * self.width].to_vec())
            .collect();
        rows.reverse();
        Board::from_rows(&rows)
    }

    fn flip_cols(&self) -> Board {
        let rows: Vec<Vec<u8>> = (0..self.height)
            .map(|r| {
                let mut row = self.cells[r * self.width..(r + 1) * self.width].to_vec();
                row.reverse();
                row
            })
            .collect();
        Board::from_rows(&rows)
    }

    /// 90 degree counter-clockwise rotation: swaps height/width.
    fn rotate_ccw90(&self) -> Board {
        let mut rows = vec![vec![cell::SPACE; self.height]; self.width];
        for r in 0..self.height {
            for c in 0..self.width {
                rows[self.width - 1 - c][r] = self.get(Position::new(r as i32, c as i32));
            }
        }
        Board::from_rows(&rows)
    }

    /// All boards reachable from this one via the isometry group of a
    /// rectangle (0/90 degree rotation composed with identity/h-flip/v-flip/
    /// 180-rotation), deduplicated structurally and in first-seen order.
    pub fn isometric_boards(&self) -> Vec<Board> {
        let variants = [
            self.clone(),
            self.flip_rows(),
            self.flip_cols(),
            self.flip_rows().flip_cols(),
        ];
        let mut out: Vec<Board> = Vec::with_capacity(8);
        for v in &variants {
            for candidate in [v.clone(), v.rotate_ccw90()] {
                if !out.contains(&candidate) {
                    out.push(candidate);
                }
            }
        }
        out
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.height {
            let row: String = (0..self.width)
                .map(|c| match self.get(Position::new(r as i32, c as i32)) {
                    cell::SPACE => ' ',
                    cell::WALL => '#',
                    cell::BOX => '$',
                    _ => unreachable!(),
                })
                .collect();
            writeln!(f, "{}", row.trim_end())?;
        }
        Ok(())
    }
}
