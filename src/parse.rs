use crate::board::{cell, Board};
use crate::error::ParseError;
use crate::position::Position;
use crate::sokoban::Sokoban;

/// Parses puzzle text in the Microban alphabet: `#` wall, ` ` space, `@`
/// player, `$` box, `.` goal, `&`/`+` player-on-goal, `*` box-on-goal. Any
/// other character folds to space. Rows are zero-padded on the right to the
/// width of the longest row.
pub fn parse_puzzle(text: &str) -> Result<Sokoban, ParseError> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() {
        return Err(ParseError::EmptyInput);
    }
    let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);

    let mut rows: Vec<Vec<u8>> = Vec::with_capacity(lines.len());
    let mut player = None;
    let mut goals = Vec::new();
    let mut box_count = 0usize;

    for (r, line) in lines.iter().enumerate() {
        let mut row = vec![cell::SPACE; width];
        for (c, ch) in line.chars().enumerate() {
            let pos = Position::new(r as i32, c as i32);
            match ch {
                '#' => row[c] = cell::WALL,
                ' ' => row[c] = cell::SPACE,
                '@' => {
                    if player.replace(pos).is_some() {
                        return Err(ParseError::MultiplePlayers);
                    }
                }
                '$' => {
                    row[c] = cell::BOX;
                    box_count += 1;
                }
                '.' => goals.push(pos),
                '&' | '+' => {
                    if player.replace(pos).is_some() {
                        return Err(ParseError::MultiplePlayers);
                    }
                    goals.push(pos);
                }
                '*' => {
                    row[c] = cell::BOX;
                    box_count += 1;
                    goals.push(pos);
                }
                _ => row[c] = cell::SPACE,
            }
        }
        rows.push(row);
    }

    let player = player.ok_or(ParseError::MissingPlayer)?;
    if box_count != goals.len() {
        return Err(ParseError::BoxGoalMismatch {
            boxes: box_count,
            goals: goals.len(),
        });
    }

    let board = Board::from_rows(&rows);
    Ok(Sokoban::new(board, player, goals))
}
