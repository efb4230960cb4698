use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::board::{cell, Board};
use crate::config::GeneratorConfig;
use crate::deadlock::{DeadlockTable, MatchMode};
use crate::heuristic::Heuristic;
use crate::position::Position;
use crate::search::SearchEngine;
use crate::sokoban::Sokoban;

/// `i x j` (`i <= j`) directly contains `i' x j'` when `i' = i - 1` or
/// `j' = j - 1`, but not both. Returns `{ area: [areas directly containing
/// area] }`.
fn build_area_containment_mapping(max_area: (u8, u8)) -> HashMap<(u8, u8), Vec<(u8, u8)>> {
    let mut contained_by: HashMap<(u8, u8), Vec<(u8, u8)>> = HashMap::new();
    contained_by.insert(max_area, Vec::new());
    if max_area == (2, 2) {
        return contained_by;
    }

    let sub_area_1 = sorted_pair((max_area.0 - 1).max(2), max_area.1);
    let sub_area_2 = sorted_pair(max_area.0, (max_area.1 - 1).max(2));
    for sub_area in [sub_area_1, sub_area_2] {
        if !contained_by.contains_key(&sub_area) {
            let mut sub_map = build_area_containment_mapping(sub_area);
            sub_map.get_mut(&sub_area).unwrap().push(max_area);
            for (area, sup_areas) in sub_map {
                let entry = contained_by.entry(area).or_default();
                for sup in sup_areas {
                    if !entry.contains(&sup) {
                        entry.push(sup);
                    }
                }
            }
        }
    }
    contained_by
}

fn sorted_pair(a: u8, b: u8) -> (u8, u8) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Returns `{ area: [subareas directly contained by area] }`.
fn build_inverse_area_containment_mapping(max_area: (u8, u8)) -> HashMap<(u8, u8), Vec<(u8, u8)>> {
    let contained_by = build_area_containment_mapping(max_area);
    let mut contains: HashMap<(u8, u8), Vec<(u8, u8)>> = HashMap::new();
    for area in contained_by.keys() {
        contains.entry(*area).or_default();
    }
    for (area, sup_areas) in &contained_by {
        for &sup in sup_areas {
            contains.entry(sup).or_default().push(*area);
        }
    }
    contains
}

fn next_area_in_topo_order(contains: &HashMap<(u8, u8), Vec<(u8, u8)>>, done: &HashSet<(u8, u8)>) -> (u8, u8) {
    *contains
        .keys()
        .find(|area| !done.contains(area) && contains[area].iter().all(|sub| done.contains(sub)))
        .expect("area containment mapping has no area left to process")
}

/// Every `SPACE`/`WALL` assignment of an `area`-shaped board, row-major bit
/// `i` controlling cell `i`.
fn generate_board_configs(area: (u8, u8)) -> impl Iterator<Item = Board> {
    let (h, w) = (area.0 as usize, area.1 as usize);
    let n = h * w;
    (0u64..(1u64 << n)).map(move |mask| {
        let mut rows = vec![vec![cell::SPACE; w]; h];
        for i in 0..n {
            if mask & (1 << i) != 0 {
                rows[i / w][i % w] = cell::WALL;
            }
        }
        Board::from_rows(&rows)
    })
}

/// Embeds `board` in a one-cell `SPACE` border, mirroring the padding the
/// generator wraps every candidate board in before attempting to solve it —
/// a box needs room to be pushed in from outside the basis area.
fn pad_with_border(board: &Board) -> Board {
    let (h, w) = (board.height(), board.width());
    let mut rows = vec![vec![cell::SPACE; w + 2]; h + 2];
    for r in 0..h {
        for c in 0..w {
            rows[r + 1][c + 1] = board.get(Position::new(r as i32, c as i32));
        }
    }
    Board::from_rows(&rows)
}

/// A board is in dynamic deadlock if every box on it can never be pushed
/// off the board's edge: first a cheap greedy search looks for any escape,
/// then A* (guided by the deadlock table built so far, maxed with the
/// remaining-boxes tie-breaker) looks harder before giving up.
fn board_in_dynamic_deadlock(board: &Board, table: &DeadlockTable) -> bool {
    let padded = pad_with_border(board);
    let sokoban = Sokoban::new(padded, Position::new(0, 0), vec![]);

    if SearchEngine::Greedy
        .solve(&sokoban, &Heuristic::RemainingBoxes, true, 10_000, None)
        .is_some()
    {
        return false;
    }

    let heuristic = Heuristic::Deadlock(Rc::new(table_snapshot(table)), MatchMode::Dynamic).max(Heuristic::RemainingBoxes);
    SearchEngine::AStar.solve(&sokoban, &heuristic, true, 100_000, None).is_none()
}

/// A board is in static deadlock if, treating every free cell as a goal, no
/// box can ever be relocated at all.
fn board_in_static_deadlock(board: &Board) -> bool {
    let padded = pad_with_border(board);
    let goals: Vec<Position> = padded.positions().filter(|&p| padded.get(p) == cell::SPACE).collect();
    let sokoban = Sokoban::new(padded, Position::new(0, 0), goals);

    if SearchEngine::Greedy
        .solve(&sokoban, &Heuristic::RemainingBoxes, false, 1_000, None)
        .is_some()
    {
        return false;
    }
    SearchEngine::AStar
        .solve(&sokoban, &Heuristic::RemainingBoxes, false, 10_000, None)
        .is_none()
}

fn table_snapshot(table: &DeadlockTable) -> DeadlockTable {
    table.clone()
}

#[allow(clippy::too_many_arguments)]
fn add_box_and_test_deadlock(
    area: (u8, u8),
    board: &Board,
    table: &mut DeadlockTable,
    basis: &mut Vec<Board>,
    box_index: usize,
    remaining_boxes: usize,
    dynamic: bool,
) {
    let positions: Vec<Position> = board.positions().collect();
    for (i, &box_pos) in positions.iter().enumerate().skip(box_index) {
        if board.get(box_pos) != cell::SPACE {
            continue;
        }
        let mut candidate = board.clone();
        candidate.set(box_pos, cell::BOX);

        if table.matches(&candidate, &[], MatchMode::Unmodified) {
            continue;
        }

        let is_deadlock = if dynamic {
            board_in_dynamic_deadlock(&candidate, table)
        } else {
            board_in_static_deadlock(&candidate)
        };

        if is_deadlock {
            let variants = candidate.isometric_boards();
            basis.retain(|existing| !variants.iter().any(|v| existing.covers(v)));
            basis.push(candidate.clone());
            table.add_basis_pattern(&candidate);
            log::debug!("deadlock basis ({}x{}): {}", area.0, area.1, candidate);
        } else if remaining_boxes > 1 {
            add_box_and_test_deadlock(area, &candidate, table, basis, i + 1, remaining_boxes - 1, dynamic);
        }
    }
}

/// Result of a basis generation run: the minimal per-area basis boards, and
/// the fully expanded match table built from them.
pub struct GeneratedBasis {
    pub basis: HashMap<(u8, u8), Vec<Board>>,
    pub table: DeadlockTable,
}

fn generate_basis(config: &GeneratorConfig, dynamic: bool) -> GeneratedBasis {
    let contains = build_inverse_area_containment_mapping(config.max_area);
    let mut done: HashSet<(u8, u8)> = HashSet::new();
    let mut table = DeadlockTable::new();
    let mut basis_by_area: HashMap<(u8, u8), Vec<Board>> = HashMap::new();

    while done.len() < contains.len() {
        let area = next_area_in_topo_order(&contains, &done);
        if !config.quiet {
            log::info!("area: {}x{}", area.0, area.1);
        }
        let mut basis = Vec::new();
        for board in generate_board_configs(area) {
            add_box_and_test_deadlock(area, &board, &mut table, &mut basis, 0, config.max_box, dynamic);
        }
        basis_by_area.insert(area, basis);
        done.insert(area);
    }

    GeneratedBasis { basis: basis_by_area, table }
}

/// Generates a deadlock basis where a board is deadlocked when no box can
/// ever be pushed off its edge.
pub fn generate_dynamic_deadlock_basis(config: &GeneratorConfig) -> GeneratedBasis {
    generate_basis(config, true)
}

/// Generates a deadlock basis where a board is deadlocked when, treating
/// every free cell as a goal, no box can ever be relocated at all.
pub fn generate_static_deadlock_basis(config: &GeneratorConfig) -> GeneratedBasis {
    generate_basis(config, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_containment_terminates_at_two_by_two() {
        let mapping = build_area_containment_mapping((2, 2));
        assert_eq!(mapping.len(), 1);
        assert!(mapping[&(2, 2)].is_empty());
    }

    #[test]
    fn inverse_mapping_covers_every_area_down_to_two_by_two() {
        let contains = build_inverse_area_containment_mapping((3, 3));
        assert!(contains.contains_key(&(2, 2)));
        assert!(contains.contains_key(&(2, 3)));
        assert!(contains.contains_key(&(3, 3)));
        assert!(contains[&(2, 2)].is_empty());
    }

    #[test]
    fn topo_order_starts_from_a_leaf_area() {
        let contains = build_inverse_area_containment_mapping((3, 3));
        let done = HashSet::new();
        let first = next_area_in_topo_order(&contains, &done);
        assert!(contains[&first].is_empty());
    }

    #[test]
    fn generate_board_configs_enumerates_every_wall_assignment() {
        let configs: Vec<Board> = generate_board_configs((2, 2)).collect();
        assert_eq!(configs.len(), 16);
    }

    #[test]
    fn pad_with_border_adds_one_cell_of_space_on_every_side() {
        let board = Board::from_rows(&[vec![cell::BOX]]);
        let padded = pad_with_border(&board);
        assert_eq!(padded.height(), 3);
        assert_eq!(padded.width(), 3);
        assert_eq!(padded.get(Position::new(1, 1)), cell::BOX);
        assert_eq!(padded.get(Position::new(0, 0)), cell::SPACE);
    }

    #[test]
    fn a_single_box_with_room_to_push_is_not_in_dynamic_deadlock() {
        let board = Board::from_rows(&[vec![cell::BOX]]);
        let table = DeadlockTable::new();
        assert!(!board_in_dynamic_deadlock(&board, &table));
    }

    #[test]
    fn a_boxed_in_corner_is_in_dynamic_deadlock() {
        // box wedged between two walls with no room to push it along either axis
        let board = Board::from_rows(&[vec![cell::WALL, cell::WALL], vec![cell::WALL, cell::BOX]]);
        let table = DeadlockTable::new();
        assert!(board_in_dynamic_deadlock(&board, &table));
    }

    #[test]
    fn generate_dynamic_basis_for_two_by_two_area_finds_the_corner_deadlock() {
        let config = GeneratorConfig {
            max_area: (2, 2),
            max_box: 1,
            quiet: true,
        };
        let result = generate_dynamic_deadlock_basis(&config);
        assert!(!result.table.is_empty());
        assert!(result.basis.contains_key(&(2, 2)));
    }
}
