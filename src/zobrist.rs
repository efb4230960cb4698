use std::sync::OnceLock;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::bits::MAX_SIZE;
use crate::position::Position;

/// Per-cell random `u64`s for incremental hashing of box/goal/player
/// positions. Seeded deterministically so that two runs of the engine
/// produce identical hashes for identical states (required by the
/// single-threaded, deterministic-given-seed resource model).
pub struct Zobrist {
    box_hashes: [[u64; MAX_SIZE]; MAX_SIZE],
    goal_hashes: [[u64; MAX_SIZE]; MAX_SIZE],
    player_hashes: [[u64; MAX_SIZE]; MAX_SIZE],
}

impl Zobrist {
    fn new() -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(0x123456789abcdef0);

        let mut fill = || {
            let mut table = [[0u64; MAX_SIZE]; MAX_SIZE];
            for row in table.iter_mut() {
                for cell in row.iter_mut() {
                    *cell = rng.next_u64();
                }
            }
            table
        };

        Zobrist {
            box_hashes: fill(),
            goal_hashes: fill(),
            player_hashes: fill(),
        }
    }

    pub fn box_hash(&self, pos: Position) -> u64 {
        self.box_hashes[pos.row as usize][pos.col as usize]
    }

    pub fn goal_hash(&self, pos: Position) -> u64 {
        self.goal_hashes[pos.row as usize][pos.col as usize]
    }

    pub fn player_hash(&self, pos: Position) -> u64 {
        self.player_hashes[pos.row as usize][pos.col as usize]
    }
}

static TABLE: OnceLock<Zobrist> = OnceLock::new();

/// The process-wide Zobrist table. Single-threaded engine, read-only after
/// first use, so a lazily initialized global is simpler than threading a
/// `&Zobrist` through every `Sokoban` value.
pub fn table() -> &'static Zobrist {
    TABLE.get_or_init(Zobrist::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_are_deterministic_across_calls() {
        let a = table().box_hash(Position::new(3, 4));
        let b = table().box_hash(Position::new(3, 4));
        assert_eq!(a, b);
    }

    #[test]
    fn box_goal_and_player_tables_are_distinct() {
        let p = Position::new(1, 1);
        assert_ne!(table().box_hash(p), table().goal_hash(p));
        assert_ne!(table().box_hash(p), table().player_hash(p));
    }

    #[test]
    fn distinct_positions_hash_differently() {
        assert_ne!(
            table().box_hash(Position::new(0, 0)),
            table().box_hash(Position::new(0, 1))
        );
    }
}
