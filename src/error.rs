use thiserror::Error;

/// Errors raised while parsing a puzzle, a deadlock basis file, or a
/// deadlock table file. Budget exhaustion and genuinely unsolvable puzzles
/// are never represented as errors — both surface as `None` from the
/// solvers, since the engine has no way to distinguish them.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("puzzle has no player")]
    MissingPlayer,

    #[error("puzzle has more than one player")]
    MultiplePlayers,

    #[error("box/goal count mismatch: {boxes} boxes, {goals} goals")]
    BoxGoalMismatch { boxes: usize, goals: usize },

    #[error("empty puzzle text")]
    EmptyInput,

    #[error("invalid deadlock basis board: {0}")]
    InvalidBasis(String),

    #[error("truncated deadlock table file")]
    TruncatedTable,

    #[error("deadlock table area mismatch: expected {expected:?}, found {found:?}")]
    AreaMismatch { expected: (u8, u8), found: (u8, u8) },

    #[error("malformed level file: {0}")]
    InvalidLevel(String),
}
