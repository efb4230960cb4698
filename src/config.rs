use crate::heuristic::Heuristic;
use crate::search::SearchEngine;

/// Parameters a solve call is run with. `max_nodes` bounds expansions, not
/// wall-clock time — the solvers have no other stopping condition short of
/// exhausting the state space.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub engine: SearchEngine,
    pub heuristic: Heuristic,
    pub max_nodes: usize,
    pub seed: Option<u64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            engine: SearchEngine::AStar,
            heuristic: Heuristic::MinMatching,
            max_nodes: 1_000_000,
            seed: None,
        }
    }
}

/// Parameters a deadlock basis generation run is bounded by.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorConfig {
    pub max_area: (u8, u8),
    pub max_box: usize,
    pub quiet: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            max_area: (4, 5),
            max_box: 4,
            quiet: true,
        }
    }
}
