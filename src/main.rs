use std::rc::Rc;
use std::time::Instant;

use clap::{Parser, ValueEnum};

use sokoban_engine::deadlock::{DeadlockTable, MatchMode};
use sokoban_engine::heuristic::Heuristic;
use sokoban_engine::levels::Levels;
use sokoban_engine::search::SearchEngine;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EngineArg {
    Bfs,
    Dfs,
    Greedy,
    Astar,
}

impl From<EngineArg> for SearchEngine {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Bfs => SearchEngine::Bfs,
            EngineArg::Dfs => SearchEngine::Dfs,
            EngineArg::Greedy => SearchEngine::Greedy,
            EngineArg::Astar => SearchEngine::AStar,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum HeuristicArg {
    None,
    RemainingBoxes,
    Manhattan,
    MinMatching,
    MinMatchingDeadlock,
}

#[derive(Parser)]
#[command(name = "sokoban-engine")]
#[command(about = "A Sokoban puzzle solver", long_about = None)]
struct Args {
    /// Path to the levels file (semicolon-separated puzzle text)
    #[arg(value_name = "FILE")]
    levels_file: String,

    /// Level number to solve (1-indexed)
    #[arg(value_name = "LEVEL")]
    level: usize,

    /// Search engine
    #[arg(short = 'e', long, value_enum, default_value = "astar")]
    engine: EngineArg,

    /// Heuristic to guide greedy/A* search
    #[arg(short = 'H', long, value_enum, default_value = "min-matching")]
    heuristic: HeuristicArg,

    /// Path to a binary deadlock table, required by `min-matching-deadlock`
    #[arg(long)]
    deadlock_table: Option<String>,

    /// Maximum number of nodes to explore before giving up
    #[arg(short = 'n', long, default_value = "1000000")]
    max_nodes: usize,

    /// Seed for neighbor-order shuffling in BFS/DFS
    #[arg(long)]
    seed: Option<u64>,
}

fn build_heuristic(arg: HeuristicArg, deadlock_table: &Option<String>) -> Heuristic {
    match arg {
        HeuristicArg::None => Heuristic::NoHeuristic,
        HeuristicArg::RemainingBoxes => Heuristic::RemainingBoxes,
        HeuristicArg::Manhattan => Heuristic::ManhattanDist,
        HeuristicArg::MinMatching => Heuristic::MinMatching,
        HeuristicArg::MinMatchingDeadlock => {
            let path = deadlock_table
                .as_ref()
                .expect("--deadlock-table is required for the min-matching-deadlock heuristic");
            let (table, _area) = DeadlockTable::read_binary(path, None).unwrap_or_else(|err| {
                eprintln!("error reading deadlock table {path}: {err}");
                std::process::exit(1);
            });
            Heuristic::MinMatching.max(Heuristic::Deadlock(Rc::new(table), MatchMode::Dynamic))
        }
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let levels = match Levels::from_file(&args.levels_file) {
        Ok(levels) => levels,
        Err(err) => {
            eprintln!("error loading levels: {err}");
            std::process::exit(1);
        }
    };

    if args.level == 0 || args.level > levels.len() {
        eprintln!("error: level {} not found (file contains {} levels)", args.level, levels.len());
        std::process::exit(1);
    }

    let state = levels.get(args.level - 1).unwrap();
    let heuristic = build_heuristic(args.heuristic, &args.deadlock_table);
    let engine: SearchEngine = args.engine.into();

    println!("Starting position:\n{state}");
    let start = Instant::now();
    let solution = engine.solve(state, &heuristic, false, args.max_nodes, args.seed);
    let elapsed_ms = start.elapsed().as_millis();

    match solution {
        Some(steps) => {
            println!("solved in {} pushes ({} ms):", steps.len(), elapsed_ms);
            for (i, step) in steps.iter().enumerate() {
                println!("{}/{}: {}\n{}", i + 1, steps.len(), step.action, step.state);
            }
        }
        None => {
            println!("no solution found within {} node(s) ({} ms)", args.max_nodes, elapsed_ms);
            std::process::exit(1);
        }
    }
}
