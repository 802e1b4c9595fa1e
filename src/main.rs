//! superchess: a 10x10 chess variant engine with PUCT search.
//!
//! ## Usage
//!
//! - `superchess` - Self-play demo
//! - `superchess protocol` - Text protocol on stdin/stdout for GUI integration
//! - `superchess search WK@f1 BK@f10 WQ@e5` - Search one position and print the policy
//! - `superchess --level 2 protocol` - Protocol play with the cautious non-search player

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use superchess::baseline::{Level, random_move, safe_move};
use superchess::board::{GameState, parse_placement};
use superchess::config::SearchConfig;
use superchess::evaluator::{
    BoardEncoder, Evaluator, MaterialEvaluator, PlaneEncoder, UniformEvaluator,
};
use superchess::mcts::Mcts;
use superchess::piece::Color;
use superchess::protocol::ProtocolEngine;
use superchess::rules::{apply_move, game_status};

/// superchess: a 10x10 chess variant engine
#[derive(Parser)]
#[command(name = "superchess")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML file with a [search] table
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Simulations per move (overrides the config file)
    #[arg(long, global = true)]
    sims: Option<u32>,

    /// Position evaluator
    #[arg(long, global = true, value_enum, default_value_t = EvaluatorKind::Material)]
    evaluator: EvaluatorKind,

    /// Strength for demo and protocol play: 1 random, 2 cautious, 3 search
    #[arg(
        long,
        global = true,
        default_value_t = 3,
        value_parser = clap::value_parser!(u8).range(1..=3)
    )]
    level: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum EvaluatorKind {
    /// Uniform priors, value 0
    Uniform,
    /// Uniform priors, material-balance value
    Material,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the text protocol server for use with GUI applications
    Protocol,
    /// Let the engine play itself from the starting position
    Demo {
        /// Maximum number of plies
        #[arg(long, default_value_t = 10)]
        plies: usize,
    },
    /// Search a single position
    Search {
        /// Side to move (w or b)
        #[arg(long, default_value = "w")]
        side: String,
        /// Pieces as <piece>@<square>, e.g. WK@f1. Empty means the starting position.
        placements: Vec<String>,
    },
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries protocol responses
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .context("failed to initialize tracing")?;

    Ok(())
}

fn load_config(cli: &Cli) -> Result<SearchConfig> {
    let mut config = match &cli.config {
        Some(path) => SearchConfig::load_from_path(path)?,
        None => SearchConfig::default().apply_env_overrides(),
    };
    if let Some(sims) = cli.sims {
        config.num_simulations = sims;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let config = load_config(&cli)?;
    info!(
        simulations = config.num_simulations,
        temperature = config.temperature,
        batch = config.eval_batch_size,
        "search configured"
    );

    match cli.evaluator {
        EvaluatorKind::Uniform => run(
            &cli,
            Mcts::new(config, UniformEvaluator::default(), PlaneEncoder::default()),
        ),
        EvaluatorKind::Material => run(
            &cli,
            Mcts::new(config, MaterialEvaluator::new(), MaterialEvaluator::encoder()),
        ),
    }
}

fn run<E: Evaluator, B: BoardEncoder>(cli: &Cli, mcts: Mcts<E, B>) -> Result<()> {
    let Some(level) = Level::from_number(cli.level) else {
        bail!("invalid level: {}", cli.level);
    };
    match &cli.command {
        Some(Commands::Protocol) => {
            let mut engine = ProtocolEngine::new(mcts).with_level(level);
            engine.run(std::io::stdin().lock(), std::io::stdout())?;
        }
        Some(Commands::Search { side, placements }) => {
            let state = parse_position(side, placements)?;
            run_search(&mcts, &state)?;
        }
        Some(Commands::Demo { plies }) => run_demo(&mcts, level, *plies)?,
        None => run_demo(&mcts, level, 10)?,
    }
    Ok(())
}

/// Position from `--side` and placements. No placements means the starting
/// setup with the given side to move.
fn parse_position(side: &str, placements: &[String]) -> Result<GameState> {
    let Some(side) = Color::parse(side) else {
        bail!("invalid side to move: {side}");
    };
    if placements.is_empty() {
        let mut state = GameState::new();
        state.side_to_move = side;
        return Ok(state);
    }
    let placements = placements
        .iter()
        .map(|p| parse_placement(p).with_context(|| format!("invalid placement: {p}")))
        .collect::<Result<Vec<_>>>()?;
    Ok(GameState::from_placements(side, &placements))
}

fn run_search<E: Evaluator, B: BoardEncoder>(mcts: &Mcts<E, B>, state: &GameState) -> Result<()> {
    println!("{state}\n");
    let result = mcts.search(state)?;
    if result.is_terminal() {
        println!("No legal moves: {:?}", game_status(state));
        return Ok(());
    }

    let mut policy = result.policy.clone();
    policy.sort_by(|a, b| b.1.total_cmp(&a.1));
    println!("Simulations: {}", result.simulations);
    println!("Root value:  {:+.3}", result.root_value);
    if let Some(best) = result.best_move {
        println!("Best move:   {best}");
    }
    println!("Top moves:");
    for (mv, p) in policy.iter().take(5) {
        println!("  {mv:<10} {p:.3}");
    }
    Ok(())
}

fn run_demo<E: Evaluator, B: BoardEncoder>(
    mcts: &Mcts<E, B>,
    level: Level,
    plies: usize,
) -> Result<()> {
    println!("superchess: 10x10 chess variant, level {level}\n");

    let mut rng = fastrand::Rng::with_seed(mcts.config().seed);
    let mut state = GameState::new();
    println!("{state}\n");

    for ply in 0..plies {
        let (chosen, note) = match level {
            Level::Random => (random_move(&state, &mut rng), String::new()),
            Level::Safe => (safe_move(&state, &mut rng), String::new()),
            Level::Search => {
                let result = mcts.search(&state)?;
                let note = format!(
                    " (value {:+.3}, {} sims)",
                    result.root_value, result.simulations
                );
                (result.sample_move(&mut rng).or(result.best_move), note)
            }
        };
        let Some(mv) = chosen else {
            println!("Game over: {:?}", game_status(&state));
            break;
        };
        println!("{ply:>3}. {} plays {mv}{note}", state.side_to_move);
        state = apply_move(&state, mv);
    }

    println!("\n{state}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_side_applies_to_the_starting_position() {
        let state = parse_position("b", &[]).unwrap();
        assert_eq!(state.side_to_move, Color::Black);
        assert_eq!(state.board, GameState::new().board);

        assert_eq!(parse_position("w", &[]).unwrap(), GameState::new());
        assert!(parse_position("x", &[]).is_err());
    }

    #[test]
    fn test_placements_build_the_position() {
        let state = parse_position("b", &strings(&["WK@f1", "BK@f10"])).unwrap();
        assert_eq!(state.side_to_move, Color::Black);
        assert_eq!(state.board.pieces().count(), 2);
        assert!(parse_position("w", &strings(&["WK-f1"])).is_err());
    }

    #[test]
    fn test_level_flag_range() {
        let cli = Cli::try_parse_from(["superchess", "--level", "2", "protocol"]).unwrap();
        assert_eq!(Level::from_number(cli.level), Some(Level::Safe));
        assert_eq!(Cli::try_parse_from(["superchess"]).unwrap().level, 3);
        assert!(Cli::try_parse_from(["superchess", "--level", "4"]).is_err());
    }
}
