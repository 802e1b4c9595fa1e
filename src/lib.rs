//! superchess: rules engine and PUCT search for a 10x10 chess variant.
//!
//! The variant adds five piece kinds to the usual six: spearman, templar,
//! marshall, assassin and lineguard. The search is AlphaZero-style MCTS: an
//! external [`evaluator::Evaluator`] supplies move priors and a position
//! value, and visit counts become the move policy.
//!
//! ## Modules
//!
//! - [`constants`] - Board geometry, search constants, piece values
//! - [`piece`], [`position`], [`board`] - Game state and text formats
//! - [`rules`] - Move legality, check detection, move generation
//! - [`action`] - Move <-> policy index mapping
//! - [`evaluator`] - Evaluator and board-encoder seams with reference implementations
//! - [`tree`] - Arena search tree and PUCT scoring
//! - [`mcts`] - Search controller
//! - [`baseline`] - Random and cautious players for the lower strength levels
//! - [`config`] - Search configuration (TOML + environment)
//! - [`protocol`] - Line-oriented text protocol
//!
//! ## Example
//!
//! ```
//! use superchess::board::GameState;
//! use superchess::config::SearchConfig;
//! use superchess::evaluator::{PlaneEncoder, UniformEvaluator};
//! use superchess::mcts::Mcts;
//!
//! let config = SearchConfig::default().with_simulations(50);
//! let mcts = Mcts::new(config, UniformEvaluator::default(), PlaneEncoder::default());
//!
//! let result = mcts.search(&GameState::new()).unwrap();
//! println!("Best move: {}", result.best_move.unwrap());
//! ```

pub mod action;
pub mod baseline;
pub mod board;
pub mod config;
pub mod constants;
pub mod evaluator;
pub mod mcts;
pub mod piece;
pub mod position;
pub mod protocol;
pub mod rules;
pub mod tree;
