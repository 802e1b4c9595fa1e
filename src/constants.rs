//! Constants for board geometry, search parameters, and piece values.
//!
//! The board is a fixed 10x10 grid. Row 0 is rank 10 (Black's back rank)
//! and row 9 is rank 1 (White's back rank), so White pawns advance toward
//! row 0 and Black pawns toward row 9.

// =============================================================================
// Board Geometry
// =============================================================================

/// Board size (NxN).
pub const N: usize = 10;

/// Number of squares on the board.
pub const NUM_SQUARES: usize = N * N;

/// Size of the (from-square, to-square) action space.
pub const NUM_ACTIONS: usize = NUM_SQUARES * NUM_SQUARES;

/// Row White pawns and spearmen start on (rank 3).
pub const WHITE_START_ROW: u8 = 7;

/// Row Black pawns and spearmen start on (rank 8).
pub const BLACK_START_ROW: u8 = 2;

// =============================================================================
// MCTS (PUCT) Parameters
// =============================================================================

/// Default number of simulations per decision.
pub const N_SIMS: u32 = 800;

/// Base of the logarithmic exploration growth term.
pub const PUCT_C_BASE: f64 = 19652.0;

/// Initial exploration constant.
pub const PUCT_C_INIT: f64 = 1.25;

/// Temperatures below this are treated as argmax selection.
pub const GREEDY_TEMPERATURE: f32 = 1e-3;

/// Number of reference-encoder planes (matches the trained network input).
pub const ENCODER_CHANNELS: usize = 3;

// =============================================================================
// Piece Values (centipawns)
// =============================================================================

pub const VALUE_ASSASSIN: i32 = 1000;
pub const VALUE_QUEEN: i32 = 900;
pub const VALUE_MARSHALL: i32 = 800;
pub const VALUE_TEMPLAR: i32 = 700;
pub const VALUE_ROOK: i32 = 500;
pub const VALUE_BISHOP: i32 = 300;
pub const VALUE_KNIGHT: i32 = 300;
pub const VALUE_PAWN: i32 = 100;
pub const VALUE_SPEARMAN: i32 = 100;
pub const VALUE_LINEGUARD: i32 = 100;

/// Material difference that maps to a value of tanh(1) ~ 0.76.
pub const MATERIAL_SCALE: f32 = 1000.0;

/// Pieces worth at least this much must not be left capturable by the
/// cautious baseline player.
pub const HANGING_PIECE_VALUE: i32 = 300;
