//! Non-search players.
//!
//! Three strength levels share one move interface:
//! - [`Level::Random`]: a random legal move, captures first
//! - [`Level::Safe`]: like `Random`, but never leaves a piece worth
//!   [`HANGING_PIECE_VALUE`] or more capturable on the next move if any
//!   other move avoids it
//! - [`Level::Search`]: PUCT search (see [`crate::mcts`])

use std::fmt;

use crate::board::GameState;
use crate::constants::HANGING_PIECE_VALUE;
use crate::rules::{Move, apply_move, generate_legal_moves};

/// Player strength.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Level {
    Random,
    Safe,
    #[default]
    Search,
}

impl Level {
    /// Level from its number, 1 to 3.
    pub fn from_number(n: u8) -> Option<Level> {
        match n {
            1 => Some(Level::Random),
            2 => Some(Level::Safe),
            3 => Some(Level::Search),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Level::Random => 1,
            Level::Safe => 2,
            Level::Search => 3,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// True if `mv` takes an opposing piece.
#[inline]
pub fn is_capture(state: &GameState, mv: Move) -> bool {
    state
        .board
        .get(mv.to)
        .is_some_and(|p| p.color != state.side_to_move)
}

/// True if after `mv` the opponent has no legal capture of a piece worth
/// [`HANGING_PIECE_VALUE`] or more.
pub fn is_move_safe(state: &GameState, mv: Move) -> bool {
    let next = apply_move(state, mv);
    !generate_legal_moves(&next, next.side_to_move)
        .into_iter()
        .any(|reply| {
            next.board
                .get(reply.to)
                .is_some_and(|p| p.kind.value() >= HANGING_PIECE_VALUE)
        })
}

fn pick_preferring_captures(
    state: &GameState,
    moves: &[Move],
    rng: &mut fastrand::Rng,
) -> Option<Move> {
    let captures: Vec<Move> = moves
        .iter()
        .copied()
        .filter(|&mv| is_capture(state, mv))
        .collect();
    let pool = if captures.is_empty() { moves } else { &captures };
    if pool.is_empty() {
        None
    } else {
        Some(pool[rng.usize(..pool.len())])
    }
}

/// Random legal move for the side to move, a capture if one exists.
pub fn random_move(state: &GameState, rng: &mut fastrand::Rng) -> Option<Move> {
    let moves = generate_legal_moves(state, state.side_to_move);
    pick_preferring_captures(state, &moves, rng)
}

/// Random safe move for the side to move, a capture if one exists.
///
/// Falls back to all legal moves when none is safe.
pub fn safe_move(state: &GameState, rng: &mut fastrand::Rng) -> Option<Move> {
    let moves = generate_legal_moves(state, state.side_to_move);
    let safe: Vec<Move> = moves
        .iter()
        .copied()
        .filter(|&mv| is_move_safe(state, mv))
        .collect();
    let pool = if safe.is_empty() { &moves } else { &safe };
    pick_preferring_captures(state, pool, rng)
}
