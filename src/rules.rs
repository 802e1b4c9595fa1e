//! Move legality, check detection, move generation, and move application.
//!
//! Legality is layered:
//! 1. [`pseudo_legal`] - the per-piece shape and path rules, ignoring checks.
//! 2. [`is_in_check`] - whether any enemy piece has a pseudo-legal move onto
//!    the king square. It only ever calls [`pseudo_legal`], so check detection
//!    never recurses back into full legality.
//! 3. [`is_legal_move`] - pseudo-legal plus "does not leave own king in check",
//!    tested on the successor state produced by [`apply_move`].

use std::fmt;

use thiserror::Error;

use crate::board::{Board, GameState};
use crate::constants::N;
use crate::piece::{Color, Piece, PieceKind};
use crate::position::{Position, parse_coord};

/// A move from one square to another.
///
/// `promotion` replaces the moving piece on arrival. The legality rules do not
/// look at it; [`play_move`] validates it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Position,
    pub to: Position,
    pub promotion: Option<PieceKind>,
}

impl Move {
    pub const fn new(from: Position, to: Position) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    pub fn with_promotion(mut self, kind: PieceKind) -> Self {
        self.promotion = Some(kind);
        self
    }

    /// Build a move from two coordinate strings, e.g. `("e3", "e4")`.
    pub fn parse(from: &str, to: &str) -> Option<Move> {
        Some(Move::new(parse_coord(from)?, parse_coord(to)?))
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "={}", kind.code())?;
        }
        Ok(())
    }
}

/// Reason a move was refused by [`play_move`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("illegal move: no piece on {0}")]
    NoPiece(Position),
    #[error("illegal move: the piece on {0} belongs to the side not on move")]
    NotYourTurn(Position),
    #[error("illegal move: {0} is occupied by a friendly piece")]
    OwnPieceOnTarget(Position),
    #[error("illegal move: a {0:?} cannot move that way")]
    IllegalShape(PieceKind),
    #[error("illegal move: leaves own king in check")]
    LeavesKingInCheck,
    #[error("illegal move: invalid promotion to {0:?}")]
    InvalidPromotion(PieceKind),
}

/// Outcome of a position from the point of view of the rules.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    Checkmate { winner: Color },
    Stalemate,
}

impl GameStatus {
    #[inline]
    pub fn is_terminal(self) -> bool {
        self != GameStatus::Ongoing
    }
}

// =============================================================================
// Shape predicates
// =============================================================================

#[inline]
fn knight_shape(dr: i32, dc: i32) -> bool {
    let (ar, ac) = (dr.abs(), dc.abs());
    (ar == 2 && ac == 1) || (ar == 1 && ac == 2)
}

#[inline]
fn diagonal_shape(dr: i32, dc: i32) -> bool {
    dr != 0 && dr.abs() == dc.abs()
}

#[inline]
fn orthogonal_shape(dr: i32, dc: i32) -> bool {
    (dr == 0) != (dc == 0)
}

/// True if every square strictly between `from` and `to` is empty.
///
/// Only meaningful for squares on a common rank, file, or diagonal.
fn path_clear(board: &Board, from: Position, to: Position) -> bool {
    let dr = (to.row as i32 - from.row as i32).signum();
    let dc = (to.col as i32 - from.col as i32).signum();
    let mut cur = from.offset(dr, dc);
    while let Some(sq) = cur {
        if sq == to {
            return true;
        }
        if !board.is_empty(sq) {
            return false;
        }
        cur = sq.offset(dr, dc);
    }
    false
}

fn bishop_move(board: &Board, from: Position, to: Position, dr: i32, dc: i32) -> bool {
    diagonal_shape(dr, dc) && path_clear(board, from, to)
}

fn rook_move(board: &Board, from: Position, to: Position, dr: i32, dc: i32) -> bool {
    orthogonal_shape(dr, dc) && path_clear(board, from, to)
}

/// Pawn and spearman rules. A spearman may step forward onto an occupied
/// square; a pawn needs the target empty.
fn foot_soldier_move(board: &Board, piece: Piece, from: Position, to: Position) -> bool {
    let dr = to.row as i32 - from.row as i32;
    let dc = to.col as i32 - from.col as i32;
    let fwd = piece.color.forward() as i32;
    let spearman = piece.kind == PieceKind::Spearman;

    if dc == 0 {
        if dr == fwd {
            return spearman || board.is_empty(to);
        }
        if dr == 2 * fwd && from.row == piece.color.start_row() {
            let mid_clear = from.offset(fwd, 0).is_some_and(|mid| board.is_empty(mid));
            return mid_clear && (spearman || board.is_empty(to));
        }
        return false;
    }

    if dc.abs() == 1 && dr == fwd {
        return board.get(to).is_some_and(|t| t.color != piece.color);
    }
    false
}

/// Shape and path rules for `piece` moving from `from` to `to`.
///
/// Does not look at the side to move, friendly pieces on the target, or
/// checks. Check detection uses this directly as the attack predicate.
pub fn pseudo_legal(board: &Board, piece: Piece, from: Position, to: Position) -> bool {
    if from == to {
        return false;
    }
    let dr = to.row as i32 - from.row as i32;
    let dc = to.col as i32 - from.col as i32;

    match piece.kind {
        PieceKind::Pawn | PieceKind::Spearman => foot_soldier_move(board, piece, from, to),
        PieceKind::Knight => knight_shape(dr, dc),
        PieceKind::Bishop => bishop_move(board, from, to, dr, dc),
        PieceKind::Rook => rook_move(board, from, to, dr, dc),
        PieceKind::Queen => {
            rook_move(board, from, to, dr, dc) || bishop_move(board, from, to, dr, dc)
        }
        PieceKind::King => dr.abs().max(dc.abs()) == 1,
        PieceKind::Templar => bishop_move(board, from, to, dr, dc) || knight_shape(dr, dc),
        PieceKind::Marshall => rook_move(board, from, to, dr, dc) || knight_shape(dr, dc),
        // Jumps: no path check at range 2
        PieceKind::Assassin => {
            dr.abs() <= 2
                && dc.abs() <= 2
                && (dr == 0 || dc == 0 || dr.abs() == dc.abs())
        }
        PieceKind::Lineguard => dr.abs() + dc.abs() == 1,
    }
}

// =============================================================================
// Check detection
// =============================================================================

/// True if any piece of `by` attacks `target`.
pub fn is_attacked(board: &Board, target: Position, by: Color) -> bool {
    board
        .pieces()
        .filter(|(_, p)| p.color == by)
        .any(|(from, p)| pseudo_legal(board, p, from, target))
}

/// True if `color`'s king is attacked. A color without a king is never in check.
pub fn is_in_check(state: &GameState, color: Color) -> bool {
    match state.king_position(color) {
        Some(king) => is_attacked(&state.board, king, color.opponent()),
        None => false,
    }
}

// =============================================================================
// Legality
// =============================================================================

/// Validate the from/to part of a move for the side to move.
fn check_move(state: &GameState, from: Position, to: Position) -> Result<(), MoveError> {
    let piece = state.board.get(from).ok_or(MoveError::NoPiece(from))?;
    if piece.color != state.side_to_move {
        return Err(MoveError::NotYourTurn(from));
    }
    if state.board.get(to).is_some_and(|t| t.color == piece.color) {
        return Err(MoveError::OwnPieceOnTarget(to));
    }
    if !pseudo_legal(&state.board, piece, from, to) {
        return Err(MoveError::IllegalShape(piece.kind));
    }
    let next = apply_move(state, Move::new(from, to));
    if is_in_check(&next, piece.color) {
        return Err(MoveError::LeavesKingInCheck);
    }
    Ok(())
}

/// True if the side to move may move the piece on `from` to `to`.
pub fn is_legal_move(state: &GameState, from: Position, to: Position) -> bool {
    check_move(state, from, to).is_ok()
}

/// Same as [`is_legal_move`] but on coordinate strings. Unparseable
/// coordinates are simply illegal.
pub fn is_legal_coord_move(state: &GameState, from: &str, to: &str) -> bool {
    match (parse_coord(from), parse_coord(to)) {
        (Some(from), Some(to)) => is_legal_move(state, from, to),
        _ => false,
    }
}

/// All legal moves of the piece on `from`, for the side to move.
pub fn legal_moves_from(state: &GameState, from: Position) -> Vec<Move> {
    match state.board.get(from) {
        Some(p) if p.color == state.side_to_move => Position::all()
            .filter(|&to| is_legal_move(state, from, to))
            .map(|to| Move::new(from, to))
            .collect(),
        _ => Vec::new(),
    }
}

/// All legal moves for `color`, judged as if `color` were on move.
///
/// An empty result means checkmate or stalemate.
pub fn generate_legal_moves(state: &GameState, color: Color) -> Vec<Move> {
    let mut view;
    let state = if state.side_to_move == color {
        state
    } else {
        view = state.clone();
        view.side_to_move = color;
        &view
    };

    let mut moves = Vec::new();
    for (from, piece) in state.board.pieces().filter(|(_, p)| p.color == color) {
        for to in Position::all() {
            // Cheap shape filter first; full check only for candidates
            if state.board.get(to).is_some_and(|t| t.color == color)
                || !pseudo_legal(&state.board, piece, from, to)
            {
                continue;
            }
            if !is_in_check(&apply_move(state, Move::new(from, to)), color) {
                moves.push(Move::new(from, to));
            }
        }
    }
    moves
}

/// Status of the position for the side to move.
pub fn game_status(state: &GameState) -> GameStatus {
    if !generate_legal_moves(state, state.side_to_move).is_empty() {
        return GameStatus::Ongoing;
    }
    if is_in_check(state, state.side_to_move) {
        GameStatus::Checkmate {
            winner: state.side_to_move.opponent(),
        }
    } else {
        GameStatus::Stalemate
    }
}

// =============================================================================
// Move application
// =============================================================================

/// Produce the successor state after `mv`.
///
/// Captures whatever stands on the target, tracks the king, drops castling
/// rights touched by the move, applies `mv.promotion`, and passes the turn.
/// No legality checking is done; moving from an empty square returns an
/// unchanged copy.
pub fn apply_move(state: &GameState, mv: Move) -> GameState {
    let mut next = state.clone();
    let Some(piece) = next.remove(mv.from) else {
        return next;
    };
    next.remove(mv.to);

    next.castling.clear_rook_square(mv.from);
    next.castling.clear_rook_square(mv.to);
    if piece.kind == PieceKind::King {
        next.castling.clear_color(piece.color);
    }

    let arriving = match mv.promotion {
        Some(kind) => Piece::new(piece.color, kind),
        None => piece,
    };
    next.place(mv.to, arriving);
    next.side_to_move = state.side_to_move.opponent();
    next
}

/// Row a color's foot soldiers promote on.
fn promotion_row(color: Color) -> u8 {
    match color {
        Color::White => 0,
        Color::Black => (N - 1) as u8,
    }
}

/// Checked move application for game drivers.
pub fn play_move(state: &GameState, mv: Move) -> Result<GameState, MoveError> {
    check_move(state, mv.from, mv.to)?;
    if let Some(kind) = mv.promotion {
        let mover = state.board.get(mv.from).ok_or(MoveError::NoPiece(mv.from))?;
        let foot_soldier = matches!(mover.kind, PieceKind::Pawn | PieceKind::Spearman);
        if !foot_soldier
            || mv.to.row != promotion_row(mover.color)
            || matches!(kind, PieceKind::Pawn | PieceKind::King)
        {
            return Err(MoveError::InvalidPromotion(kind));
        }
    }
    Ok(apply_move(state, mv))
}
