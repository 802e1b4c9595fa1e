//! Board grid and full game state.
//!
//! [`GameState`] is a plain value: the rules engine takes it by reference and
//! returns new states, so a search can keep as many snapshots as it likes.

use std::fmt;

use crate::constants::{N, NUM_SQUARES};
use crate::piece::{Color, Piece, PieceKind, parse_piece};
use crate::position::{Position, parse_coord};

/// 10x10 grid of optional pieces.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [Option<Piece>; NUM_SQUARES],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// An empty board.
    pub fn new() -> Self {
        Self {
            cells: [None; NUM_SQUARES],
        }
    }

    #[inline]
    pub fn get(&self, pos: Position) -> Option<Piece> {
        self.cells[pos.index()]
    }

    #[inline]
    pub fn set(&mut self, pos: Position, piece: Option<Piece>) {
        self.cells[pos.index()] = piece;
    }

    #[inline]
    pub fn is_empty(&self, pos: Position) -> bool {
        self.cells[pos.index()].is_none()
    }

    /// All occupied squares with their pieces, in row-major order.
    pub fn pieces(&self) -> impl Iterator<Item = (Position, Piece)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| Some((Position::from_index(i)?, (*cell)?)))
    }
}

/// Castling rights per color and side. Tracked but not used for move legality.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CastlingRights {
    pub white_king_side: bool,
    pub white_queen_side: bool,
    pub black_king_side: bool,
    pub black_queen_side: bool,
}

impl CastlingRights {
    pub const ALL: CastlingRights = CastlingRights {
        white_king_side: true,
        white_queen_side: true,
        black_king_side: true,
        black_queen_side: true,
    };

    pub const NONE: CastlingRights = CastlingRights {
        white_king_side: false,
        white_queen_side: false,
        black_king_side: false,
        black_queen_side: false,
    };

    pub fn clear_color(&mut self, color: Color) {
        match color {
            Color::White => {
                self.white_king_side = false;
                self.white_queen_side = false;
            }
            Color::Black => {
                self.black_king_side = false;
                self.black_queen_side = false;
            }
        }
    }

    /// Drop the right tied to a rook's home square, if `pos` is one.
    pub fn clear_rook_square(&mut self, pos: Position) {
        let last = (N - 1) as u8;
        match (pos.row, pos.col) {
            (r, 0) if r == last => self.white_queen_side = false,
            (r, c) if r == last && c == last => self.white_king_side = false,
            (0, 0) => self.black_queen_side = false,
            (0, c) if c == last => self.black_king_side = false,
            _ => {}
        }
    }
}

/// A complete position: pieces, side to move, king tracking, castling rights.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GameState {
    pub board: Board,
    pub side_to_move: Color,
    /// King square per color, indexed by [`Color::index`].
    pub king_pos: [Option<Position>; 2],
    pub castling: CastlingRights,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

/// White's setup; Black mirrors it across the middle of the board.
const WHITE_SETUP: &[(&str, &[&str])] = &[
    ("SP", &["a3", "b3", "i3", "j3"]),
    ("P", &["c3", "d3", "e3", "f3", "g3", "h3"]),
    ("LG", &["a2", "j2"]),
    ("N", &["b2", "i2"]),
    ("B", &["c2", "h2"]),
    ("A", &["d2", "g2"]),
    ("R", &["a1", "j1"]),
    ("M", &["d1"]),
    ("Q", &["e1"]),
    ("K", &["f1"]),
    ("T", &["g1"]),
];

impl GameState {
    /// The standard starting position, White to move.
    pub fn new() -> Self {
        let mut state = Self::empty(Color::White);
        for (code, squares) in WHITE_SETUP {
            let Some(kind) = PieceKind::from_code(code) else {
                continue;
            };
            for sq in *squares {
                let Some(pos) = parse_coord(sq) else {
                    continue;
                };
                let mirrored = Position {
                    row: (N - 1) as u8 - pos.row,
                    col: pos.col,
                };
                state.place(pos, Piece::new(Color::White, kind));
                state.place(mirrored, Piece::new(Color::Black, kind));
            }
        }
        state.castling = CastlingRights::ALL;
        state
    }

    /// An empty board with no castling rights.
    pub fn empty(side_to_move: Color) -> Self {
        Self {
            board: Board::new(),
            side_to_move,
            king_pos: [None, None],
            castling: CastlingRights::NONE,
        }
    }

    /// Build a state from `(piece, square)` placements.
    pub fn from_placements(side_to_move: Color, placements: &[(Piece, Position)]) -> Self {
        let mut state = Self::empty(side_to_move);
        for &(piece, pos) in placements {
            state.place(pos, piece);
        }
        state
    }

    /// Put a piece on a square, keeping king tracking consistent.
    pub fn place(&mut self, pos: Position, piece: Piece) {
        self.remove(pos);
        self.board.set(pos, Some(piece));
        if piece.kind == PieceKind::King {
            self.king_pos[piece.color.index()] = Some(pos);
        }
    }

    /// Clear a square, returning what stood there.
    pub fn remove(&mut self, pos: Position) -> Option<Piece> {
        let old = self.board.get(pos);
        if let Some(p) = old {
            if p.kind == PieceKind::King && self.king_pos[p.color.index()] == Some(pos) {
                self.king_pos[p.color.index()] = None;
            }
        }
        self.board.set(pos, None);
        old
    }

    #[inline]
    pub fn king_position(&self, color: Color) -> Option<Position> {
        self.king_pos[color.index()]
    }

    /// Total material of a color in centipawns.
    pub fn material(&self, color: Color) -> i32 {
        self.board
            .pieces()
            .filter(|(_, p)| p.color == color)
            .map(|(_, p)| p.kind.value())
            .sum()
    }
}

/// Parse a placement written as `<piece>@<square>`, e.g. `WK@f1`.
pub fn parse_placement(s: &str) -> Option<(Piece, Position)> {
    let (piece, square) = s.split_once('@')?;
    Some((parse_piece(piece)?, parse_coord(square)?))
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..N {
            write!(f, "{:>2} ", N - row)?;
            for col in 0..N {
                let pos = Position {
                    row: row as u8,
                    col: col as u8,
                };
                match self.board.get(pos) {
                    Some(p) => write!(f, "{:<4}", p.to_string())?,
                    None => write!(f, "{:<4}", ".")?,
                }
            }
            writeln!(f)?;
        }
        write!(f, "   ")?;
        for col in 0..N {
            write!(f, "{:<4}", (b'a' + col as u8) as char)?;
        }
        writeln!(f)?;
        writeln!(f, "{} to move", self.side_to_move)
    }
}
