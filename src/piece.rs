//! Piece colors, kinds, and their text codes.
//!
//! Pieces are written as a color prefix (`W` or `B`) followed by a kind code,
//! e.g. `WK`, `BSP`, `WLG`.

use std::fmt;

use crate::constants::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub const ALL: [Color; 2] = [Color::White, Color::Black];

    #[inline]
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Row delta of a forward step for this color.
    #[inline]
    pub fn forward(self) -> i8 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    /// Row pawns and spearmen of this color start on.
    #[inline]
    pub fn start_row(self) -> u8 {
        match self {
            Color::White => WHITE_START_ROW,
            Color::Black => BLACK_START_ROW,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }

    pub fn code(self) -> char {
        match self {
            Color::White => 'W',
            Color::Black => 'B',
        }
    }

    /// Parse `w`, `b`, `white` or `black` (case-insensitive).
    pub fn parse(s: &str) -> Option<Color> {
        match s.to_ascii_lowercase().as_str() {
            "w" | "white" => Some(Color::White),
            "b" | "black" => Some(Color::Black),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Spearman,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
    Templar,
    Marshall,
    Assassin,
    Lineguard,
}

impl PieceKind {
    pub const ALL: [PieceKind; 11] = [
        PieceKind::Pawn,
        PieceKind::Spearman,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
        PieceKind::Templar,
        PieceKind::Marshall,
        PieceKind::Assassin,
        PieceKind::Lineguard,
    ];

    pub fn code(self) -> &'static str {
        match self {
            PieceKind::Pawn => "P",
            PieceKind::Spearman => "SP",
            PieceKind::Knight => "N",
            PieceKind::Bishop => "B",
            PieceKind::Rook => "R",
            PieceKind::Queen => "Q",
            PieceKind::King => "K",
            PieceKind::Templar => "T",
            PieceKind::Marshall => "M",
            PieceKind::Assassin => "A",
            PieceKind::Lineguard => "LG",
        }
    }

    /// Parse a kind code. `IP` is accepted as a pawn.
    pub fn from_code(code: &str) -> Option<PieceKind> {
        let kind = match code.to_ascii_uppercase().as_str() {
            "P" | "IP" => PieceKind::Pawn,
            "SP" => PieceKind::Spearman,
            "N" => PieceKind::Knight,
            "B" => PieceKind::Bishop,
            "R" => PieceKind::Rook,
            "Q" => PieceKind::Queen,
            "K" => PieceKind::King,
            "T" => PieceKind::Templar,
            "M" => PieceKind::Marshall,
            "A" => PieceKind::Assassin,
            "LG" => PieceKind::Lineguard,
            _ => return None,
        };
        Some(kind)
    }

    /// Material value in centipawns. The king has no material value.
    pub fn value(self) -> i32 {
        match self {
            PieceKind::Pawn => VALUE_PAWN,
            PieceKind::Spearman => VALUE_SPEARMAN,
            PieceKind::Knight => VALUE_KNIGHT,
            PieceKind::Bishop => VALUE_BISHOP,
            PieceKind::Rook => VALUE_ROOK,
            PieceKind::Queen => VALUE_QUEEN,
            PieceKind::King => 0,
            PieceKind::Templar => VALUE_TEMPLAR,
            PieceKind::Marshall => VALUE_MARSHALL,
            PieceKind::Assassin => VALUE_ASSASSIN,
            PieceKind::Lineguard => VALUE_LINEGUARD,
        }
    }

    /// Index of this kind in the encoder's plane ordering.
    pub fn plane_index(self) -> usize {
        match self {
            PieceKind::Pawn => 0,
            PieceKind::Knight => 1,
            PieceKind::Bishop => 2,
            PieceKind::Rook => 3,
            PieceKind::Queen => 4,
            PieceKind::King => 5,
            PieceKind::Spearman => 6,
            PieceKind::Templar => 7,
            PieceKind::Marshall => 8,
            PieceKind::Assassin => 9,
            PieceKind::Lineguard => 10,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.color.code(), self.kind.code())
    }
}

/// Parse a piece written as color prefix plus kind code (`WSP`, `BK`, ...).
///
/// Returns `None` for anything without a valid color prefix and kind code.
pub fn parse_piece(raw: &str) -> Option<Piece> {
    let raw = raw.trim();
    let mut chars = raw.chars();
    let color = match chars.next()? {
        'W' | 'w' => Color::White,
        'B' | 'b' => Color::Black,
        _ => return None,
    };
    let kind = PieceKind::from_code(chars.as_str())?;
    Some(Piece::new(color, kind))
}
