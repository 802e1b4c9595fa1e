//! Board coordinates and their text form.
//!
//! A [`Position`] is a `(row, col)` pair on the 10x10 board. The text form is
//! a column letter `a`-`j` followed by the rank `10 - row`, so `a1` is the
//! bottom-left corner (row 9, col 0) and `j10` the top-right (row 0, col 9).

use std::fmt;

use crate::constants::N;

/// A square on the board.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: u8,
    pub col: u8,
}

impl Position {
    /// Create a position, or `None` if it lies off the board.
    pub fn new(row: i32, col: i32) -> Option<Position> {
        if (0..N as i32).contains(&row) && (0..N as i32).contains(&col) {
            Some(Position {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }

    /// Index into a row-major square array.
    #[inline]
    pub fn index(self) -> usize {
        self.row as usize * N + self.col as usize
    }

    /// Inverse of [`Position::index`].
    #[inline]
    pub fn from_index(index: usize) -> Option<Position> {
        if index < N * N {
            Some(Position {
                row: (index / N) as u8,
                col: (index % N) as u8,
            })
        } else {
            None
        }
    }

    /// The square `(dr, dc)` away from this one, if it is on the board.
    #[inline]
    pub fn offset(self, dr: i32, dc: i32) -> Option<Position> {
        Position::new(self.row as i32 + dr, self.col as i32 + dc)
    }

    /// Iterate over all squares in row-major order.
    pub fn all() -> impl Iterator<Item = Position> {
        (0..N * N).filter_map(Position::from_index)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", str_coord(*self))
    }
}

/// Parse a coordinate like `e4` or `J10`.
///
/// Returns `None` for anything that is not a column `a`-`j` followed by a
/// rank `1`-`10`.
pub fn parse_coord(s: &str) -> Option<Position> {
    let s = s.trim();
    let mut chars = s.chars();
    let col_char = chars.next()?.to_ascii_lowercase();
    if !('a'..='j').contains(&col_char) {
        return None;
    }
    let rank_str = chars.as_str();
    if rank_str.is_empty() || !rank_str.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let rank: i32 = rank_str.parse().ok()?;
    if !(1..=N as i32).contains(&rank) {
        return None;
    }
    let col = col_char as i32 - 'a' as i32;
    Position::new(N as i32 - rank, col)
}

/// Convert a position to its text form.
pub fn str_coord(pos: Position) -> String {
    let col = (b'a' + pos.col) as char;
    let rank = N - pos.row as usize;
    format!("{col}{rank}")
}
