//! Mapping between moves and policy-vector indices.
//!
//! Index layout: `from_square * (rows * cols) + to_square`, where a square is
//! `row * cols + col`. For the 10x10 board this gives 10 000 actions.

use crate::constants::N;
use crate::position::Position;
use crate::rules::Move;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ActionSpace {
    pub rows: usize,
    pub cols: usize,
}

impl Default for ActionSpace {
    fn default() -> Self {
        Self { rows: N, cols: N }
    }
}

impl ActionSpace {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    #[inline]
    fn squares(&self) -> usize {
        self.rows * self.cols
    }

    /// Total number of actions.
    #[inline]
    pub fn len(&self) -> usize {
        self.squares() * self.squares()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    fn square(&self, pos: Position) -> usize {
        pos.row as usize * self.cols + pos.col as usize
    }

    /// Policy index of a move. Promotion metadata is not part of the index.
    #[inline]
    pub fn encode(&self, mv: Move) -> usize {
        self.square(mv.from) * self.squares() + self.square(mv.to)
    }

    /// Move for a policy index, or `None` if the index is out of range.
    pub fn decode(&self, index: usize) -> Option<Move> {
        if index >= self.len() {
            return None;
        }
        let (from, to) = (index / self.squares(), index % self.squares());
        let from = Position::new((from / self.cols) as i32, (from % self.cols) as i32)?;
        let to = Position::new((to / self.cols) as i32, (to % self.cols) as i32)?;
        Some(Move::new(from, to))
    }
}
