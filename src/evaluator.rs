//! Evaluator and board-encoder seams.
//!
//! The search treats both as opaque: an encoder turns a [`GameState`] into a
//! flat `f32` tensor, and an evaluator turns that tensor into a policy over
//! the full action space plus a scalar value for the side to move. In
//! production the evaluator is a trained network; the implementations here
//! are references for testing and for running the engine without a model.

use thiserror::Error;

use crate::board::GameState;
use crate::constants::{ENCODER_CHANNELS, MATERIAL_SCALE, NUM_ACTIONS, NUM_SQUARES};
use crate::piece::{Color, PieceKind};

/// Errors that can occur during evaluation.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Policy and value for one position.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalResult {
    /// Probability per action index (see [`crate::action::ActionSpace`]).
    pub policy: Vec<f32>,

    /// Value for the side to move, in [-1, 1].
    pub value: f32,
}

/// Position evaluator. Must be pure from the search's point of view.
pub trait Evaluator {
    fn evaluate(&self, input: &[f32]) -> Result<EvalResult, EvaluatorError>;

    /// Evaluate several positions in one call. Defaults to one call each.
    fn evaluate_batch(&self, inputs: &[Vec<f32>]) -> Result<Vec<EvalResult>, EvaluatorError> {
        inputs.iter().map(|input| self.evaluate(input)).collect()
    }
}

impl<E: Evaluator + ?Sized> Evaluator for &E {
    fn evaluate(&self, input: &[f32]) -> Result<EvalResult, EvaluatorError> {
        (**self).evaluate(input)
    }

    fn evaluate_batch(&self, inputs: &[Vec<f32>]) -> Result<Vec<EvalResult>, EvaluatorError> {
        (**self).evaluate_batch(inputs)
    }
}

/// Deterministic transform from a game state to evaluator input.
pub trait BoardEncoder {
    fn encode(&self, state: &GameState) -> Vec<f32>;
}

/// One-hot piece planes, `channels x 10 x 10`, channel-major.
///
/// Kinds are ordered `P N B R Q K SP T M A LG`; a white piece of kind index
/// `i` goes to channel `i % channels`, a black one to `(i + 11) % channels`.
/// With three channels this reproduces the trained network's input layout
/// (several kinds share a plane). With 22 channels every piece gets its own
/// plane. When `side_to_move_plane` is set, one extra plane is appended that
/// is all ones when White is on move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneEncoder {
    pub channels: usize,
    pub side_to_move_plane: bool,
}

/// Number of distinct (color, kind) planes.
pub const FULL_CHANNELS: usize = 2 * PieceKind::ALL.len();

impl Default for PlaneEncoder {
    fn default() -> Self {
        Self {
            channels: ENCODER_CHANNELS,
            side_to_move_plane: false,
        }
    }
}

impl PlaneEncoder {
    /// One plane per (color, kind) plus the side-to-move plane.
    pub fn full() -> Self {
        Self {
            channels: FULL_CHANNELS,
            side_to_move_plane: true,
        }
    }

    /// Length of the encoded vector.
    pub fn len(&self) -> usize {
        (self.channels + usize::from(self.side_to_move_plane)) * NUM_SQUARES
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn channel(&self, color: Color, kind: PieceKind) -> usize {
        let index = kind.plane_index();
        match color {
            Color::White => index % self.channels,
            Color::Black => (index + PieceKind::ALL.len()) % self.channels,
        }
    }
}

impl BoardEncoder for PlaneEncoder {
    fn encode(&self, state: &GameState) -> Vec<f32> {
        let mut planes = vec![0.0; self.len()];
        if self.channels == 0 {
            return planes;
        }
        for (pos, piece) in state.board.pieces() {
            let channel = self.channel(piece.color, piece.kind);
            planes[channel * NUM_SQUARES + pos.index()] = 1.0;
        }
        if self.side_to_move_plane && state.side_to_move == Color::White {
            let start = self.channels * NUM_SQUARES;
            planes[start..start + NUM_SQUARES].fill(1.0);
        }
        planes
    }
}

/// Uniform policy over the whole action space, value 0.
///
/// The search filters the policy to legal moves, so this yields uniform
/// priors over whatever is legal.
#[derive(Debug, Clone)]
pub struct UniformEvaluator {
    pub num_actions: usize,
}

impl Default for UniformEvaluator {
    fn default() -> Self {
        Self::new(NUM_ACTIONS)
    }
}

impl UniformEvaluator {
    pub fn new(num_actions: usize) -> Self {
        Self { num_actions }
    }
}

impl Evaluator for UniformEvaluator {
    fn evaluate(&self, _input: &[f32]) -> Result<EvalResult, EvaluatorError> {
        let p = if self.num_actions == 0 {
            0.0
        } else {
            1.0 / self.num_actions as f32
        };
        Ok(EvalResult {
            policy: vec![p; self.num_actions],
            value: 0.0,
        })
    }
}

/// Uniform policy with a material-balance value.
///
/// Expects input from [`PlaneEncoder::full`]. The value is
/// `tanh((material(side to move) - material(opponent)) / 1000)`.
#[derive(Debug, Clone, Default)]
pub struct MaterialEvaluator {
    uniform: UniformEvaluator,
}

impl MaterialEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The encoder this evaluator understands.
    pub fn encoder() -> PlaneEncoder {
        PlaneEncoder::full()
    }
}

fn plane_value(channel: usize) -> i32 {
    let index = channel % PieceKind::ALL.len();
    PieceKind::ALL
        .iter()
        .find(|k| k.plane_index() == index)
        .map_or(0, |k| k.value())
}

impl Evaluator for MaterialEvaluator {
    fn evaluate(&self, input: &[f32]) -> Result<EvalResult, EvaluatorError> {
        let expected = PlaneEncoder::full().len();
        if input.len() != expected {
            return Err(EvaluatorError::InvalidInput(format!(
                "expected {expected} inputs, got {}",
                input.len()
            )));
        }

        let mut balance = 0i32;
        for (channel, plane) in input[..FULL_CHANNELS * NUM_SQUARES]
            .chunks_exact(NUM_SQUARES)
            .enumerate()
        {
            let count = plane.iter().filter(|&&x| x > 0.5).count() as i32;
            let value = count * plane_value(channel);
            if channel < PieceKind::ALL.len() {
                balance += value;
            } else {
                balance -= value;
            }
        }

        let white_to_move = input[FULL_CHANNELS * NUM_SQUARES] > 0.5;
        if !white_to_move {
            balance = -balance;
        }

        let mut result = self.uniform.evaluate(input)?;
        result.value = (balance as f32 / MATERIAL_SCALE).tanh();
        Ok(result)
    }
}
