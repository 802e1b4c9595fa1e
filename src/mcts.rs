//! PUCT Monte Carlo Tree Search driven by an external evaluator.
//!
//! One call to [`Mcts::search`] builds a fresh [`SearchTree`] for the given
//! position and runs the simulation loop:
//! - Select: descend by PUCT score to a childless node
//! - Terminal check: positions without legal moves are scored by the rules
//! - Expand/Evaluate: the evaluator's policy becomes the children's priors
//!   and its value is backed up directly (no rollouts)
//! - Backpropagate: alternate the sign on the way to the root
//!
//! When `eval_batch_size > 1`, leaves are collected under virtual loss and
//! sent to [`Evaluator::evaluate_batch`] together.

use std::time::Instant;

use thiserror::Error;
use tracing::{debug, trace};

use crate::action::ActionSpace;
use crate::board::GameState;
use crate::config::{ConfigError, SearchConfig};
use crate::evaluator::{BoardEncoder, EvalResult, Evaluator, EvaluatorError};
use crate::rules::{Move, apply_move, generate_legal_moves, is_in_check};
use crate::tree::{NodeId, SearchTree, TreeStats};

/// Errors that abort a search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("evaluator error: {0}")]
    Evaluator(#[from] EvaluatorError),

    #[error("evaluator returned a policy of length {got}, expected {expected}")]
    PolicyLength { expected: usize, got: usize },

    #[error("evaluator returned {got} results for a batch of {expected}")]
    BatchLength { expected: usize, got: usize },

    #[error("evaluator returned a non-finite value: {0}")]
    InvalidValue(f32),

    #[error("invalid search config: {0}")]
    Config(#[from] ConfigError),
}

/// Outcome of one search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Probability per legal root move, in generation order.
    pub policy: Vec<(Move, f32)>,
    /// Visit count per root move, in generation order.
    pub visits: Vec<(Move, u32)>,
    /// Most visited root move. `None` when the root is terminal.
    pub best_move: Option<Move>,
    /// Mean backed-up value for the side to move at the root.
    pub root_value: f64,
    /// Simulations actually run.
    pub simulations: u32,
    pub stats: TreeStats,
}

impl SearchResult {
    /// True when the root had no legal moves.
    pub fn is_terminal(&self) -> bool {
        self.policy.is_empty()
    }

    /// Draw a move from the policy.
    pub fn sample_move(&self, rng: &mut fastrand::Rng) -> Option<Move> {
        let mut remaining = rng.f32();
        for &(mv, p) in &self.policy {
            if remaining < p {
                return Some(mv);
            }
            remaining -= p;
        }
        // Rounding left a sliver of mass unassigned
        self.policy
            .iter()
            .rev()
            .find(|(_, p)| *p > 0.0)
            .map(|&(mv, _)| mv)
    }

    /// The policy spread over the full action space.
    pub fn dense_policy(&self, space: &ActionSpace) -> Vec<f32> {
        let mut dense = vec![0.0; space.len()];
        for &(mv, p) in &self.policy {
            dense[space.encode(mv)] += p;
        }
        dense
    }
}

/// A leaf waiting for its evaluation.
struct PendingLeaf {
    node: NodeId,
    moves: Vec<Move>,
    input: Vec<f32>,
}

/// Search controller. Owns its configuration, evaluator and encoder.
pub struct Mcts<E, B> {
    config: SearchConfig,
    evaluator: E,
    encoder: B,
}

impl<E: Evaluator, B: BoardEncoder> Mcts<E, B> {
    pub fn new(config: SearchConfig, evaluator: E, encoder: B) -> Self {
        Self {
            config,
            evaluator,
            encoder,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SearchConfig {
        &mut self.config
    }

    /// Run simulations from `state` and return the visit-count policy.
    ///
    /// At least one simulation always runs, even if the time budget is
    /// already spent, so a non-terminal root always gets children.
    pub fn search(&self, state: &GameState) -> Result<SearchResult, SearchError> {
        self.config.validate()?;
        let space = self.config.action_space();
        let mut tree = SearchTree::new(state.clone());

        if generate_legal_moves(state, state.side_to_move).is_empty() {
            let root_value = if is_in_check(state, state.side_to_move) {
                -1.0
            } else {
                0.0
            };
            debug!(root_value, "search root is terminal");
            return Ok(SearchResult {
                policy: Vec::new(),
                visits: Vec::new(),
                best_move: None,
                root_value,
                simulations: 0,
                stats: tree.stats(),
            });
        }

        let start = Instant::now();
        let deadline = self.config.time_budget().map(|budget| start + budget);
        let batch_size = self.config.eval_batch_size;
        let virtual_loss = if batch_size > 1 {
            self.config.virtual_loss
        } else {
            0.0
        };

        let mut completed = 0u32;
        while completed < self.config.num_simulations {
            if completed > 0 && deadline.is_some_and(|d| Instant::now() >= d) {
                debug!(completed, "search stopped by time budget");
                break;
            }

            let wanted = batch_size.min((self.config.num_simulations - completed) as usize);
            let mut batch: Vec<PendingLeaf> = Vec::with_capacity(wanted);
            let mut collected = 0;
            while collected < wanted {
                let spent = deadline.is_some_and(|d| Instant::now() >= d);
                if spent && completed as usize + batch.len() > 0 {
                    debug!(completed, pending = batch.len(), "batch cut short by time budget");
                    break;
                }
                let (leaf, leaf_state) = descend(&tree, virtual_loss);
                let (terminal_value, pending) = {
                    let node = tree.get(leaf);
                    (node.terminal_value, node.pending)
                };

                if let Some(value) = terminal_value {
                    tree.backpropagate(leaf, value);
                    completed += 1;
                    collected += 1;
                    continue;
                }
                if pending > 0 {
                    // Already waiting in this batch
                    break;
                }

                let moves = generate_legal_moves(&leaf_state, leaf_state.side_to_move);
                if moves.is_empty() {
                    // The player who moved here delivered mate
                    let value = if is_in_check(&leaf_state, leaf_state.side_to_move) {
                        1.0
                    } else {
                        0.0
                    };
                    tree.get_mut(leaf).terminal_value = Some(value);
                    tree.backpropagate(leaf, value);
                    completed += 1;
                    collected += 1;
                    continue;
                }

                if batch_size > 1 {
                    tree.apply_virtual_loss(leaf);
                }
                batch.push(PendingLeaf {
                    node: leaf,
                    moves,
                    input: self.encoder.encode(&leaf_state),
                });
                collected += 1;
            }

            if batch.is_empty() {
                continue;
            }
            trace!(leaves = batch.len(), "evaluating batch");
            let results = self.evaluate(&batch)?;

            for (leaf, result) in batch.into_iter().zip(results) {
                if batch_size > 1 {
                    tree.remove_virtual_loss(leaf.node);
                }
                if result.policy.len() != space.len() {
                    return Err(SearchError::PolicyLength {
                        expected: space.len(),
                        got: result.policy.len(),
                    });
                }
                if !result.value.is_finite() {
                    return Err(SearchError::InvalidValue(result.value));
                }
                expand(&mut tree, leaf.node, &leaf.moves, &result.policy, &space);
                tree.backpropagate(leaf.node, -f64::from(result.value));
                completed += 1;
            }
        }

        let stats = tree.stats();
        let result = SearchResult {
            policy: tree.extract_policy(self.config.temperature),
            visits: tree
                .children(tree.root())
                .filter_map(|(_, child)| Some((child.mv?, child.visit_count)))
                .collect(),
            best_move: tree.best_move(),
            root_value: -tree.get(tree.root()).value(),
            simulations: completed,
            stats,
        };
        debug!(
            simulations = result.simulations,
            nodes = result.stats.total_nodes,
            depth = result.stats.max_depth,
            root_value = result.root_value,
            best = ?result.best_move.map(|m| m.to_string()),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "search finished"
        );
        Ok(result)
    }

    fn evaluate(&self, batch: &[PendingLeaf]) -> Result<Vec<EvalResult>, SearchError> {
        if self.config.eval_batch_size == 1 {
            return batch
                .iter()
                .map(|leaf| self.evaluator.evaluate(&leaf.input).map_err(SearchError::from))
                .collect();
        }
        let inputs: Vec<Vec<f32>> = batch.iter().map(|leaf| leaf.input.clone()).collect();
        let results = self.evaluator.evaluate_batch(&inputs)?;
        if results.len() != batch.len() {
            return Err(SearchError::BatchLength {
                expected: batch.len(),
                got: results.len(),
            });
        }
        Ok(results)
    }
}

/// Follow PUCT from the root to a childless node, replaying moves on a copy
/// of the root state.
fn descend(tree: &SearchTree, virtual_loss: f64) -> (NodeId, GameState) {
    let mut id = tree.root();
    let mut state = tree.state().clone();
    while let Some(child) = tree.select_child(id, virtual_loss) {
        if let Some(mv) = tree.get(child).mv {
            state = apply_move(&state, mv);
        }
        id = child;
    }
    (id, state)
}

/// Add one child per legal move, priors taken from `policy` and renormalized.
fn expand(
    tree: &mut SearchTree,
    leaf: NodeId,
    moves: &[Move],
    policy: &[f32],
    space: &ActionSpace,
) {
    let raw: Vec<f64> = moves
        .iter()
        .map(|&mv| {
            let p = policy[space.encode(mv)];
            if p.is_finite() && p > 0.0 { f64::from(p) } else { 0.0 }
        })
        .collect();
    let total: f64 = raw.iter().sum();
    let uniform = 1.0 / moves.len() as f64;
    for (&mv, p) in moves.iter().zip(raw) {
        let prior = if total > 0.0 { p / total } else { uniform };
        tree.add_child(leaf, mv, prior);
    }
}
