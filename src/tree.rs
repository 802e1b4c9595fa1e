//! Search tree with arena allocation.
//!
//! Nodes live in one `Vec` and refer to each other by [`NodeId`]. A node owns
//! its children in the sense that they are only ever reached through it; the
//! parent link is a plain index, so there are no ownership cycles. The tree
//! is built fresh for every decision and dropped as a whole.
//!
//! Each node's statistics are from the point of view of the player whose move
//! led to it, so a parent can rank its children by their `value()` directly.

use crate::board::GameState;
use crate::constants::{GREEDY_TEMPERATURE, PUCT_C_BASE, PUCT_C_INIT};
use crate::rules::Move;

/// Index into the node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn is_some(self) -> bool {
        !self.is_none()
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A vertex of the search tree.
#[derive(Debug, Clone)]
pub struct SearchNode {
    /// Parent index (`NONE` for the root)
    pub parent: NodeId,
    /// Move that led here from the parent (`None` for the root)
    pub mv: Option<Move>,
    /// Prior probability from the evaluator, renormalized over legal moves
    pub prior: f64,
    pub visit_count: u32,
    pub value_sum: f64,
    /// Children in generation order. Empty until expanded.
    pub children: Vec<NodeId>,
    /// Simulations currently in flight through this node
    pub pending: u32,
    /// Cached value of a position with no legal moves
    pub terminal_value: Option<f64>,
}

impl SearchNode {
    fn new(parent: NodeId, mv: Option<Move>, prior: f64) -> Self {
        Self {
            parent,
            mv,
            prior,
            visit_count: 0,
            value_sum: 0.0,
            children: Vec::new(),
            pending: 0,
            terminal_value: None,
        }
    }

    /// A node is expanded iff it has children.
    #[inline]
    pub fn expanded(&self) -> bool {
        !self.children.is_empty()
    }

    /// Mean backed-up value, 0 when unvisited.
    #[inline]
    pub fn value(&self) -> f64 {
        if self.visit_count == 0 {
            0.0
        } else {
            self.value_sum / self.visit_count as f64
        }
    }

    /// Visits including simulations still in flight.
    #[inline]
    pub fn effective_visits(&self) -> u32 {
        self.visit_count + self.pending
    }

    /// Mean value with each in-flight simulation counted as a loss of `virtual_loss`.
    #[inline]
    pub fn effective_value(&self, virtual_loss: f64) -> f64 {
        let n = self.effective_visits();
        if n == 0 {
            0.0
        } else {
            (self.value_sum - self.pending as f64 * virtual_loss) / n as f64
        }
    }
}

/// Exploration rate `C(p) = ln((N(p) + c_base) / c_base) + c_init`.
#[inline]
pub fn exploration_rate(parent_visits: u32) -> f64 {
    ((parent_visits as f64 + PUCT_C_BASE) / PUCT_C_BASE).ln() + PUCT_C_INIT
}

/// `score(c) = value(c) + C(p) * prior(c) * sqrt(N(p)) / (1 + N(c))`.
#[inline]
pub fn puct_score(parent_visits: u32, child_visits: u32, child_value: f64, prior: f64) -> f64 {
    let u = exploration_rate(parent_visits) * prior * (parent_visits as f64).sqrt()
        / (1.0 + child_visits as f64);
    child_value + u
}

/// Search tree rooted at one game state.
#[derive(Debug)]
pub struct SearchTree {
    nodes: Vec<SearchNode>,
    root: NodeId,
    state: GameState,
}

impl SearchTree {
    pub fn new(state: GameState) -> Self {
        Self {
            nodes: vec![SearchNode::new(NodeId::NONE, None, 1.0)],
            root: NodeId(0),
            state,
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The game state at the root.
    #[inline]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &SearchNode {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut SearchNode {
        &mut self.nodes[id.index()]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Children of a node with their nodes.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &SearchNode)> + '_ {
        self.get(id)
            .children
            .iter()
            .map(move |&child| (child, self.get(child)))
    }

    /// Create a child for `mv` under `parent`.
    pub fn add_child(&mut self, parent: NodeId, mv: Move, prior: f64) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(SearchNode::new(parent, Some(mv), prior));
        self.get_mut(parent).children.push(id);
        id
    }

    /// PUCT score of `child` as seen from its parent, counting in-flight
    /// simulations as losses of `virtual_loss`.
    pub fn score(&self, child: NodeId, virtual_loss: f64) -> f64 {
        let node = self.get(child);
        let parent_visits = if node.parent.is_some() {
            self.get(node.parent).effective_visits()
        } else {
            0
        };
        puct_score(
            parent_visits,
            node.effective_visits(),
            node.effective_value(virtual_loss),
            node.prior,
        )
    }

    /// Child with the highest PUCT score. Ties go to the earliest child.
    pub fn select_child(&self, id: NodeId, virtual_loss: f64) -> Option<NodeId> {
        let mut best: Option<(NodeId, f64)> = None;
        for &child in &self.get(id).children {
            let score = self.score(child, virtual_loss);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((child, score));
            }
        }
        best.map(|(child, _)| child)
    }

    /// Walk from `leaf` to the root adding `value * (-1)^d` and one visit at
    /// depth `d` (the leaf is depth 0).
    pub fn backpropagate(&mut self, leaf: NodeId, value: f64) {
        let mut current = leaf;
        let mut v = value;
        while current.is_some() {
            let node = self.get_mut(current);
            node.visit_count += 1;
            node.value_sum += v;
            v = -v;
            current = node.parent;
        }
    }

    /// Mark a simulation in flight on every node from `leaf` to the root.
    pub fn apply_virtual_loss(&mut self, leaf: NodeId) {
        let mut current = leaf;
        while current.is_some() {
            let node = self.get_mut(current);
            node.pending += 1;
            current = node.parent;
        }
    }

    /// Undo [`SearchTree::apply_virtual_loss`].
    pub fn remove_virtual_loss(&mut self, leaf: NodeId) {
        let mut current = leaf;
        while current.is_some() {
            let node = self.get_mut(current);
            node.pending = node.pending.saturating_sub(1);
            current = node.parent;
        }
    }

    /// Most visited root child. Ties go to the earliest child.
    pub fn best_move(&self) -> Option<Move> {
        let mut best: Option<(&SearchNode, u32)> = None;
        for (_, child) in self.children(self.root) {
            if best.is_none_or(|(_, v)| child.visit_count > v) {
                best = Some((child, child.visit_count));
            }
        }
        best.and_then(|(node, _)| node.mv)
    }

    /// Distribution over root moves proportional to `visits^(1/temperature)`.
    ///
    /// * no children: empty (terminal position)
    /// * all children unvisited: uniform
    /// * temperature below 1e-3: all mass on the most visited child
    pub fn extract_policy(&self, temperature: f32) -> Vec<(Move, f32)> {
        let children: Vec<(Move, u32)> = self
            .children(self.root)
            .filter_map(|(_, c)| Some((c.mv?, c.visit_count)))
            .collect();
        if children.is_empty() {
            return Vec::new();
        }

        let max_visits = children.iter().map(|&(_, v)| v).max().unwrap_or(0);
        if max_visits == 0 {
            let p = 1.0 / children.len() as f32;
            return children.into_iter().map(|(mv, _)| (mv, p)).collect();
        }

        if temperature < GREEDY_TEMPERATURE {
            let best = self.best_move();
            return children
                .into_iter()
                .map(|(mv, _)| (mv, if Some(mv) == best { 1.0 } else { 0.0 }))
                .collect();
        }

        // Scale by the max first so large exponents cannot overflow
        let exponent = 1.0 / temperature as f64;
        let weights: Vec<f64> = children
            .iter()
            .map(|&(_, v)| (v as f64 / max_visits as f64).powf(exponent))
            .collect();
        let total: f64 = weights.iter().sum();
        children
            .into_iter()
            .zip(weights)
            .map(|((mv, _), w)| (mv, (w / total) as f32))
            .collect()
    }

    /// Statistics about the tree for logging.
    pub fn stats(&self) -> TreeStats {
        let root = self.get(self.root);
        let mut max_depth = 0;
        let mut stack = vec![(self.root, 0u32)];
        while let Some((id, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            stack.extend(self.get(id).children.iter().map(|&c| (c, depth + 1)));
        }
        TreeStats {
            total_nodes: self.nodes.len(),
            root_visits: root.visit_count,
            root_value: root.value(),
            max_depth,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeStats {
    pub total_nodes: usize,
    pub root_visits: u32,
    pub root_value: f64,
    pub max_depth: u32,
}
