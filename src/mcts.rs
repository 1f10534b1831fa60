//! Monte Carlo Tree Search (MCTS) with UCT selection.
//!
//! Each playout runs four phases against its own copy of the board:
//! 1. Select: descend from the root by UCT score while nodes have children
//! 2. Expand: give a first-visited node one child per legal move
//! 3. Simulate: finish the game with random legal moves
//! 4. Backpropagate: add the outcome to every node on the path
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]. Every node
//! stores wins for black; the selection step flips the numerator when white
//! is choosing, so backpropagation never changes sign.
//!
//! The search is bounded either by a deadline or by a playout count. The
//! deadline is polled before each playout and before each simulated move; a
//! playout cut short by it is dropped before anything is written back.

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::board::{Board, Color, Point};
use crate::constants::UCT_C;
use crate::playout::random_playout;

/// Index into the node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// A node in the search tree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Move that led here from the parent (`None` for the root)
    pub mv: Option<Point>,
    /// Parent node, used only to walk back up during backpropagation
    pub parent: Option<NodeId>,
    /// Number of completed playouts through this node
    pub visits: u32,
    /// How many of those playouts black won
    pub black_wins: u32,
    /// Children in the order they were created (ascending move)
    pub children: Vec<(Point, NodeId)>,
    /// Whether legal moves have been generated for this node
    pub expanded: bool,
}

impl TreeNode {
    fn new(mv: Option<Point>, parent: Option<NodeId>) -> Self {
        Self {
            mv,
            parent,
            visits: 0,
            black_wins: 0,
            children: Vec::new(),
            expanded: false,
        }
    }

    /// Number of playouts through this node won by `color`.
    #[inline]
    pub fn wins_for(&self, color: Color) -> u32 {
        match color {
            Color::Black => self.black_wins,
            Color::White => self.visits - self.black_wins,
        }
    }

    /// Fraction of playouts won by `color`, or `None` if never visited.
    pub fn win_rate(&self, color: Color) -> Option<f64> {
        (self.visits > 0).then(|| self.wins_for(color) as f64 / self.visits as f64)
    }

    /// Expanded with no children: the side to move here has no legal move.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.expanded && self.children.is_empty()
    }
}

/// UCT score of `child` for the player choosing at its parent.
///
/// Unvisited children score infinity so each is tried once before any is revisited.
pub fn uct_score(parent_visits: u32, child: &TreeNode, mover: Color, c: f64) -> f64 {
    if child.visits == 0 {
        return f64::INFINITY;
    }
    let n = child.visits as f64;
    child.wins_for(mover) as f64 / n + c * ((parent_visits as f64).ln() / n).sqrt()
}

/// Search tree with arena-based node storage. The root is always the first node.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<TreeNode>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    const ROOT: NodeId = NodeId(0);

    /// A tree holding only an unexpanded root.
    pub fn new() -> Self {
        Self {
            nodes: vec![TreeNode::new(None, None)],
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0 as usize]
    }

    #[inline]
    fn get_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id.0 as usize]
    }

    /// Total number of nodes, root included.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the root exists from construction.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Children of a node as `(move, node)` pairs.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = (Point, &TreeNode)> + '_ {
        self.get(id)
            .children
            .iter()
            .map(|&(mv, child)| (mv, self.get(child)))
    }

    /// Add one unvisited child per move and mark the node expanded.
    pub fn expand(&mut self, id: NodeId, moves: &[Point]) {
        for &mv in moves {
            let child = NodeId(self.nodes.len() as u32);
            self.nodes.push(TreeNode::new(Some(mv), Some(id)));
            self.get_mut(id).children.push((mv, child));
        }
        self.get_mut(id).expanded = true;
    }

    /// Child with the highest UCT score for `mover`; the first one wins ties.
    pub fn select_child(&self, id: NodeId, mover: Color, c: f64) -> Option<(Point, NodeId)> {
        let node = self.get(id);
        let mut best: Option<(Point, NodeId)> = None;
        let mut best_score = f64::NEG_INFINITY;
        for &(mv, child) in &node.children {
            let score = uct_score(node.visits, self.get(child), mover, c);
            if best.is_none() || score > best_score {
                best = Some((mv, child));
                best_score = score;
            }
        }
        best
    }

    /// Record one playout outcome on `leaf` and every ancestor.
    pub fn backpropagate(&mut self, leaf: NodeId, black_won: bool) {
        let mut current = Some(leaf);
        while let Some(id) = current {
            let node = self.get_mut(id);
            node.visits += 1;
            if black_won {
                node.black_wins += 1;
            }
            current = node.parent;
        }
    }

    /// Most-visited root child; the first one wins ties.
    pub fn best_child(&self) -> Option<&TreeNode> {
        let mut best: Option<&TreeNode> = None;
        for (_, child) in self.children(self.root()) {
            if best.is_none_or(|b| child.visits > b.visits) {
                best = Some(child);
            }
        }
        best
    }
}

/// How long a search may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    /// Run playouts until this much wall-clock time has passed.
    Time(Duration),
    /// Run exactly this many playouts, ignoring the clock.
    Playouts(u64),
}

/// Search parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// UCT exploration constant
    pub exploration: f64,
    /// Seed for the playout RNG; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            exploration: UCT_C,
            seed: None,
        }
    }
}

/// Outcome of one [`Search::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Chosen move, or `None` if there is nothing to play
    pub best: Option<Point>,
    /// Completed playouts
    pub playouts: u64,
    /// Nodes in the tree at the end of the search
    pub nodes: usize,
    /// Wall-clock time spent
    pub elapsed: Duration,
    /// Win rate of the chosen move for the side that searched
    pub win_rate: Option<f64>,
}

/// MCTS driver. The tree is rebuilt on every [`run`](Search::run); the RNG carries over.
pub struct Search {
    tree: Tree,
    rng: fastrand::Rng,
    exploration: f64,
}

impl Search {
    pub fn new(config: &SearchConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        Self {
            tree: Tree::new(),
            rng,
            exploration: config.exploration,
        }
    }

    /// The tree built by the last run.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Search for a move for `color` on `board` within `budget`.
    ///
    /// `board` itself is never modified; every playout works on a clone.
    /// Returns no move when `color` has no legal move or when not a single
    /// playout completed before the deadline.
    pub fn run(&mut self, board: &Board, color: Color, budget: Budget) -> SearchResult {
        let start = Instant::now();
        self.tree = Tree::new();

        let (deadline, max_playouts) = match budget {
            Budget::Time(limit) => (start.checked_add(limit), u64::MAX),
            Budget::Playouts(n) => (None, n),
        };

        let root_moves = board.clone().legal_moves(color);
        let root = self.tree.root();
        self.tree.expand(root, &root_moves);

        let mut playouts = 0u64;
        if !root_moves.is_empty() {
            while playouts < max_playouts {
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    break;
                }
                if !self.playout(board, color, deadline) {
                    break;
                }
                playouts += 1;
            }
        }

        let best = if playouts == 0 {
            None
        } else {
            self.tree.best_child()
        };
        let result = SearchResult {
            best: best.and_then(|c| c.mv),
            playouts,
            nodes: self.tree.len(),
            elapsed: start.elapsed(),
            win_rate: best.and_then(|c| c.win_rate(color)),
        };

        debug!(
            color = %color,
            best = ?result.best,
            playouts = result.playouts,
            nodes = result.nodes,
            elapsed_ms = result.elapsed.as_millis() as u64,
            win_rate = ?result.win_rate,
            "search finished"
        );
        self.trace_root_children(color);

        result
    }

    /// One select-expand-simulate-backpropagate cycle.
    ///
    /// Returns false, without touching any statistics, if the deadline cut
    /// the simulation short.
    fn playout(&mut self, board: &Board, color: Color, deadline: Option<Instant>) -> bool {
        let mut board = board.clone();
        let mut to_move = color;
        let mut node = self.tree.root();

        while let Some((mv, child)) = self.tree.select_child(node, to_move, self.exploration) {
            board.play(mv, to_move);
            to_move = to_move.opponent();
            node = child;
        }

        if !self.tree.get(node).expanded {
            let moves = board.legal_moves(to_move);
            self.tree.expand(node, &moves);
        }

        let Some(winner) = random_playout(&mut board, to_move, &mut self.rng, deadline) else {
            return false;
        };
        self.tree.backpropagate(node, winner == Color::Black);
        true
    }

    fn trace_root_children(&self, color: Color) {
        for (mv, child) in self.tree.children(self.tree.root()) {
            trace!(
                mv,
                visits = child.visits,
                win_rate = ?child.win_rate(color),
                "root child"
            );
        }
    }
}
