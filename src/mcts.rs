//! Monte Carlo Tree Search (MCTS) over the moves of one turn.
//!
//! This module implements MCTS with:
//! - UCB1 for node selection
//! - One-child-per-iteration expansion with lazily listed actions
//! - Random playouts (see [`crate::playout`]) for value estimation
//! - Subtree reuse between decisions of the same turn
//!
//! Every node holds its own copy of the game with the acting player partway
//! through their queue. Children apply one more queued value, or give up the
//! rest of the queue ("skip"). A node whose queue is empty is terminal, so the
//! tree never reaches past the current turn; the playouts cover the rest.
//!
//! Nodes own their children. The search walks the tree by a path of child
//! indices from the root, and reuse detaches one child of the root.

use tracing::debug;

use crate::agent::{Agent, Choice, dedup_moves};
use crate::config::SearchConfig;
use crate::game::{Game, Move};
use crate::playout::rollout;

/// A node in the search tree.
#[derive(Debug, Clone)]
pub struct SearchNode {
    /// The game after `action`
    pub game: Game,
    /// The player the search is for
    pub player: usize,
    /// How this node was reached from its parent (`None` at a fresh root)
    pub action: Option<Choice>,
    pub visits: u32,
    /// Sum of playout scores through this node
    pub score: f64,
    pub children: Vec<SearchNode>,
    untried: Option<Vec<Choice>>,
}

impl SearchNode {
    pub fn new(game: Game, player: usize, action: Option<Choice>) -> Self {
        Self {
            game,
            player,
            action,
            visits: 0,
            score: 0.0,
            children: Vec::new(),
            untried: None,
        }
    }

    /// Average playout score, 0.0 when unvisited.
    #[inline]
    pub fn mean(&self) -> f64 {
        if self.visits > 0 {
            self.score / self.visits as f64
        } else {
            0.0
        }
    }

    /// No queued values left, or the player (or the game) is done.
    pub fn is_terminal(&self) -> bool {
        self.game.pending().is_empty() || self.game.is_over() || self.game.is_ranked(self.player)
    }

    /// Actions not yet expanded, listed on first use.
    fn untried_actions(&mut self) -> &mut Vec<Choice> {
        let (game, player) = (&self.game, self.player);
        self.untried.get_or_insert_with(|| candidate_actions(game, player))
    }
}

/// Distinct moves for `player`, plus a skip when a piece is on the late path.
///
/// Actions are expanded from the back, so the skip is tried first.
fn candidate_actions(game: &Game, player: usize) -> Vec<Choice> {
    if game.pending().is_empty() {
        return Vec::new();
    }
    let legal = game.legal_moves(player);
    if legal.is_empty() {
        return Vec::new();
    }

    let mut actions: Vec<Choice> = dedup_moves(game, player, &legal)
        .into_iter()
        .map(Choice::Play)
        .collect();

    let board = game.board();
    let late = game.player(player).is_some_and(|p| {
        p.active_pieces()
            .filter_map(|piece| piece.cell)
            .any(|cell| board.is_late_path(cell))
    });
    if late {
        actions.push(Choice::Skip);
    }
    actions
}

/// Apply `action` to a copy of `node`'s game.
///
/// Returns the index of the new child, or `None` when there is nothing left
/// to expand or the move is rejected (the playout then starts at `node`).
fn expand(node: &mut SearchNode, rng: &mut fastrand::Rng) -> Option<usize> {
    if node.is_terminal() {
        return None;
    }
    let action = node.untried_actions().pop()?;
    let mut game = node.game.fork();

    match action {
        Choice::Skip => game.forfeit_remaining(),
        Choice::Play(mv) => {
            let result = match game.apply(node.player, &mv) {
                Ok(result) => result,
                Err(err) => {
                    debug!(%err, action = %mv, "expansion rejected move");
                    return None;
                }
            };
            if result.captured() {
                game.throw_phase(rng, true);
            }
            game.check_win_condition();
        }
    }

    node.children.push(SearchNode::new(game, node.player, Some(action)));
    Some(node.children.len() - 1)
}

/// UCB1 priority of a child; unvisited children come first.
#[inline]
fn ucb1(child: &SearchNode, parent_visits: u32, exploration: f64) -> f64 {
    if child.visits == 0 {
        return f64::INFINITY;
    }
    let parent = (parent_visits.max(1) as f64).ln();
    child.mean() + exploration * (parent / child.visits as f64).sqrt()
}

/// Select the child with the highest UCB1 value (first one on ties).
fn most_urgent(node: &SearchNode, exploration: f64) -> usize {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (i, child) in node.children.iter().enumerate() {
        let value = ucb1(child, node.visits, exploration);
        if value > best_value {
            best = i;
            best_value = value;
        }
    }
    best
}

/// Descend through fully expanded nodes, recording the path taken.
///
/// Stops at a terminal node, a node with untried actions, or a leaf.
fn tree_descend(tree: &mut SearchNode, exploration: f64) -> Vec<usize> {
    let mut path = Vec::new();
    let mut node = tree;

    loop {
        if node.is_terminal() || !node.untried_actions().is_empty() || node.children.is_empty() {
            break;
        }
        let child_idx = most_urgent(node, exploration);
        path.push(child_idx);
        node = &mut node.children[child_idx];
    }

    path
}

/// Add a playout score to every node on the path, root included.
fn tree_update(tree: &mut SearchNode, path: &[usize], score: f64) {
    tree.visits += 1;
    tree.score += score;

    let mut node = tree;
    for &idx in path {
        node = &mut node.children[idx];
        node.visits += 1;
        node.score += score;
    }
}

fn node_at_mut<'a>(tree: &'a mut SearchNode, path: &[usize]) -> &'a mut SearchNode {
    path.iter().fold(tree, |node, &idx| &mut node.children[idx])
}

fn node_at<'a>(tree: &'a SearchNode, path: &[usize]) -> &'a SearchNode {
    path.iter().fold(tree, |node, &idx| &node.children[idx])
}

/// Run `config.iterations` rounds of select, expand, simulate and update.
///
/// Playouts are scored for `root.player` taking rank `target_rank`.
pub fn tree_search(
    root: &mut SearchNode,
    config: &SearchConfig,
    target_rank: usize,
    rng: &mut fastrand::Rng,
) {
    let limits = config.playout_limits();
    for _ in 0..config.iterations {
        let mut path = tree_descend(root, config.exploration);

        if let Some(child_idx) = expand(node_at_mut(root, &path), rng) {
            path.push(child_idx);
        }

        let leaf = node_at(root, &path);
        let mut sim = leaf.game.fork();
        let score = rollout(&mut sim, leaf.player, target_rank, limits, rng);

        tree_update(root, &path, score);
    }
}

/// Index of the most visited child (first one on ties).
fn best_child(tree: &SearchNode) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;
    for (i, child) in tree.children.iter().enumerate() {
        if best.is_none_or(|(_, visits)| child.visits > visits) {
            best = Some((i, child.visits));
        }
    }
    best.map(|(i, _)| i)
}

/// Statistics of one root child after a search.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildStats {
    pub choice: Choice,
    pub visits: u32,
    pub mean: f64,
}

/// What the last search looked like.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchReport {
    pub iterations: usize,
    /// Root visits carried over from the previous decision
    pub reused_visits: u32,
    /// Root children in expansion order
    pub children: Vec<ChildStats>,
    pub chosen: Choice,
}

/// Tree search agent with subtree reuse inside a turn.
#[derive(Debug, Clone, Default)]
pub struct MctsAgent {
    config: SearchConfig,
    reuse: Option<SearchNode>,
    last_report: Option<SearchReport>,
}

impl MctsAgent {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            reuse: None,
            last_report: None,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn last_report(&self) -> Option<&SearchReport> {
        self.last_report.as_ref()
    }

    /// Visits of the subtree kept for the next decision, if any.
    pub fn retained_visits(&self) -> Option<u32> {
        self.reuse.as_ref().map(|node| node.visits)
    }

    /// Drop any retained subtree.
    pub fn reset(&mut self) {
        self.reuse = None;
    }

    /// Take the retained subtree if it describes the live position.
    ///
    /// The queue must match exactly. The pieces must match too, so a tree
    /// left over from an earlier turn is never picked up.
    fn take_reusable(&mut self, game: &Game) -> Option<SearchNode> {
        let node = self.reuse.take()?;
        let matches = node.player == game.current_index()
            && node.game.pending() == game.pending()
            && node.game.players() == game.players();
        if matches { Some(node) } else { None }
    }

    fn search(&mut self, game: &Game, candidates: &[Move], rng: &mut fastrand::Rng) -> Choice {
        let player = game.current_index();
        let mut root = self
            .take_reusable(game)
            .unwrap_or_else(|| SearchNode::new(game.fork(), player, None));
        let reused_visits = root.visits;

        tree_search(&mut root, &self.config, game.rankings().len(), rng);

        let Some(best) = best_child(&root) else {
            self.last_report = None;
            return Choice::Play(candidates[0]);
        };
        let chosen = root.children[best]
            .action
            .unwrap_or(Choice::Play(candidates[0]));

        let report = SearchReport {
            iterations: self.config.iterations,
            reused_visits,
            children: root
                .children
                .iter()
                .filter_map(|child| {
                    child.action.map(|choice| ChildStats {
                        choice,
                        visits: child.visits,
                        mean: child.mean(),
                    })
                })
                .collect(),
            chosen,
        };
        debug!(
            iterations = report.iterations,
            reused_visits,
            root_children = report.children.len(),
            "tree search complete"
        );
        for stats in &report.children {
            debug!(
                action = %stats.choice,
                visits = stats.visits,
                mean = stats.mean,
                chosen = stats.choice == chosen,
                "root child"
            );
        }
        self.last_report = Some(report);

        if matches!(chosen, Choice::Play(_)) {
            let mut retained = root.children.swap_remove(best);
            retained.action = None;
            self.reuse = Some(retained);
        }
        chosen
    }
}

impl Agent for MctsAgent {
    fn name(&self) -> &str {
        "mcts"
    }

    fn choose_move(&mut self, game: &Game, legal: &[Move], rng: &mut fastrand::Rng) -> Choice {
        let candidates = dedup_moves(game, game.current_index(), legal);
        match candidates.as_slice() {
            [] => {
                self.reuse = None;
                Choice::Skip
            }
            [only] => {
                self.reuse = None;
                Choice::Play(*only)
            }
            _ => self.search(game, &candidates, rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Cell;
    use crate::game::Target;

    fn agent() -> MctsAgent {
        MctsAgent::new(SearchConfig::for_testing())
    }

    fn finish_pieces(game: &mut Game, player: usize, count: usize) {
        for piece in game.player_mut(player).unwrap().pieces.iter_mut().take(count) {
            piece.enter(Cell::START);
            piece.finish();
        }
    }

    #[test]
    fn test_skip_only_on_late_path() {
        let mut game = Game::new(2, None).unwrap();
        game.player_mut(0).unwrap().pieces[0].enter(Cell::outer(3));
        game.set_pending([2]);
        let actions = candidate_actions(&game, 0);
        assert!(!actions.contains(&Choice::Skip));

        game.player_mut(0).unwrap().pieces[1].enter(Cell::outer(16));
        let actions = candidate_actions(&game, 0);
        assert_eq!(actions.last(), Some(&Choice::Skip));

        game.forfeit_remaining();
        assert!(candidate_actions(&game, 0).is_empty());
    }

    #[test]
    fn test_ucb1_prefers_unvisited() {
        let game = Game::new(2, None).unwrap();
        let mut child = SearchNode::new(game, 0, None);
        assert_eq!(ucb1(&child, 10, 1.0), f64::INFINITY);
        child.visits = 4;
        child.score = 2.0;
        let expected = 0.5 + (10f64.ln() / 4.0).sqrt();
        assert!((ucb1(&child, 10, 1.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_visits_add_up() {
        let mut rng = fastrand::Rng::with_seed(7);
        let mut game = Game::new(2, None).unwrap();
        game.set_pending([1, 2, 3]);
        let config = SearchConfig::for_testing();

        let mut root = SearchNode::new(game.fork(), 0, None);
        tree_search(&mut root, &config, 0, &mut rng);

        assert_eq!(root.visits as usize, config.iterations);
        assert_eq!(root.children.len(), 3);
        let child_visits: u32 = root.children.iter().map(|c| c.visits).sum();
        assert_eq!(child_visits, root.visits);
        assert!(root.children.iter().all(|c| (0.0..=1.1).contains(&c.mean())));
    }

    #[test]
    fn test_single_candidate_skips_search() {
        let mut rng = fastrand::Rng::with_seed(1);
        let mut game = Game::new(2, None).unwrap();
        game.set_pending([4]);
        let legal = game.legal_moves(0);
        let mut agent = agent();
        assert_eq!(agent.choose_move(&game, &legal, &mut rng), Choice::Play(legal[0]));
        assert!(agent.last_report().is_none());
        assert_eq!(agent.retained_visits(), None);
    }

    #[test]
    fn test_takes_the_winning_line() {
        let mut rng = fastrand::Rng::with_seed(11);
        let mut game = Game::new(2, None).unwrap();
        finish_pieces(&mut game, 0, 3);
        game.player_mut(0).unwrap().pieces[3].enter(Cell::outer(18));
        // The opponent exits on almost any throw next turn
        finish_pieces(&mut game, 1, 3);
        game.player_mut(1).unwrap().pieces[3].enter(Cell::START);
        game.set_pending([2, 1]);

        let legal = game.legal_moves(0);
        let choice = agent().choose_move(&game, &legal, &mut rng);
        let Choice::Play(mv) = choice else {
            panic!("expected a move, got {choice}");
        };
        assert_eq!(mv.steps, 2);
        assert_eq!(mv.target, Target::Cell(Cell::START));
    }

    #[test]
    fn test_reuse_keeps_statistics() {
        let mut rng = fastrand::Rng::with_seed(5);
        let mut game = Game::new(2, None).unwrap();
        game.set_pending([1, 2, 3]);
        let mut agent = agent();

        let legal = game.legal_moves(0);
        let Choice::Play(mv) = agent.choose_move(&game, &legal, &mut rng) else {
            panic!("entering is always better than skipping");
        };
        let retained = agent.retained_visits().unwrap();
        assert!(retained > 0);

        // No opposing pieces, so no capture and no bonus throw
        game.apply(0, &mv).unwrap();
        let legal = game.legal_moves(0);
        agent.choose_move(&game, &legal, &mut rng);

        let report = agent.last_report().unwrap();
        assert_eq!(report.reused_visits, retained);
        // The retained root's first visit was its own playout
        let child_visits: u32 = report.children.iter().map(|c| c.visits).sum();
        assert_eq!(child_visits as usize, retained as usize - 1 + report.iterations);
    }

    #[test]
    fn test_reuse_dropped_on_queue_mismatch() {
        let mut rng = fastrand::Rng::with_seed(6);
        let mut game = Game::new(2, None).unwrap();
        game.set_pending([1, 2, 3]);
        let mut agent = agent();

        let legal = game.legal_moves(0);
        agent.choose_move(&game, &legal, &mut rng);
        assert!(agent.retained_visits().is_some());

        game.set_pending([4, 5]);
        let legal = game.legal_moves(0);
        agent.choose_move(&game, &legal, &mut rng);
        assert_eq!(agent.last_report().unwrap().reused_visits, 0);
    }
}
