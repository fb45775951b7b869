//! The rule engine.
//!
//! A [`Game`] owns the players, the turn order, the queue of unused move
//! values from the current throws, the history log and the ranking list.
//! There is no explicit "waiting for throw" state: moves are legal exactly
//! while the queue is non-empty.
//!
//! A turn, as driven by a collaborator:
//! 1. [`Game::throw_phase`] fills the queue (extra throws on `yut`/`mo`).
//! 2. [`Game::legal_moves`] / [`Game::move_piece`] spend queue values.
//!    A capture is the caller's cue for `throw_phase(rng, true)`.
//! 3. [`Game::check_win_condition`] after every move.
//! 4. [`Game::next_turn`].
//!
//! Illegal requests return a [`MoveError`] and leave the game untouched.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::board::{Board, Cell};
use crate::constants::{BACK_STEP, HISTORY_TAIL, MAX_PLAYERS, MIN_PLAYERS};
use crate::error::{ConfigError, MoveError};
use crate::player::Player;
use crate::throw::{Throw, throw_sticks};

/// Lifecycle of a game.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    Playing,
    Finished,
}

/// Which piece a move applies to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PieceSelector {
    /// Bring a waiting piece onto the board.
    Enter,
    /// Move an active piece (and the stack it belongs to).
    Piece(usize),
}

/// Where a move ends.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    Cell(Cell),
    /// The piece leaves the board from the finish cell.
    Exit,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Cell(cell) => write!(f, "{cell}"),
            Target::Exit => f.write_str("exit"),
        }
    }
}

/// A legal move as listed by [`Game::legal_moves`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub piece: PieceSelector,
    pub steps: i8,
    pub target: Target,
}

impl Move {
    /// Explicit landing cell to pass along with a backward move.
    pub fn back_destination(&self) -> Option<Cell> {
        match self.target {
            Target::Cell(cell) if self.steps == BACK_STEP => Some(cell),
            _ => None,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.piece {
            PieceSelector::Enter => write!(f, "enter {:+} -> {}", self.steps, self.target),
            PieceSelector::Piece(id) => {
                write!(f, "piece {id} {:+} -> {}", self.steps, self.target)
            }
        }
    }
}

/// Effect of a successful move.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveResult {
    /// Opposing pieces sent back to the start
    pub captures: usize,
    /// The moved stack left the board
    pub exited: bool,
}

impl MoveResult {
    /// A capture earns a bonus throw.
    #[inline]
    pub fn captured(&self) -> bool {
        self.captures > 0
    }
}

/// Full game state.
///
/// `Clone` copies everything including the history. Simulations should use
/// [`Game::fork`], which skips the history.
#[derive(Clone, Debug)]
pub struct Game {
    board: &'static Board,
    players: Vec<Player>,
    current: usize,
    state: GameState,
    winner: Option<usize>,
    rankings: Vec<usize>,
    pending: Vec<i8>,
    history: Vec<String>,
    record_history: bool,
}

impl Game {
    /// Create a game for `num_players` players.
    ///
    /// Without names, players are called `"Player 0"`, `"Player 1"`, ...
    pub fn new(num_players: usize, names: Option<Vec<String>>) -> Result<Self, ConfigError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&num_players) {
            return Err(ConfigError::PlayerCount(num_players));
        }
        let names =
            names.unwrap_or_else(|| (0..num_players).map(|i| format!("Player {i}")).collect());
        if names.len() != num_players {
            return Err(ConfigError::NameCount {
                expected: num_players,
                got: names.len(),
            });
        }

        Ok(Self {
            board: Board::standard(),
            players: names
                .into_iter()
                .enumerate()
                .map(|(i, name)| Player::new(i, name))
                .collect(),
            current: 0,
            state: GameState::Playing,
            winner: None,
            rankings: Vec::new(),
            pending: Vec::new(),
            history: Vec::new(),
            record_history: true,
        })
    }

    /// Independent copy for simulation.
    ///
    /// Shares the board tables, copies all piece and player state, and starts
    /// with an empty history that is never written to.
    pub fn fork(&self) -> Self {
        Self {
            board: self.board,
            players: self.players.clone(),
            current: self.current,
            state: self.state,
            winner: self.winner,
            rankings: self.rankings.clone(),
            pending: self.pending.clone(),
            history: Vec::new(),
            record_history: false,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn board(&self) -> &'static Board {
        self.board
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: usize) -> Option<&Player> {
        self.players.get(id)
    }

    /// Direct access for setting up positions.
    pub fn player_mut(&mut self, id: usize) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    pub fn num_players(&self) -> usize {
        self.players.len()
    }

    /// Id of the player to act.
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_player(&self) -> &Player {
        &self.players[self.current]
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_over(&self) -> bool {
        self.state == GameState::Finished
    }

    /// First player to finish all pieces.
    pub fn winner(&self) -> Option<usize> {
        self.winner
    }

    /// Player ids in finishing order.
    pub fn rankings(&self) -> &[usize] {
        &self.rankings
    }

    pub fn is_ranked(&self, player: usize) -> bool {
        self.rankings.contains(&player)
    }

    /// Unused move values of the current turn.
    pub fn pending(&self) -> &[i8] {
        &self.pending
    }

    /// Replace the unused move values.
    pub fn set_pending(&mut self, moves: impl IntoIterator<Item = i8>) {
        self.pending = moves.into_iter().collect();
    }

    /// Give up the remaining move values of this turn.
    pub fn forfeit_remaining(&mut self) {
        self.pending.clear();
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// The last `n` history lines.
    pub fn history_tail(&self, n: usize) -> &[String] {
        let start = self.history.len().saturating_sub(n);
        &self.history[start..]
    }

    /// Owners of the active pieces on each occupied cell.
    pub fn occupancy(&self) -> BTreeMap<Cell, Vec<usize>> {
        let mut map: BTreeMap<Cell, Vec<usize>> = BTreeMap::new();
        for player in &self.players {
            for piece in player.active_pieces() {
                if let Some(cell) = piece.cell {
                    map.entry(cell).or_default().push(player.id);
                }
            }
        }
        map
    }

    /// Serializable summary of the whole game.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            current_player: self.current,
            state: self.state,
            winner: self.winner,
            rankings: self.rankings.clone(),
            pending: self.pending.clone(),
            players: self
                .players
                .iter()
                .map(|p| PlayerSummary {
                    id: p.id,
                    name: p.name.clone(),
                    active_pieces: p.active_pieces().count(),
                    finished_pieces: p.finished_count(),
                    pieces: p
                        .pieces
                        .iter()
                        .map(|piece| PieceSummary {
                            id: piece.id,
                            cell: piece.cell,
                            active: piece.active,
                        })
                        .collect(),
                })
                .collect(),
            history: self.history_tail(HISTORY_TAIL).to_vec(),
        }
    }

    // =========================================================================
    // Throwing
    // =========================================================================

    /// Throw until a result without an extra throw comes up.
    ///
    /// A regular phase starts from an empty queue; a bonus phase (after a
    /// capture) appends to what is left.
    pub fn throw_phase(&mut self, rng: &mut fastrand::Rng, is_bonus: bool) -> Vec<Throw> {
        if !is_bonus {
            self.pending.clear();
        }

        let mut throws = Vec::new();
        loop {
            let throw = throw_sticks(rng);
            throws.push(throw);
            self.pending.push(throw.steps());

            if self.record_history {
                let bonus = if is_bonus { " (bonus)" } else { "" };
                let msg = format!(
                    "{} threw {throw} ({} spaces){bonus}",
                    self.players[self.current].name,
                    throw.steps()
                );
                self.log_move(msg);
            }

            if !throw.grants_extra_throw() {
                break;
            }
        }
        throws
    }

    // =========================================================================
    // Moves
    // =========================================================================

    /// Every move `player` can make with the queued values.
    ///
    /// Each distinct queue value is tried once per active piece, so pieces in
    /// one stack list the same moves. Backward moves list one entry per
    /// predecessor cell.
    pub fn legal_moves(&self, player: usize) -> Vec<Move> {
        let Some(p) = self.players.get(player) else {
            return Vec::new();
        };

        let mut values: Vec<i8> = Vec::with_capacity(self.pending.len());
        for &steps in &self.pending {
            if !values.contains(&steps) {
                values.push(steps);
            }
        }

        let mut moves = Vec::new();
        for piece in p.active_pieces() {
            let Some(cell) = piece.cell else {
                continue;
            };
            let at_goal = self.board.is_finish(cell, piece.has_moved);
            let selector = PieceSelector::Piece(piece.id);

            for &steps in &values {
                if steps == BACK_STEP {
                    for &dest in self.board.back_do_destinations(cell) {
                        moves.push(Move {
                            piece: selector,
                            steps,
                            target: Target::Cell(dest),
                        });
                    }
                } else if at_goal {
                    moves.push(Move {
                        piece: selector,
                        steps,
                        target: Target::Exit,
                    });
                } else if let Some(dest) = self.board.resolve(cell, steps) {
                    moves.push(Move {
                        piece: selector,
                        steps,
                        target: Target::Cell(dest),
                    });
                }
            }
        }

        if p.can_enter() {
            for &steps in &values {
                if let Some(entry) = self.board.entry(steps) {
                    moves.push(Move {
                        piece: PieceSelector::Enter,
                        steps,
                        target: Target::Cell(entry),
                    });
                }
            }
        }

        moves
    }

    /// Play a listed move.
    pub fn apply(&mut self, player: usize, mv: &Move) -> Result<MoveResult, MoveError> {
        self.move_piece(player, mv.piece, mv.steps, mv.back_destination())
    }

    /// Spend `steps` from the queue on one piece.
    ///
    /// The whole stack at the piece's cell moves together. A piece standing
    /// on the finish cell after a circuit leaves the board on any forward
    /// value. `destination` picks the landing cell of a backward move; it is
    /// required from `00`, which has two predecessors.
    pub fn move_piece(
        &mut self,
        player: usize,
        selector: PieceSelector,
        steps: i8,
        destination: Option<Cell>,
    ) -> Result<MoveResult, MoveError> {
        let p = self
            .players
            .get(player)
            .ok_or(MoveError::UnknownPlayer(player))?;
        let slot = self.pending.iter().position(|&s| s == steps);

        match selector {
            PieceSelector::Enter => {
                let entry = self.board.entry(steps).ok_or(MoveError::InvalidEntry(steps))?;
                let piece_id = p
                    .inactive_pieces()
                    .next()
                    .map(|piece| piece.id)
                    .ok_or(MoveError::NoInactivePiece)?;
                let slot = slot.ok_or(MoveError::StepsUnavailable(steps))?;

                self.pending.remove(slot);
                self.players[player].pieces[piece_id].enter(entry);

                if self.record_history {
                    let note = if self.board.triggers_shortcut(entry) {
                        " (shortcut position)"
                    } else {
                        ""
                    };
                    let msg = format!(
                        "{} entered new piece (Piece {piece_id}) at position {entry}{note}",
                        self.players[player].name
                    );
                    self.log_move(msg);
                }

                let captures = self.capture_at(player, entry);
                Ok(MoveResult {
                    captures,
                    exited: false,
                })
            }

            PieceSelector::Piece(id) => {
                let piece = p.piece(id).ok_or(MoveError::UnknownPiece(id))?;
                let origin = match piece.cell {
                    Some(cell) if piece.active => cell,
                    _ => return Err(MoveError::PieceNotActive(id)),
                };
                let slot = slot.ok_or(MoveError::StepsUnavailable(steps))?;
                let stack = p.stack_at(origin);

                if steps != BACK_STEP && self.board.is_finish(origin, piece.has_moved) {
                    self.pending.remove(slot);
                    for &i in &stack {
                        self.players[player].pieces[i].finish();
                    }
                    if self.record_history {
                        let msg = format!(
                            "{}'s {} exited the board!",
                            self.players[player].name,
                            describe_stack(id, stack.len())
                        );
                        self.log_move(msg);
                    }
                    return Ok(MoveResult {
                        captures: 0,
                        exited: true,
                    });
                }

                let dest = match destination {
                    Some(to) if steps == BACK_STEP => {
                        if !self.board.back_do_destinations(origin).contains(&to) {
                            return Err(MoveError::InvalidBackDestination { from: origin, to });
                        }
                        to
                    }
                    _ => self
                        .board
                        .resolve(origin, steps)
                        .ok_or(MoveError::Overshoot {
                            from: origin,
                            steps,
                        })?,
                };

                self.pending.remove(slot);
                for &i in &stack {
                    self.players[player].pieces[i].move_to(dest);
                }

                if self.record_history {
                    let note = if dest == Cell::START {
                        " (at goal - next move exits)"
                    } else if self.board.triggers_shortcut(dest) {
                        " (shortcut position - next move uses diagonal)"
                    } else {
                        ""
                    };
                    let msg = format!(
                        "{} moved {} {steps} spaces to {dest}{note}",
                        self.players[player].name,
                        describe_stack(id, stack.len())
                    );
                    self.log_move(msg);
                }

                let captures = self.capture_at(player, dest);
                Ok(MoveResult {
                    captures,
                    exited: false,
                })
            }
        }
    }

    /// Send every opposing active piece on `cell` back to the start.
    fn capture_at(&mut self, player: usize, cell: Cell) -> usize {
        let mut captures = 0;
        for other in 0..self.players.len() {
            if other == player {
                continue;
            }
            let victims: Vec<usize> = self.players[other]
                .active_pieces()
                .filter(|piece| piece.cell == Some(cell))
                .map(|piece| piece.id)
                .collect();

            for id in victims {
                self.players[other].pieces[id].capture();
                captures += 1;
                if self.record_history {
                    let msg = format!(
                        "{} captured {}'s Piece {id}!",
                        self.players[player].name, self.players[other].name
                    );
                    self.log_move(msg);
                }
            }
        }
        captures
    }

    // =========================================================================
    // Ranking and Turns
    // =========================================================================

    /// Rank every player who has newly finished all pieces.
    ///
    /// When at most one player is left unranked, that player is ranked last
    /// and the game is over. Returns true if the rankings changed or the game
    /// is over.
    pub fn check_win_condition(&mut self) -> bool {
        let mut changed = false;
        for id in 0..self.players.len() {
            if self.players[id].has_finished() && !self.rankings.contains(&id) {
                self.rankings.push(id);
                self.winner.get_or_insert(id);
                changed = true;
                if self.record_history {
                    let msg = format!(
                        "{} finishes in place #{}!",
                        self.players[id].name,
                        self.rankings.len()
                    );
                    self.log_move(msg);
                }
            }
        }

        let remaining: Vec<usize> = (0..self.players.len())
            .filter(|id| !self.rankings.contains(id))
            .collect();
        if remaining.len() <= 1 {
            if let Some(&last) = remaining.first() {
                self.rankings.push(last);
                if self.record_history {
                    let msg = format!(
                        "{} finishes in place #{}",
                        self.players[last].name,
                        self.rankings.len()
                    );
                    self.log_move(msg);
                }
            }
            self.state = GameState::Finished;
            return true;
        }

        changed
    }

    /// Pass the turn to the next unranked player and clear the queue.
    pub fn next_turn(&mut self) {
        let n = self.players.len();
        for _ in 0..n {
            self.current = (self.current + 1) % n;
            if !self.rankings.contains(&self.current) {
                break;
            }
        }
        self.pending.clear();
    }

    /// Append a line to the move history.
    pub fn log_move(&mut self, message: String) {
        if self.record_history {
            debug!(target: "yut_rust::game", "{message}");
            self.history.push(message);
        }
    }
}

fn describe_stack(id: usize, size: usize) -> String {
    if size == 1 {
        format!("Piece {id}")
    } else {
        format!("Stack (x{size})")
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// Summary of a game for display or transport.
#[derive(Clone, Debug, Serialize)]
pub struct GameSnapshot {
    pub current_player: usize,
    pub state: GameState,
    pub winner: Option<usize>,
    pub rankings: Vec<usize>,
    pub pending: Vec<i8>,
    pub players: Vec<PlayerSummary>,
    pub history: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerSummary {
    pub id: usize,
    pub name: String,
    pub active_pieces: usize,
    pub finished_pieces: usize,
    pub pieces: Vec<PieceSummary>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PieceSummary {
    pub id: usize,
    pub cell: Option<Cell>,
    pub active: bool,
}
