//! Pieces and players.
//!
//! A piece is in one of three situations:
//! - waiting: `cell == None`, `active == false`, `has_moved == false`
//! - on the board: `cell == Some(_)`, `active == true`
//! - finished: `cell == None`, `active == false`, `has_moved == true`
//!
//! Capture sends a piece back to waiting; only finishing keeps `has_moved`.

use std::collections::BTreeMap;

use crate::board::Cell;
use crate::constants::NUM_PIECES;

/// A single game piece.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Piece {
    /// Sequence number within the owner (0..4)
    pub id: usize,
    /// Owning player id
    pub owner: usize,
    /// Current cell, `None` when off the board
    pub cell: Option<Cell>,
    /// On the board and movable
    pub active: bool,
    /// Has left the start; tells `00` at the start apart from `00` at the goal
    pub has_moved: bool,
}

impl Piece {
    pub fn new(id: usize, owner: usize) -> Self {
        Self {
            id,
            owner,
            cell: None,
            active: false,
            has_moved: false,
        }
    }

    /// Put a waiting piece on the board.
    pub fn enter(&mut self, cell: Cell) {
        self.cell = Some(cell);
        self.active = true;
        self.has_moved = true;
    }

    pub fn move_to(&mut self, cell: Cell) {
        self.cell = Some(cell);
        self.has_moved = true;
    }

    /// Take the piece off the board after completing the circuit.
    pub fn finish(&mut self) {
        self.cell = None;
        self.active = false;
    }

    /// Send the piece back to the start after being captured.
    pub fn capture(&mut self) {
        self.cell = None;
        self.active = false;
        self.has_moved = false;
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        !self.active && self.has_moved && self.cell.is_none()
    }

    #[inline]
    pub fn is_waiting(&self) -> bool {
        !self.active && !self.is_finished()
    }
}

/// A player and their pieces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pub id: usize,
    pub name: String,
    pub pieces: [Piece; NUM_PIECES],
}

impl Player {
    pub fn new(id: usize, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            pieces: std::array::from_fn(|i| Piece::new(i, id)),
        }
    }

    pub fn active_pieces(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.iter().filter(|p| p.active)
    }

    pub fn finished_pieces(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.iter().filter(|p| p.is_finished())
    }

    /// Pieces that have not entered the board yet (or were captured).
    pub fn inactive_pieces(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.iter().filter(|p| p.is_waiting())
    }

    pub fn finished_count(&self) -> usize {
        self.finished_pieces().count()
    }

    /// All four pieces have completed the circuit.
    pub fn has_finished(&self) -> bool {
        self.finished_count() == NUM_PIECES
    }

    pub fn can_enter(&self) -> bool {
        self.inactive_pieces().next().is_some()
    }

    /// Active pieces grouped by cell. Pieces sharing a cell form a stack.
    pub fn stacks(&self) -> BTreeMap<Cell, Vec<usize>> {
        let mut stacks: BTreeMap<Cell, Vec<usize>> = BTreeMap::new();
        for piece in self.active_pieces() {
            if let Some(cell) = piece.cell {
                stacks.entry(cell).or_default().push(piece.id);
            }
        }
        stacks
    }

    /// Ids of this player's active pieces on `cell`.
    pub fn stack_at(&self, cell: Cell) -> Vec<usize> {
        self.active_pieces()
            .filter(|p| p.cell == Some(cell))
            .map(|p| p.id)
            .collect()
    }

    pub fn piece(&self, id: usize) -> Option<&Piece> {
        self.pieces.get(id)
    }

    pub fn piece_mut(&mut self, id: usize) -> Option<&mut Piece> {
        self.pieces.get_mut(id)
    }
}
