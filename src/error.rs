//! Error types for game construction and move execution.

use thiserror::Error;

use crate::board::Cell;
use crate::constants::{MAX_PLAYERS, MIN_PLAYERS};

/// A game could not be created from the given settings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "number of players must be between {min} and {max}, got {0}",
        min = MIN_PLAYERS,
        max = MAX_PLAYERS
    )]
    PlayerCount(usize),

    #[error("expected {expected} player names, got {got}")]
    NameCount { expected: usize, got: usize },
}

/// A requested move is not possible in the current state.
///
/// Returned by [`crate::game::Game::move_piece`]; the game is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("no player with id {0}")]
    UnknownPlayer(usize),

    #[error("no piece with id {0}")]
    UnknownPiece(usize),

    #[error("piece {0} is not on the board")]
    PieceNotActive(usize),

    #[error("move value {0} is not available this turn")]
    StepsUnavailable(i8),

    #[error("moving {steps} from {from} overshoots the finish")]
    Overshoot { from: Cell, steps: i8 },

    #[error("no piece left to enter")]
    NoInactivePiece,

    #[error("cannot enter a piece with move value {0}")]
    InvalidEntry(i8),

    #[error("{to} is not one step behind {from}")]
    InvalidBackDestination { from: Cell, to: Cell },
}

/// A string is not a board label.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown cell label: {0:?}")]
pub struct ParseCellError(pub String);
