//! Constants for the game rules and the search agents.
//!
//! Rule constants are fixed by the game itself. Search constants are the
//! defaults used by [`crate::config::SearchConfig`] and can be overridden
//! per agent.

// =============================================================================
// Players and Pieces
// =============================================================================

/// Pieces owned by every player.
pub const NUM_PIECES: usize = 4;

/// Fewest players a game may be created with.
pub const MIN_PLAYERS: usize = 2;

/// Most players a game may be created with.
pub const MAX_PLAYERS: usize = 6;

// =============================================================================
// Board Geometry
// =============================================================================

/// Cells on the outer ring (`00`..`19`).
pub const OUTER_CELLS: usize = 20;

/// Cells on the two diagonals, counting the shared crossroad once.
pub const DIAGONAL_CELLS: usize = 9;

/// Total number of cells on the board.
pub const NUM_CELLS: usize = OUTER_CELLS + DIAGONAL_CELLS;

/// Longest forward move a single throw can produce.
pub const MAX_STEPS: i8 = 5;

/// Step value of a backward throw.
pub const BACK_STEP: i8 = -1;

// =============================================================================
// Throwing
// =============================================================================

/// Probability that a single stick lands flat side up.
pub const FLAT_PROBABILITY: f64 = 0.6;

/// Index of the marked stick. A lone flat on this stick moves backward.
pub const BACK_DO_STICK: usize = 0;

// =============================================================================
// Search Parameters
// =============================================================================

/// Turn cap for a single random rollout.
pub const MAX_ROLLOUT_TURNS: usize = 200;

/// Default rollouts per candidate move for the flat Monte Carlo agent.
pub const N_SIMS: usize = 3000;

/// Default iterations per decision for the tree search agent.
pub const N_ITERATIONS: usize = 1000;

/// UCB1 exploration constant.
pub const UCB_C: f64 = std::f64::consts::SQRT_2;

/// Added to the heuristic score when the player leads every opponent.
pub const LEAD_BONUS: f64 = 0.1;

// =============================================================================
// Reporting
// =============================================================================

/// History lines included in a [`crate::game::GameSnapshot`].
pub const HISTORY_TAIL: usize = 10;
