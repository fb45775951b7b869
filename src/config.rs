//! Search agent configuration.

use crate::constants::{LEAD_BONUS, MAX_ROLLOUT_TURNS, N_ITERATIONS, N_SIMS, UCB_C};
use crate::playout::PlayoutLimits;

/// Parameters shared by the Monte Carlo and tree search agents.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Rollouts per candidate move (Monte Carlo agent).
    pub simulations: usize,

    /// Select/expand/simulate/backpropagate rounds per decision (tree search).
    pub iterations: usize,

    /// Full turns a rollout may play before it is scored heuristically.
    pub max_rollout_turns: usize,

    /// UCB1 exploration constant.
    pub exploration: f64,

    /// Heuristic bonus for leading every opponent in finished pieces.
    pub lead_bonus: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            simulations: N_SIMS,
            iterations: N_ITERATIONS,
            max_rollout_turns: MAX_ROLLOUT_TURNS,
            exploration: UCB_C,
            lead_bonus: LEAD_BONUS,
        }
    }
}

impl SearchConfig {
    /// Create a fast config for testing.
    pub fn for_testing() -> Self {
        Self {
            simulations: 30,
            iterations: 200,
            ..Self::default()
        }
    }

    pub fn playout_limits(&self) -> PlayoutLimits {
        PlayoutLimits {
            max_turns: self.max_rollout_turns,
            lead_bonus: self.lead_bonus,
        }
    }
}
