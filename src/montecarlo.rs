//! Flat Monte Carlo move selection.
//!
//! Every distinct candidate move is scored by the mean result of a fixed
//! number of random playouts that start by playing it. The best mean wins;
//! ties go to the candidate listed first.

use tracing::debug;

use crate::agent::{Agent, Choice, dedup_moves};
use crate::config::SearchConfig;
use crate::game::{Game, Move};
use crate::playout::{rank_outcome, rollout};

/// Rollout-based agent.
#[derive(Debug, Clone, Default)]
pub struct MonteCarloAgent {
    config: SearchConfig,
}

impl MonteCarloAgent {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Mean playout score of every candidate, in candidate order.
    pub fn evaluate(
        &self,
        game: &Game,
        candidates: &[Move],
        rng: &mut fastrand::Rng,
    ) -> Vec<(Move, f64)> {
        let player = game.current_index();
        let sims = self.config.simulations.max(1);
        let mut scored = Vec::with_capacity(candidates.len());
        for mv in candidates {
            let mut total = 0.0;
            for _ in 0..sims {
                total += self.simulate(game, player, mv, rng);
            }
            scored.push((*mv, total / sims as f64));
        }
        scored
    }

    /// One playout starting with `mv`.
    fn simulate(&self, game: &Game, player: usize, mv: &Move, rng: &mut fastrand::Rng) -> f64 {
        let mut sim = game.fork();
        let target_rank = sim.rankings().len();

        let result = match sim.apply(player, mv) {
            Ok(result) => result,
            Err(_) => return 0.0,
        };
        if result.captured() {
            sim.throw_phase(rng, true);
        }
        sim.check_win_condition();
        if let Some(score) = rank_outcome(&sim, player, target_rank) {
            return score;
        }

        rollout(&mut sim, player, target_rank, self.config.playout_limits(), rng)
    }
}

impl Agent for MonteCarloAgent {
    fn name(&self) -> &str {
        "monte-carlo"
    }

    fn choose_move(&mut self, game: &Game, legal: &[Move], rng: &mut fastrand::Rng) -> Choice {
        let candidates = dedup_moves(game, game.current_index(), legal);
        match candidates.as_slice() {
            [] => return Choice::Skip,
            [only] => return Choice::Play(*only),
            _ => {}
        }

        let scored = self.evaluate(game, &candidates, rng);
        let mut best = scored[0];
        for &(mv, score) in &scored[1..] {
            if score > best.1 {
                best = (mv, score);
            }
        }

        for (mv, score) in &scored {
            debug!(
                candidate = %mv,
                score,
                chosen = *mv == best.0,
                sims = self.config.simulations,
                "monte carlo candidate"
            );
        }
        Choice::Play(best.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Cell;
    use crate::game::{PieceSelector, Target};

    fn agent() -> MonteCarloAgent {
        MonteCarloAgent::new(SearchConfig::for_testing())
    }

    #[test]
    fn test_single_candidate_needs_no_search() {
        let mut rng = fastrand::Rng::with_seed(1);
        let mut game = Game::new(2, None).unwrap();
        game.set_pending([3]);
        let legal = game.legal_moves(0);
        assert_eq!(
            agent().choose_move(&game, &legal, &mut rng),
            Choice::Play(legal[0])
        );
    }

    #[test]
    fn test_takes_the_finishing_move() {
        let mut rng = fastrand::Rng::with_seed(2);
        let mut game = Game::new(2, None).unwrap();
        {
            let player = game.player_mut(0).unwrap();
            for piece in player.pieces.iter_mut().take(3) {
                piece.enter(Cell::START);
                piece.finish();
            }
            player.pieces[3].enter(Cell::outer(18));
        }
        // +2 lands on the finish and the 1 then takes the last piece off;
        // +1 first leaves an unusable 2.
        game.set_pending([2, 1]);

        let legal = game.legal_moves(0);
        let choice = agent().choose_move(&game, &legal, &mut rng);
        let Choice::Play(mv) = choice else {
            panic!("expected a move");
        };
        assert_eq!(mv.piece, PieceSelector::Piece(3));
        assert_eq!(mv.steps, 2);
        assert_eq!(mv.target, Target::Cell(Cell::START));
    }

    #[test]
    fn test_immediate_win_scores_one() {
        let mut rng = fastrand::Rng::with_seed(3);
        let mut game = Game::new(2, None).unwrap();
        {
            let player = game.player_mut(0).unwrap();
            for piece in player.pieces.iter_mut().take(3) {
                piece.enter(Cell::START);
                piece.finish();
            }
            player.pieces[3].enter(Cell::START);
        }
        game.set_pending([2]);

        let legal = game.legal_moves(0);
        let scored = agent().evaluate(&game, &legal, &mut rng);
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].0.target, Target::Exit);
        assert_eq!(scored[0].1, 1.0);
    }

    #[test]
    fn test_evaluate_leaves_game_untouched() {
        let mut rng = fastrand::Rng::with_seed(4);
        let mut game = Game::new(3, None).unwrap();
        game.set_pending([4, 2]);
        let before = game.players().to_vec();
        let legal = game.legal_moves(0);
        let scored = agent().evaluate(&game, &legal, &mut rng);
        assert_eq!(scored.len(), legal.len());
        assert!(scored.iter().all(|&(_, s)| (0.0..=1.1).contains(&s)));
        assert_eq!(game.players(), before.as_slice());
        assert_eq!(game.pending(), &[4, 2]);
    }
}
