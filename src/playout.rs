//! Monte Carlo playouts (random game simulation).
//!
//! A playout spends the rest of the acting player's queue on uniformly random
//! legal moves, then plays whole turns for every player the same way until
//! somebody claims the rank the acting player is after, the game ends, or the
//! turn cap runs out. A capped playout is scored by [`heuristic_score`].
//!
//! Playouts operate on a forked game and never touch the caller's state.

use tracing::warn;

use crate::constants::NUM_PIECES;
use crate::error::MoveError;
use crate::game::Game;

/// Scoring parameters of a playout.
#[derive(Debug, Clone, Copy)]
pub struct PlayoutLimits {
    /// Full turns played before falling back to the heuristic
    pub max_turns: usize,
    /// Heuristic bonus for leading every opponent
    pub lead_bonus: f64,
}

/// Score for `player` once somebody holds rank `target_rank`.
///
/// 1.0 if it is `player`, 0.0 for anybody else, `None` while the rank is open.
#[inline]
pub fn rank_outcome(game: &Game, player: usize, target_rank: usize) -> Option<f64> {
    game.rankings()
        .get(target_rank)
        .map(|&id| if id == player { 1.0 } else { 0.0 })
}

/// Spend the whole queue on random legal moves for `player`.
///
/// The queue is forfeited when no legal move is left. A capture triggers a
/// bonus throw. Stops early once the rankings change.
pub fn play_remaining_moves(
    game: &mut Game,
    player: usize,
    rng: &mut fastrand::Rng,
) -> Result<(), MoveError> {
    while !game.pending().is_empty() {
        let legal = game.legal_moves(player);
        if legal.is_empty() {
            game.forfeit_remaining();
            break;
        }

        let mv = legal[rng.usize(..legal.len())];
        let result = game.apply(player, &mv)?;
        if result.captured() {
            game.throw_phase(rng, true);
        }
        if game.check_win_condition() {
            break;
        }
    }
    Ok(())
}

/// Finish a simulation in which `player` is partway through their turn.
///
/// Returns 1.0 if `player` takes rank `target_rank`, 0.0 if anybody else
/// does or the game ends otherwise, and the heuristic score when the turn
/// cap is reached. A move failure aborts the playout with 0.0.
pub fn rollout(
    game: &mut Game,
    player: usize,
    target_rank: usize,
    limits: PlayoutLimits,
    rng: &mut fastrand::Rng,
) -> f64 {
    match try_rollout(game, player, target_rank, limits, rng) {
        Ok(score) => score,
        Err(err) => {
            warn!(%err, player, "aborting playout after illegal move");
            0.0
        }
    }
}

fn try_rollout(
    game: &mut Game,
    player: usize,
    target_rank: usize,
    limits: PlayoutLimits,
    rng: &mut fastrand::Rng,
) -> Result<f64, MoveError> {
    if let Some(score) = rank_outcome(game, player, target_rank) {
        return Ok(score);
    }

    play_remaining_moves(game, player, rng)?;
    if let Some(score) = rank_outcome(game, player, target_rank) {
        return Ok(score);
    }
    if game.is_over() {
        return Ok(0.0);
    }

    game.next_turn();
    for _ in 0..limits.max_turns {
        if game.is_over() {
            break;
        }
        let current = game.current_index();
        game.throw_phase(rng, false);
        play_remaining_moves(game, current, rng)?;

        if let Some(score) = rank_outcome(game, player, target_rank) {
            return Ok(score);
        }
        game.next_turn();
    }

    Ok(rank_outcome(game, player, target_rank)
        .unwrap_or_else(|| heuristic_score(game, player, limits.lead_bonus)))
}

/// Value of an unfinished game for `player`.
///
/// The fraction of `player`'s pieces that have finished, plus `lead_bonus`
/// when that count is strictly higher than every opponent's.
pub fn heuristic_score(game: &Game, player: usize, lead_bonus: f64) -> f64 {
    let Some(me) = game.player(player) else {
        return 0.0;
    };
    let mine = me.finished_count();
    let best_opponent = game
        .players()
        .iter()
        .filter(|p| p.id != player)
        .map(|p| p.finished_count())
        .max()
        .unwrap_or(0);

    let mut score = mine as f64 / NUM_PIECES as f64;
    if mine > best_opponent {
        score += lead_bonus;
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Cell;
    use crate::constants::{LEAD_BONUS, MAX_ROLLOUT_TURNS};

    const LIMITS: PlayoutLimits = PlayoutLimits {
        max_turns: MAX_ROLLOUT_TURNS,
        lead_bonus: LEAD_BONUS,
    };

    fn finish_pieces(game: &mut Game, player: usize, count: usize) {
        for piece in game.player_mut(player).unwrap().pieces.iter_mut().take(count) {
            piece.enter(Cell::START);
            piece.finish();
        }
    }

    #[test]
    fn test_heuristic_score() {
        let mut game = Game::new(3, None).unwrap();
        assert_eq!(heuristic_score(&game, 0, LEAD_BONUS), 0.0);

        finish_pieces(&mut game, 0, 2);
        assert!((heuristic_score(&game, 0, LEAD_BONUS) - 0.6).abs() < 1e-9);

        finish_pieces(&mut game, 2, 2);
        assert!((heuristic_score(&game, 0, LEAD_BONUS) - 0.5).abs() < 1e-9);
        assert_eq!(heuristic_score(&game, 1, LEAD_BONUS), 0.0);
    }

    #[test]
    fn test_play_remaining_moves_empties_queue() {
        let mut rng = fastrand::Rng::with_seed(1);
        for _ in 0..100 {
            let mut game = Game::new(2, None).unwrap().fork();
            game.throw_phase(&mut rng, false);
            play_remaining_moves(&mut game, 0, &mut rng).unwrap();
            assert!(game.pending().is_empty());
        }
    }

    #[test]
    fn test_rollout_scores_are_bounded() {
        let mut rng = fastrand::Rng::with_seed(2);
        let base = Game::new(3, None).unwrap();
        for _ in 0..30 {
            let mut game = base.fork();
            game.throw_phase(&mut rng, false);
            let score = rollout(&mut game, 0, 0, LIMITS, &mut rng);
            assert!((0.0..=1.0 + LEAD_BONUS).contains(&score), "{score}");
        }
    }

    #[test]
    fn test_rollout_with_claimed_rank_is_immediate() {
        let mut rng = fastrand::Rng::with_seed(3);
        let mut game = Game::new(3, None).unwrap();
        finish_pieces(&mut game, 1, 4);
        game.check_win_condition();

        assert_eq!(rollout(&mut game.fork(), 1, 0, LIMITS, &mut rng), 1.0);
        assert_eq!(rollout(&mut game.fork(), 0, 0, LIMITS, &mut rng), 0.0);
    }

    #[test]
    fn test_zero_turn_cap_uses_heuristic() {
        let mut rng = fastrand::Rng::with_seed(4);
        let mut game = Game::new(2, None).unwrap().fork();
        finish_pieces(&mut game, 0, 1);
        let limits = PlayoutLimits {
            max_turns: 0,
            lead_bonus: LEAD_BONUS,
        };
        // Empty queue: nothing to play this turn, then the cap hits at once
        let score = rollout(&mut game, 0, 0, limits, &mut rng);
        assert!((score - (0.25 + LEAD_BONUS)).abs() < 1e-9);
    }
}
