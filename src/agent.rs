//! Move selection seam and the turn driver.
//!
//! An [`Agent`] picks one move at a time from the legal moves of the acting
//! player, or declines the rest of its queue. [`play_turn`] runs a complete
//! turn for whoever is to act; the caller then advances the turn.

use std::fmt;

use tracing::info;

use crate::board::Cell;
use crate::error::MoveError;
use crate::game::{Game, Move, PieceSelector};
use crate::throw::Throw;

/// What an agent decided.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Choice {
    Play(Move),
    /// Forfeit the remaining move values of this turn.
    Skip,
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::Play(mv) => write!(f, "{mv}"),
            Choice::Skip => f.write_str("skip"),
        }
    }
}

/// A move chooser for the acting player.
pub trait Agent {
    fn name(&self) -> &str;

    /// Pick one of `legal` (as listed by [`Game::legal_moves`] for the
    /// current player) or skip.
    fn choose_move(&mut self, game: &Game, legal: &[Move], rng: &mut fastrand::Rng) -> Choice;
}

/// Uniformly random play.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomAgent;

impl Agent for RandomAgent {
    fn name(&self) -> &str {
        "random"
    }

    fn choose_move(&mut self, _game: &Game, legal: &[Move], rng: &mut fastrand::Rng) -> Choice {
        if legal.is_empty() {
            return Choice::Skip;
        }
        Choice::Play(legal[rng.usize(..legal.len())])
    }
}

/// Collapse moves with identical outcomes.
///
/// Pieces in one stack move together, so moves that start from the same cell
/// (or both enter) with the same value are interchangeable. The first move
/// of each group is kept, in listing order.
pub fn dedup_moves(game: &Game, player: usize, legal: &[Move]) -> Vec<Move> {
    let Some(p) = game.player(player) else {
        return Vec::new();
    };

    let mut seen: Vec<(Option<Cell>, i8)> = Vec::with_capacity(legal.len());
    let mut unique = Vec::with_capacity(legal.len());
    for mv in legal {
        let origin = match mv.piece {
            PieceSelector::Enter => None,
            PieceSelector::Piece(id) => p.piece(id).and_then(|piece| piece.cell),
        };
        let key = (origin, mv.steps);
        if !seen.contains(&key) {
            seen.push(key);
            unique.push(*mv);
        }
    }
    unique
}

/// What happened during one turn.
#[derive(Clone, Debug, Default)]
pub struct TurnSummary {
    pub player: usize,
    /// Every throw, bonus throws included
    pub throws: Vec<Throw>,
    pub moves: Vec<Move>,
    /// Move values left unused (no legal move, a skip, or the player finished)
    pub forfeited: Vec<i8>,
    pub game_over: bool,
}

/// Play one full turn for the current player.
///
/// Throws, then lets `agent` spend the queue one move at a time. Captures
/// earn a bonus throw; the win check runs after every move. Whatever is left
/// of the queue at the end is forfeited. Does not advance to the next player.
pub fn play_turn(
    game: &mut Game,
    agent: &mut dyn Agent,
    rng: &mut fastrand::Rng,
) -> Result<TurnSummary, MoveError> {
    let player = game.current_index();
    let mut summary = TurnSummary {
        player,
        throws: game.throw_phase(rng, false),
        ..TurnSummary::default()
    };

    while !game.pending().is_empty() {
        let legal = game.legal_moves(player);
        if legal.is_empty() {
            break;
        }

        let Choice::Play(mv) = agent.choose_move(game, &legal, rng) else {
            break;
        };

        let result = game.apply(player, &mv)?;
        summary.moves.push(mv);

        if result.captured() {
            summary.throws.extend(game.throw_phase(rng, true));
        }
        if game.check_win_condition() {
            break;
        }
    }

    summary.forfeited = game.pending().to_vec();
    game.forfeit_remaining();
    summary.game_over = game.is_over();
    info!(
        player,
        agent = agent.name(),
        throws = summary.throws.len(),
        moves = summary.moves.len(),
        forfeited = summary.forfeited.len(),
        "turn complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Target;

    #[test]
    fn test_dedup_collapses_stacks() {
        let mut game = Game::new(2, None).unwrap();
        {
            let player = game.player_mut(0).unwrap();
            player.pieces[0].enter(Cell::outer(3));
            player.pieces[1].enter(Cell::outer(3));
            player.pieces[2].enter(Cell::outer(7));
        }
        game.set_pending([2, 2, 4]);

        let legal = game.legal_moves(0);
        let unique = dedup_moves(&game, 0, &legal);
        let listed: Vec<String> = unique.iter().map(|m| m.to_string()).collect();
        assert_eq!(
            listed,
            vec![
                "piece 0 +2 -> 05",
                "piece 0 +4 -> 07",
                "piece 2 +2 -> 09",
                "piece 2 +4 -> 11",
                "enter +2 -> 02",
                "enter +4 -> 04",
            ]
        );
    }

    #[test]
    fn test_dedup_keeps_first_back_destination() {
        let mut game = Game::new(2, None).unwrap();
        game.player_mut(0).unwrap().pieces[0].enter(Cell::START);
        game.set_pending([-1]);

        let legal = game.legal_moves(0);
        assert_eq!(legal.len(), 2);
        let unique = dedup_moves(&game, 0, &legal);
        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].target, Target::Cell(Cell::outer(19)));
    }

    #[test]
    fn test_random_agent_picks_listed_move() {
        let mut rng = fastrand::Rng::with_seed(9);
        let mut game = Game::new(2, None).unwrap();
        game.set_pending([1, 3]);
        let legal = game.legal_moves(0);
        for _ in 0..20 {
            match RandomAgent.choose_move(&game, &legal, &mut rng) {
                Choice::Play(mv) => assert!(legal.contains(&mv)),
                Choice::Skip => panic!("random agent never skips with moves available"),
            }
        }
        assert_eq!(RandomAgent.choose_move(&game, &[], &mut rng), Choice::Skip);
    }

    #[test]
    fn test_play_turn_spends_queue() {
        let mut rng = fastrand::Rng::with_seed(21);
        let mut game = Game::new(2, None).unwrap();
        let mut agent = RandomAgent;
        for _ in 0..40 {
            let summary = play_turn(&mut game, &mut agent, &mut rng).unwrap();
            assert!(game.pending().is_empty());
            assert!(!summary.throws.is_empty());
            assert!(summary.moves.len() + summary.forfeited.len() >= 1);
            if summary.game_over {
                break;
            }
            game.next_turn();
        }
    }

    struct Skipper;

    impl Agent for Skipper {
        fn name(&self) -> &str {
            "skipper"
        }

        fn choose_move(&mut self, _: &Game, _: &[Move], _: &mut fastrand::Rng) -> Choice {
            Choice::Skip
        }
    }

    #[test]
    fn test_play_turn_skip_forfeits() {
        let mut rng = fastrand::Rng::with_seed(4);
        let mut game = Game::new(2, None).unwrap();
        let summary = play_turn(&mut game, &mut Skipper, &mut rng).unwrap();
        assert!(summary.moves.is_empty());
        let thrown: Vec<i8> = summary.throws.iter().map(|t| t.steps()).collect();
        assert_eq!(summary.forfeited, thrown);
        assert!(game.pending().is_empty());
    }
}
