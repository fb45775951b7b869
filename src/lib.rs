//! Yut-Rust: a Yut Nori rules engine with simulation-based agents.
//!
//! This crate provides the board topology and rules of Yut Nori together
//! with a flat Monte Carlo agent and a Monte Carlo Tree Search agent that
//! choose moves by playing the rules forward on forked games.
//!
//! ## Modules
//!
//! - [`constants`] - Board dimensions, throw model and search parameters
//! - [`board`] - Cell labels and the movement tables
//! - [`throw`] - The four-stick throw
//! - [`player`] - Pieces and players
//! - [`game`] - The rule engine (throws, moves, captures, ranking)
//! - [`agent`] - The move-chooser seam and the turn driver
//! - [`playout`] - Random game simulation for move evaluation
//! - [`montecarlo`] - Flat Monte Carlo agent
//! - [`mcts`] - Monte Carlo Tree Search with UCB1 and subtree reuse
//! - [`config`] - Search parameters
//! - [`error`] - Error types
//!
//! ## Example
//!
//! ```
//! use yut_rust::agent::{RandomAgent, play_turn};
//! use yut_rust::config::SearchConfig;
//! use yut_rust::game::Game;
//! use yut_rust::montecarlo::MonteCarloAgent;
//!
//! let mut rng = fastrand::Rng::with_seed(7);
//! let mut game = Game::new(2, None).unwrap();
//!
//! let mut config = SearchConfig::for_testing();
//! config.simulations = 5;
//! let mut ai = MonteCarloAgent::new(config);
//!
//! let summary = play_turn(&mut game, &mut ai, &mut rng).unwrap();
//! assert!(!summary.throws.is_empty());
//! game.next_turn();
//! play_turn(&mut game, &mut RandomAgent, &mut rng).unwrap();
//! ```

pub mod agent;
pub mod board;
pub mod config;
pub mod constants;
pub mod error;
pub mod game;
pub mod mcts;
pub mod montecarlo;
pub mod player;
pub mod playout;
pub mod throw;
