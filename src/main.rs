//! Yut-Rust: command-line front end.
//!
//! ## Usage
//!
//! - `yut-rust` - Play a game between computer agents
//! - `yut-rust play --players 3 --agents mcts,random` - Choose seats and agents
//! - `yut-rust throws --count 100000` - Sample the stick throw distribution

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use yut_rust::agent::{Agent, RandomAgent, play_turn};
use yut_rust::config::SearchConfig;
use yut_rust::constants::{N_ITERATIONS, N_SIMS};
use yut_rust::game::Game;
use yut_rust::mcts::MctsAgent;
use yut_rust::montecarlo::MonteCarloAgent;
use yut_rust::throw::{Throw, throw_sticks};

/// Yut-Rust: Yut Nori with Monte Carlo agents
#[derive(Parser)]
#[command(name = "yut-rust")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a full game between computer agents
    Play(PlayArgs),
    /// Throw the sticks repeatedly and print the frequencies
    Throws {
        #[arg(long, default_value_t = 100_000)]
        count: usize,
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum AgentKind {
    Random,
    MonteCarlo,
    Mcts,
}

#[derive(Args, Debug)]
struct PlayArgs {
    /// Number of players (2 to 6)
    #[arg(long, default_value_t = 2)]
    players: usize,

    /// Comma-separated display names, one per player
    #[arg(long, value_delimiter = ',')]
    names: Option<Vec<String>>,

    /// Agents assigned to seats in order, repeated as needed
    #[arg(long, value_enum, value_delimiter = ',', default_value = "mcts,monte-carlo")]
    agents: Vec<AgentKind>,

    /// Seed for a reproducible game
    #[arg(long)]
    seed: Option<u64>,

    /// Rollouts per candidate for the Monte Carlo agent
    #[arg(long, default_value_t = N_SIMS)]
    simulations: usize,

    /// Search iterations per decision for the tree search agent
    #[arg(long, default_value_t = N_ITERATIONS)]
    iterations: usize,

    /// Stop the game after this many turns
    #[arg(long, default_value_t = 1000)]
    max_turns: usize,
}

impl Default for PlayArgs {
    fn default() -> Self {
        Self {
            players: 2,
            names: None,
            agents: vec![AgentKind::Mcts, AgentKind::MonteCarlo],
            seed: None,
            simulations: N_SIMS,
            iterations: N_ITERATIONS,
            max_turns: 1000,
        }
    }
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    match cli.command {
        Some(Commands::Play(args)) => run_game(&args),
        Some(Commands::Throws { count, seed }) => {
            run_throws(count, seed);
            Ok(())
        }
        None => run_game(&PlayArgs::default()),
    }
}

fn make_agent(kind: AgentKind, config: &SearchConfig) -> Box<dyn Agent> {
    match kind {
        AgentKind::Random => Box::new(RandomAgent),
        AgentKind::MonteCarlo => Box::new(MonteCarloAgent::new(config.clone())),
        AgentKind::Mcts => Box::new(MctsAgent::new(config.clone())),
    }
}

fn run_game(args: &PlayArgs) -> Result<()> {
    if args.agents.is_empty() {
        bail!("at least one agent kind is required");
    }

    let mut game = Game::new(args.players, args.names.clone()).context("invalid game setup")?;
    let mut rng = match args.seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };

    let config = SearchConfig {
        simulations: args.simulations,
        iterations: args.iterations,
        ..SearchConfig::default()
    };
    let mut agents: Vec<Box<dyn Agent>> = args
        .agents
        .iter()
        .cycle()
        .take(game.num_players())
        .map(|&kind| make_agent(kind, &config))
        .collect();

    for (player, agent) in game.players().iter().zip(&agents) {
        info!(player = player.id, name = %player.name, agent = agent.name(), "seat");
    }

    let mut printed = 0;
    let mut turns = 0;
    while !game.is_over() && turns < args.max_turns {
        let seat = game.current_index();
        let summary = play_turn(&mut game, agents[seat].as_mut(), &mut rng)
            .with_context(|| format!("turn {turns} failed for {}", game.current_player().name))?;

        for line in &game.history()[printed..] {
            println!("{line}");
        }
        printed = game.history().len();

        if summary.game_over {
            break;
        }
        game.next_turn();
        turns += 1;
    }

    if !game.is_over() {
        warn!(turns, "turn limit reached before the game finished");
        println!("\nStopped after {turns} turns");
    }

    println!("\nRankings:");
    for (place, &id) in game.rankings().iter().enumerate() {
        let name = game.player(id).map_or("?", |p| p.name.as_str());
        println!("  {}. {name} ({})", place + 1, agents[id].name());
    }
    Ok(())
}

fn run_throws(count: usize, seed: Option<u64>) {
    let mut rng = match seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };

    let mut counts = [0usize; Throw::ALL.len()];
    for _ in 0..count {
        let throw = throw_sticks(&mut rng);
        if let Some(i) = Throw::ALL.iter().position(|&t| t == throw) {
            counts[i] += 1;
        }
    }

    println!("{count} throws:");
    for (throw, n) in Throw::ALL.iter().zip(counts) {
        let share = if count > 0 { n as f64 / count as f64 } else { 0.0 };
        println!("  {:>7} ({:+}) {n:>9} {:6.2}%", throw.name(), throw.steps(), share * 100.0);
    }
}
