//! nogo-mcts: a NoGo engine.
//!
//! ## Usage
//!
//! - `nogo-mcts` - Start the GTP server with default settings
//! - `nogo-mcts gtp --size 9 --time-limit 5` - GTP server with custom settings
//! - `nogo-mcts demo` - Let the engine play a short game against itself

use std::io;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use nogo_mcts::constants::{DEFAULT_SIZE, DEFAULT_TIME_LIMIT, TIME_EPSILON, UCT_C};
use nogo_mcts::gtp::{GtpEngine, format_vertex};
use nogo_mcts::mcts::SearchConfig;
use nogo_mcts::session::{Session, SessionConfig};

/// nogo-mcts: a Monte Carlo Tree Search NoGo engine
#[derive(Parser)]
#[command(name = "nogo-mcts")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is unset (logs go to stderr)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the GTP (Go Text Protocol) server on stdin/stdout
    Gtp(EngineArgs),
    /// Let the engine play one game against itself and print it
    Demo(EngineArgs),
}

#[derive(Args, Clone)]
struct EngineArgs {
    /// Board size (2..=25)
    #[arg(long, default_value_t = DEFAULT_SIZE)]
    size: usize,

    /// Seconds allowed per generated move
    #[arg(long, default_value_t = DEFAULT_TIME_LIMIT)]
    time_limit: f64,

    /// Seconds of the time limit kept back as safety margin
    #[arg(long, default_value_t = TIME_EPSILON)]
    epsilon: f64,

    /// UCT exploration constant
    #[arg(long, default_value_t = UCT_C)]
    exploration: f64,

    /// Seed for the playout RNG (random if omitted)
    #[arg(long)]
    seed: Option<u64>,
}

impl Default for EngineArgs {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            time_limit: DEFAULT_TIME_LIMIT,
            epsilon: TIME_EPSILON,
            exploration: UCT_C,
            seed: None,
        }
    }
}

impl EngineArgs {
    fn session_config(&self) -> Result<SessionConfig> {
        if !self.exploration.is_finite() || self.exploration < 0.0 {
            bail!("invalid exploration constant {}", self.exploration);
        }
        let time_limit = Duration::try_from_secs_f64(self.time_limit)
            .with_context(|| format!("invalid time limit {}", self.time_limit))?;
        let time_epsilon = Duration::try_from_secs_f64(self.epsilon)
            .with_context(|| format!("invalid epsilon {}", self.epsilon))?;
        Ok(SessionConfig {
            size: self.size,
            time_limit,
            time_epsilon,
            search: SearchConfig {
                exploration: self.exploration,
                seed: self.seed,
            },
        })
    }
}

fn init_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Some(Commands::Gtp(args)) => run_gtp(&args),
        Some(Commands::Demo(args)) => run_demo(&args),
        None => run_gtp(&EngineArgs::default()),
    }
}

fn run_gtp(args: &EngineArgs) -> Result<()> {
    let session = Session::new(args.session_config()?)?;
    info!(size = session.board_size(), "starting GTP server");
    let mut engine = GtpEngine::new(session);
    engine.run(io::stdin().lock(), io::stdout().lock())
}

fn run_demo(args: &EngineArgs) -> Result<()> {
    let mut session = Session::new(args.session_config()?)?;
    println!("nogo-mcts: NoGo MCTS Engine\n");
    println!(
        "Self-play on {0}x{0}, {1:.1}s per move\n",
        session.board_size(),
        session.time_limit().as_secs_f64()
    );

    let mut move_number = 1;
    loop {
        let color = session.current_side();
        let Some(pt) = session.generate_move(color) else {
            println!("{color} has no legal move");
            break;
        };
        let vertex = format_vertex(pt, session.board()).unwrap_or_else(|| pt.to_string());
        println!("{move_number}. {color} {vertex}");
        move_number += 1;
    }

    println!("\n{}", session.board());
    if let Some(winner) = session.winner() {
        println!("Winner: {winner}");
    }
    Ok(())
}
