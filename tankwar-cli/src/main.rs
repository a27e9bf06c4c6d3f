//! TANKWAR CLI - Command-line interface
//!
//! Commands:
//! - battle: Play a single battle
//! - evolve: Run Red Queen coevolution
//! - inspect: Decode a genome

mod battle_cmd;
mod evolve;
mod inspect;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tankwar")]
#[command(version, about = "TANKWAR coevolving tank battles")]
struct Cli {
    /// Random seed (random if omitted)
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single battle
    Battle(battle_cmd::BattleArgs),
    /// Evolve both teams against each other
    Evolve(evolve::EvolveArgs),
    /// Show what a genome decodes to
    Inspect(inspect::InspectArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Battle(args) => battle_cmd::run(args, cli.seed),
        Commands::Evolve(args) => evolve::run(args, cli.seed),
        Commands::Inspect(args) => inspect::run(args, cli.seed),
    }
}
