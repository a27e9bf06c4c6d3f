//! Evolution command - coevolve team A and team B against each other
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_config(), run_evolution(), save_results()
//! - Level 3: save_pool(), save_fitness_history()
//! - Level 4: file I/O, formatting utilities

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use tankwar_arena::{run_coevolution, ArenaConfig, CoevolutionConfig, CoevolutionResult, Layout};
use tankwar_core::{classify_strategy, Genome, ObjectiveConfig, Team};
use tankwar_evolve::{CandidateRecord, EvolutionConfig};

use crate::inspect::load_simulation_config;

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct EvolveArgs {
    /// Number of generations to run
    #[arg(long, default_value = "20")]
    pub generations: usize,

    /// Tanks per team
    #[arg(long, default_value = "5")]
    pub team_size: usize,

    /// Battles per generation
    #[arg(long, default_value = "4")]
    pub battles: usize,

    /// Time limit per battle in seconds
    #[arg(long, default_value = "120")]
    pub max_duration: f32,

    /// Obstacle layout: open, scattered:N, symmetric:N
    #[arg(long, default_value = "symmetric:3")]
    pub layout: Layout,

    /// Enable king-of-the-hill mode
    #[arg(long)]
    pub hill: bool,

    /// Simulation config JSON
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Per-gene mutation probability (0.0-1.0)
    #[arg(long, default_value = "0.1")]
    pub mutation_rate: f32,

    /// Crossover rate (0.0-1.0)
    #[arg(long, default_value = "0.7")]
    pub crossover_rate: f32,

    /// Tournament size for parent selection
    #[arg(long, default_value = "3")]
    pub tournament_size: usize,

    /// Records per team carried over unchanged
    #[arg(long, default_value = "1")]
    pub elitism: usize,

    /// Records kept per team after each generation
    #[arg(long, default_value = "20")]
    pub pool_capacity: usize,

    /// Run battles on a single thread
    #[arg(long)]
    pub sequential: bool,

    /// Output directory (default: runs/evolve_<timestamp>)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long)]
    pub quiet: bool,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run evolution command
///
/// 1. Build the coevolution configuration
/// 2. Run the generations
/// 3. Save pool and fitness history
/// 4. Print a summary
pub fn run(args: EvolveArgs, seed: Option<u64>) -> Result<()> {
    let config = build_config(&args, seed)?;
    let output = args.output.clone().unwrap_or_else(default_output_dir);

    tracing::info!(
        "Starting evolution: gen={}, {}v{}, battles={}, seed={}",
        config.generations,
        config.arena.team_size,
        config.arena.team_size,
        config.arena.battles_per_generation,
        config.arena.seed
    );

    let result = run_evolution(&config, args.quiet)?;
    save_results(&result, &output)?;
    print_summary(&result, &output, args.json)?;

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn build_config(args: &EvolveArgs, seed: Option<u64>) -> Result<CoevolutionConfig> {
    let mut simulation = load_simulation_config(args.config.as_deref())?;
    if args.hill && simulation.objective.is_none() {
        simulation = simulation.with_objective(ObjectiveConfig::default());
    }

    let mut arena = ArenaConfig::default()
        .with_team_size(args.team_size)
        .with_battles(args.battles)
        .with_max_duration(args.max_duration)
        .with_layout(args.layout)
        .with_seed(seed.unwrap_or_else(rand::random))
        .with_simulation(simulation);
    if args.sequential {
        arena = arena.sequential();
    }

    let evolution = EvolutionConfig::default()
        .with_mutation_rate(args.mutation_rate)
        .with_crossover_rate(args.crossover_rate)
        .with_tournament_size(args.tournament_size)
        .with_elitism(args.elitism)
        .with_pool_capacity(args.pool_capacity);

    Ok(CoevolutionConfig::new(args.generations)
        .with_arena(arena)
        .with_evolution(evolution))
}

/// Run the generations behind a progress bar
fn run_evolution(config: &CoevolutionConfig, quiet: bool) -> Result<CoevolutionResult> {
    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        create_progress_bar(config.generations as u64)?
    };

    let result = run_coevolution(config, |report| {
        let [a, b] = &report.fitness;
        pb.set_message(format!(
            "A {:.3} ({:+.3}) | B {:.3} ({:+.3})",
            a.mean, a.relative, b.mean, b.relative
        ));
        pb.inc(1);
    })?;

    pb.finish_with_message("done");
    Ok(result)
}

fn save_results(result: &CoevolutionResult, output: &Path) -> Result<()> {
    std::fs::create_dir_all(output).context("Failed to create output directory")?;
    save_pool(result, output)?;
    save_fitness_history(result, output)?;
    Ok(())
}

fn print_summary(result: &CoevolutionResult, output: &Path, json: bool) -> Result<()> {
    let champions: Vec<ChampionSummary> = Team::ALL
        .iter()
        .filter_map(|&team| result.champion(team).map(|r| ChampionSummary::new(team, r)))
        .collect();

    if json {
        #[derive(Serialize)]
        struct JsonOutput<'a> {
            generations_run: usize,
            pool_size: usize,
            output: &'a Path,
            champions: &'a [ChampionSummary],
        }

        let summary = JsonOutput {
            generations_run: result.history.len(),
            pool_size: result.pool.len(),
            output,
            champions: &champions,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("\n=== Evolution Complete ===");
    println!("Generations: {}", result.history.len());
    println!("Pool size:   {}", result.pool.len());
    if let Some(last) = result.history.last() {
        println!(
            "Final round: A {} / B {} / draws {}",
            last.a_wins, last.b_wins, last.draws
        );
    }
    for champion in &champions {
        println!(
            "Team {} champion: {} [{}] fitness {:.3}, {}/{} wins",
            champion.team,
            champion.name,
            champion.strategy,
            champion.fitness,
            champion.wins,
            champion.battles
        );
    }
    println!("Output directory: {}", output.display());
    Ok(())
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn save_pool(result: &CoevolutionResult, output: &Path) -> Result<()> {
    let path = output.join("pool.json");
    let content = serde_json::to_string_pretty(&result.pool)?;
    std::fs::write(&path, content).context("Failed to write pool")?;
    tracing::info!("Saved pool ({} records) to {}", result.pool.len(), path.display());
    Ok(())
}

/// Save per-generation fitness to CSV
fn save_fitness_history(result: &CoevolutionResult, output: &Path) -> Result<()> {
    let path = output.join("fitness_history.csv");
    std::fs::write(&path, fitness_history_csv(result)).context("Failed to write fitness history")?;
    tracing::info!("Saved fitness history to {}", path.display());
    Ok(())
}

fn fitness_history_csv(result: &CoevolutionResult) -> String {
    let mut content = String::from(
        "generation,a_mean,a_best,a_relative,b_mean,b_best,b_relative,a_wins,b_wins,draws,avg_duration\n",
    );
    for report in &result.history {
        let [a, b] = &report.fitness;
        content.push_str(&format!(
            "{},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{},{},{},{:.2}\n",
            report.generation,
            a.mean,
            a.best,
            a.relative,
            b.mean,
            b.best,
            b.relative,
            report.a_wins,
            report.b_wins,
            report.draws,
            report.avg_duration
        ));
    }
    content
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

#[derive(Serialize)]
struct ChampionSummary {
    team: Team,
    name: String,
    strategy: String,
    fitness: f32,
    battles: u32,
    wins: u32,
    genome: Genome,
}

impl ChampionSummary {
    fn new(team: Team, record: &CandidateRecord) -> Self {
        Self {
            team,
            name: record.name(),
            strategy: classify_strategy(&record.genome).to_string(),
            fitness: record.fitness,
            battles: record.battles,
            wins: record.wins,
            genome: record.genome,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("runs").join(format!("evolve_{}", Local::now().format("%Y%m%d_%H%M%S")))
}

fn create_progress_bar(generations: u64) -> Result<ProgressBar> {
    let pb = ProgressBar::new(generations);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} generations ({msg})")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

// ============================================================================
// TESTS
// ============================================================================
