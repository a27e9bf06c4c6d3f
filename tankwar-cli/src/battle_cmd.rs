//! Battle command - play one battle between two teams
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_lineups(), build_simulation(), report_results()
//! - Level 4: formatting utilities

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use tankwar_arena::{run_battle, Layout};
use tankwar_core::{BattleResult, Genome, ObjectiveConfig, SimulationConfig, Team};
use tankwar_evolve::genome_name;

use crate::inspect::{create_rng, load_simulation_config, parse_genome};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct BattleArgs {
    /// Tanks per team
    #[arg(long, default_value = "5")]
    pub team_size: usize,

    /// Team A genome (comma-separated genes); random if omitted
    #[arg(long, value_name = "GENES")]
    pub team_a: Option<String>,

    /// Team B genome (comma-separated genes); random if omitted
    #[arg(long, value_name = "GENES")]
    pub team_b: Option<String>,

    /// Obstacle layout: open, scattered:N, symmetric:N
    #[arg(long, default_value = "scattered:6")]
    pub layout: Layout,

    /// Enable king-of-the-hill mode
    #[arg(long)]
    pub hill: bool,

    /// Simulation config JSON
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Time limit in seconds
    #[arg(long, default_value = "120")]
    pub max_duration: f32,

    /// Simulation step in seconds
    #[arg(long, default_value = "0.05")]
    pub dt: f32,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run battle command
///
/// 1. Build both lineups and the battlefield
/// 2. Play the battle to completion
/// 3. Report results
pub fn run(args: BattleArgs, seed: Option<u64>) -> Result<()> {
    let mut rng = create_rng(seed);
    let (genomes_a, genomes_b) = build_lineups(&args, &mut rng)?;
    let simulation = build_simulation(&args, &mut rng)?;
    let obstacles = args.layout.generate(&simulation, &mut rng);

    tracing::info!(
        "Starting battle: {}v{}, layout {}, {} obstacles{}",
        genomes_a.len(),
        genomes_b.len(),
        args.layout,
        obstacles.len(),
        if simulation.objective.is_some() { ", hill" } else { "" }
    );

    let result = run_battle(
        &genomes_a,
        &genomes_b,
        &obstacles,
        simulation,
        args.dt,
        args.max_duration,
    )?;

    report_results(&result, &args)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn build_lineups(args: &BattleArgs, rng: &mut ChaCha8Rng) -> Result<(Vec<Genome>, Vec<Genome>)> {
    let a = team_genomes(args.team_a.as_deref(), args.team_size, rng)?;
    let b = team_genomes(args.team_b.as_deref(), args.team_size, rng)?;
    Ok((a, b))
}

/// `team_size` copies of the given genome, or of a random one
fn team_genomes(genes: Option<&str>, team_size: usize, rng: &mut ChaCha8Rng) -> Result<Vec<Genome>> {
    let genome = match genes {
        Some(text) => parse_genome(text)?,
        None => Genome::random(rng),
    };
    Ok(vec![genome; team_size])
}

fn build_simulation(args: &BattleArgs, rng: &mut ChaCha8Rng) -> Result<SimulationConfig> {
    let mut simulation = load_simulation_config(args.config.as_deref())?;
    if args.hill && simulation.objective.is_none() {
        simulation = simulation.with_objective(ObjectiveConfig::default());
    }
    Ok(simulation.with_seed(rng.gen()))
}

fn report_results(result: &BattleResult, args: &BattleArgs) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        print_text_results(result);
    }
    Ok(())
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn print_text_results(result: &BattleResult) {
    println!("\n=== Battle Results ===");
    match result.winner() {
        Some(team) => println!("Winner:   Team {}", team),
        None => println!("Winner:   draw"),
    }
    println!("Duration: {:.1}s ({} ticks)", result.duration, result.ticks);

    for team in Team::ALL {
        let Some(stats) = result.team(team) else {
            continue;
        };
        let accuracy = if stats.shots_fired > 0 {
            stats.shots_hit as f32 / stats.shots_fired as f32 * 100.0
        } else {
            0.0
        };
        println!(
            "\nTeam {}: {}/{} alive, {:.0} hp, {} kills, {:.1}% accuracy",
            team, stats.alive, stats.agents, stats.total_health, stats.kills, accuracy
        );
        for agent in result.team_agents(team) {
            println!(
                "  #{} {:<24} fitness {:.3}  dealt {:>5.1}  taken {:>5.1}{}",
                agent.slot,
                genome_name(&agent.genome),
                agent.fitness,
                agent.stats.damage_dealt,
                agent.stats.damage_taken,
                if agent.alive { "" } else { "  (destroyed)" }
            );
        }
    }

    if let Some(hill) = &result.hill {
        println!(
            "\nHill: A {:.1} / B {:.1} ({:?})",
            hill.score_a, hill.score_b, hill.status
        );
        for event in &result.capture_events {
            println!("  {:>6.1}s {:?} by Team {}", event.time, event.kind, event.team);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> BattleArgs {
        BattleArgs {
            team_size: 3,
            team_a: Some("0.9,0.5,0.5,0.5,0.5,0.5,0.5,0.5,0.5".into()),
            team_b: None,
            layout: Layout::Open,
            hill: true,
            config: None,
            max_duration: 10.0,
            dt: 0.05,
            json: false,
        }
    }

    #[test]
    fn test_build_lineups() {
        let mut rng = create_rng(Some(42));
        let (a, b) = build_lineups(&args(), &mut rng).unwrap();
        assert_eq!(a.len(), 3);
        assert_eq!(b.len(), 3);
        assert!(a.iter().all(|g| *g == a[0]));
        assert!(b[0].is_valid());
    }

    #[test]
    fn test_zero_dt_is_an_error() {
        let args = BattleArgs { dt: 0.0, ..args() };
        assert!(run(args, Some(42)).is_err());
    }

    #[test]
    fn test_hill_flag_enables_objective() {
        let mut rng = create_rng(Some(42));
        let simulation = build_simulation(&args(), &mut rng).unwrap();
        assert!(simulation.objective.is_some());
    }
}
