//! Inspect command - decode a genome into traits, stats and behavior
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: resolve_genome(), report()
//! - Level 4: parsing and formatting utilities

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use tankwar_core::{
    classify_strategy, decode, Gene, Genome, Phenotype, SimulationConfig, StrategyLabel, GENOME_LEN,
};
use tankwar_evolve::genome_name;

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct InspectArgs {
    /// Comma-separated gene values, e.g. 0.5,0.5,0.5,0.5,0.5,0.5,0.5,0.5,0.5
    #[arg(long, value_name = "GENES", conflicts_with = "random")]
    pub genome: Option<String>,

    /// Inspect a random genome
    #[arg(long)]
    pub random: bool,

    /// Simulation config JSON (stat formulas)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct Inspection {
    name: String,
    strategy: StrategyLabel,
    genome: Genome,
    phenotype: Phenotype,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

pub fn run(args: InspectArgs, seed: Option<u64>) -> Result<()> {
    let genome = resolve_genome(&args, seed)?;
    let config = load_simulation_config(args.config.as_deref())?;

    let inspection = Inspection {
        name: genome_name(&genome),
        strategy: classify_strategy(&genome),
        genome,
        phenotype: decode(&genome, &config.stats),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&inspection)?);
    } else {
        print_text(&inspection);
    }
    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn resolve_genome(args: &InspectArgs, seed: Option<u64>) -> Result<Genome> {
    match &args.genome {
        Some(text) => parse_genome(text),
        None if args.random => Ok(Genome::random(&mut create_rng(seed))),
        None => Ok(Genome::default()),
    }
}

fn print_text(inspection: &Inspection) {
    let p = &inspection.phenotype;

    println!("=== {} ({}) ===", inspection.name, inspection.strategy);

    println!("\nGenes:");
    for gene in Gene::ALL {
        println!("  {:<12} {:.3}", gene.name(), inspection.genome.get(gene));
    }

    println!("\nDerived stats:");
    println!("  Max health:  {:.1}", p.stats.max_health);
    println!("  Speed:       {:.1} u/s", p.stats.speed);
    println!("  Fire rate:   {:.2} shots/s", p.stats.fire_rate);
    println!("  Damage:      {:.1}", p.stats.damage);
    println!("  Range:       {:.1}", p.stats.range);
    println!("  Accuracy:    {:.1}%", p.stats.accuracy * 100.0);
    println!("  Armor:       {:.1}%", p.stats.armor * 100.0);

    println!("\nBehavior weights:");
    println!("  Caution:         {:.3}", p.weights.caution);
    println!("  Cooperation:     {:.3}", p.weights.cooperation);
    println!("  Hill priority:   {:.3}", p.weights.hill_priority);
    println!("  Objective focus: {:.3}", p.weights.objective_focus);
    println!("  Flanking:        {:.3}", p.weights.flanking);
    println!("  Risk:            {:.3}", p.weights.risk);
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Parse a comma-separated genome. Values outside [0,1] are clamped.
pub(crate) fn parse_genome(text: &str) -> Result<Genome> {
    let values = text
        .split(',')
        .map(|s| {
            s.trim()
                .parse::<f32>()
                .with_context(|| format!("Invalid gene value '{}'", s.trim()))
        })
        .collect::<Result<Vec<f32>>>()?;

    if values.len() != GENOME_LEN {
        anyhow::bail!("Expected {} genes, got {}", GENOME_LEN, values.len());
    }
    Ok(Genome::from_values(&values))
}

pub(crate) fn load_simulation_config(path: Option<&std::path::Path>) -> Result<SimulationConfig> {
    match path {
        Some(path) => SimulationConfig::load(path)
            .with_context(|| format!("Failed to load simulation config: {}", path.display())),
        None => Ok(SimulationConfig::default()),
    }
}

/// Create RNG from seed or random
pub(crate) fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}
