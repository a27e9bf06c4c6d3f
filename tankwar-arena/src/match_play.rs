//! Match play - multiple battles between two lineups
//!
//! Level 2 - Phase-level implementation

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tankwar_core::{BattleResult, Genome, Rect, SimResult, Team};

use crate::battle_runner::run_battle;
use crate::config::ArenaConfig;

/// Result of a match (multiple battles)
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MatchResult {
    /// Wins for team A
    pub a_wins: u32,
    /// Wins for team B
    pub b_wins: u32,
    /// Draws (including time-limit ties)
    pub draws: u32,
    /// Average battle length in seconds
    pub avg_duration: f32,
    /// Total battles played
    pub battles_played: u32,
    /// Individual battle results
    pub results: Vec<BattleResult>,
}

/// Play a match between two lineups (Level 2 phase)
///
/// Battle `i` runs with seed `base_seed + i`, so sequential and parallel
/// execution produce identical results.
///
/// # Arguments
/// * `genomes_a` - Team A lineup
/// * `genomes_b` - Team B lineup
/// * `obstacles` - Obstacles shared by every battle of the match
/// * `config` - Arena configuration (battles, dt, time limit, parallelism)
/// * `base_seed` - Seed of the first battle
pub fn play_match(
    genomes_a: &[Genome],
    genomes_b: &[Genome],
    obstacles: &[Rect],
    config: &ArenaConfig,
    base_seed: u64,
) -> SimResult<MatchResult> {
    config.validate()?;
    if config.battles_per_generation == 0 {
        return Ok(MatchResult::default());
    }

    let seeds = prepare_seeds(config.battles_per_generation, base_seed);
    let results = if config.parallel {
        execute_battles_parallel(genomes_a, genomes_b, obstacles, config, &seeds)?
    } else {
        execute_battles(genomes_a, genomes_b, obstacles, config, &seeds)?
    };
    Ok(aggregate_results(results))
}

// ============================================================================
// Level 3 - Steps
// ============================================================================

/// Seeds for each battle in a match
fn prepare_seeds(battles: usize, base_seed: u64) -> Vec<u64> {
    (0..battles as u64).map(|i| base_seed.wrapping_add(i)).collect()
}

/// Execute battles sequentially
fn execute_battles(
    genomes_a: &[Genome],
    genomes_b: &[Genome],
    obstacles: &[Rect],
    config: &ArenaConfig,
    seeds: &[u64],
) -> SimResult<Vec<BattleResult>> {
    seeds
        .iter()
        .map(|&seed| play_single_battle(genomes_a, genomes_b, obstacles, config, seed))
        .collect()
}

/// Execute battles in parallel using rayon
fn execute_battles_parallel(
    genomes_a: &[Genome],
    genomes_b: &[Genome],
    obstacles: &[Rect],
    config: &ArenaConfig,
    seeds: &[u64],
) -> SimResult<Vec<BattleResult>> {
    seeds
        .par_iter()
        .map(|&seed| play_single_battle(genomes_a, genomes_b, obstacles, config, seed))
        .collect()
}

fn play_single_battle(
    genomes_a: &[Genome],
    genomes_b: &[Genome],
    obstacles: &[Rect],
    config: &ArenaConfig,
    seed: u64,
) -> SimResult<BattleResult> {
    let simulation = config.simulation.clone().with_seed(seed);
    run_battle(
        genomes_a,
        genomes_b,
        obstacles,
        simulation,
        config.dt,
        config.max_duration,
    )
}

/// Aggregate battle results into a match result
fn aggregate_results(results: Vec<BattleResult>) -> MatchResult {
    let mut a_wins = 0u32;
    let mut b_wins = 0u32;
    let mut draws = 0u32;
    let mut total_duration = 0.0f32;

    for result in &results {
        total_duration += result.duration;
        match result.winner() {
            Some(Team::A) => a_wins += 1,
            Some(Team::B) => b_wins += 1,
            None => draws += 1,
        }
    }

    let battles_played = results.len() as u32;
    let avg_duration = if battles_played > 0 {
        total_duration / battles_played as f32
    } else {
        0.0
    };

    MatchResult {
        a_wins,
        b_wins,
        draws,
        avg_duration,
        battles_played,
        results,
    }
}
