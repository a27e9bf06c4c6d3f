//! Coevolution loop - both teams evolve against each other
//!
//! Level 1 - Orchestration and Level 2 - Phases

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tankwar_core::{SimResult, Team};
use tankwar_evolve::{BestGenomeCache, CandidatePool, CandidateRecord, Lineup, PoolChecksum};

use crate::config::CoevolutionConfig;
use crate::fitness::{compute_team_fitness, TeamFitness};
use crate::match_play::{play_match, MatchResult};

/// Summary of one generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationReport {
    pub generation: u32,
    /// Fitness for team A and team B
    pub fitness: [TeamFitness; 2],
    pub a_wins: u32,
    pub b_wins: u32,
    pub draws: u32,
    pub avg_duration: f32,
    /// Best record per team after this generation's results were recorded
    pub best_a: Option<CandidateRecord>,
    pub best_b: Option<CandidateRecord>,
    pub pool_size: usize,
    pub checksum: PoolChecksum,
}

impl GenerationReport {
    pub fn team_fitness(&self, team: Team) -> &TeamFitness {
        &self.fitness[team.index()]
    }

    pub fn best(&self, team: Team) -> Option<&CandidateRecord> {
        match team {
            Team::A => self.best_a.as_ref(),
            Team::B => self.best_b.as_ref(),
        }
    }
}

/// Result of a coevolution run
#[derive(Clone, Debug)]
pub struct CoevolutionResult {
    /// Final candidate pool
    pub pool: CandidatePool,
    /// One report per generation
    pub history: Vec<GenerationReport>,
    /// Lineup bred for the generation after the last one played
    pub next_lineup: Lineup,
}

impl CoevolutionResult {
    /// Fittest record for a team in the final pool
    pub fn champion(&self, team: Team) -> Option<&CandidateRecord> {
        self.pool.best_for_team(team)
    }
}

// ============================================================================
// Level 1 - Orchestration
// ============================================================================

/// Run a coevolution (Level 1 orchestration)
///
/// Each generation the current lineups fight a match on a freshly
/// generated obstacle layout, the results are folded into the pool and the
/// next lineups are bred from it.
///
/// # Arguments
/// * `config` - Generations, arena and evolution settings
/// * `callback` - Called with each generation's report
///
/// # Returns
/// Final pool, per-generation history and the next lineup
pub fn run_coevolution<F>(config: &CoevolutionConfig, mut callback: F) -> SimResult<CoevolutionResult>
where
    F: FnMut(&GenerationReport),
{
    config.arena.validate()?;

    let arena = &config.arena;
    let mut rng = ChaCha8Rng::seed_from_u64(arena.seed);
    let mut pool = CandidatePool::new();
    let mut lineup = pool.seed(arena.team_size, &mut rng);
    let mut cache = BestGenomeCache::new();
    let mut history = Vec::with_capacity(config.generations);

    tracing::info!(
        "Starting coevolution: {} generations, {}v{}, {} battles/generation",
        config.generations,
        arena.team_size,
        arena.team_size,
        arena.battles_per_generation
    );

    for _ in 0..config.generations {
        let generation = pool.generation();
        let base_seed = generation_seed(arena.seed, generation, arena.battles_per_generation);
        let match_result = play_generation(&pool, &lineup, config, base_seed)?;
        let fitness = compute_team_fitness(&match_result.results);

        for result in &match_result.results {
            pool.record_battle(&lineup, result);
        }
        let report = build_report(generation, fitness, &match_result, &pool, &mut cache);
        log_generation(&report);
        callback(&report);
        history.push(report);

        lineup = pool.next_lineup(&config.evolution, arena.team_size, &mut rng);
    }

    tracing::info!(
        "Coevolution finished: pool size {}, {} cache rebuilds",
        pool.len(),
        cache.recomputes()
    );

    Ok(CoevolutionResult {
        pool,
        history,
        next_lineup: lineup,
    })
}

// ============================================================================
// Level 2 - Phases
// ============================================================================

/// Play one generation's match on a fresh obstacle layout (Level 2 phase)
fn play_generation(
    pool: &CandidatePool,
    lineup: &Lineup,
    config: &CoevolutionConfig,
    base_seed: u64,
) -> SimResult<MatchResult> {
    let arena = &config.arena;
    let mut layout_rng = ChaCha8Rng::seed_from_u64(base_seed);
    let obstacles = arena.layout.generate(&arena.simulation, &mut layout_rng);
    let (genomes_a, genomes_b) = pool.genomes(lineup);

    tracing::debug!(
        "Generation {}: {} obstacles ({}), seed {}",
        pool.generation(),
        obstacles.len(),
        arena.layout,
        base_seed
    );

    play_match(&genomes_a, &genomes_b, &obstacles, arena, base_seed)
}

// ============================================================================
// Level 3 - Steps
// ============================================================================

/// Battle seeds never repeat across generations
fn generation_seed(seed: u64, generation: u32, battles: usize) -> u64 {
    seed.wrapping_add(generation as u64 * battles.max(1) as u64)
}

fn build_report(
    generation: u32,
    fitness: [TeamFitness; 2],
    match_result: &MatchResult,
    pool: &CandidatePool,
    cache: &mut BestGenomeCache,
) -> GenerationReport {
    GenerationReport {
        generation,
        fitness,
        a_wins: match_result.a_wins,
        b_wins: match_result.b_wins,
        draws: match_result.draws,
        avg_duration: match_result.avg_duration,
        best_a: cache.get(pool.records(), Team::A),
        best_b: cache.get(pool.records(), Team::B),
        pool_size: pool.len(),
        checksum: pool.checksum(),
    }
}

fn log_generation(report: &GenerationReport) {
    let [a, b] = &report.fitness;
    tracing::info!(
        "Gen {}: A {:.3} (rel {:+.3}) | B {:.3} (rel {:+.3}) | W/L/D {}/{}/{}",
        report.generation,
        a.mean,
        a.relative,
        b.mean,
        b.relative,
        report.a_wins,
        report.b_wins,
        report.draws
    );
    if let (Some(best_a), Some(best_b)) = (&report.best_a, &report.best_b) {
        tracing::debug!(
            "Best A: {} ({:.3}), best B: {} ({:.3})",
            best_a.name(),
            best_a.fitness,
            best_b.name(),
            best_b.fitness
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArenaConfig;
    use crate::layout::Layout;
    use tankwar_core::SimError;

    fn tiny_config(generations: usize) -> CoevolutionConfig {
        CoevolutionConfig::new(generations).with_arena(
            ArenaConfig::default()
                .with_team_size(2)
                .with_battles(2)
                .with_max_duration(15.0)
                .with_layout(Layout::Symmetric(2))
                .sequential(),
        )
    }

    #[test]
    fn test_runs_every_generation() {
        let mut seen = Vec::new();
        let result = run_coevolution(&tiny_config(3), |r| seen.push(r.generation)).unwrap();

        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(result.history.len(), 3);
        assert_eq!(result.next_lineup.a.len(), 2);
        assert_eq!(result.next_lineup.b.len(), 2);
        assert_eq!(result.pool.generation(), 3);
    }

    #[test]
    fn test_reports_are_consistent() {
        let result = run_coevolution(&tiny_config(2), |_| {}).unwrap();
        for report in &result.history {
            assert_eq!(report.a_wins + report.b_wins + report.draws, 2);
            let [a, b] = report.fitness;
            assert!((a.relative + b.relative).abs() < 1e-5);
            assert!(report.best(Team::A).is_some());
            assert!(report.best(Team::B).is_some());
            assert_eq!(report.best(Team::A).and_then(|r| r.team), Some(Team::A));
        }
    }

    #[test]
    fn test_pool_respects_capacity() {
        let mut config = tiny_config(4);
        config.evolution.pool_capacity = 3;
        let result = run_coevolution(&config, |_| {}).unwrap();
        // Trimmed to capacity, then at most team_size - elitism children added
        for team in Team::ALL {
            assert!(result.pool.team_records(team).count() <= 3 + 2);
        }
    }

    #[test]
    fn test_deterministic() {
        let a = run_coevolution(&tiny_config(2), |_| {}).unwrap();
        let b = run_coevolution(&tiny_config(2), |_| {}).unwrap();
        assert_eq!(a.pool.checksum(), b.pool.checksum());
        assert_eq!(a.next_lineup, b.next_lineup);
    }

    #[test]
    fn test_zero_generations() {
        let result = run_coevolution(&tiny_config(0), |_| {}).unwrap();
        assert!(result.history.is_empty());
        assert_eq!(result.pool.len(), 4);
    }

    #[test]
    fn test_invalid_simulation_rejected() {
        let mut config = tiny_config(1);
        config.arena.simulation.decision_interval = -1.0;
        assert!(run_coevolution(&config, |_| {}).is_err());
    }

    #[test]
    fn test_zero_step_rejected() {
        let mut config = tiny_config(1);
        config.arena.dt = 0.0;
        assert!(matches!(
            run_coevolution(&config, |_| {}),
            Err(SimError::InvalidConfig(_))
        ));
    }
}
