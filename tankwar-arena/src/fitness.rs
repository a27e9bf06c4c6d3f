//! Team fitness aggregation
//!
//! Level 2 - Phase-level implementation
//!
//! Red Queen scoring: a team's `relative` fitness is its mean agent fitness
//! minus the opponent's, so progress is only measured against the other
//! side's current strategy.

use serde::{Deserialize, Serialize};
use tankwar_core::{BattleResult, Team};

/// Fitness summary for one team over a set of battles
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TeamFitness {
    pub team: Team,
    /// Mean per-agent fitness
    pub mean: f32,
    /// Best single-agent fitness
    pub best: f32,
    /// `mean - opponent.mean`
    pub relative: f32,
    /// Agent samples aggregated
    pub samples: u32,
}

impl TeamFitness {
    /// Create empty result
    pub fn empty(team: Team) -> Self {
        Self {
            team,
            mean: 0.0,
            best: 0.0,
            relative: 0.0,
            samples: 0,
        }
    }
}

/// Aggregate per-agent fitness across battles, indexed by `Team::index`
///
/// # Arguments
/// * `results` - Battles to aggregate
///
/// # Returns
/// Fitness for team A and team B
pub fn compute_team_fitness(results: &[BattleResult]) -> [TeamFitness; 2] {
    let mut fitness = Team::ALL.map(|team| aggregate_team(results, team));
    let [a, b] = fitness;
    fitness[Team::A.index()].relative = a.mean - b.mean;
    fitness[Team::B.index()].relative = b.mean - a.mean;
    fitness
}

// ============================================================================
// Level 3 - Steps
// ============================================================================

fn aggregate_team(results: &[BattleResult], team: Team) -> TeamFitness {
    let mut out = TeamFitness::empty(team);
    let mut sum = 0.0f32;
    let mut best = f32::NEG_INFINITY;

    for agent in results.iter().flat_map(|r| r.team_agents(team)) {
        sum += agent.fitness;
        best = best.max(agent.fitness);
        out.samples += 1;
    }

    if out.samples > 0 {
        out.mean = sum / out.samples as f32;
        out.best = best;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tankwar_core::{initialize_battle, Genome, SimulationConfig};

    fn result_with(fitness_a: &[f32], fitness_b: &[f32]) -> BattleResult {
        let a = vec![Genome::default(); fitness_a.len()];
        let b = vec![Genome::default(); fitness_b.len()];
        let mut result = initialize_battle(&a, &b, Vec::new(), SimulationConfig::default())
            .unwrap()
            .result();
        let mut values = fitness_a.iter().chain(fitness_b);
        for agent in &mut result.agents {
            agent.fitness = *values.next().unwrap();
        }
        result
    }

    #[test]
    fn test_relative_is_antisymmetric() {
        let results = vec![result_with(&[0.8, 0.6], &[0.2, 0.4])];
        let [a, b] = compute_team_fitness(&results);

        assert!((a.mean - 0.7).abs() < 1e-6);
        assert!((b.mean - 0.3).abs() < 1e-6);
        assert!((a.best - 0.8).abs() < 1e-6);
        assert!((a.relative - 0.4).abs() < 1e-6);
        assert!((a.relative + b.relative).abs() < 1e-6);
    }

    #[test]
    fn test_aggregates_across_battles() {
        let results = vec![result_with(&[1.0], &[0.0]), result_with(&[0.0], &[0.5])];
        let [a, b] = compute_team_fitness(&results);
        assert_eq!(a.samples, 2);
        assert!((a.mean - 0.5).abs() < 1e-6);
        assert!((b.best - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_empty_results() {
        let [a, b] = compute_team_fitness(&[]);
        assert_eq!(a, TeamFitness::empty(Team::A));
        assert_eq!(b.samples, 0);
    }
}
