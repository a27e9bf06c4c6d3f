//! Battle runner - executes single battles under a time limit
//!
//! Level 3 - Step-level implementation

use tankwar_core::{initialize_battle, BattleResult, Genome, Rect, SimResult, SimulationConfig};

/// Play one battle to completion.
///
/// Ticks until the battle ends on its own or `max_duration` seconds have
/// elapsed, then resolves a still-running battle on points. A step that is
/// not positive and finite is rejected before the first tick.
///
/// # Arguments
/// * `genomes_a` - Team A, one genome per tank
/// * `genomes_b` - Team B, one genome per tank
/// * `obstacles` - Battlefield obstacles
/// * `simulation` - Rules; `simulation.seed` drives the battle's RNG
/// * `dt` - Step size in seconds
/// * `max_duration` - External time limit in seconds
pub fn run_battle(
    genomes_a: &[Genome],
    genomes_b: &[Genome],
    obstacles: &[Rect],
    simulation: SimulationConfig,
    dt: f32,
    max_duration: f32,
) -> SimResult<BattleResult> {
    let mut battle = initialize_battle(genomes_a, genomes_b, obstacles.to_vec(), simulation)?;

    while !battle.is_over() && battle.time() < max_duration {
        battle.tick(dt)?;
    }
    if !battle.is_over() {
        battle.end_by_time_limit();
    }

    Ok(battle.result())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tankwar_core::{BattleOutcome, ObjectiveConfig, SimError};

    #[test]
    fn test_battle_terminates() {
        let genomes = vec![Genome::default(); 2];
        let simulation = SimulationConfig::default().with_seed(7);
        let result = run_battle(&genomes, &genomes, &[], simulation, 0.05, 30.0).unwrap();

        assert!(result.outcome.is_some());
        assert!(result.duration <= 30.0 + 0.1);
        assert_eq!(result.agents.len(), 4);
    }

    #[test]
    fn test_time_limit_resolves_standoff() {
        // Tiny time limit: nobody can win outright
        let genomes = vec![Genome::default(); 2];
        let result =
            run_battle(&genomes, &genomes, &[], SimulationConfig::default(), 0.05, 0.5).unwrap();
        assert_eq!(result.outcome, Some(BattleOutcome::Draw));
        assert!(result.duration >= 0.5 - 1e-3);
    }

    #[test]
    fn test_same_seed_same_result() {
        let genomes_a = vec![Genome::uniform(0.7); 2];
        let genomes_b = vec![Genome::uniform(0.4); 2];
        let play = || {
            let simulation = SimulationConfig::default().with_seed(7);
            run_battle(&genomes_a, &genomes_b, &[], simulation, 0.05, 30.0).unwrap()
        };

        let a = play();
        let b = play();
        assert_eq!(a.outcome, b.outcome);
        assert_eq!(a.ticks, b.ticks);
    }

    #[test]
    fn test_bad_step_rejected() {
        let genomes = vec![Genome::default(); 2];
        for dt in [0.0, -0.05, f32::NAN] {
            let err = run_battle(&genomes, &genomes, &[], SimulationConfig::default(), dt, 1.0)
                .unwrap_err();
            assert!(matches!(err, SimError::InvalidConfig(_)));
        }
    }

    #[test]
    fn test_hill_battle_ends() {
        let simulation = SimulationConfig::default().with_objective(ObjectiveConfig {
            max_score: 5.0,
            ..ObjectiveConfig::default()
        });
        let genomes = vec![Genome::uniform(0.8); 3];
        let result = run_battle(&genomes, &genomes, &[], simulation, 0.05, 60.0).unwrap();
        assert!(result.outcome.is_some());
        assert!(result.hill.is_some());
    }

    #[test]
    fn test_invalid_simulation_propagates() {
        let mut simulation = SimulationConfig::default();
        simulation.decision_interval = 0.0;
        let err = run_battle(&[], &[], &[], simulation, 0.05, 1.0).unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig(_)));
    }
}
