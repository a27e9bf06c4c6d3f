//! Configuration types for arena play
//!
//! Level 4 - Utilities and configuration

use serde::{Deserialize, Serialize};
use tankwar_core::{SimError, SimResult, SimulationConfig};
use tankwar_evolve::EvolutionConfig;

use crate::layout::Layout;

/// Settings for playing battles
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Tanks per team
    pub team_size: usize,
    /// Simulation step in seconds
    pub dt: f32,
    /// External time limit; battles still running are resolved on points
    pub max_duration: f32,
    /// Battles played by each lineup per generation
    pub battles_per_generation: usize,
    /// Whether to run battles in parallel
    pub parallel: bool,
    /// Base seed; battle `i` of a match runs with `seed + i`
    pub seed: u64,
    /// Obstacle layout generator
    pub layout: Layout,
    /// Battlefield and combat rules
    pub simulation: SimulationConfig,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            team_size: 5,
            dt: 0.05,
            max_duration: 120.0,
            battles_per_generation: 4,
            parallel: true,
            seed: 42,
            layout: Layout::Scattered(6),
            simulation: SimulationConfig::default(),
        }
    }
}

impl ArenaConfig {
    /// Set team size
    pub fn with_team_size(mut self, team_size: usize) -> Self {
        self.team_size = team_size;
        self
    }

    /// Set battles per generation
    pub fn with_battles(mut self, battles: usize) -> Self {
        self.battles_per_generation = battles;
        self
    }

    /// Set time limit
    pub fn with_max_duration(mut self, seconds: f32) -> Self {
        self.max_duration = seconds;
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set obstacle layout
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Set simulation rules
    pub fn with_simulation(mut self, simulation: SimulationConfig) -> Self {
        self.simulation = simulation;
        self
    }

    /// Run battles sequentially
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Check the step, time limit and simulation rules
    pub fn validate(&self) -> SimResult<()> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "dt must be positive and finite, got {}",
                self.dt
            )));
        }
        if !(self.max_duration.is_finite() && self.max_duration > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "max duration must be positive and finite, got {}",
                self.max_duration
            )));
        }
        self.simulation.validate()
    }
}

/// Settings for a full coevolution run
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CoevolutionConfig {
    pub generations: usize,
    pub arena: ArenaConfig,
    pub evolution: EvolutionConfig,
}

impl CoevolutionConfig {
    pub fn new(generations: usize) -> Self {
        Self {
            generations,
            ..Default::default()
        }
    }

    pub fn with_arena(mut self, arena: ArenaConfig) -> Self {
        self.arena = arena;
        self
    }

    pub fn with_evolution(mut self, evolution: EvolutionConfig) -> Self {
        self.evolution = evolution;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_config_defaults() {
        let config = ArenaConfig::default();
        assert_eq!(config.team_size, 5);
        assert_eq!(config.battles_per_generation, 4);
        assert!(config.parallel);
        assert!(config.simulation.validate().is_ok());
    }

    #[test]
    fn test_arena_config_builders() {
        let config = ArenaConfig::default()
            .with_team_size(2)
            .with_battles(6)
            .with_layout(Layout::Open)
            .sequential();
        assert_eq!(config.team_size, 2);
        assert_eq!(config.battles_per_generation, 6);
        assert_eq!(config.layout, Layout::Open);
        assert!(!config.parallel);
    }

    #[test]
    fn test_arena_config_validation() {
        assert!(ArenaConfig::default().validate().is_ok());

        for dt in [0.0, -0.05, f32::NAN, f32::INFINITY] {
            let config = ArenaConfig { dt, ..ArenaConfig::default() };
            assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));
        }

        let config = ArenaConfig::default().with_max_duration(f32::INFINITY);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_coevolution_config() {
        let config = CoevolutionConfig::new(10);
        assert_eq!(config.generations, 10);
        assert_eq!(config.evolution.tournament_size, 3);
    }
}
