//! Simulation configuration
//!
//! Every tunable constant of a battle lives here and is passed explicitly
//! into `initialize_battle` or `BattleState::with_spawns`. Nothing in the
//! core reads global state.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{SimError, SimResult};
use crate::geometry::Vec2;

// ============================================================================
// STAT FORMULAS
// ============================================================================

/// Linear `base + gene * scale` mapping used to derive combat stats.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearStat {
    pub base: f32,
    pub scale: f32,
}

impl LinearStat {
    pub const fn new(base: f32, scale: f32) -> Self {
        Self { base, scale }
    }

    pub fn apply(&self, gene: f32) -> f32 {
        self.base + gene * self.scale
    }
}

/// Formulas mapping decoded traits to derived combat stats
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatFormulas {
    /// Max health from defense
    pub max_health: LinearStat,
    /// Movement speed (units/s) from speed
    pub speed: LinearStat,
    /// Shots per second from aggression
    pub fire_rate: LinearStat,
    /// Damage per hit from aggression
    pub damage: LinearStat,
    /// Weapon range from accuracy
    pub range: LinearStat,
    /// Hit accuracy (0..1) from accuracy
    pub accuracy: LinearStat,
    /// Incoming damage reduction fraction from defense
    pub armor: LinearStat,
}

impl Default for StatFormulas {
    fn default() -> Self {
        Self {
            max_health: LinearStat::new(100.0, 50.0),
            speed: LinearStat::new(40.0, 60.0),
            fire_rate: LinearStat::new(0.5, 1.5),
            damage: LinearStat::new(10.0, 10.0),
            range: LinearStat::new(150.0, 150.0),
            accuracy: LinearStat::new(0.5, 0.5),
            armor: LinearStat::new(0.0, 0.3),
        }
    }
}

// ============================================================================
// OBJECTIVE
// ============================================================================

/// King-of-the-hill objective settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveConfig {
    /// Hill center; `None` places it at the battlefield center
    pub position: Option<Vec2>,
    /// Capture radius
    pub radius: f32,
    /// Radius within which an enemy contests the hill
    pub contest_radius: f32,
    /// Seconds for an uncontested team to take a neutral hill to 100%
    pub capture_time: f32,
    /// Points per second while fully controlled
    pub points_per_second: f32,
    /// First team to reach this score wins
    pub max_score: f32,
    /// Progress decay per second while contested
    pub contested_decay: f32,
    /// Progress decay per second while nobody is present
    pub empty_decay: f32,
    /// Progress loss per second while an enemy holds the hill alone
    pub enemy_decay: f32,
}

impl Default for ObjectiveConfig {
    fn default() -> Self {
        Self {
            position: None,
            radius: 60.0,
            contest_radius: 90.0,
            capture_time: 3.0,
            points_per_second: 1.0,
            max_score: 60.0,
            contested_decay: 30.0,
            empty_decay: 10.0,
            enemy_decay: 40.0,
        }
    }
}

impl ObjectiveConfig {
    /// Progress gained per second while capturing
    pub fn capture_rate(&self) -> f32 {
        100.0 / self.capture_time
    }
}

// ============================================================================
// SIMULATION CONFIG
// ============================================================================

/// Full battle configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub width: f32,
    pub height: f32,
    /// Side length of a tank's square hitbox
    pub tank_size: f32,
    pub stats: StatFormulas,
    /// Seconds between tactical re-decisions
    pub decision_interval: f32,
    /// Max rotation in radians per second
    pub turn_rate: f32,
    pub projectile_speed: f32,
    pub projectile_lifetime: f32,
    /// Net displacement below which a moving agent counts as stuck
    pub stuck_distance: f32,
    /// Window over which displacement is measured
    pub stuck_window: f32,
    /// Seed for the battle's own random stream
    pub seed: u64,
    /// Enables king-of-the-hill mode
    pub objective: Option<ObjectiveConfig>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 700.0,
            tank_size: 30.0,
            stats: StatFormulas::default(),
            decision_interval: 0.1,
            turn_rate: 4.0,
            projectile_speed: 300.0,
            projectile_lifetime: 2.0,
            stuck_distance: 5.0,
            stuck_window: 1.5,
            seed: 42,
            objective: None,
        }
    }
}

impl SimulationConfig {
    /// Enable the hill objective with default settings
    pub fn with_objective(mut self, objective: ObjectiveConfig) -> Self {
        self.objective = Some(objective);
        self
    }

    /// Set the battle seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Clamp a point into the playable area, keeping a tank fully inside
    pub fn clamp_to_bounds(&self, p: Vec2) -> Vec2 {
        let half = self.tank_size / 2.0;
        Vec2::new(
            p.x.clamp(half, (self.width - half).max(half)),
            p.y.clamp(half, (self.height - half).max(half)),
        )
    }

    pub fn in_bounds(&self, p: Vec2) -> bool {
        p.x >= 0.0 && p.x <= self.width && p.y >= 0.0 && p.y <= self.height
    }

    /// Reject configurations that would make the simulation meaningless
    pub fn validate(&self) -> SimResult<()> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "battlefield must have positive size, got {}x{}",
                self.width, self.height
            )));
        }
        if self.tank_size <= 0.0 || self.tank_size >= self.width.min(self.height) {
            return Err(SimError::InvalidConfig(format!(
                "tank size {} does not fit the battlefield",
                self.tank_size
            )));
        }
        if self.decision_interval <= 0.0 {
            return Err(SimError::InvalidConfig("decision interval must be positive".into()));
        }
        if self.projectile_speed <= 0.0 || self.projectile_lifetime <= 0.0 {
            return Err(SimError::InvalidConfig("projectiles need positive speed and lifetime".into()));
        }
        if let Some(obj) = &self.objective {
            if obj.radius <= 0.0 || obj.contest_radius < obj.radius {
                return Err(SimError::InvalidConfig(
                    "hill contest radius must be at least its capture radius".into(),
                ));
            }
            if obj.capture_time <= 0.0 || obj.max_score <= 0.0 {
                return Err(SimError::InvalidConfig(
                    "hill capture time and max score must be positive".into(),
                ));
            }
        }
        Ok(())
    }

    /// Load from JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SimulationConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save to JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
        let with_hill = SimulationConfig::default().with_objective(ObjectiveConfig::default());
        assert!(with_hill.validate().is_ok());
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let mut config = SimulationConfig::default();
        config.width = 0.0;
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));

        let mut config = SimulationConfig::default();
        config.decision_interval = 0.0;
        assert!(config.validate().is_err());

        let mut obj = ObjectiveConfig::default();
        obj.contest_radius = obj.radius - 1.0;
        let config = SimulationConfig::default().with_objective(obj);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_capture_rate() {
        let obj = ObjectiveConfig::default();
        assert!((obj.capture_rate() - 100.0 / 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_clamp_to_bounds() {
        let config = SimulationConfig::default();
        let p = config.clamp_to_bounds(Vec2::new(-50.0, 2000.0));
        assert_eq!(p, Vec2::new(15.0, 685.0));
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = SimulationConfig::default().with_objective(ObjectiveConfig::default());
        let json = serde_json::to_string(&config).unwrap();
        let back: SimulationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
