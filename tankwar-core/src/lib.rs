//! TANKWAR Core - Combat simulation engine
//!
//! This crate provides the core simulation for TANKWAR:
//! - Genome codec (9 genes -> traits, derived stats, behavior weights)
//! - Geometry (rectangles, segment intersection, line of sight)
//! - Agents, perception and the six-state tactical controller
//! - Projectile ballistics and hit resolution
//! - King-of-the-hill objective
//! - Battle state and the tick loop

pub mod error;
pub mod config;
pub mod geometry;
pub mod genome;
pub mod agent;
pub mod perception;
pub mod tactics;
pub mod combat;
pub mod hill;
pub mod battle;

// Re-exports for convenient access
pub use error::{SimError, SimResult};
pub use config::{LinearStat, ObjectiveConfig, SimulationConfig, StatFormulas};
pub use geometry::{has_line_of_sight, point_in_rect, rectangles_overlap, segments_intersect, Rect, Vec2};
pub use genome::{
    classify_strategy, decode, BehaviorWeights, DerivedStats, Gene, Genome, Phenotype,
    StrategyLabel, Traits, GENOME_LEN, NEUTRAL_GENE,
};
pub use agent::{Agent, AgentId, AgentSnapshot, AgentStats, Team};
pub use perception::{perceive, AgentView, Contact, ObjectiveStatus, Perception};
pub use tactics::{decide_state, TacticalState};
pub use combat::{fire, should_fire, HitReport, Projectile, ProjectileSnapshot};
pub use hill::{CaptureEvent, CaptureKind, Hill, HillSnapshot, HillStatus};
pub use battle::{
    initialize_battle, AgentResult, BattleOutcome, BattleResult, BattleSnapshot, BattleState,
    Spawn, TeamStats,
};
