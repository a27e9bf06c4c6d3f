//! TANKWAR Arena - Battles, matches and coevolution
//!
//! This crate provides the evaluation loop:
//! - Single battles played to completion under a time limit
//! - Matches of repeated battles, optionally in parallel
//! - Team fitness with Red Queen relative scoring
//! - The coevolution loop feeding results back into the candidate pool
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run_coevolution (orchestration)
//! - Level 2: play_match, compute_team_fitness (phases)
//! - Level 3: run_battle (steps)
//! - Level 4: obstacle layouts, configuration

mod battle_runner;
mod coevolution;
mod config;
mod fitness;
mod layout;
mod match_play;

pub use battle_runner::run_battle;
pub use coevolution::{run_coevolution, CoevolutionResult, GenerationReport};
pub use config::{ArenaConfig, CoevolutionConfig};
pub use fitness::{compute_team_fitness, TeamFitness};
pub use layout::Layout;
pub use match_play::{play_match, MatchResult};
