//! Error types for the simulation core

use crate::agent::AgentId;

/// Errors raised by the simulation core.
///
/// Numerical anomalies (bad genomes, stale targets, degenerate geometry) are
/// normalized in place and never surface here. These variants indicate the
/// caller broke a precondition.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("battle is already over")]
    BattleOver,

    #[error("unknown agent id: {0:?}")]
    UnknownAgent(AgentId),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type SimResult<T> = Result<T, SimError>;
