//! TANKWAR Evolution - Genetic algorithm for tank genomes
//!
//! This crate provides the selection side of the evolutionary loop:
//! - Mutation (per-gene Gaussian noise)
//! - Crossover (single point splice)
//! - Selection (tournament, elitism)
//! - Candidate pool bookkeeping, checksum and best-genome lookup
//! - Genome naming for logs

pub mod mutation;
pub mod crossover;
pub mod selection;
pub mod pool;
pub mod naming;

use serde::{Deserialize, Serialize};

pub use crossover::{crossover, splice};
pub use mutation::{gaussian, mutate, MUTATION_STD};
pub use naming::genome_name;
pub use pool::{
    best_genome_for_team, pool_checksum, BestGenomeCache, CandidatePool, CandidateRecord, Lineup,
    PoolChecksum,
};
pub use selection::{select_elite, tournament_select, Scored};

/// Evolution configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Per-gene mutation probability
    pub mutation_rate: f32,
    /// Probability that a child recombines rather than copies a parent
    pub crossover_rate: f32,
    pub tournament_size: usize,
    /// Best records per team fielded unchanged each generation
    pub elitism: usize,
    /// Records kept per team after each generation
    pub pool_capacity: usize,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            mutation_rate: 0.1,
            crossover_rate: 0.7,
            tournament_size: 3,
            elitism: 1,
            pool_capacity: 20,
        }
    }
}

impl EvolutionConfig {
    pub fn with_mutation_rate(mut self, rate: f32) -> Self {
        self.mutation_rate = rate;
        self
    }

    pub fn with_crossover_rate(mut self, rate: f32) -> Self {
        self.crossover_rate = rate;
        self
    }

    pub fn with_tournament_size(mut self, size: usize) -> Self {
        self.tournament_size = size;
        self
    }

    pub fn with_elitism(mut self, elitism: usize) -> Self {
        self.elitism = elitism;
        self
    }

    pub fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }
}
