//! Candidate pool: per-genome battle records and next-generation breeding
//!
//! Records carry running-average fitness, battles played and wins. Any
//! cached lookup over the pool is keyed on [`pool_checksum`], which covers
//! every field that can change in place, so an edit to one record always
//! invalidates the cache.

use rand::Rng;
use rustc_hash::{FxHashMap, FxHasher};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use tankwar_core::{BattleResult, Gene, Genome, Team};

use crate::crossover::crossover;
use crate::mutation::mutate;
use crate::naming::genome_name;
use crate::selection::{by_fitness_desc, select_elite, tournament_select, Scored};
use crate::EvolutionConfig;

/// Trait threshold for the per-team heuristic fallback
const HEURISTIC_THRESHOLD: f32 = 0.3;

// ============================================================================
// RECORDS
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub genome: Genome,
    /// Team this genome was bred for; untagged records are shared stock
    pub team: Option<Team>,
    /// Running mean of per-battle fitness
    pub fitness: f32,
    pub battles: u32,
    pub wins: u32,
    /// Generation the record was created in
    pub generation: u32,
}

impl CandidateRecord {
    pub fn new(genome: Genome, team: Option<Team>, generation: u32) -> Self {
        Self {
            genome,
            team,
            fitness: 0.0,
            battles: 0,
            wins: 0,
            generation,
        }
    }

    pub fn win_rate(&self) -> f32 {
        if self.battles == 0 {
            0.0
        } else {
            self.wins as f32 / self.battles as f32
        }
    }

    pub fn name(&self) -> String {
        genome_name(&self.genome)
    }

    /// Fold one battle into the running averages
    pub fn record(&mut self, fitness: f32, won: bool) {
        let fitness = if fitness.is_finite() { fitness } else { 0.0 };
        let n = self.battles as f32;
        self.fitness = (self.fitness * n + fitness) / (n + 1.0);
        self.battles += 1;
        if won {
            self.wins += 1;
        }
    }
}

impl Scored for CandidateRecord {
    fn fitness(&self) -> f32 {
        self.fitness
    }
}

// ============================================================================
// CHECKSUM
// ============================================================================

/// Change detector over the pool: size plus a hash of every mutable field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolChecksum {
    pub size: usize,
    pub checksum: u64,
}

pub fn pool_checksum(records: &[CandidateRecord]) -> PoolChecksum {
    let mut hasher = FxHasher::default();
    for r in records {
        r.fitness.to_bits().hash(&mut hasher);
        r.battles.hash(&mut hasher);
        r.wins.hash(&mut hasher);
        r.team.hash(&mut hasher);
        for g in r.genome.genes() {
            g.to_bits().hash(&mut hasher);
        }
    }
    PoolChecksum {
        size: records.len(),
        checksum: hasher.finish(),
    }
}

// ============================================================================
// BEST GENOME LOOKUP
// ============================================================================

/// Best record for `team`.
///
/// 1. fittest record tagged with `team`
/// 2. otherwise the fittest record in the whole pool passing the team's
///    trait heuristic (A: aggression, B: defense)
/// 3. otherwise a positional split of the fitness-sorted pool, A taking
///    the first entry and B the second (or the only one)
///
/// Returns `None` only for an empty pool.
pub fn best_genome_for_team(records: &[CandidateRecord], team: Team) -> Option<&CandidateRecord> {
    let tagged = records
        .iter()
        .filter(|r| r.team == Some(team))
        .min_by(|a, b| by_fitness_desc(*a, *b));
    if tagged.is_some() {
        return tagged;
    }

    let mut sorted: Vec<&CandidateRecord> = records.iter().collect();
    sorted.sort_by(|a, b| by_fitness_desc(a, b));

    let gene = match team {
        Team::A => Gene::Aggression,
        Team::B => Gene::Defense,
    };
    if let Some(r) = sorted.iter().copied().find(|r| r.genome.get(gene) > HEURISTIC_THRESHOLD) {
        return Some(r);
    }

    let slot = match team {
        Team::A => 0,
        Team::B => 1.min(sorted.len().saturating_sub(1)),
    };
    sorted.get(slot).copied()
}

/// Memoized [`best_genome_for_team`] keyed on [`pool_checksum`]
#[derive(Clone, Debug, Default)]
pub struct BestGenomeCache {
    key: Option<PoolChecksum>,
    best: [Option<CandidateRecord>; 2],
    recomputes: usize,
}

impl BestGenomeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, records: &[CandidateRecord], team: Team) -> Option<CandidateRecord> {
        let key = pool_checksum(records);
        if self.key != Some(key) {
            self.best = Team::ALL.map(|t| best_genome_for_team(records, t).cloned());
            self.key = Some(key);
            self.recomputes += 1;
        }
        self.best[team.index()].clone()
    }

    /// Number of times the cache was rebuilt
    pub fn recomputes(&self) -> usize {
        self.recomputes
    }
}

// ============================================================================
// POOL
// ============================================================================

/// Pool indices fielded by each team in one battle, in spawn order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lineup {
    pub a: Vec<usize>,
    pub b: Vec<usize>,
}

impl Lineup {
    pub fn team(&self, team: Team) -> &[usize] {
        match team {
            Team::A => &self.a,
            Team::B => &self.b,
        }
    }

    fn team_mut(&mut self, team: Team) -> &mut Vec<usize> {
        match team {
            Team::A => &mut self.a,
            Team::B => &mut self.b,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CandidatePool {
    records: Vec<CandidateRecord>,
    generation: u32,
}

impl CandidatePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<CandidateRecord>) -> Self {
        let generation = records.iter().map(|r| r.generation).max().unwrap_or(0);
        Self { records, generation }
    }

    pub fn records(&self) -> &[CandidateRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&CandidateRecord> {
        self.records.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut CandidateRecord> {
        self.records.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn push(&mut self, record: CandidateRecord) -> usize {
        self.records.push(record);
        self.records.len() - 1
    }

    pub fn checksum(&self) -> PoolChecksum {
        pool_checksum(&self.records)
    }

    pub fn best_for_team(&self, team: Team) -> Option<&CandidateRecord> {
        best_genome_for_team(&self.records, team)
    }

    /// Records tagged with `team`
    pub fn team_records(&self, team: Team) -> impl Iterator<Item = &CandidateRecord> {
        self.records.iter().filter(move |r| r.team == Some(team))
    }

    /// Add `team_size` random genomes per team and return them as a lineup
    pub fn seed<R: Rng>(&mut self, team_size: usize, rng: &mut R) -> Lineup {
        let mut lineup = Lineup::default();
        for team in Team::ALL {
            for _ in 0..team_size {
                let index = self.push(CandidateRecord::new(Genome::random(rng), Some(team), self.generation));
                lineup.team_mut(team).push(index);
            }
        }
        lineup
    }

    /// Genomes for a lineup, team A then team B
    pub fn genomes(&self, lineup: &Lineup) -> (Vec<Genome>, Vec<Genome>) {
        let pick = |indices: &[usize]| -> Vec<Genome> {
            indices
                .iter()
                .filter_map(|&i| self.records.get(i))
                .map(|r| r.genome)
                .collect()
        };
        (pick(&lineup.a), pick(&lineup.b))
    }

    /// Fold one battle's per-agent fitness into the fielded records.
    ///
    /// A record fielded in several slots gets one battle entry carrying the
    /// mean of its slots' fitness.
    pub fn record_battle(&mut self, lineup: &Lineup, result: &BattleResult) {
        let mut samples: FxHashMap<usize, (f32, u32, Team)> = FxHashMap::default();
        for agent in &result.agents {
            let Some(&index) = lineup.team(agent.team).get(agent.slot) else {
                tracing::warn!("Battle result slot {} has no lineup entry", agent.slot);
                continue;
            };
            let entry = samples.entry(index).or_insert((0.0, 0, agent.team));
            entry.0 += agent.fitness;
            entry.1 += 1;
        }

        let winner = result.winner();
        let mut indices: Vec<usize> = samples.keys().copied().collect();
        indices.sort_unstable();
        for index in indices {
            let (sum, count, team) = samples[&index];
            if let Some(record) = self.records.get_mut(index) {
                record.record(sum / count as f32, winner == Some(team));
            }
        }
    }

    /// Keep at most `capacity` records per team, fittest first. Untagged
    /// records are left alone. Invalidates outstanding lineups.
    pub fn trim(&mut self, capacity: usize) {
        let mut keep = vec![true; self.records.len()];
        for team in Team::ALL {
            let mut indices: Vec<usize> = (0..self.records.len())
                .filter(|&i| self.records[i].team == Some(team))
                .collect();
            if indices.len() <= capacity {
                continue;
            }
            indices.sort_by(|&a, &b| by_fitness_desc(&self.records[a], &self.records[b]));
            for &i in &indices[capacity..] {
                keep[i] = false;
            }
        }
        let mut flags = keep.into_iter();
        self.records.retain(|_| flags.next().unwrap_or(true));
    }

    /// Trim, then breed the next lineup for both teams.
    ///
    /// Each team fields its `elitism` best records unchanged, the rest are
    /// children of two tournament winners (crossover then mutation). A team
    /// with no records of its own is restocked with random genomes.
    pub fn next_lineup<R: Rng>(
        &mut self,
        config: &EvolutionConfig,
        team_size: usize,
        rng: &mut R,
    ) -> Lineup {
        self.trim(config.pool_capacity);
        self.generation += 1;

        let mut lineup = Lineup::default();
        for team in Team::ALL {
            let indices: Vec<usize> = (0..self.records.len())
                .filter(|&i| self.records[i].team == Some(team))
                .collect();
            let parents: Vec<CandidateRecord> = indices.iter().map(|&i| self.records[i].clone()).collect();

            for e in select_elite(&parents, config.elitism.min(team_size)) {
                lineup.team_mut(team).push(indices[e]);
            }

            if parents.is_empty() {
                tracing::warn!("Team {} has an empty pool, restocking with random genomes", team);
            }

            while lineup.team(team).len() < team_size {
                let genome = match (
                    tournament_select(&parents, config.tournament_size, rng),
                    tournament_select(&parents, config.tournament_size, rng),
                ) {
                    (Some(a), Some(b)) => {
                        let child = crossover(&a.genome, &b.genome, config.crossover_rate, rng);
                        mutate(&child, config.mutation_rate, rng)
                    }
                    _ => Genome::random(rng),
                };
                let index = self.push(CandidateRecord::new(genome, Some(team), self.generation));
                lineup.team_mut(team).push(index);
            }
        }

        tracing::debug!(
            "Generation {}: pool size {}, lineup {}v{}",
            self.generation,
            self.records.len(),
            lineup.a.len(),
            lineup.b.len()
        );
        lineup
    }

    /// Record every battle played by `lineup`, then breed the next lineup.
    pub fn advance_generation<R: Rng>(
        &mut self,
        lineup: &Lineup,
        results: &[BattleResult],
        config: &EvolutionConfig,
        team_size: usize,
        rng: &mut R,
    ) -> Lineup {
        for result in results {
            self.record_battle(lineup, result);
        }
        self.next_lineup(config, team_size, rng)
    }
}
