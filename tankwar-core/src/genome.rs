//! Genome codec - maps the 9-gene vector onto named traits and derived stats
//!
//! Index-based access to genes is confined to this module. Everything
//! downstream works with `Traits`, `DerivedStats` and `BehaviorWeights`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::StatFormulas;

/// Number of genes in every genome
pub const GENOME_LEN: usize = 9;

/// Value substituted for missing or non-finite genes
pub const NEUTRAL_GENE: f32 = 0.5;

// ============================================================================
// GENES
// ============================================================================

/// Gene positions within the genome
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Gene {
    Aggression = 0,
    Speed = 1,
    Accuracy = 2,
    Defense = 3,
    Cooperation = 4,
    Formation = 5,
    Flanking = 6,
    RiskTaking = 7,
    Evasion = 8,
}

impl Gene {
    pub const ALL: [Gene; GENOME_LEN] = [
        Gene::Aggression,
        Gene::Speed,
        Gene::Accuracy,
        Gene::Defense,
        Gene::Cooperation,
        Gene::Formation,
        Gene::Flanking,
        Gene::RiskTaking,
        Gene::Evasion,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Gene::Aggression => "aggression",
            Gene::Speed => "speed",
            Gene::Accuracy => "accuracy",
            Gene::Defense => "defense",
            Gene::Cooperation => "cooperation",
            Gene::Formation => "formation",
            Gene::Flanking => "flanking",
            Gene::RiskTaking => "risk_taking",
            Gene::Evasion => "evasion",
        }
    }
}

// ============================================================================
// GENOME
// ============================================================================

/// Fixed-length genome with every gene in [0,1].
///
/// Construction always normalizes: values are clamped, non-finite values and
/// missing positions become `NEUTRAL_GENE`, surplus values are dropped.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<f32>", into = "Vec<f32>")]
pub struct Genome([f32; GENOME_LEN]);

impl Genome {
    /// Build from arbitrary values, normalizing as needed
    pub fn from_values(values: &[f32]) -> Self {
        let mut genes = [NEUTRAL_GENE; GENOME_LEN];
        for (slot, &v) in genes.iter_mut().zip(values) {
            *slot = normalize_gene(v);
        }
        Self(genes)
    }

    /// Genome with every gene set to `value` (clamped)
    pub fn uniform(value: f32) -> Self {
        Self([normalize_gene(value); GENOME_LEN])
    }

    /// Uniformly random genome
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let mut genes = [0.0; GENOME_LEN];
        for g in genes.iter_mut() {
            *g = rng.gen_range(0.0..=1.0);
        }
        Self(genes)
    }

    pub fn get(&self, gene: Gene) -> f32 {
        self.0[gene as usize]
    }

    pub fn genes(&self) -> &[f32; GENOME_LEN] {
        &self.0
    }

    /// True if every gene is finite and within [0,1]
    pub fn is_valid(&self) -> bool {
        self.0.iter().all(|g| g.is_finite() && (0.0..=1.0).contains(g))
    }
}

impl Default for Genome {
    fn default() -> Self {
        Self::uniform(NEUTRAL_GENE)
    }
}

impl From<Vec<f32>> for Genome {
    fn from(values: Vec<f32>) -> Self {
        Genome::from_values(&values)
    }
}

impl From<Genome> for Vec<f32> {
    fn from(genome: Genome) -> Self {
        genome.0.to_vec()
    }
}

impl From<[f32; GENOME_LEN]> for Genome {
    fn from(values: [f32; GENOME_LEN]) -> Self {
        Genome::from_values(&values)
    }
}

fn normalize_gene(v: f32) -> f32 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        NEUTRAL_GENE
    }
}

// ============================================================================
// DECODED FORMS
// ============================================================================

/// Named view of the genome
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Traits {
    pub aggression: f32,
    pub speed: f32,
    pub accuracy: f32,
    pub defense: f32,
    pub cooperation: f32,
    pub formation: f32,
    pub flanking: f32,
    pub risk_taking: f32,
    pub evasion: f32,
}

impl Traits {
    pub fn decode(genome: &Genome) -> Self {
        Self {
            aggression: genome.get(Gene::Aggression),
            speed: genome.get(Gene::Speed),
            accuracy: genome.get(Gene::Accuracy),
            defense: genome.get(Gene::Defense),
            cooperation: genome.get(Gene::Cooperation),
            formation: genome.get(Gene::Formation),
            flanking: genome.get(Gene::Flanking),
            risk_taking: genome.get(Gene::RiskTaking),
            evasion: genome.get(Gene::Evasion),
        }
    }
}

/// Combat stats fixed at agent construction
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DerivedStats {
    pub max_health: f32,
    pub speed: f32,
    pub fire_rate: f32,
    pub damage: f32,
    pub range: f32,
    pub accuracy: f32,
    pub armor: f32,
}

impl DerivedStats {
    pub fn from_traits(traits: &Traits, formulas: &StatFormulas) -> Self {
        Self {
            max_health: formulas.max_health.apply(traits.defense),
            speed: formulas.speed.apply(traits.speed),
            fire_rate: formulas.fire_rate.apply(traits.aggression).max(f32::EPSILON),
            damage: formulas.damage.apply(traits.aggression),
            range: formulas.range.apply(traits.accuracy),
            accuracy: formulas.accuracy.apply(traits.accuracy).clamp(0.0, 1.0),
            armor: formulas.armor.apply(traits.defense).clamp(0.0, 0.95),
        }
    }

    /// Preferred distance for initiating combat
    pub fn engagement_range(&self) -> f32 {
        self.range * 0.8
    }

    /// Seconds between shots
    pub fn fire_interval(&self) -> f32 {
        1.0 / self.fire_rate
    }
}

/// Per-behavior weights consulted by the tactical controller
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BehaviorWeights {
    pub caution: f32,
    pub cooperation: f32,
    pub hill_priority: f32,
    pub objective_focus: f32,
    pub flanking: f32,
    pub risk: f32,
}

impl BehaviorWeights {
    pub fn from_traits(traits: &Traits) -> Self {
        Self {
            caution: (traits.defense + traits.evasion) / 2.0,
            cooperation: traits.cooperation,
            hill_priority: (traits.aggression + traits.formation) / 2.0,
            objective_focus: (traits.formation + traits.cooperation) / 2.0,
            flanking: traits.flanking,
            risk: traits.risk_taking,
        }
    }
}

/// Everything an agent derives from its genome
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Phenotype {
    pub traits: Traits,
    pub stats: DerivedStats,
    pub weights: BehaviorWeights,
}

/// Decode a genome into traits, derived stats and behavior weights
pub fn decode(genome: &Genome, formulas: &StatFormulas) -> Phenotype {
    let traits = Traits::decode(genome);
    Phenotype {
        stats: DerivedStats::from_traits(&traits, formulas),
        weights: BehaviorWeights::from_traits(&traits),
        traits,
    }
}

// ============================================================================
// STRATEGY LABELS
// ============================================================================

/// Coarse reporting label for a genome
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyLabel {
    Aggressive,
    Sniper,
    Defensive,
    Flanker,
    Evasive,
    TeamPlayer,
    Balanced,
}

impl fmt::Display for StrategyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StrategyLabel::Aggressive => "Aggressive",
            StrategyLabel::Sniper => "Sniper",
            StrategyLabel::Defensive => "Defensive",
            StrategyLabel::Flanker => "Flanker",
            StrategyLabel::Evasive => "Evasive",
            StrategyLabel::TeamPlayer => "Team Player",
            StrategyLabel::Balanced => "Balanced",
        };
        f.write_str(s)
    }
}

/// Rule-based strategy tag. First matching rule wins.
pub fn classify_strategy(genome: &Genome) -> StrategyLabel {
    let t = Traits::decode(genome);

    if t.aggression > 0.7 && t.risk_taking > 0.5 {
        StrategyLabel::Aggressive
    } else if t.accuracy > 0.7 && t.aggression < 0.5 {
        StrategyLabel::Sniper
    } else if t.defense > 0.7 {
        StrategyLabel::Defensive
    } else if t.flanking > 0.7 && t.speed > 0.6 {
        StrategyLabel::Flanker
    } else if t.evasion > 0.7 {
        StrategyLabel::Evasive
    } else if t.cooperation > 0.7 {
        StrategyLabel::TeamPlayer
    } else {
        StrategyLabel::Balanced
    }
}
