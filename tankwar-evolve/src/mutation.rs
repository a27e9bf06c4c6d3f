//! Mutation operators for genome evolution
//!
//! Per-gene Gaussian perturbation with clamping back into [0, 1].

use rand::Rng;
use std::f32::consts::TAU;
use tankwar_core::Genome;

// ============================================================================
// Constants
// ============================================================================

/// Standard deviation of per-gene mutation noise
pub const MUTATION_STD: f32 = 0.1;

/// Standard normal sample via the Box-Muller transform
pub fn gaussian<R: Rng>(rng: &mut R) -> f32 {
    // u1 in (0, 1] so ln stays finite
    let u1 = 1.0 - rng.gen::<f32>();
    let u2 = rng.gen::<f32>();
    (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
}

/// Mutate a genome.
///
/// Each gene independently, with probability `rate`, receives N(0, 0.1)
/// noise and is clamped to [0, 1]. The input is left untouched.
///
/// # Arguments
/// * `genome` - Parent genome
/// * `rate` - Per-gene mutation probability (clamped to [0, 1])
/// * `rng` - Random number generator
///
/// # Returns
/// New mutated genome
pub fn mutate<R: Rng>(genome: &Genome, rate: f32, rng: &mut R) -> Genome {
    mutate_with_std(genome, rate, MUTATION_STD, rng)
}

/// [`mutate`] with an explicit noise scale
pub fn mutate_with_std<R: Rng>(genome: &Genome, rate: f32, std: f32, rng: &mut R) -> Genome {
    let rate = if rate.is_finite() { rate.clamp(0.0, 1.0) } else { 0.0 };
    let mut genes = *genome.genes();
    for gene in genes.iter_mut() {
        if rng.gen::<f32>() < rate {
            *gene = (*gene + gaussian(rng) * std).clamp(0.0, 1.0);
        }
    }
    Genome::from(genes)
}
