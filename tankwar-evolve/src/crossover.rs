//! Crossover operators for genome evolution
//!
//! Single-point splice of two parents, or a straight copy of one of them.

use rand::Rng;
use tankwar_core::{Genome, GENOME_LEN};

/// Crossover two genomes.
///
/// With probability `1 - rate` the child is a full copy of a randomly
/// chosen parent. Otherwise a cut point is drawn uniformly from
/// `[0, GENOME_LEN)` and the child takes `a[..point]` followed by
/// `b[point..]`.
///
/// # Arguments
/// * `a` - First parent (contributes the head)
/// * `b` - Second parent (contributes the tail)
/// * `rate` - Probability of recombining (clamped to [0, 1])
/// * `rng` - Random number generator
///
/// # Returns
/// New child genome
pub fn crossover<R: Rng>(a: &Genome, b: &Genome, rate: f32, rng: &mut R) -> Genome {
    let rate = if rate.is_finite() { rate.clamp(0.0, 1.0) } else { 0.0 };

    if rng.gen::<f32>() >= rate {
        return if rng.gen_bool(0.5) { *a } else { *b };
    }

    let point = rng.gen_range(0..GENOME_LEN);
    splice(a, b, point)
}

/// `a[..point]` followed by `b[point..]`
pub fn splice(a: &Genome, b: &Genome, point: usize) -> Genome {
    let point = point.min(GENOME_LEN);
    let mut genes = *b.genes();
    genes[..point].copy_from_slice(&a.genes()[..point]);
    Genome::from(genes)
}
