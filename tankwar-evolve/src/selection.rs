//! Selection operators for genetic algorithms
//!
//! Implements tournament selection where candidates compete
//! in small tournaments, with the winner being selected for breeding.

use rand::Rng;
use std::cmp::Ordering;

/// Anything that carries a fitness score (higher = better)
pub trait Scored {
    fn fitness(&self) -> f32;
}

impl<T: Scored + ?Sized> Scored for &T {
    fn fitness(&self) -> f32 {
        (**self).fitness()
    }
}

/// Descending-fitness comparator; NaN compares equal
pub fn by_fitness_desc<T: Scored>(a: &T, b: &T) -> Ordering {
    b.fitness().partial_cmp(&a.fitness()).unwrap_or(Ordering::Equal)
}

/// Fittest entry of a slice
pub fn best<T: Scored>(population: &[T]) -> Option<&T> {
    population.iter().min_by(|a, b| by_fitness_desc(*a, *b))
}

/// Tournament selection: select a candidate by running a tournament.
///
/// Samples `tournament_size` candidates uniformly with replacement and
/// returns the fittest. When the population is no larger than the
/// tournament, the global best is returned directly.
///
/// # Arguments
/// * `population` - Candidates to select from
/// * `tournament_size` - Number of candidates in each tournament
/// * `rng` - Random number generator
///
/// # Returns
/// The winner, or `None` if the population is empty
pub fn tournament_select<'a, T: Scored, R: Rng>(
    population: &'a [T],
    tournament_size: usize,
    rng: &mut R,
) -> Option<&'a T> {
    if population.len() <= tournament_size {
        return best(population);
    }

    let mut winner = &population[rng.gen_range(0..population.len())];
    for _ in 1..tournament_size {
        let challenger = &population[rng.gen_range(0..population.len())];
        if challenger.fitness() > winner.fitness() {
            winner = challenger;
        }
    }
    Some(winner)
}

/// Select the top N candidates by fitness (elitism).
///
/// # Returns
/// Indices of the best candidates, sorted by fitness (descending)
pub fn select_elite<T: Scored>(population: &[T], n: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..population.len()).collect();
    indices.sort_by(|&a, &b| by_fitness_desc(&population[a], &population[b]));
    indices.truncate(n);
    indices
}
