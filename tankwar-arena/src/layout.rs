//! Obstacle layouts
//!
//! Level 4 - Utilities and configuration
//!
//! Obstacles are kept out of the spawn columns and off the hill center.
//! Symmetric layouts mirror every block across the vertical midline so
//! neither spawn side gets better cover.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tankwar_core::{point_in_rect, rectangles_overlap, Rect, SimulationConfig};

/// Obstacle side length range
const MIN_SIZE: f32 = 30.0;
const MAX_SIZE: f32 = 80.0;

/// Fraction of width reserved for each spawn column
const SPAWN_MARGIN: f32 = 0.2;

/// Placement attempts per obstacle before giving up on it
const MAX_ATTEMPTS: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layout {
    /// No obstacles
    Open,
    /// `n` random blocks
    Scattered(usize),
    /// `n` random blocks on the left half plus their mirror images
    Symmetric(usize),
}

impl Layout {
    /// Generate obstacles for a battlefield
    pub fn generate<R: Rng>(&self, config: &SimulationConfig, rng: &mut R) -> Vec<Rect> {
        match *self {
            Layout::Open => Vec::new(),
            Layout::Scattered(n) => scatter(n, config, rng, config.width * (1.0 - SPAWN_MARGIN)),
            Layout::Symmetric(n) => {
                let left = scatter(n, config, rng, config.width / 2.0);
                let mut obstacles = Vec::with_capacity(left.len() * 2);
                for r in left {
                    obstacles.push(r);
                    obstacles.push(r.mirrored_x(config.width));
                }
                obstacles
            }
        }
    }
}

/// Place up to `n` non-overlapping blocks with `x` in
/// `[SPAWN_MARGIN * width, max_right]`
fn scatter<R: Rng>(n: usize, config: &SimulationConfig, rng: &mut R, max_right: f32) -> Vec<Rect> {
    let min_x = config.width * SPAWN_MARGIN;
    let hill = config
        .objective
        .as_ref()
        .map(|obj| obj.position.unwrap_or_else(|| config.center()));

    let mut placed: Vec<Rect> = Vec::with_capacity(n);
    for _ in 0..n {
        for _ in 0..MAX_ATTEMPTS {
            let w = rng.gen_range(MIN_SIZE..=MAX_SIZE);
            let h = rng.gen_range(MIN_SIZE..=MAX_SIZE);
            if max_right - w <= min_x || config.height <= h {
                break;
            }
            let r = Rect::new(
                rng.gen_range(min_x..max_right - w),
                rng.gen_range(0.0..config.height - h),
                w,
                h,
            );
            if hill.map_or(false, |c| point_in_rect(c, &r)) {
                continue;
            }
            if placed.iter().any(|p| rectangles_overlap(p, &r)) {
                continue;
            }
            placed.push(r);
            break;
        }
    }
    placed
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Open => f.write_str("open"),
            Layout::Scattered(n) => write!(f, "scattered:{}", n),
            Layout::Symmetric(n) => write!(f, "symmetric:{}", n),
        }
    }
}

/// Parses `open`, `scattered:N` or `symmetric:N`
impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, count) = match s.split_once(':') {
            Some((kind, n)) => {
                let n = n
                    .parse::<usize>()
                    .map_err(|e| format!("invalid obstacle count '{}': {}", n, e))?;
                (kind, Some(n))
            }
            None => (s, None),
        };
        match (kind.to_ascii_lowercase().as_str(), count) {
            ("open", _) => Ok(Layout::Open),
            ("scattered", n) => Ok(Layout::Scattered(n.unwrap_or(6))),
            ("symmetric", n) => Ok(Layout::Symmetric(n.unwrap_or(3))),
            (other, _) => Err(format!("unknown layout '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use tankwar_core::ObjectiveConfig;

    #[test]
    fn test_open_is_empty() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        assert!(Layout::Open.generate(&SimulationConfig::default(), &mut rng).is_empty());
    }

    #[test]
    fn test_scattered_clear_of_spawns() {
        let config = SimulationConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let obstacles = Layout::Scattered(8).generate(&config, &mut rng);
        assert!(!obstacles.is_empty());
        for r in &obstacles {
            assert!(r.x >= config.width * SPAWN_MARGIN);
            assert!(r.right() <= config.width * (1.0 - SPAWN_MARGIN));
            assert!(r.bottom() <= config.height);
        }
        for (i, a) in obstacles.iter().enumerate() {
            for b in &obstacles[i + 1..] {
                assert!(!rectangles_overlap(a, b));
            }
        }
    }

    #[test]
    fn test_symmetric_mirrors() {
        let config = SimulationConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let obstacles = Layout::Symmetric(3).generate(&config, &mut rng);
        assert_eq!(obstacles.len() % 2, 0);
        for pair in obstacles.chunks(2) {
            assert_eq!(pair[0].mirrored_x(config.width), pair[1]);
        }
    }

    #[test]
    fn test_hill_center_kept_clear() {
        let config = SimulationConfig::default().with_objective(ObjectiveConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..20 {
            for r in Layout::Scattered(10).generate(&config, &mut rng) {
                assert!(!point_in_rect(config.center(), &r));
            }
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!("open".parse::<Layout>(), Ok(Layout::Open));
        assert_eq!("scattered:4".parse::<Layout>(), Ok(Layout::Scattered(4)));
        assert_eq!("Symmetric".parse::<Layout>(), Ok(Layout::Symmetric(3)));
        assert!("maze".parse::<Layout>().is_err());
        assert!("scattered:x".parse::<Layout>().is_err());
        assert_eq!(Layout::Scattered(4).to_string(), "scattered:4");
    }
}
