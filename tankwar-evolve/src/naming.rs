//! Genome naming - Human-readable identifiers for tracking evolution
//!
//! Generates memorable two-word names (e.g., "iron-wolf", "swift-tower")
//! from genomes. Names are deterministic on the genome quantized to one
//! decimal, so near-identical genomes share a name.

use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};
use tankwar_core::Genome;

// 64 adjectives + 64 nouns = 4096 unique names
const ADJECTIVES: [&str; 64] = [
    "red", "blue", "gold", "dark", "pale", "wild", "calm", "bold",
    "swift", "slow", "warm", "cold", "soft", "hard", "deep", "high",
    "iron", "silk", "jade", "ruby", "onyx", "opal", "amber", "coral",
    "quick", "still", "bright", "dim", "fresh", "old", "new", "lost",
    "stone", "glass", "steel", "brass", "copper", "silver", "bronze", "chrome",
    "sharp", "blunt", "keen", "dull", "pure", "mixed", "raw", "fine",
    "north", "south", "east", "west", "inner", "outer", "upper", "lower",
    "first", "last", "prime", "dual", "twin", "lone", "true", "void",
];

const NOUNS: [&str; 64] = [
    "wolf", "bear", "hawk", "lion", "fox", "owl", "elk", "ram",
    "oak", "pine", "elm", "ash", "fern", "moss", "vine", "root",
    "storm", "flame", "frost", "tide", "wind", "dust", "mist", "haze",
    "crown", "blade", "shield", "helm", "lance", "bow", "staff", "ring",
    "tower", "gate", "wall", "bridge", "path", "road", "trail", "pass",
    "dawn", "dusk", "noon", "night", "moon", "star", "sun", "sky",
    "peak", "vale", "cave", "lake", "river", "shore", "cliff", "ridge",
    "forge", "anvil", "hammer", "arrow", "spear", "axe", "sword", "torch",
];

/// Quantized genome, one digit per gene (0-10)
pub fn genome_signature(genome: &Genome) -> String {
    genome
        .genes()
        .iter()
        .map(|g| ((g * 10.0).round() as u8).to_string())
        .collect::<Vec<_>>()
        .join(".")
}

/// Convert a signature to a deterministic two-word name.
pub fn signature_to_name(sig: &str) -> String {
    let mut hasher = FxHasher::default();
    sig.hash(&mut hasher);
    let h = hasher.finish();

    let adj_idx = ((h >> 6) & 0x3F) as usize; // bits 6-11 -> adjective (0-63)
    let noun_idx = (h & 0x3F) as usize; // bits 0-5 -> noun (0-63)

    format!("{}-{}", ADJECTIVES[adj_idx], NOUNS[noun_idx])
}

/// Generate a memorable two-word name for a genome.
pub fn genome_name(genome: &Genome) -> String {
    signature_to_name(&genome_signature(genome))
}
