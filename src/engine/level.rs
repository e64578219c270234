//! SKIPTTL - Randomized Leveling Policy
//!
//! Each new node gets a height drawn from a geometric distribution:
//! start at 1 and keep adding a level while a fair coin comes up heads,
//! capped at `max_level`. On average half of the nodes at level `i` also
//! appear at level `i + 1`, which gives O(log n) expected height and
//! O(log n) expected search/insert/erase cost.
//!
//! The generator is owned by the engine rather than process-global, so
//! tests can inject a seeded `StdRng` and get reproducible heights.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Probability of promoting a node one more level.
const PROMOTION_PROBABILITY: f64 = 0.5;

/// Draws node heights in `[1, max_level]`.
#[derive(Debug, Clone)]
pub struct LevelGenerator<R = StdRng> {
    rng: R,
    max_level: usize,
}

impl LevelGenerator<StdRng> {
    /// Generator seeded from OS entropy.
    pub fn from_entropy(max_level: usize) -> Self {
        Self::new(StdRng::from_entropy(), max_level)
    }

    /// Deterministic generator for reproducible layouts.
    pub fn seeded(seed: u64, max_level: usize) -> Self {
        Self::new(StdRng::seed_from_u64(seed), max_level)
    }
}

impl<R: Rng> LevelGenerator<R> {
    /// Wrap a caller-provided random source.
    /// `max_level` is assumed validated (>= 1) by the engine.
    pub fn new(rng: R, max_level: usize) -> Self {
        Self { rng, max_level }
    }

    /// Upper bound on generated heights.
    pub fn max_level(&self) -> usize {
        self.max_level
    }

    /// Draw the height of a new node.
    pub fn random_level(&mut self) -> usize {
        let mut level = 1;
        while level < self.max_level && self.rng.gen_bool(PROMOTION_PROBABILITY) {
            level += 1;
        }
        level
    }
}
