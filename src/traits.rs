//! Seams between the estimator core and its collaborators.
//!
//! These are intentionally minimal. Production wiring supplies a real entropy
//! source and a restaurant catalog; tests fix a seed and use plain maps.

use std::collections::BTreeMap;

use rand::Rng;

/// Source of randomness for extreme-mode jitter and scenario sampling.
///
/// Implemented for every [`rand::Rng`], so a seeded `StdRng` makes every
/// draw reproducible.
pub trait EntropySource {
    /// Whole minutes drawn uniformly from `[0, upper)`. Zero when `upper` is 0.
    fn jitter_minutes(&mut self, upper: u32) -> u32;

    /// A value drawn uniformly from `[low, high]`.
    fn uniform(&mut self, low: f64, high: f64) -> f64;

    /// An index drawn uniformly from `[0, len)`. `len` must be non-zero.
    fn pick(&mut self, len: usize) -> usize;

    fn coin(&mut self) -> bool;
}

impl<R: Rng> EntropySource for R {
    fn jitter_minutes(&mut self, upper: u32) -> u32 {
        if upper == 0 {
            return 0;
        }
        self.random_range(0..upper)
    }

    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        self.random_range(low..=high)
    }

    fn pick(&mut self, len: usize) -> usize {
        self.random_range(0..len)
    }

    fn coin(&mut self) -> bool {
        self.random_bool(0.5)
    }
}

/// Provides preparation time (minutes) for a named restaurant.
pub trait PrepTimeProvider {
    /// `None` when the restaurant is unknown to the catalog.
    fn prep_minutes(&self, restaurant: &str) -> Option<f64>;
}

impl PrepTimeProvider for BTreeMap<String, f64> {
    fn prep_minutes(&self, restaurant: &str) -> Option<f64> {
        self.get(restaurant).copied()
    }
}
