//! Seeded integer random source
//!
//! Every component that needs randomness takes a `&mut RandomSource` rather
//! than reaching for a global generator, so two calls never share hidden
//! state. The stream is ChaCha8, which is stable across platforms and `rand`
//! releases: the same seed yields the same matrices everywhere.
//!
//! # Example
//!
//! ```
//! use i8mm::RandomSource;
//!
//! let mut a = RandomSource::new(42);
//! let mut b = RandomSource::new(42);
//! assert_eq!(a.get_i32(-127, 127), b.get_i32(-127, 127));
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic bounded-range integer generator
#[derive(Debug, Clone)]
pub struct RandomSource {
    rng: ChaCha8Rng,
    seed: u64,
}

impl RandomSource {
    /// Create a generator with a fixed seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Create a generator with a fresh seed drawn from OS entropy
    ///
    /// Used for the Freivalds test vectors so that a kernel cannot special-case
    /// a known vector. The chosen seed is still recorded and can be logged to
    /// replay the run.
    pub fn from_entropy() -> Self {
        Self::new(rand::random::<u64>())
    }

    /// Seed this generator was created with
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform integer in the closed range `[lo, hi]`
    ///
    /// # Panics
    ///
    /// Panics if `lo > hi`.
    pub fn get_i32(&mut self, lo: i32, hi: i32) -> i32 {
        assert!(lo <= hi, "empty range [{lo}, {hi}]");
        self.rng.gen_range(lo..=hi)
    }

    /// Uniform int8 in the closed range `[lo, hi]`
    pub fn get_i8(&mut self, lo: i8, hi: i8) -> i8 {
        assert!(lo <= hi, "empty range [{lo}, {hi}]");
        self.rng.gen_range(lo..=hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = RandomSource::new(7);
        let mut b = RandomSource::new(7);
        let sa: Vec<i32> = (0..256).map(|_| a.get_i32(-1000, 1000)).collect();
        let sb: Vec<i32> = (0..256).map(|_| b.get_i32(-1000, 1000)).collect();
        assert_eq!(sa, sb);
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = RandomSource::new(42);
        let mut b = RandomSource::new(21);
        let sa: Vec<i32> = (0..64).map(|_| a.get_i32(-127, 127)).collect();
        let sb: Vec<i32> = (0..64).map(|_| b.get_i32(-127, 127)).collect();
        assert_ne!(sa, sb);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let mut rng = RandomSource::new(1);
        let mut seen = [false; 3];
        for _ in 0..1000 {
            let v = rng.get_i32(-1, 1);
            assert!((-1..=1).contains(&v));
            seen[(v + 1) as usize] = true;
        }
        assert!(seen.iter().all(|&s| s), "all of -1, 0, 1 should appear");
    }

    #[test]
    fn test_degenerate_range() {
        let mut rng = RandomSource::new(3);
        assert_eq!(rng.get_i32(5, 5), 5);
        assert_eq!(rng.get_i8(-9, -9), -9);
    }

    #[test]
    #[should_panic(expected = "empty range")]
    fn test_empty_range_panics() {
        RandomSource::new(0).get_i32(1, 0);
    }

    #[test]
    fn test_seed_is_recorded() {
        assert_eq!(RandomSource::new(1234).seed(), 1234);
        let fresh = RandomSource::from_entropy();
        assert_eq!(RandomSource::new(fresh.seed()).seed(), fresh.seed());
    }
}
