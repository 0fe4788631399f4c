//! Tester configuration
//!
//! # Example
//!
//! ```
//! use i8mm::{Backend, TesterConfig};
//!
//! let config = TesterConfig::default()
//!     .with_test(true)
//!     .with_seed(Some(7))
//!     .with_freivalds_trials(32);
//! assert_eq!(config.backend, Backend::Host);
//! assert_eq!(config.seed, Some(7));
//! ```

use crate::verify::DEFAULT_TRIALS;
use crate::{Backend, RandomSource};

/// Environment variable consulted for the verification seed
pub const SEED_ENV: &str = "I8MM_SEED";

/// How a tester run is carried out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TesterConfig {
    /// Verify the output (`--test`); otherwise only run and time the kernel
    pub test: bool,
    /// Freivalds trials for regular problems
    pub freivalds_trials: usize,
    /// Seed for output garbage and Freivalds vectors; `None` draws fresh entropy
    pub seed: Option<u64>,
    /// Execution strategy
    pub backend: Backend,
}

impl Default for TesterConfig {
    fn default() -> Self {
        Self {
            test: false,
            freivalds_trials: DEFAULT_TRIALS,
            seed: None,
            backend: Backend::Host,
        }
    }
}

impl TesterConfig {
    /// Set verification mode
    #[must_use]
    pub fn with_test(mut self, test: bool) -> Self {
        self.test = test;
        self
    }

    /// Set the Freivalds trial count
    ///
    /// # Panics
    ///
    /// Panics if `trials` is zero.
    #[must_use]
    pub fn with_freivalds_trials(mut self, trials: usize) -> Self {
        assert!(trials > 0, "Freivalds trial count must be positive");
        self.freivalds_trials = trials;
        self
    }

    /// Set (or clear) the seed
    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Set the execution strategy
    #[must_use]
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Fill an unset seed from [`SEED_ENV`]; unparsable values are ignored
    #[must_use]
    pub fn with_env_seed(self) -> Self {
        if self.seed.is_some() {
            return self;
        }
        let seed = std::env::var(SEED_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok());
        self.with_seed(seed)
    }

    /// Random source for this run
    pub fn random_source(&self) -> RandomSource {
        match self.seed {
            Some(seed) => RandomSource::new(seed),
            None => RandomSource::from_entropy(),
        }
    }
}
