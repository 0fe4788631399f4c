//! Verification engine
//!
//! Two strategies decide whether a kernel's output is the product `A × B`:
//!
//! - **Regular** problems always get [`verify_freivalds`], and additionally
//!   [`verify_exact`] when [`exact_affordable`] says the O(m·n·k) reference is
//!   cheap enough. The two must agree; a disagreement is a bug in this module
//!   and panics.
//! - **Tiled** problems get [`verify_tiled`], which collapses the output to one
//!   value per tile, checks that collapse exactly, and certifies every tile is
//!   internally constant.
//!
//! [`verify`] picks the strategy from the problem's tile size.

pub mod exact;
pub mod freivalds;
pub mod tiled;

use std::fmt;

#[cfg(feature = "tracing")]
use tracing::instrument;

pub use exact::verify_exact;
pub use freivalds::{verify_freivalds, DEFAULT_TRIALS};
pub use tiled::{verify_tiled, TiledVerdict};

use crate::problem::{ErrorMap, Problem};
use crate::RandomSource;

/// Largest output (m·n) still checked exactly
pub const EXACT_MAX_OUTPUT: usize = 32 * 32;

/// Exclusive bound on m·n·k for the exact check
pub const EXACT_MAX_WORK: usize = 256 * 256;

/// Whether the exact reference is cheap enough for this problem
///
/// # Example
///
/// ```
/// use i8mm::{verify::exact_affordable, generator::InputMode};
///
/// assert!(exact_affordable(&InputMode::Uniform.build(32, 32, 63, None)));
/// assert!(!exact_affordable(&InputMode::Uniform.build(32, 32, 64, None)));
/// ```
pub fn exact_affordable(problem: &Problem) -> bool {
    let output = problem.m() * problem.n();
    output <= EXACT_MAX_OUTPUT && output * problem.k() < EXACT_MAX_WORK
}

/// Which verification path produced an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeClass {
    /// Exact and Freivalds checks
    Small,
    /// Freivalds check only
    Large,
    /// Tile-consistency check
    Tiled,
}

impl SizeClass {
    /// Report token
    pub fn as_str(self) -> &'static str {
        match self {
            SizeClass::Small => "small",
            SizeClass::Large => "large",
            SizeClass::Tiled => "tiled",
        }
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of the regular strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegularVerdict {
    /// Freivalds found no evidence of a mismatch
    pub freivalds_pass: bool,
    /// Exact per-cell map, when the problem was small enough to check
    pub errors: Option<ErrorMap>,
}

impl RegularVerdict {
    /// True when every check that ran passed
    pub fn passed(&self) -> bool {
        self.freivalds_pass && self.errors.as_ref().map_or(true, ErrorMap::is_clean)
    }
}

/// Outcome of verifying one kernel run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Untiled problem
    Regular(RegularVerdict),
    /// Tiled problem
    Tiled(TiledVerdict),
}

impl Outcome {
    /// True when the output was accepted
    pub fn passed(&self) -> bool {
        match self {
            Outcome::Regular(v) => v.passed(),
            Outcome::Tiled(v) => v.passed(),
        }
    }

    /// Verification path taken
    pub fn size_class(&self) -> SizeClass {
        match self {
            Outcome::Regular(v) if v.errors.is_some() => SizeClass::Small,
            Outcome::Regular(_) => SizeClass::Large,
            Outcome::Tiled(_) => SizeClass::Tiled,
        }
    }

    /// Per-cell map (per-tile for tiled problems), if one was computed
    pub fn errors(&self) -> Option<&ErrorMap> {
        match self {
            Outcome::Regular(v) => v.errors.as_ref(),
            Outcome::Tiled(v) => Some(&v.errors),
        }
    }
}

/// Runs the regular strategy
///
/// # Panics
///
/// Panics if Freivalds rejects an output the exact check accepts (impossible
/// for a correct implementation), or if the exact check rejects an output
/// Freivalds accepts after at least [`DEFAULT_TRIALS`] trials (probability at
/// most `255^-20`).
#[cfg_attr(feature = "tracing", instrument(level = "debug", skip(problem, output, rng)))]
pub fn verify_regular(
    problem: &Problem,
    output: &[i32],
    trials: usize,
    rng: &mut RandomSource,
) -> RegularVerdict {
    let freivalds_pass = verify_freivalds(problem, output, trials, rng);
    let errors = exact_affordable(problem).then(|| verify_exact(problem, output));

    if let Some(map) = &errors {
        let exact_pass = map.is_clean();
        assert!(
            freivalds_pass || !exact_pass,
            "Freivalds rejected an output the exact check accepts (seed {})",
            rng.seed()
        );
        if trials >= DEFAULT_TRIALS {
            assert!(
                exact_pass || !freivalds_pass,
                "Freivalds missed a mismatch across {trials} trials (seed {})",
                rng.seed()
            );
        }
    }

    RegularVerdict {
        freivalds_pass,
        errors,
    }
}

/// Verifies `output` with the strategy matching the problem
///
/// Tiled problems ignore `trials` and `rng`.
///
/// # Example
///
/// ```
/// use i8mm::{verify::{verify, SizeClass}, generator::InputMode, RandomSource};
///
/// let p = InputMode::IdentityTimesB.build(4, 4, 4, None);
/// let output: Vec<i32> = p.b().iter().map(|&v| i32::from(v)).collect();
/// let outcome = verify(&p, &output, 20, &mut RandomSource::new(1));
/// assert!(outcome.passed());
/// assert_eq!(outcome.size_class(), SizeClass::Small);
/// ```
pub fn verify(problem: &Problem, output: &[i32], trials: usize, rng: &mut RandomSource) -> Outcome {
    let outcome = match problem.tile_size() {
        Some(_) => Outcome::Tiled(verify_tiled(problem, output)),
        None => Outcome::Regular(verify_regular(problem, output, trials, rng)),
    };

    #[cfg(feature = "tracing")]
    {
        if outcome.passed() {
            tracing::debug!(size = %outcome.size_class(), "output verified");
        } else {
            tracing::warn!(size = %outcome.size_class(), "output rejected");
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::InputMode;
    use crate::problem::CellStatus;

    fn product(p: &Problem) -> Vec<i32> {
        let mut c = vec![0i32; p.output_len()];
        for i in 0..p.m() {
            for kk in 0..p.k() {
                let a = i32::from(p.a()[i * p.k() + kk]);
                for j in 0..p.n() {
                    c[i * p.n() + j] += a * i32::from(p.b()[kk * p.n() + j]);
                }
            }
        }
        c
    }

    #[test]
    fn test_exact_affordable_boundaries() {
        let at = |m, n, k| exact_affordable(&InputMode::Ternary.build(m, n, k, None));
        assert!(at(32, 32, 1));
        assert!(!at(33, 32, 1));
        assert!(at(16, 16, 255));
        assert!(!at(16, 16, 256));
    }

    #[test]
    fn test_small_correct_output() {
        let p = InputMode::Uniform.build(5, 6, 7, None);
        let outcome = verify(&p, &product(&p), DEFAULT_TRIALS, &mut RandomSource::new(3));
        assert!(outcome.passed());
        assert_eq!(outcome.size_class(), SizeClass::Small);
        assert!(outcome.errors().is_some_and(ErrorMap::is_clean));
    }

    #[test]
    fn test_large_problem_skips_exact() {
        let p = InputMode::Ternary.build(64, 64, 64, None);
        let mut c = product(&p);
        let outcome = verify(&p, &c, DEFAULT_TRIALS, &mut RandomSource::new(3));
        assert!(outcome.passed());
        assert_eq!(outcome.size_class(), SizeClass::Large);
        assert!(outcome.errors().is_none());

        c[64 * 64 - 1] += 1;
        let outcome = verify(&p, &c, DEFAULT_TRIALS, &mut RandomSource::new(3));
        assert!(!outcome.passed());
    }

    #[test]
    fn test_small_mismatch_is_located() {
        let p = InputMode::IdentityTimesB.build(4, 4, 4, None);
        let mut c = product(&p);
        c[0] += 1;
        let outcome = verify(&p, &c, DEFAULT_TRIALS, &mut RandomSource::new(11));
        assert!(!outcome.passed());
        let map = outcome.errors().unwrap();
        assert_eq!(map.get(0, 0), Some(CellStatus::Mismatch));
        assert_eq!(map.count(CellStatus::Mismatch), 1);
    }

    #[test]
    fn test_tiled_dispatch() {
        let p = InputMode::Tiled.build(8, 8, 8, Some(4));
        let outcome = verify(&p, &product(&p), DEFAULT_TRIALS, &mut RandomSource::new(0));
        assert!(outcome.passed());
        assert_eq!(outcome.size_class(), SizeClass::Tiled);
        assert_eq!(outcome.errors().map(|m| (m.rows(), m.cols())), Some((2, 2)));
    }

    #[test]
    fn test_few_trials_do_not_assert_on_miss() {
        // With one trial a miss is legitimate (p <= 1/255) and must not panic
        let p = InputMode::Uniform.build(3, 3, 3, None);
        let mut c = product(&p);
        c[4] += 1;
        for seed in 0..64 {
            let v = verify_regular(&p, &c, 1, &mut RandomSource::new(seed));
            assert!(!v.passed());
        }
    }

    #[test]
    fn test_size_class_tokens() {
        assert_eq!(SizeClass::Small.to_string(), "small");
        assert_eq!(SizeClass::Large.to_string(), "large");
        assert_eq!(SizeClass::Tiled.to_string(), "tiled");
    }
}
