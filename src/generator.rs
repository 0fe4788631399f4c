//! Test matrix generation
//!
//! Builds int8 operands for the five fixture modes. Every mode is
//! deterministic given its seed; the fixture modes use [`SEED_A`] for `A` and
//! [`SEED_B`] for `B` so the same fixture produces the same problem for every
//! kernel under test.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{I8mmError, Problem, RandomSource, Result};

/// Seed for the left operand in seeded modes
pub const SEED_A: u64 = 42;

/// Seed for the right operand in seeded modes
pub const SEED_B: u64 = 21;

/// Value range of uniform cells
pub const UNIFORM_RANGE: (i8, i8) = (-127, 127);

/// Value range of the small matrix behind a tiled operand
pub const TILED_RANGE: (i8, i8) = (-9, 9);

/// How to fill a single operand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenMode {
    /// 1 on the diagonal, 0 elsewhere (square only)
    Identity,
    /// Independent cells in `[-127, 127]`
    Uniform { seed: u64 },
    /// Independent cells in `{-1, 0, 1}`
    Ternary { seed: u64 },
    /// Cells in `[-9, 9]`, each replicated into a `tile_size × tile_size` block
    Tiled { seed: u64, tile_size: usize },
}

/// Generates a `rows × cols` int8 matrix in row-major order
///
/// # Panics
///
/// Panics if `Identity` is requested for a non-square shape, or if `Tiled`
/// is requested with a tile size that does not divide both dimensions.
///
/// # Example
///
/// ```
/// use i8mm::generator::{generate, GenMode};
///
/// let id = generate(2, 2, GenMode::Identity);
/// assert_eq!(id, vec![1, 0, 0, 1]);
/// ```
#[cfg_attr(feature = "tracing", instrument(level = "debug"))]
pub fn generate(rows: usize, cols: usize, mode: GenMode) -> Vec<i8> {
    match mode {
        GenMode::Identity => {
            assert_eq!(rows, cols, "identity matrix must be square");
            generate_identity(rows)
        }
        GenMode::Uniform { seed } => {
            let (lo, hi) = UNIFORM_RANGE;
            fill(rows * cols, &mut RandomSource::new(seed), lo, hi)
        }
        GenMode::Ternary { seed } => fill(rows * cols, &mut RandomSource::new(seed), -1, 1),
        GenMode::Tiled { seed, tile_size } => generate_tiled(rows, cols, seed, tile_size),
    }
}

fn generate_identity(n: usize) -> Vec<i8> {
    let mut values = vec![0i8; n * n];
    for i in 0..n {
        values[i * n + i] = 1;
    }
    values
}

fn fill(len: usize, rng: &mut RandomSource, lo: i8, hi: i8) -> Vec<i8> {
    (0..len).map(|_| rng.get_i8(lo, hi)).collect()
}

fn generate_tiled(rows: usize, cols: usize, seed: u64, ts: usize) -> Vec<i8> {
    assert!(ts > 0, "tile size must be positive");
    assert!(
        rows % ts == 0 && cols % ts == 0,
        "{rows}x{cols} is not divisible by tile size {ts}"
    );
    let (lo, hi) = TILED_RANGE;
    let small_cols = cols / ts;
    let small = fill((rows / ts) * small_cols, &mut RandomSource::new(seed), lo, hi);

    let mut large = vec![0i8; rows * cols];
    for (i, row) in large.chunks_exact_mut(cols).enumerate() {
        let small_row = &small[(i / ts) * small_cols..(i / ts + 1) * small_cols];
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = small_row[j / ts];
        }
    }
    large
}

/// Fixture-level input mode, naming how both operands are built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// `A = I`, `B` uniform; the product equals `B`
    IdentityTimesB,
    /// `A` uniform, `B = I`; the product equals `A`
    ATimesIdentity,
    /// Both operands uniform
    Uniform,
    /// Both operands ternary
    Ternary,
    /// Both operands block-constant; requires a tile size
    Tiled,
}

impl InputMode {
    /// All modes, in fixture-token order
    pub const ALL: [InputMode; 5] = [
        InputMode::IdentityTimesB,
        InputMode::ATimesIdentity,
        InputMode::Uniform,
        InputMode::Ternary,
        InputMode::Tiled,
    ];

    /// Token used in fixture files
    pub fn token(self) -> &'static str {
        match self {
            InputMode::IdentityTimesB => "id_x_b",
            InputMode::ATimesIdentity => "a_x_id",
            InputMode::Uniform => "uniform",
            InputMode::Ternary => "ternary",
            InputMode::Tiled => "tiled",
        }
    }

    /// Whether the fixture carries a tile size after `m n k`
    pub fn needs_tile_size(self) -> bool {
        matches!(self, InputMode::Tiled)
    }

    /// Builds the problem for this mode
    ///
    /// # Panics
    ///
    /// Shape preconditions are contract violations and panic: `m == k` for
    /// `id_x_b`, `n == k` for `a_x_id`, and a tile size dividing `m`, `n`
    /// and `k` for `tiled`.
    ///
    /// # Example
    ///
    /// ```
    /// use i8mm::generator::InputMode;
    ///
    /// let p = InputMode::IdentityTimesB.build(3, 5, 3, None);
    /// assert_eq!(&p.a()[..3], &[1, 0, 0]);
    /// ```
    pub fn build(self, m: usize, n: usize, k: usize, tile_size: Option<usize>) -> Problem {
        let (a, b) = match self {
            InputMode::IdentityTimesB => {
                assert_eq!(m, k, "id_x_b requires m == k");
                (
                    generate(m, m, GenMode::Identity),
                    generate(k, n, GenMode::Uniform { seed: SEED_A }),
                )
            }
            InputMode::ATimesIdentity => {
                assert_eq!(n, k, "a_x_id requires n == k");
                (
                    generate(m, k, GenMode::Uniform { seed: SEED_A }),
                    generate(n, n, GenMode::Identity),
                )
            }
            InputMode::Uniform => (
                generate(m, k, GenMode::Uniform { seed: SEED_A }),
                generate(k, n, GenMode::Uniform { seed: SEED_B }),
            ),
            InputMode::Ternary => (
                generate(m, k, GenMode::Ternary { seed: SEED_A }),
                generate(k, n, GenMode::Ternary { seed: SEED_B }),
            ),
            InputMode::Tiled => {
                let tile_size = tile_size.expect("tiled mode requires a tile size");
                (
                    generate(m, k, GenMode::Tiled { seed: SEED_A, tile_size }),
                    generate(k, n, GenMode::Tiled { seed: SEED_B, tile_size }),
                )
            }
        };

        // Shapes come from the generator, so lengths always line up.
        let problem = match Problem::new(m, n, k, a, b) {
            Ok(p) => p,
            Err(e) => unreachable!("generator produced a malformed problem: {e}"),
        };
        match (self, tile_size) {
            (InputMode::Tiled, Some(ts)) => problem.with_tile_size(ts),
            _ => problem,
        }
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for InputMode {
    type Err = I8mmError;

    fn from_str(s: &str) -> Result<Self> {
        InputMode::ALL
            .into_iter()
            .find(|mode| mode.token() == s)
            .ok_or_else(|| I8mmError::UnknownMode(s.to_string()))
    }
}
