//! Freivalds' randomized product check
//!
//! Instead of recomputing `A × B`, multiply both sides by random vectors and
//! compare: if `C = A·B` then `A·(B·x) = C·x` for every `x`. All trials run
//! at once as the columns of an `n × r` matrix `X`, so the cost is
//! `O((m·k + k·n + m·n) · r)` instead of `O(m·n·k)`.
//!
//! # Error Bound
//!
//! The check is one-sided. A correct output always passes. For an incorrect
//! output, some row `d` of `A·B − C` is non-zero, and `d·x = 0` holds for at
//! most one value of any coordinate of `x` with `d` non-zero there, so a single
//! trial with entries uniform over 255 values misses it with probability
//! at most `1/255`. Trials are independent, giving [`false_pass_bound`].

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{Problem, RandomSource};

/// Trial count used by the regular test
pub const DEFAULT_TRIALS: usize = 20;

/// Closed range of test-vector entries
pub const VECTOR_RANGE: (i32, i32) = (-127, 127);

/// Upper bound on the probability that `trials` trials all miss a wrong output
///
/// # Example
///
/// ```
/// use i8mm::verify::freivalds::false_pass_bound;
///
/// assert!(false_pass_bound(1) <= 1.0 / 255.0);
/// assert!(false_pass_bound(20) < 1e-48);
/// ```
pub fn false_pass_bound(trials: usize) -> f64 {
    let alphabet = f64::from(VECTOR_RANGE.1 - VECTOR_RANGE.0 + 1);
    let exponent = i32::try_from(trials).unwrap_or(i32::MAX);
    alphabet.recip().powi(exponent)
}

/// Runs `trials` simultaneous Freivalds trials
///
/// Returns `true` when no trial found evidence of a mismatch. Test vectors are
/// drawn from `rng`, so a fixed seed makes the check reproducible.
///
/// # Panics
///
/// Panics if `trials == 0` or `output.len() != m * n`.
///
/// # Example
///
/// ```
/// use i8mm::{verify::verify_freivalds, Problem, RandomSource};
///
/// let p = Problem::new(2, 2, 2, vec![1, 2, 3, 4], vec![5, 6, 7, 8]).unwrap();
/// let mut rng = RandomSource::new(0);
/// assert!(verify_freivalds(&p, &[19, 22, 43, 50], 20, &mut rng));
/// assert!(!verify_freivalds(&p, &[19, 22, 43, 51], 20, &mut rng));
/// ```
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "debug",
        skip(problem, output, rng),
        fields(m = problem.m(), n = problem.n(), k = problem.k(), seed = rng.seed())
    )
)]
pub fn verify_freivalds(
    problem: &Problem,
    output: &[i32],
    trials: usize,
    rng: &mut RandomSource,
) -> bool {
    assert!(trials > 0, "Freivalds check needs at least one trial");
    let (m, n, k) = (problem.m(), problem.n(), problem.k());
    assert_eq!(output.len(), m * n, "output length does not match {m}x{n}");

    let (lo, hi) = VECTOR_RANGE;
    let x: Vec<i64> = (0..n * trials)
        .map(|_| i64::from(rng.get_i32(lo, hi)))
        .collect();

    let bx = multiply(problem.b(), k, n, &x, trials);
    let abx = multiply(problem.a(), m, k, &bx, trials);
    let cx = multiply(output, m, n, &x, trials);

    abx == cx
}

/// `lhs (rows × inner) · rhs (inner × r)` with int64 accumulation
///
/// Each output row is owned by exactly one worker.
fn multiply<T>(lhs: &[T], rows: usize, inner: usize, rhs: &[i64], r: usize) -> Vec<i64>
where
    T: Copy + Into<i64> + Sync,
{
    debug_assert_eq!(lhs.len(), rows * inner);
    debug_assert_eq!(rhs.len(), inner * r);

    let mut out = vec![0i64; rows * r];
    let row_product = |i: usize, acc: &mut [i64]| {
        for (p, &left) in lhs[i * inner..(i + 1) * inner].iter().enumerate() {
            let left: i64 = left.into();
            if left == 0 {
                continue;
            }
            for (a, &v) in acc.iter_mut().zip(&rhs[p * r..(p + 1) * r]) {
                *a += left * v;
            }
        }
    };

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        out.par_chunks_mut(r)
            .enumerate()
            .for_each(|(i, acc)| row_product(i, acc));
    }

    #[cfg(not(feature = "parallel"))]
    {
        out.chunks_mut(r)
            .enumerate()
            .for_each(|(i, acc)| row_product(i, acc));
    }

    out
}
