//! Brute-force reference check
//!
//! Recomputes every output cell as an int64 dot product and compares it with
//! the candidate. Cost is O(m·n·k), so callers gate it behind
//! [`exact_affordable`](super::exact_affordable).

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::problem::{CellStatus, ErrorMap, Problem};

/// Compares `output` against the exact product `A × B`
///
/// Returns a map with [`CellStatus::Mismatch`] at every differing cell; the
/// output is correct iff the map [`is_clean`](ErrorMap::is_clean). Rows are
/// checked independently and, with the `parallel` feature, concurrently.
///
/// # Panics
///
/// Panics if `output.len() != m * n`.
///
/// # Example
///
/// ```
/// use i8mm::{verify::verify_exact, Problem};
///
/// let p = Problem::new(1, 1, 2, vec![2, 3], vec![4, 5]).unwrap();
/// assert!(verify_exact(&p, &[23]).is_clean());
/// assert!(!verify_exact(&p, &[22]).is_clean());
/// ```
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "debug",
        skip_all,
        fields(m = problem.m(), n = problem.n(), k = problem.k())
    )
)]
pub fn verify_exact(problem: &Problem, output: &[i32]) -> ErrorMap {
    let (m, n, k) = (problem.m(), problem.n(), problem.k());
    assert_eq!(output.len(), m * n, "output length does not match {m}x{n}");

    let mut cells = vec![CellStatus::Match; m * n];
    if m == 0 || n == 0 {
        return ErrorMap::from_cells(m, n, cells);
    }

    let (a, b) = (problem.a(), problem.b());
    let check_row = |i: usize, row: &mut [CellStatus]| {
        let a_row = &a[i * k..(i + 1) * k];
        let c_row = &output[i * n..(i + 1) * n];
        for (j, status) in row.iter_mut().enumerate() {
            let sum: i64 = a_row
                .iter()
                .enumerate()
                .map(|(kk, &x)| i64::from(x) * i64::from(b[kk * n + j]))
                .sum();
            if i64::from(c_row[j]) != sum {
                *status = CellStatus::Mismatch;
            }
        }
    };

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        cells
            .par_chunks_mut(n)
            .enumerate()
            .for_each(|(i, row)| check_row(i, row));
    }

    #[cfg(not(feature = "parallel"))]
    {
        cells
            .chunks_mut(n)
            .enumerate()
            .for_each(|(i, row)| check_row(i, row));
    }

    ErrorMap::from_cells(m, n, cells)
}
