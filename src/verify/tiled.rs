//! Tile-consistency check for block-structured problems
//!
//! When both operands are built from constant `ts × ts` blocks with values
//! `a'`, `b'`, every output block is constant too, with value
//! `ts · (a' × b')`. That lets a large tiled test be verified with one small
//! exact check on the quotient matrix, plus a linear scan that every output
//! block really is constant.

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::exact::verify_exact;
use crate::problem::{CellStatus, ErrorMap, Problem};

/// Result of a tile-consistency check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TiledVerdict {
    /// Tile size of the original problem
    pub tile_size: usize,
    /// One-element-per-tile problem built from tile corners
    pub reduced: Problem,
    /// Output corners divided by the tile size
    pub reduced_output: Vec<i32>,
    /// Per-tile verdict; `Inhomogeneous` takes precedence over `Mismatch`
    pub errors: ErrorMap,
}

impl TiledVerdict {
    /// True when every tile is constant and its quotient is exact
    pub fn passed(&self) -> bool {
        self.errors.is_clean()
    }
}

/// Verifies a tiled problem's output at tile granularity
///
/// A tile is marked [`CellStatus::Inhomogeneous`] when any of its cells
/// differs from the tile's top-left corner. A constant tile is marked
/// [`CellStatus::Mismatch`] when its corner quotient disagrees with the
/// reduced reference, or when the corner is not a multiple of `ts` (the
/// division would otherwise silently round a wrong value onto a right one).
///
/// # Panics
///
/// Panics if the problem has no tile size, if the tile size does not divide
/// `m`, `n` and `k`, or if `output.len() != m * n`.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "debug",
        skip_all,
        fields(m = problem.m(), n = problem.n(), k = problem.k(), tile_size = ?problem.tile_size())
    )
)]
pub fn verify_tiled(problem: &Problem, output: &[i32]) -> TiledVerdict {
    let ts = problem
        .tile_size()
        .expect("tile-consistency check requires a tiled problem");
    let (m, n, k) = (problem.m(), problem.n(), problem.k());
    assert!(
        m % ts == 0 && n % ts == 0 && k % ts == 0,
        "{m}x{n}x{k} is not divisible by tile size {ts}"
    );
    assert_eq!(output.len(), m * n, "output length does not match {m}x{n}");

    let reduced = problem.tiled();
    let (sm, sn) = (reduced.m(), reduced.n());
    let divisor = i32::try_from(ts).unwrap_or(i32::MAX);

    let mut reduced_output = vec![0i32; sm * sn];
    let mut homogeneous = vec![true; sm * sn];
    let mut divisible = vec![true; sm * sn];

    let scan_tile_row = |ti: usize, quot: &mut [i32], homo: &mut [bool], div: &mut [bool]| {
        let i = ti * ts;
        for tj in 0..sn {
            let j = tj * ts;
            let corner = output[i * n + j];
            quot[tj] = corner / divisor;
            div[tj] = corner % divisor == 0;
            homo[tj] = (0..ts).all(|ii| {
                let row = &output[(i + ii) * n + j..(i + ii) * n + j + ts];
                row.iter().all(|&v| v == corner)
            });
        }
    };

    if sn > 0 {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            reduced_output
                .par_chunks_mut(sn)
                .zip(homogeneous.par_chunks_mut(sn))
                .zip(divisible.par_chunks_mut(sn))
                .enumerate()
                .for_each(|(ti, ((quot, homo), div))| scan_tile_row(ti, quot, homo, div));
        }

        #[cfg(not(feature = "parallel"))]
        {
            reduced_output
                .chunks_mut(sn)
                .zip(homogeneous.chunks_mut(sn))
                .zip(divisible.chunks_mut(sn))
                .enumerate()
                .for_each(|(ti, ((quot, homo), div))| scan_tile_row(ti, quot, homo, div));
        }
    }

    let mut errors = verify_exact(&reduced, &reduced_output);
    for ti in 0..sm {
        for tj in 0..sn {
            let idx = ti * sn + tj;
            if !homogeneous[idx] {
                errors.set(ti, tj, CellStatus::Inhomogeneous);
            } else if !divisible[idx] {
                errors.set(ti, tj, CellStatus::Mismatch);
            }
        }
    }

    TiledVerdict {
        tile_size: ts,
        reduced,
        reduced_output,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::InputMode;

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
    fn test_correct_tiled_output_passes() {
        let p = InputMode::Tiled.build(8, 12, 16, Some(4));
        let verdict = verify_tiled(&p, &product(&p));
        assert!(verdict.passed());
        assert_eq!(verdict.tile_size, 4);
        assert_eq!((verdict.errors.rows(), verdict.errors.cols()), (2, 3));
        assert_eq!(verdict.reduced_output.len(), 6);
    }

    #[test]
    fn test_reduced_output_is_quotient_of_corners() {
        let p = InputMode::Tiled.build(4, 4, 4, Some(2));
        let c = product(&p);
        let verdict = verify_tiled(&p, &c);
        assert_eq!(verdict.reduced_output[0], c[0] / 2);
        assert_eq!(verdict.reduced_output[1], c[2] / 2);
        assert_eq!(verdict.reduced_output[2], c[8] / 2);
        assert_eq!(verdict.reduced_output[3], c[10] / 2);
    }

    #[test]
    fn test_interior_cell_flags_inhomogeneity() {
        // Corner stays correct; only an interior cell changes
        let p = InputMode::Tiled.build(8, 8, 8, Some(4));
        let mut c = product(&p);
        c[5 * 8 + 6] += 4 * 3;
        let verdict = verify_tiled(&p, &c);
        assert!(!verdict.passed());
        assert_eq!(verdict.errors.get(1, 1), Some(CellStatus::Inhomogeneous));
        assert_eq!(verdict.errors.count(CellStatus::Inhomogeneous), 1);
        assert_eq!(verdict.errors.count(CellStatus::Mismatch), 0);
    }

    #[test]
    fn test_wrong_constant_tile_is_mismatch() {
        let p = InputMode::Tiled.build(8, 8, 8, Some(4));
        let mut c = product(&p);
        for i in 0..4 {
            for j in 4..8 {
                c[i * 8 + j] += 4;
            }
        }
        let verdict = verify_tiled(&p, &c);
        assert_eq!(verdict.errors.codes(), vec![0, 1, 0, 0]);
    }

    #[test]
    fn test_inhomogeneity_takes_precedence() {
        let p = InputMode::Tiled.build(8, 8, 8, Some(4));
        let mut c = product(&p);
        // Entire first row of tile (0, 0) wrong, including the corner
        for j in 0..4 {
            c[j] += 40;
        }
        let verdict = verify_tiled(&p, &c);
        assert_eq!(verdict.errors.get(0, 0), Some(CellStatus::Inhomogeneous));
    }

    #[test]
    fn test_rounding_cannot_hide_off_by_one() {
        let p = InputMode::Tiled.build(4, 4, 4, Some(4));
        let c: Vec<i32> = product(&p).iter().map(|v| v + 1).collect();
        let verdict = verify_tiled(&p, &c);
        assert!(!verdict.passed());
    }

    #[test]
    fn test_interior_off_by_one_detected() {
        let p = InputMode::Tiled.build(8, 8, 8, Some(4));
        let mut c = product(&p);
        c[2 * 8 + 3] += 1;
        let verdict = verify_tiled(&p, &c);
        assert_eq!(verdict.errors.get(0, 0), Some(CellStatus::Inhomogeneous));
        assert_eq!(verdict.errors.count(CellStatus::Match), 3);
    }

    #[test]
    fn test_row_off_by_less_than_tile_size_is_inhomogeneous() {
        // Row 0 of tile (0, 1) differs from the rest by 1, within one quotient step
        let p = InputMode::Tiled.build(8, 8, 8, Some(4));
        let mut c = product(&p);
        for v in &mut c[4..8] {
            *v += 1;
        }
        let verdict = verify_tiled(&p, &c);
        assert_eq!(verdict.errors.codes(), vec![0, 2, 0, 0]);
    }

    #[test]
    fn test_constant_non_multiple_tile_is_mismatch() {
        let p = InputMode::Tiled.build(8, 8, 8, Some(4));
        let mut c = product(&p);
        for i in 4..8 {
            for j in 0..4 {
                c[i * 8 + j] += 1;
            }
        }
        let verdict = verify_tiled(&p, &c);
        assert_eq!(verdict.errors.codes(), vec![0, 0, 1, 0]);
    }

    #[test]
    #[should_panic(expected = "requires a tiled problem")]
    fn test_untiled_problem_panics() {
        let p = InputMode::Uniform.build(4, 4, 4, None);
        verify_tiled(&p, &[0; 16]);
    }
}
