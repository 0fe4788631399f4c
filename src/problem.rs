//! Problem instances and per-cell verification maps
//!
//! A [`Problem`] is the immutable input pair `A` (m×k) and `B` (k×n), both
//! int8 and row-major, plus an optional tile size for block-structured tests.
//! An [`ErrorMap`] records the verdict for each output cell.
//!
//! # Storage Layout
//!
//! Element `(row, col)` of `A` lives at `a[row * k + col]`, of `B` at
//! `b[row * n + col]`, and of the output `C` at `c[row * n + col]`.

use std::fmt;

use crate::{I8mmError, Result};

/// A matrix multiplication instance `C = A × B`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    m: usize,
    n: usize,
    k: usize,
    a: Vec<i8>,
    b: Vec<i8>,
    tile_size: Option<usize>,
}

impl Problem {
    /// Creates a regular (untiled) problem
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if `a.len() != m * k` or `b.len() != k * n`.
    ///
    /// # Example
    ///
    /// ```
    /// use i8mm::Problem;
    ///
    /// let p = Problem::new(2, 3, 1, vec![1, 2], vec![3, 4, 5]).unwrap();
    /// assert_eq!(p.output_len(), 6);
    /// assert_eq!(p.tile_size(), None);
    /// ```
    pub fn new(m: usize, n: usize, k: usize, a: Vec<i8>, b: Vec<i8>) -> Result<Self> {
        if a.len() != m * k {
            return Err(I8mmError::ShapeMismatch {
                expected: m * k,
                actual: a.len(),
            });
        }
        if b.len() != k * n {
            return Err(I8mmError::ShapeMismatch {
                expected: k * n,
                actual: b.len(),
            });
        }
        Ok(Self {
            m,
            n,
            k,
            a,
            b,
            tile_size: None,
        })
    }

    /// Marks this problem as block-structured with `ts × ts` tiles
    ///
    /// # Panics
    ///
    /// Panics if `ts` is zero or does not divide `m`, `n` and `k`.
    pub fn with_tile_size(mut self, ts: usize) -> Self {
        assert!(ts > 0, "tile size must be positive");
        assert!(
            self.m % ts == 0 && self.n % ts == 0 && self.k % ts == 0,
            "{}x{}x{} is not divisible by tile size {ts}",
            self.m,
            self.n,
            self.k
        );
        self.tile_size = Some(ts);
        self
    }

    /// Rows of `A` and `C`
    pub fn m(&self) -> usize {
        self.m
    }

    /// Columns of `B` and `C`
    pub fn n(&self) -> usize {
        self.n
    }

    /// Reduction dimension
    pub fn k(&self) -> usize {
        self.k
    }

    /// `A` in row-major order
    pub fn a(&self) -> &[i8] {
        &self.a
    }

    /// `B` in row-major order
    pub fn b(&self) -> &[i8] {
        &self.b
    }

    /// Tile size, or `None` for a regular problem
    pub fn tile_size(&self) -> Option<usize> {
        self.tile_size
    }

    /// Number of elements in `C`
    pub fn output_len(&self) -> usize {
        self.m * self.n
    }

    /// Collapses a tiled problem to one element per tile
    ///
    /// The reduced problem has shape `m/ts × n/ts × k/ts` and takes the
    /// top-left corner of every tile of `A` and `B`. The result carries no
    /// tile size of its own.
    ///
    /// # Panics
    ///
    /// Panics if the problem has no tile size.
    pub fn tiled(&self) -> Problem {
        let ts = self
            .tile_size
            .expect("tiled() requires a problem with a tile size");
        let (sm, sn, sk) = (self.m / ts, self.n / ts, self.k / ts);

        let mut a = vec![0i8; sm * sk];
        for i in (0..self.m).step_by(ts) {
            for kk in (0..self.k).step_by(ts) {
                a[(i / ts) * sk + kk / ts] = self.a[i * self.k + kk];
            }
        }

        let mut b = vec![0i8; sk * sn];
        for kk in (0..self.k).step_by(ts) {
            for j in (0..self.n).step_by(ts) {
                b[(kk / ts) * sn + j / ts] = self.b[kk * self.n + j];
            }
        }

        Problem {
            m: sm,
            n: sn,
            k: sk,
            a,
            b,
            tile_size: None,
        }
    }

    /// Checks that an output buffer fits this problem
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if `output.len() != m * n`.
    pub fn check_output(&self, output: &[i32]) -> Result<()> {
        if output.len() != self.output_len() {
            return Err(I8mmError::ShapeMismatch {
                expected: self.output_len(),
                actual: output.len(),
            });
        }
        Ok(())
    }
}

/// Verdict for a single output cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CellStatus {
    /// Output equals the reference
    #[default]
    Match = 0,
    /// Output differs from the reference
    Mismatch = 1,
    /// Tile is not constant after quotienting by the tile size
    Inhomogeneous = 2,
}

impl CellStatus {
    /// Numeric code used in reports
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for CellStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Row-major map of per-cell verdicts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMap {
    rows: usize,
    cols: usize,
    cells: Vec<CellStatus>,
}

impl ErrorMap {
    /// A map with every cell marked as matching
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![CellStatus::Match; rows * cols],
        }
    }

    pub(crate) fn from_cells(rows: usize, cols: usize, cells: Vec<CellStatus>) -> Self {
        debug_assert_eq!(cells.len(), rows * cols);
        Self { rows, cols, cells }
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Status at `(row, col)`, or `None` if out of bounds
    pub fn get(&self, row: usize, col: usize) -> Option<CellStatus> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.cells[row * self.cols + col])
    }

    /// Overwrites the status at `(row, col)`
    pub fn set(&mut self, row: usize, col: usize, status: CellStatus) {
        assert!(row < self.rows && col < self.cols, "({row}, {col}) out of bounds");
        self.cells[row * self.cols + col] = status;
    }

    /// All cells in row-major order
    pub fn as_slice(&self) -> &[CellStatus] {
        &self.cells
    }

    /// Numeric codes in row-major order, for rendering
    pub fn codes(&self) -> Vec<u8> {
        self.cells.iter().map(|c| c.code()).collect()
    }

    /// Number of cells with the given status
    pub fn count(&self, status: CellStatus) -> usize {
        self.cells.iter().filter(|&&c| c == status).count()
    }

    /// True when every cell matches
    pub fn is_clean(&self) -> bool {
        self.cells.iter().all(|&c| c == CellStatus::Match)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problem_new_valid() {
        let p = Problem::new(2, 2, 3, vec![0; 6], vec![0; 6]).unwrap();
        assert_eq!((p.m(), p.n(), p.k()), (2, 2, 3));
        assert_eq!(p.output_len(), 4);
    }

    #[test]
    fn test_problem_new_bad_a() {
        let err = Problem::new(2, 2, 3, vec![0; 5], vec![0; 6]).unwrap_err();
        assert!(matches!(
            err,
            I8mmError::ShapeMismatch {
                expected: 6,
                actual: 5
            }
        ));
    }

    #[test]
    fn test_problem_new_bad_b() {
        let err = Problem::new(2, 4, 3, vec![0; 6], vec![0; 6]).unwrap_err();
        assert!(matches!(
            err,
            I8mmError::ShapeMismatch {
                expected: 12,
                actual: 6
            }
        ));
    }

    #[test]
    fn test_check_output() {
        let p = Problem::new(2, 3, 1, vec![0; 2], vec![0; 3]).unwrap();
        assert!(p.check_output(&[0; 6]).is_ok());
        assert!(p.check_output(&[0; 5]).is_err());
    }

    #[test]
    fn test_tiled_samples_tile_corners() {
        // 4x4 A and B, tile size 2: corners at (0,0), (0,2), (2,0), (2,2)
        let a: Vec<i8> = (0..16).map(|i| i as i8).collect();
        let b: Vec<i8> = (0..16).map(|i| -(i as i8)).collect();
        let p = Problem::new(4, 4, 4, a, b).unwrap().with_tile_size(2);
        let small = p.tiled();

        assert_eq!((small.m(), small.n(), small.k()), (2, 2, 2));
        assert_eq!(small.a(), &[0, 2, 8, 10]);
        assert_eq!(small.b(), &[0, -2, -8, -10]);
        assert_eq!(small.tile_size(), None);
    }

    #[test]
    fn test_tiled_rectangular() {
        // m=2, k=4, n=6 with ts=2 -> 1x2 A, 2x3 B
        let a: Vec<i8> = (0..8).map(|i| i as i8).collect();
        let b: Vec<i8> = (0..24).map(|i| i as i8).collect();
        let p = Problem::new(2, 6, 4, a, b).unwrap().with_tile_size(2);
        let small = p.tiled();
        assert_eq!((small.m(), small.n(), small.k()), (1, 3, 2));
        assert_eq!(small.a(), &[0, 2]);
        assert_eq!(small.b(), &[0, 2, 4, 12, 14, 16]);
    }

    #[test]
    #[should_panic(expected = "not divisible")]
    fn test_with_tile_size_not_divisible() {
        let _ = Problem::new(3, 4, 4, vec![0; 12], vec![0; 16])
            .unwrap()
            .with_tile_size(2);
    }

    #[test]
    #[should_panic(expected = "requires a problem with a tile size")]
    fn test_tiled_without_tile_size() {
        let _ = Problem::new(1, 1, 1, vec![0], vec![0]).unwrap().tiled();
    }

    #[test]
    fn test_error_map_defaults_to_match() {
        let map = ErrorMap::new(3, 2);
        assert!(map.is_clean());
        assert_eq!(map.count(CellStatus::Match), 6);
        assert_eq!(map.get(3, 0), None);
    }

    #[test]
    fn test_error_map_set_and_codes() {
        let mut map = ErrorMap::new(2, 2);
        map.set(0, 1, CellStatus::Mismatch);
        map.set(1, 0, CellStatus::Inhomogeneous);
        assert!(!map.is_clean());
        assert_eq!(map.codes(), vec![0, 1, 2, 0]);
        assert_eq!(map.get(0, 1), Some(CellStatus::Mismatch));
        assert_eq!(map.count(CellStatus::Inhomogeneous), 1);
    }

    #[test]
    fn test_cell_status_display() {
        assert_eq!(CellStatus::Match.to_string(), "0");
        assert_eq!(CellStatus::Mismatch.to_string(), "1");
        assert_eq!(CellStatus::Inhomogeneous.to_string(), "2");
    }
}
