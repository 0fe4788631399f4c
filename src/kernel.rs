//! Kernel-under-test interface and reference kernels
//!
//! A kernel computes `C = A × B` for row-major int8 `A` (m×k) and `B` (k×n)
//! into a pre-allocated int32 `C` (m×n). It must write every element of `C`
//! and must not assume `C` starts zeroed.
//!
//! Any `Fn(usize, usize, usize, &[i8], &[i8], &mut [i32])` is a kernel, so a
//! test can wrap or corrupt a reference kernel with a closure.

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Integer matrix multiplication kernel
pub trait Kernel {
    /// Short name used in logs
    fn name(&self) -> &str {
        "custom"
    }

    /// Computes `c = a × b`
    ///
    /// `a.len() == m * k`, `b.len() == k * n`, `c.len() == m * n`.
    fn gemm(&self, m: usize, n: usize, k: usize, a: &[i8], b: &[i8], c: &mut [i32]);
}

impl<F> Kernel for F
where
    F: Fn(usize, usize, usize, &[i8], &[i8], &mut [i32]),
{
    fn gemm(&self, m: usize, n: usize, k: usize, a: &[i8], b: &[i8], c: &mut [i32]) {
        self(m, n, k, a, b, c)
    }
}

/// Scalar triple loop in i-k-j order
#[derive(Debug, Clone, Copy, Default)]
pub struct NaiveKernel;

impl Kernel for NaiveKernel {
    fn name(&self) -> &str {
        "naive"
    }

    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self, a, b, c)))]
    fn gemm(&self, m: usize, n: usize, k: usize, a: &[i8], b: &[i8], c: &mut [i32]) {
        debug_assert_eq!(a.len(), m * k);
        debug_assert_eq!(b.len(), k * n);
        debug_assert_eq!(c.len(), m * n);

        if n == 0 {
            return;
        }
        for (i, c_row) in c.chunks_exact_mut(n).enumerate() {
            c_row.fill(0);
            for (kk, &av) in a[i * k..(i + 1) * k].iter().enumerate() {
                let av = i32::from(av);
                for (cv, &bv) in c_row.iter_mut().zip(&b[kk * n..(kk + 1) * n]) {
                    *cv += av * i32::from(bv);
                }
            }
        }
    }
}

/// Cache-blocked kernel, row-parallel with the `parallel` feature
///
/// Rows of `C` are split into bands of `block_rows`; within a band the
/// reduction dimension is walked in panels of `block_k` so the touched slice
/// of `B` stays in cache.
#[derive(Debug, Clone, Copy)]
pub struct BlockedKernel {
    /// Rows of `C` per band
    pub block_rows: usize,
    /// Reduction panel depth
    pub block_k: usize,
}

impl Default for BlockedKernel {
    fn default() -> Self {
        Self {
            block_rows: 16,
            block_k: 256,
        }
    }
}

impl BlockedKernel {
    fn band(&self, k: usize, n: usize, a_band: &[i8], b: &[i8], c_band: &mut [i32]) {
        c_band.fill(0);
        let block_k = self.block_k.max(1);
        for k0 in (0..k).step_by(block_k) {
            let k1 = (k0 + block_k).min(k);
            for (a_row, c_row) in a_band.chunks_exact(k).zip(c_band.chunks_exact_mut(n)) {
                for kk in k0..k1 {
                    let av = i32::from(a_row[kk]);
                    if av == 0 {
                        continue;
                    }
                    for (cv, &bv) in c_row.iter_mut().zip(&b[kk * n..(kk + 1) * n]) {
                        *cv += av * i32::from(bv);
                    }
                }
            }
        }
    }
}

impl Kernel for BlockedKernel {
    fn name(&self) -> &str {
        "blocked"
    }

    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self, a, b, c)))]
    fn gemm(&self, m: usize, n: usize, k: usize, a: &[i8], b: &[i8], c: &mut [i32]) {
        debug_assert_eq!(a.len(), m * k);
        debug_assert_eq!(b.len(), k * n);
        debug_assert_eq!(c.len(), m * n);

        if n == 0 {
            return;
        }
        if k == 0 {
            c.fill(0);
            return;
        }

        let rows = self.block_rows.max(1);

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            c.par_chunks_mut(rows * n)
                .zip(a.par_chunks(rows * k))
                .for_each(|(c_band, a_band)| self.band(k, n, a_band, b, c_band));
        }

        #[cfg(not(feature = "parallel"))]
        {
            c.chunks_mut(rows * n)
                .zip(a.chunks(rows * k))
                .for_each(|(c_band, a_band)| self.band(k, n, a_band, b, c_band));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::InputMode;
    use crate::verify::verify_exact;

    fn run(kernel: &dyn Kernel, m: usize, n: usize, k: usize) -> (crate::Problem, Vec<i32>) {
        let p = InputMode::Uniform.build(m, n, k, None);
        let mut c = vec![-7; m * n];
        kernel.gemm(m, n, k, p.a(), p.b(), &mut c);
        (p, c)
    }

    #[test]
    fn test_naive_small() {
        let mut c = [99; 4];
        NaiveKernel.gemm(2, 2, 2, &[1, 2, 3, 4], &[5, 6, 7, 8], &mut c);
        assert_eq!(c, [19, 22, 43, 50]);
    }

    #[test]
    fn test_naive_overwrites_garbage() {
        let (p, c) = run(&NaiveKernel, 9, 7, 5);
        assert!(verify_exact(&p, &c).is_clean());
    }

    #[test]
    fn test_blocked_matches_naive() {
        for (m, n, k) in [(1, 1, 1), (17, 5, 300), (33, 31, 29), (8, 64, 513)] {
            let (p, c) = run(&BlockedKernel::default(), m, n, k);
            let mut expected = vec![0; m * n];
            NaiveKernel.gemm(m, n, k, p.a(), p.b(), &mut expected);
            assert_eq!(c, expected, "{m}x{n}x{k}");
        }
    }

    #[test]
    fn test_blocked_odd_blocking() {
        let kernel = BlockedKernel {
            block_rows: 3,
            block_k: 7,
        };
        let (p, c) = run(&kernel, 10, 11, 23);
        assert!(verify_exact(&p, &c).is_clean());
    }

    #[test]
    fn test_blocked_zero_reduction() {
        let mut c = [5; 6];
        BlockedKernel::default().gemm(2, 3, 0, &[], &[], &mut c);
        assert_eq!(c, [0; 6]);
    }

    #[test]
    fn test_closure_is_kernel() {
        let doubled = |m: usize, n: usize, k: usize, a: &[i8], b: &[i8], c: &mut [i32]| {
            NaiveKernel.gemm(m, n, k, a, b, c);
            c.iter_mut().for_each(|v| *v *= 2);
        };
        let mut c = [0; 1];
        doubled.gemm(1, 1, 1, &[3], &[4], &mut c);
        assert_eq!(c, [24]);
        assert_eq!(doubled.name(), "custom");
        assert_eq!(NaiveKernel.name(), "naive");
    }
}
