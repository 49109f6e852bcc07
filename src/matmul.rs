//! Small strided GEMM over flat row-major buffers.
//!
//! Computes `C = alpha * A·B + beta * C` with `A: (m, k)`, `B: (k, n)`,
//! `C: (m, n)`. Every operand is addressed by a row stride and a column stride,
//! so a transposed operand is just the same buffer with its strides swapped:
//! for a row-major `(rows, cols)` matrix, `(cols, 1)` reads it as-is and
//! `(1, cols)` reads its transpose.
//!
//! - default: a simple, safe triple-loop implementation
//! - optional: a faster backend via the `matrixmultiply` feature

/// Strides of a matrix operand: `(row_stride, col_stride)`.
pub(crate) type Strides = (usize, usize);

/// Row-major `(rows, cols)` matrix read as-is.
#[inline]
pub(crate) fn row_major(cols: usize) -> Strides {
    (cols, 1)
}

/// Row-major `(rows, cols)` matrix read as its transpose `(cols, rows)`.
#[inline]
pub(crate) fn transposed(cols: usize) -> Strides {
    (1, cols)
}

#[allow(clippy::too_many_arguments)]
#[inline]
pub(crate) fn gemm_f64(
    m: usize,
    n: usize,
    k: usize,
    alpha: f64,
    a: &[f64],
    (rsa, csa): Strides,
    b: &[f64],
    (rsb, csb): Strides,
    beta: f64,
    c: &mut [f64],
    (rsc, csc): Strides,
) {
    debug_assert!(m > 0 && n > 0 && k > 0);
    debug_assert!(rsa > 0 || m <= 1);
    debug_assert!(csa > 0 || k <= 1);
    debug_assert!(rsb > 0 || k <= 1);
    debug_assert!(csb > 0 || n <= 1);
    debug_assert!(rsc > 0 || m <= 1);
    debug_assert!(csc > 0 || n <= 1);
    debug_assert!(a.len() > (m - 1) * rsa + (k - 1) * csa);
    debug_assert!(b.len() > (k - 1) * rsb + (n - 1) * csb);
    debug_assert!(c.len() > (m - 1) * rsc + (n - 1) * csc);

    #[cfg(feature = "matrixmultiply")]
    {
        // matrixmultiply supports arbitrary strides and treats beta == 0 as overwrite.
        unsafe {
            matrixmultiply::dgemm(
                m,
                k,
                n,
                alpha,
                a.as_ptr(),
                rsa as isize,
                csa as isize,
                b.as_ptr(),
                rsb as isize,
                csb as isize,
                beta,
                c.as_mut_ptr(),
                rsc as isize,
                csc as isize,
            );
        }
    }

    #[cfg(not(feature = "matrixmultiply"))]
    for i in 0..m {
        for j in 0..n {
            let mut acc = 0.0_f64;
            let a0 = i * rsa;
            let b0 = j * csb;

            for p in 0..k {
                let av = a[a0 + p * csa];
                let bv = b[p * rsb + b0];
                acc = av.mul_add(bv, acc);
            }

            let idx = i * rsc + j * csc;
            // beta == 0 overwrites, so stale NaN/inf in `c` never leaks through.
            c[idx] = if beta == 0.0 {
                alpha * acc
            } else {
                alpha * acc + beta * c[idx]
            };
        }
    }
}

/// Sums the rows of a row-major `(rows, cols)` buffer into `out` (length `cols`).
#[inline]
pub(crate) fn column_sum(x: &[f64], cols: usize, out: &mut [f64]) {
    debug_assert_eq!(out.len(), cols);
    debug_assert!(cols > 0 && x.len().is_multiple_of(cols));

    out.fill(0.0);
    for row in x.chunks_exact(cols) {
        for (o, &v) in out.iter_mut().zip(row) {
            *o += v;
        }
    }
}

/// Adds `bias` (length `cols`) to every row of a row-major `(rows, cols)` buffer.
#[inline]
pub(crate) fn add_row_broadcast(x: &mut [f64], bias: &[f64]) {
    debug_assert!(!bias.is_empty() && x.len().is_multiple_of(bias.len()));

    for row in x.chunks_exact_mut(bias.len()) {
        for (v, &b) in row.iter_mut().zip(bias) {
            *v += b;
        }
    }
}
