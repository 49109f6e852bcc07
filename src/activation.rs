//! Activation primitives.
//!
//! The hidden layer applies `sigmoid` element-wise. The output layer turns each
//! row of scores into a probability distribution with `softmax_rows`.
//!
//! Like the rest of the crate we keep the *post-activation* values around and
//! express derivatives in terms of them: `sigmoid_grad(s)` takes `s = sigmoid(z)`,
//! not `z`.

/// Numerically stable logistic function `1 / (1 + e^-x)`.
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

/// Derivative of the sigmoid, given its output `s = sigmoid(x)`.
#[inline]
pub fn sigmoid_grad(s: f64) -> f64 {
    s * (1.0 - s)
}

/// Applies `sigmoid` in place to every element of `xs`.
#[inline]
pub fn sigmoid_in_place(xs: &mut [f64]) {
    for v in xs.iter_mut() {
        *v = sigmoid(*v);
    }
}

/// Row-wise softmax over a row-major `(rows, cols)` buffer, in place.
///
/// Each row is shifted by its maximum before exponentiation, so large scores
/// do not overflow. Every output row is non-negative and sums to 1.
///
/// Panics if `cols == 0` or `z.len()` is not a multiple of `cols`.
pub fn softmax_rows(z: &mut [f64], cols: usize) {
    assert!(cols > 0, "softmax requires at least 1 column");
    assert!(
        z.len().is_multiple_of(cols),
        "buffer len {} is not divisible by cols {}",
        z.len(),
        cols
    );

    for row in z.chunks_exact_mut(cols) {
        let mut max_z = row[0];
        for &v in row.iter().skip(1) {
            if v > max_z {
                max_z = v;
            }
        }

        let mut sum_exp = 0.0_f64;
        for v in row.iter_mut() {
            *v = (*v - max_z).exp();
            sum_exp += *v;
        }

        let inv_sum = 1.0 / sum_exp;
        for v in row.iter_mut() {
            *v *= inv_sum;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_basic_values() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(10.0) > 0.9999);
        assert!(sigmoid(-10.0) < 0.0001);

        // Symmetry: sigmoid(-x) = 1 - sigmoid(x).
        for &x in &[0.3, 1.7, 5.0, 20.0] {
            assert!((sigmoid(-x) - (1.0 - sigmoid(x))).abs() < 1e-12);
        }
    }

    #[test]
    fn sigmoid_is_finite_for_extreme_inputs() {
        assert_eq!(sigmoid(1000.0), 1.0);
        assert_eq!(sigmoid(-1000.0), 0.0);
    }

    #[test]
    fn sigmoid_grad_uses_activation_not_input() {
        assert!((sigmoid_grad(sigmoid(0.0)) - 0.25).abs() < 1e-12);

        // Finite difference of sigmoid at x.
        let x = 0.7;
        let eps = 1e-6;
        let numeric = (sigmoid(x + eps) - sigmoid(x - eps)) / (2.0 * eps);
        assert!((sigmoid_grad(sigmoid(x)) - numeric).abs() < 1e-9);
    }

    #[test]
    fn softmax_rows_are_distributions() {
        let mut z = vec![1.0, 2.0, 3.0, -1.0, 0.0, 1000.0];
        softmax_rows(&mut z, 3);

        for row in z.chunks_exact(3) {
            let sum: f64 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-12);
            assert!(row.iter().all(|&p| p >= 0.0 && p.is_finite()));
        }

        // softmax([1, 2, 3])
        assert!((z[0] - 0.090_030_573_170_380_46).abs() < 1e-12);
        assert!((z[1] - 0.244_728_471_054_797_64).abs() < 1e-12);
        assert!((z[2] - 0.665_240_955_774_821_9).abs() < 1e-12);
    }

    #[test]
    fn softmax_is_shift_invariant() {
        let mut a = vec![1.0, 2.0];
        let mut b = vec![1001.0, 1002.0];
        softmax_rows(&mut a, 2);
        softmax_rows(&mut b, 2);
        assert!((a[0] - b[0]).abs() < 1e-12);
        assert!((a[1] - b[1]).abs() < 1e-12);
    }

    #[test]
    #[should_panic]
    fn softmax_panics_on_ragged_buffer() {
        let mut z = vec![0.0; 5];
        softmax_rows(&mut z, 2);
    }
}
