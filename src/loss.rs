//! Softmax cross-entropy over a batch.
//!
//! The network's output layer produces row-wise probabilities `probs = softmax(Z2)`.
//! The cost is the *total* cross-entropy over the batch:
//!
//! - `cost = -sum_{m, k} labels[m, k] * ln(probs[m, k])`
//!
//! It is a sum, not a mean, so the cost and its gradient both scale with the
//! batch size.

/// Summed cross-entropy between predicted distributions and targets.
///
/// Every entry contributes `t * ln(p)`, so a zero probability is not special-cased:
/// it yields `inf` under a non-zero target and `NaN` (from `0 * ln(0)`) otherwise.
///
/// Shape contract: `probs.len() == labels.len()`.
#[inline]
pub fn cross_entropy_sum(probs: &[f64], labels: &[f64]) -> f64 {
    assert_eq!(
        probs.len(),
        labels.len(),
        "probs len {} does not match labels len {}",
        probs.len(),
        labels.len()
    );

    let mut cost = 0.0_f64;
    for (&p, &t) in probs.iter().zip(labels) {
        cost -= t * p.ln();
    }
    cost
}

/// Gradient of the summed cross-entropy with respect to the pre-softmax scores.
///
/// Writes `d_scores = probs - labels` and returns the cost. This is the
/// gradient of the softmax + cross-entropy composite, valid when every label
/// row sums to 1.
///
/// Shape contract:
/// - `probs.len() == labels.len()`
/// - `probs.len() == d_scores.len()`
#[inline]
pub fn cross_entropy_backward(probs: &[f64], labels: &[f64], d_scores: &mut [f64]) -> f64 {
    assert_eq!(
        probs.len(),
        d_scores.len(),
        "probs len {} does not match d_scores len {}",
        probs.len(),
        d_scores.len()
    );

    let cost = cross_entropy_sum(probs, labels);
    for ((d, &p), &t) in d_scores.iter_mut().zip(probs).zip(labels) {
        *d = p - t;
    }
    cost
}
