//! Finite-difference gradient checking.
//!
//! For every scalar `x[i]` the checker compares the analytic `grad[i]` against
//! the centred difference `(f(x + h e_i) - f(x - h e_i)) / 2h`, using the
//! relative difference `|numeric - analytic| / max(1, |numeric|, |analytic|)`.
//! The first entry above tolerance fails the whole check.

use log::{debug, error, info};

use crate::{Error, Result};

/// Gradient check settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradCheckConfig {
    /// Perturbation applied to each parameter.
    pub h: f64,
    /// Maximum allowed relative difference.
    pub tolerance: f64,
}

impl Default for GradCheckConfig {
    fn default() -> Self {
        Self {
            h: 1e-4,
            tolerance: 1e-5,
        }
    }
}

impl GradCheckConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.h.is_finite() && self.h > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "h must be finite and > 0, got {}",
                self.h
            )));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "tolerance must be finite and > 0, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Summary of a passing gradient check.
#[derive(Debug, Clone, PartialEq)]
pub struct GradCheckReport {
    /// Number of parameters checked.
    pub checked: usize,
    /// Largest relative difference seen.
    pub max_rel_diff: f64,
    /// Index at which `max_rel_diff` occurred.
    pub worst_index: usize,
    /// Cost at the unperturbed point.
    pub cost: f64,
}

/// Relative difference used to compare two derivatives.
#[inline]
pub fn relative_difference(numeric: f64, analytic: f64) -> f64 {
    (numeric - analytic).abs() / 1.0_f64.max(numeric.abs()).max(analytic.abs())
}

/// Check the gradient returned by `f` against centred finite differences.
///
/// `f` maps a parameter vector to `(cost, grad)`. `x` is perturbed in place
/// one entry at a time and restored before the next entry (and before
/// returning, on success or failure).
///
/// Returns [`Error::GradCheck`] for the first mismatching index and
/// [`Error::InvalidShape`] if `f` returns a gradient of the wrong length.
pub fn gradcheck_naive<F>(mut f: F, x: &mut [f64], cfg: &GradCheckConfig) -> Result<GradCheckReport>
where
    F: FnMut(&[f64]) -> (f64, Vec<f64>),
{
    cfg.validate()?;

    let (cost, grad) = f(x);
    if grad.len() != x.len() {
        return Err(Error::InvalidShape(format!(
            "gradient len {} does not match parameter len {}",
            grad.len(),
            x.len()
        )));
    }

    let h = cfg.h;
    let mut report = GradCheckReport {
        checked: 0,
        max_rel_diff: 0.0,
        worst_index: 0,
        cost,
    };

    for (i, &analytic) in grad.iter().enumerate() {
        let orig = x[i];

        x[i] = orig + h;
        let (plus, _) = f(x);
        x[i] = orig - h;
        let (minus, _) = f(x);
        x[i] = orig;

        let numeric = (plus - minus) / (2.0 * h);
        let rel_diff = relative_difference(numeric, analytic);
        debug!("index {i}: analytic {analytic:.10} numeric {numeric:.10} rel_diff {rel_diff:e}");

        // NaN compares false against the tolerance, so test the negation.
        if !(rel_diff <= cfg.tolerance) {
            error!("Gradient check failed at index {i}");
            error!("Your gradient: {analytic}\tNumerical gradient: {numeric}");
            return Err(Error::GradCheck {
                index: i,
                analytic,
                numeric,
                rel_diff,
            });
        }

        report.checked += 1;
        if rel_diff > report.max_rel_diff {
            report.max_rel_diff = rel_diff;
            report.worst_index = i;
        }
    }

    info!(
        "Gradient check passed! ({} entries, max relative difference {:e})",
        report.checked, report.max_rel_diff
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(x: &[f64]) -> (f64, Vec<f64>) {
        let cost = x.iter().map(|v| v * v).sum();
        let grad = x.iter().map(|v| 2.0 * v).collect();
        (cost, grad)
    }

    #[test]
    fn passes_for_quadratic() {
        let mut x = vec![123.456];
        let report = gradcheck_naive(quad, &mut x, &GradCheckConfig::default()).unwrap();
        assert_eq!(report.checked, 1);

        let mut x = vec![-0.3, 1.7, 4.0];
        let report = gradcheck_naive(quad, &mut x, &GradCheckConfig::default()).unwrap();
        assert_eq!(report.checked, 3);
        assert!(report.max_rel_diff <= 1e-5);
        assert_eq!(x, [-0.3, 1.7, 4.0]);
    }

    #[test]
    fn passes_for_transcendental_function() {
        let f = |x: &[f64]| {
            let cost = x[0].sin() * x[1].exp();
            let grad = vec![x[0].cos() * x[1].exp(), x[0].sin() * x[1].exp()];
            (cost, grad)
        };
        let mut x = vec![0.4, -0.2];
        assert!(gradcheck_naive(f, &mut x, &GradCheckConfig::default()).is_ok());
    }

    #[test]
    fn reports_first_wrong_index_and_restores_params() {
        let wrong = |x: &[f64]| {
            let (cost, mut grad) = quad(x);
            grad[1] += 0.5;
            grad[2] += 0.5;
            (cost, grad)
        };
        let mut x = vec![1.0, 2.0, 3.0];
        let err = gradcheck_naive(wrong, &mut x, &GradCheckConfig::default()).unwrap_err();
        match err {
            Error::GradCheck { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(x, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn nan_gradient_fails() {
        let f = |x: &[f64]| (x[0], vec![f64::NAN]);
        let mut x = vec![0.0];
        assert!(matches!(
            gradcheck_naive(f, &mut x, &GradCheckConfig::default()),
            Err(Error::GradCheck { .. })
        ));
    }

    #[test]
    fn gradient_length_mismatch_is_a_shape_error() {
        let f = |x: &[f64]| (0.0, vec![0.0; x.len() + 1]);
        let mut x = vec![0.0; 2];
        assert!(matches!(
            gradcheck_naive(f, &mut x, &GradCheckConfig::default()),
            Err(Error::InvalidShape(_))
        ));
    }

    #[test]
    fn config_validation() {
        assert!(GradCheckConfig::default().validate().is_ok());
        let bad_h = GradCheckConfig {
            h: 0.0,
            ..GradCheckConfig::default()
        };
        assert!(bad_h.validate().is_err());
        let bad_tol = GradCheckConfig {
            tolerance: f64::NAN,
            ..GradCheckConfig::default()
        };
        assert!(bad_tol.validate().is_err());
    }

    #[test]
    fn relative_difference_uses_unit_floor() {
        assert_eq!(relative_difference(0.5, 0.25), 0.25);
        assert_eq!(relative_difference(4.0, 2.0), 0.5);
    }
}
