//! Sanity checks on synthetic data.
//!
//! [`sanity_check`] builds a random batch and random parameters and runs the
//! gradient checker over [`forward_backward_prop`]. [`your_sanity_checks`] is
//! the place for additional hand-written checks; the binary runs both.

use std::env;

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::gradcheck::{GradCheckConfig, GradCheckReport, gradcheck_naive};
use crate::network::{Network, forward, forward_backward_prop};
use crate::{Batch, Dimensions, Error, Result};

/// Environment variable holding an optional `u64` seed for the binary.
pub const SEED_ENV: &str = "TWOLAYER_SEED";

/// Settings for [`sanity_check`].
#[derive(Debug, Clone, PartialEq)]
pub struct SanityConfig {
    /// Number of examples (M).
    pub batch_size: usize,
    pub dims: Dimensions,
    /// `None` draws the seed from OS entropy, so runs are not reproducible.
    pub seed: Option<u64>,
    pub grad_check: GradCheckConfig,
}

impl Default for SanityConfig {
    fn default() -> Self {
        Self {
            batch_size: 20,
            dims: Dimensions::from([10, 5, 10]),
            seed: None,
            grad_check: GradCheckConfig::default(),
        }
    }
}

impl SanityConfig {
    /// Defaults, with the seed taken from [`SEED_ENV`] when it is set.
    pub fn from_env() -> Result<Self> {
        let seed = match env::var(SEED_ENV) {
            Ok(s) => Some(parse_seed(&s)?),
            Err(env::VarError::NotPresent) => None,
            Err(e) => {
                return Err(Error::InvalidConfig(format!("{SEED_ENV}: {e}")));
            }
        };
        Ok(Self {
            seed,
            ..Self::default()
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be > 0".to_owned()));
        }
        self.dims.validate()?;
        self.grad_check.validate()
    }

    /// RNG for data generation: seeded if a seed is configured.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

fn parse_seed(s: &str) -> Result<u64> {
    s.trim()
        .parse::<u64>()
        .map_err(|e| Error::InvalidConfig(format!("{SEED_ENV} must be a u64, got {s:?}: {e}")))
}

/// Random batch and standard-normal parameters for `cfg`.
pub fn synthetic_problem<R: Rng + ?Sized>(
    cfg: &SanityConfig,
    rng: &mut R,
) -> Result<(Batch, Network)> {
    let dims = cfg.dims;
    let batch = Batch::random(cfg.batch_size, dims.input_dim, dims.output_dim, rng)?;
    let net = Network::new_with_rng(dims, rng)?;
    Ok((batch, net))
}

/// Gradient-check the propagator on a random problem.
pub fn sanity_check(cfg: &SanityConfig) -> Result<GradCheckReport> {
    info!("Running sanity check...");
    cfg.validate()?;

    let mut rng = cfg.rng();
    let (batch, net) = synthetic_problem(cfg, &mut rng)?;
    let dims = net.dims();
    let mut params = net.into_params();

    gradcheck_naive(
        |p| forward_backward_prop(&batch, p, dims),
        &mut params,
        &cfg.grad_check,
    )
}

/// Additional checks beyond [`sanity_check`].
///
/// - a single-example batch goes through the gradient checker with the same
///   shape contracts as any other batch size;
/// - every output row of the forward pass is a probability distribution.
pub fn your_sanity_checks(cfg: &SanityConfig) -> Result<()> {
    info!("Running your sanity checks...");
    cfg.validate()?;

    let single = SanityConfig {
        batch_size: 1,
        ..cfg.clone()
    };
    let report = sanity_check(&single)?;
    info!(
        "batch of 1: {} entries checked, cost {:.6}",
        report.checked, report.cost
    );

    let mut rng = cfg.rng();
    let (batch, net) = synthetic_problem(cfg, &mut rng)?;
    let dims = net.dims();
    let act = forward(&batch, net.params(), dims);

    for (i, row) in act.probs.chunks_exact(dims.output_dim).enumerate() {
        let sum: f64 = row.iter().sum();
        if (sum - 1.0).abs() > 1e-9 || row.iter().any(|&p| p < 0.0) {
            return Err(Error::InvalidData(format!(
                "output row {i} is not a distribution (sum {sum})"
            )));
        }
    }
    if !(act.cost >= 0.0) {
        return Err(Error::InvalidData(format!(
            "cost must be >= 0, got {}",
            act.cost
        )));
    }
    info!("forward pass: {} rows sum to 1, cost {:.6}", batch.len(), act.cost);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> SanityConfig {
        SanityConfig {
            seed: Some(seed),
            ..SanityConfig::default()
        }
    }

    #[test]
    fn default_matches_reference_configuration() {
        let cfg = SanityConfig::default();
        assert_eq!(cfg.batch_size, 20);
        assert_eq!(cfg.dims.as_array(), [10, 5, 10]);
        assert_eq!(cfg.dims.num_params(), 115);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn seeded_sanity_check_passes() {
        let report = sanity_check(&seeded(0)).unwrap();
        assert_eq!(report.checked, 115);
        assert!(report.cost >= 0.0);
    }

    #[test]
    fn unseeded_sanity_check_passes() {
        assert!(sanity_check(&SanityConfig::default()).is_ok());
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let a = sanity_check(&seeded(42)).unwrap();
        let b = sanity_check(&seeded(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn extra_checks_pass() {
        assert!(your_sanity_checks(&seeded(3)).is_ok());
    }

    #[test]
    fn rejects_empty_batch() {
        let cfg = SanityConfig {
            batch_size: 0,
            ..SanityConfig::default()
        };
        assert!(matches!(sanity_check(&cfg), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn seed_parsing() {
        assert_eq!(parse_seed(" 17 ").unwrap(), 17);
        assert!(parse_seed("seventeen").is_err());
        assert!(parse_seed("-1").is_err());
    }
}
