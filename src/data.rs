//! Contiguous batch storage.
//!
//! A [`Batch`] holds the inputs `X` with shape `(M, Dx)` and the one-hot labels
//! with shape `(M, Dy)`, both as flat row-major buffers. Constructors validate
//! shapes and return [`Result`]; one-hotness is an opt-in check because the
//! propagator itself does not depend on it.

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::{Error, Result};

/// Inputs and one-hot labels for one forward/backward call.
#[derive(Debug, Clone)]
pub struct Batch {
    inputs: Vec<f64>,
    labels: Vec<f64>,
    len: usize,
    input_dim: usize,
    num_classes: usize,
}

impl Batch {
    /// Build a batch from flat buffers.
    ///
    /// `inputs` is `(len, input_dim)` and `labels` is `(len, num_classes)`.
    pub fn from_flat(
        inputs: Vec<f64>,
        labels: Vec<f64>,
        input_dim: usize,
        num_classes: usize,
    ) -> Result<Self> {
        if input_dim == 0 {
            return Err(Error::InvalidData("input_dim must be > 0".to_owned()));
        }
        if num_classes == 0 {
            return Err(Error::InvalidData("num_classes must be > 0".to_owned()));
        }
        if inputs.is_empty() {
            return Err(Error::InvalidData("batch must not be empty".to_owned()));
        }
        if !inputs.len().is_multiple_of(input_dim) {
            return Err(Error::InvalidData(format!(
                "inputs length {} is not divisible by input_dim {}",
                inputs.len(),
                input_dim
            )));
        }

        let len = inputs.len() / input_dim;
        if labels.len() != len * num_classes {
            return Err(Error::InvalidData(format!(
                "labels length {} does not match len * num_classes ({} * {})",
                labels.len(),
                len,
                num_classes
            )));
        }

        Ok(Self {
            inputs,
            labels,
            len,
            input_dim,
            num_classes,
        })
    }

    /// Build a batch from per-example rows and class indices.
    ///
    /// This is a convenience constructor (it copies into contiguous storage and
    /// expands each class index into a one-hot row).
    pub fn from_rows(inputs: &[Vec<f64>], classes: &[usize], num_classes: usize) -> Result<Self> {
        if inputs.len() != classes.len() {
            return Err(Error::InvalidData(format!(
                "inputs/classes length mismatch: {} vs {}",
                inputs.len(),
                classes.len()
            )));
        }

        let input_dim = inputs.first().map(|r| r.len()).unwrap_or(0);
        let mut inputs_flat = Vec::with_capacity(inputs.len() * input_dim);
        for (i, row) in inputs.iter().enumerate() {
            if row.len() != input_dim {
                return Err(Error::InvalidData(format!(
                    "input row {i} has len {}, expected {input_dim}",
                    row.len()
                )));
            }
            inputs_flat.extend_from_slice(row);
        }

        let labels = one_hot(classes, num_classes)?;
        Self::from_flat(inputs_flat, labels, input_dim, num_classes)
    }

    /// Synthetic batch: `X ~ N(0, 1)` and one uniformly random class per row.
    pub fn random<R: Rng + ?Sized>(
        len: usize,
        input_dim: usize,
        num_classes: usize,
        rng: &mut R,
    ) -> Result<Self> {
        if num_classes == 0 {
            return Err(Error::InvalidData("num_classes must be > 0".to_owned()));
        }

        let inputs: Vec<f64> = (0..len * input_dim)
            .map(|_| StandardNormal.sample(rng))
            .collect();
        let classes: Vec<usize> = (0..len).map(|_| rng.gen_range(0..num_classes)).collect();
        let labels = one_hot(&classes, num_classes)?;

        Self::from_flat(inputs, labels, input_dim, num_classes)
    }

    /// Check that every label row has exactly one entry equal to 1 and the rest 0.
    pub fn validate_one_hot(&self) -> Result<()> {
        for (i, row) in self.labels.chunks_exact(self.num_classes).enumerate() {
            let ones = row.iter().filter(|&&v| v == 1.0).count();
            let zeros = row.iter().filter(|&&v| v == 0.0).count();
            if ones != 1 || ones + zeros != row.len() {
                return Err(Error::InvalidData(format!(
                    "label row {i} is not one-hot: {row:?}"
                )));
            }
        }
        Ok(())
    }

    #[inline]
    /// Returns the number of examples (M).
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    /// Returns true if there are no examples.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    #[inline]
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    #[inline]
    /// Flat `(M, Dx)` inputs.
    pub fn inputs(&self) -> &[f64] {
        &self.inputs
    }

    #[inline]
    /// Flat `(M, Dy)` labels.
    pub fn labels(&self) -> &[f64] {
        &self.labels
    }

    #[inline]
    /// Returns the `idx`-th input row.
    ///
    /// Panics if `idx >= len`.
    pub fn input(&self, idx: usize) -> &[f64] {
        let start = idx * self.input_dim;
        &self.inputs[start..start + self.input_dim]
    }

    #[inline]
    /// Returns the `idx`-th label row.
    ///
    /// Panics if `idx >= len`.
    pub fn label(&self, idx: usize) -> &[f64] {
        let start = idx * self.num_classes;
        &self.labels[start..start + self.num_classes]
    }
}

/// Expand class indices into flat one-hot rows.
pub fn one_hot(classes: &[usize], num_classes: usize) -> Result<Vec<f64>> {
    let mut labels = vec![0.0; classes.len() * num_classes];
    for (i, &c) in classes.iter().enumerate() {
        if c >= num_classes {
            return Err(Error::InvalidData(format!(
                "class {c} at row {i} is out of range for {num_classes} classes"
            )));
        }
        labels[i * num_classes + c] = 1.0;
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn batch_from_flat_validates_shapes() {
        let ok = Batch::from_flat(vec![0.0, 1.0, 2.0, 3.0], vec![1.0, 0.0, 0.0, 1.0], 2, 2);
        assert!(ok.is_ok());

        let ragged = Batch::from_flat(vec![0.0, 1.0, 2.0], vec![1.0, 0.0], 2, 2);
        assert!(ragged.is_err());

        let bad_labels = Batch::from_flat(vec![0.0, 1.0], vec![1.0, 0.0, 0.0], 2, 2);
        assert!(bad_labels.is_err());

        assert!(Batch::from_flat(vec![], vec![], 2, 2).is_err());
    }

    #[test]
    fn from_rows_builds_one_hot_labels() {
        let batch = Batch::from_rows(&[vec![0.5, -0.5], vec![1.0, 2.0]], &[2, 0], 3).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.input(1), &[1.0, 2.0]);
        assert_eq!(batch.label(0), &[0.0, 0.0, 1.0]);
        assert_eq!(batch.label(1), &[1.0, 0.0, 0.0]);
        assert!(batch.validate_one_hot().is_ok());

        assert!(Batch::from_rows(&[vec![0.0]], &[3], 3).is_err());
    }

    #[test]
    fn validate_one_hot_rejects_soft_labels() {
        let batch = Batch::from_flat(vec![0.0, 0.0], vec![0.5, 0.5, 0.0, 1.0], 1, 2).unwrap();
        assert!(batch.validate_one_hot().is_err());

        let two_hot = Batch::from_flat(vec![0.0], vec![1.0, 1.0], 1, 2).unwrap();
        assert!(two_hot.validate_one_hot().is_err());
    }

    #[test]
    fn random_batch_is_seeded_and_one_hot() {
        let a = Batch::random(20, 10, 10, &mut StdRng::seed_from_u64(7)).unwrap();
        let b = Batch::random(20, 10, 10, &mut StdRng::seed_from_u64(7)).unwrap();

        assert_eq!(a.len(), 20);
        assert_eq!(a.inputs().len(), 200);
        assert_eq!(a.labels().len(), 200);
        assert!(a.validate_one_hot().is_ok());
        assert_eq!(a.inputs(), b.inputs());
        assert_eq!(a.labels(), b.labels());
    }
}
