//! Forward/backward propagation for a two-layer sigmoid/softmax network.
//!
//! Forward:
//! - `Z1 = X·W1 + b1`, `hidden = sigmoid(Z1)`
//! - `Z2 = hidden·W2 + b2`, `probs = softmax(Z2)`
//! - `cost = -sum(labels * ln(probs))`
//!
//! Backward, in order:
//! - `dZ2 = probs - labels`
//! - `gradW2 = hiddenᵀ·dZ2`, `gradb2 = colsum(dZ2)`
//! - `dHidden = (dZ2·W2ᵀ) * sigmoid_grad(hidden)`
//! - `gradW1 = Xᵀ·dHidden`, `gradb1 = colsum(dHidden)`
//!
//! Gradients are written straight into a flat buffer with the same
//! [`ParamLayout`] as the parameters.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

use crate::activation::{sigmoid_grad, sigmoid_in_place, softmax_rows};
use crate::loss::{cross_entropy_backward, cross_entropy_sum};
use crate::matmul::{add_row_broadcast, column_sum, gemm_f64, row_major, transposed};
use crate::{Batch, Dimensions, Error, ParamLayout, Result};

/// Reusable buffers for [`forward_backward_into`].
///
/// A `Scratch` is tied to a batch size and a set of dimensions; the
/// activations of the most recent call live inside it.
#[derive(Debug, Clone)]
pub struct Scratch {
    dims: Dimensions,
    batch_len: usize,
    /// `(M, H)` sigmoid activations.
    hidden: Vec<f64>,
    /// `(M, Dy)` row-wise softmax outputs.
    probs: Vec<f64>,
    /// `(M, Dy)` gradient w.r.t. `Z2`.
    d_scores: Vec<f64>,
    /// `(M, H)` gradient w.r.t. `Z1`.
    d_hidden: Vec<f64>,
}

impl Scratch {
    pub fn new(dims: Dimensions, batch_len: usize) -> Self {
        let m = batch_len;
        Self {
            dims,
            batch_len,
            hidden: vec![0.0; m * dims.hidden_dim],
            probs: vec![0.0; m * dims.output_dim],
            d_scores: vec![0.0; m * dims.output_dim],
            d_hidden: vec![0.0; m * dims.hidden_dim],
        }
    }

    #[inline]
    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    #[inline]
    pub fn batch_len(&self) -> usize {
        self.batch_len
    }

    /// Hidden activations `(M, H)` from the last forward pass.
    #[inline]
    pub fn hidden(&self) -> &[f64] {
        &self.hidden
    }

    /// Output distributions `(M, Dy)` from the last forward pass.
    #[inline]
    pub fn probs(&self) -> &[f64] {
        &self.probs
    }
}

/// Owned result of a forward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Activations {
    /// `(M, H)` row-major.
    pub hidden: Vec<f64>,
    /// `(M, Dy)` row-major, each row sums to 1.
    pub probs: Vec<f64>,
    pub cost: f64,
}

fn check_shapes(batch: &Batch, params: &[f64], layout: &ParamLayout, scratch: &Scratch) {
    let dims = layout.dims();
    assert_eq!(
        batch.input_dim(),
        dims.input_dim,
        "batch input_dim {} does not match Dx {}",
        batch.input_dim(),
        dims.input_dim
    );
    assert_eq!(
        batch.num_classes(),
        dims.output_dim,
        "batch num_classes {} does not match Dy {}",
        batch.num_classes(),
        dims.output_dim
    );
    assert_eq!(
        params.len(),
        layout.len(),
        "params len {} does not match expected {} for dims {:?}",
        params.len(),
        layout.len(),
        dims.as_array()
    );
    assert_eq!(
        scratch.dims, dims,
        "scratch was built for dims {:?}, got {:?}",
        scratch.dims.as_array(),
        dims.as_array()
    );
    assert_eq!(
        scratch.batch_len,
        batch.len(),
        "scratch was built for batch len {}, got {}",
        scratch.batch_len,
        batch.len()
    );
}

/// Forward pass into `scratch.hidden` and `scratch.probs`.
fn forward_in_scratch(batch: &Batch, params: &[f64], layout: &ParamLayout, scratch: &mut Scratch) {
    let Dimensions {
        input_dim: dx,
        hidden_dim: h,
        output_dim: dy,
    } = layout.dims();
    let m = batch.len();
    let p = layout.unpack(params);

    // hidden = sigmoid(X·W1 + b1)
    gemm_f64(
        m,
        h,
        dx,
        1.0,
        batch.inputs(),
        row_major(dx),
        p.w1,
        row_major(h),
        0.0,
        &mut scratch.hidden,
        row_major(h),
    );
    add_row_broadcast(&mut scratch.hidden, p.b1);
    sigmoid_in_place(&mut scratch.hidden);

    // probs = softmax(hidden·W2 + b2)
    gemm_f64(
        m,
        dy,
        h,
        1.0,
        &scratch.hidden,
        row_major(h),
        p.w2,
        row_major(dy),
        0.0,
        &mut scratch.probs,
        row_major(dy),
    );
    add_row_broadcast(&mut scratch.probs, p.b2);
    softmax_rows(&mut scratch.probs, dy);
}

/// Forward + backward pass without allocating.
///
/// Writes `dcost/dparams` into `grad` (overwrite semantics, same layout as
/// `params`) and returns the cost. Intermediate activations are left in
/// `scratch`.
///
/// Shape mismatches are programmer errors and panic:
/// - `batch.input_dim() == dims.input_dim`, `batch.num_classes() == dims.output_dim`
/// - `params.len() == grad.len() == dims.num_params()`
/// - `scratch` built for `dims` and `batch.len()`
pub fn forward_backward_into(
    batch: &Batch,
    params: &[f64],
    layout: &ParamLayout,
    scratch: &mut Scratch,
    grad: &mut [f64],
) -> f64 {
    check_shapes(batch, params, layout, scratch);
    let Dimensions {
        input_dim: dx,
        hidden_dim: h,
        output_dim: dy,
    } = layout.dims();
    let m = batch.len();

    forward_in_scratch(batch, params, layout, scratch);

    let p = layout.unpack(params);
    let g = layout.unpack_mut(grad);

    // dZ2 = probs - labels
    let cost = cross_entropy_backward(&scratch.probs, batch.labels(), &mut scratch.d_scores);

    // gradW2 = hiddenᵀ·dZ2 (H x Dy)
    gemm_f64(
        h,
        dy,
        m,
        1.0,
        &scratch.hidden,
        transposed(h),
        &scratch.d_scores,
        row_major(dy),
        0.0,
        g.w2,
        row_major(dy),
    );

    // gradb2 = colsum(dZ2)
    column_sum(&scratch.d_scores, dy, g.b2);

    // dHidden = (dZ2·W2ᵀ) * sigmoid_grad(hidden)
    gemm_f64(
        m,
        h,
        dy,
        1.0,
        &scratch.d_scores,
        row_major(dy),
        p.w2,
        transposed(dy),
        0.0,
        &mut scratch.d_hidden,
        row_major(h),
    );
    for (d, &s) in scratch.d_hidden.iter_mut().zip(&scratch.hidden) {
        *d *= sigmoid_grad(s);
    }

    // gradW1 = Xᵀ·dHidden (Dx x H)
    gemm_f64(
        dx,
        h,
        m,
        1.0,
        batch.inputs(),
        transposed(dx),
        &scratch.d_hidden,
        row_major(h),
        0.0,
        g.w1,
        row_major(h),
    );

    // gradb1 = colsum(dHidden)
    column_sum(&scratch.d_hidden, h, g.b1);

    // Gradient shapes come from the operands that were multiplied; parameter
    // shapes come from the parameter blocks themselves.
    let hidden_cols = scratch.d_hidden.len() / m;
    let score_cols = scratch.d_scores.len() / m;
    assert_block_shape(
        "W1",
        (batch.inputs().len() / m, hidden_cols),
        (p.w1.len() / p.b1.len(), p.b1.len()),
        g.w1.len(),
    );
    assert_block_shape("b1", (1, hidden_cols), (1, p.b1.len()), g.b1.len());
    assert_block_shape(
        "W2",
        (scratch.hidden.len() / m, score_cols),
        (p.w2.len() / p.b2.len(), p.b2.len()),
        g.w2.len(),
    );
    assert_block_shape("b2", (1, score_cols), (1, p.b2.len()), g.b2.len());

    cost
}

/// Panics unless a gradient block has its parameter's shape and the buffer
/// slot it was written into holds exactly that many entries.
fn assert_block_shape(
    name: &str,
    grad_shape: (usize, usize),
    param_shape: (usize, usize),
    written: usize,
) {
    assert_eq!(
        grad_shape, param_shape,
        "grad{name} shape {grad_shape:?} does not match {name} shape {param_shape:?}"
    );
    assert_eq!(
        written,
        grad_shape.0 * grad_shape.1,
        "grad{name} buffer len {written} does not match shape {grad_shape:?}"
    );
}

/// Forward pass only, returning owned activations.
///
/// Panics on shape mismatch (see [`forward_backward_into`]).
pub fn forward(batch: &Batch, params: &[f64], dims: Dimensions) -> Activations {
    let layout = dims.layout();
    let mut scratch = Scratch::new(dims, batch.len());
    check_shapes(batch, params, &layout, &scratch);

    forward_in_scratch(batch, params, &layout, &mut scratch);
    let cost = cross_entropy_sum(&scratch.probs, batch.labels());

    let m = batch.len();
    assert_eq!(scratch.hidden.len(), m * dims.hidden_dim);
    assert_eq!(scratch.probs.len(), m * dims.output_dim);

    Activations {
        hidden: scratch.hidden,
        probs: scratch.probs,
        cost,
    }
}

/// Cost and gradient of the summed cross-entropy w.r.t. the flat parameter vector.
///
/// Allocating convenience wrapper around [`forward_backward_into`]. The
/// returned gradient has exactly the length and layout of `params`.
///
/// Panics on shape mismatch.
pub fn forward_backward_prop(batch: &Batch, params: &[f64], dims: Dimensions) -> (f64, Vec<f64>) {
    let layout = dims.layout();
    let mut scratch = Scratch::new(dims, batch.len());
    let mut grad = vec![0.0; layout.len()];

    let cost = forward_backward_into(batch, params, &layout, &mut scratch, &mut grad);

    assert_eq!(grad.len(), params.len(), "grad len does not match params len");
    (cost, grad)
}

/// Shape-checked variant of [`forward_backward_prop`].
pub fn try_forward_backward(
    batch: &Batch,
    params: &[f64],
    dims: Dimensions,
) -> Result<(f64, Vec<f64>)> {
    dims.validate()?;
    if batch.input_dim() != dims.input_dim {
        return Err(Error::InvalidShape(format!(
            "batch input_dim {} does not match Dx {}",
            batch.input_dim(),
            dims.input_dim
        )));
    }
    if batch.num_classes() != dims.output_dim {
        return Err(Error::InvalidShape(format!(
            "batch num_classes {} does not match Dy {}",
            batch.num_classes(),
            dims.output_dim
        )));
    }
    dims.layout().try_unpack(params)?;

    Ok(forward_backward_prop(batch, params, dims))
}

/// A parameter vector together with the dimensions that lay it out.
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    layout: ParamLayout,
    params: Vec<f64>,
}

impl Network {
    /// Standard-normal initialisation from a deterministic seed.
    pub fn new_with_seed(dims: Dimensions, seed: u64) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::new_with_rng(dims, &mut rng)
    }

    /// Standard-normal initialisation from the provided RNG.
    pub fn new_with_rng<R: Rng + ?Sized>(dims: Dimensions, rng: &mut R) -> Result<Self> {
        dims.validate()?;
        let layout = dims.layout();
        let params = (0..layout.len())
            .map(|_| StandardNormal.sample(rng))
            .collect();
        Ok(Self { layout, params })
    }

    /// Wrap an existing parameter vector.
    pub fn from_parts(dims: Dimensions, params: Vec<f64>) -> Result<Self> {
        dims.validate()?;
        let layout = dims.layout();
        layout.try_unpack(&params)?;
        Ok(Self { layout, params })
    }

    #[inline]
    pub fn dims(&self) -> Dimensions {
        self.layout.dims()
    }

    #[inline]
    pub fn layout(&self) -> &ParamLayout {
        &self.layout
    }

    #[inline]
    pub fn params(&self) -> &[f64] {
        &self.params
    }

    #[inline]
    pub fn params_mut(&mut self) -> &mut [f64] {
        &mut self.params
    }

    #[inline]
    pub fn into_params(self) -> Vec<f64> {
        self.params
    }

    pub fn scratch(&self, batch_len: usize) -> Scratch {
        Scratch::new(self.dims(), batch_len)
    }

    pub fn forward(&self, batch: &Batch) -> Activations {
        forward(batch, &self.params, self.dims())
    }

    pub fn forward_backward(&self, batch: &Batch) -> (f64, Vec<f64>) {
        forward_backward_prop(batch, &self.params, self.dims())
    }
}
