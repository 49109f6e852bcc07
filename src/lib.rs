//! Forward and backward propagation for a two-layer sigmoid/softmax network.
//!
//! `twolayer-nn` computes, for a batch of inputs and one-hot labels, the summed
//! cross-entropy cost of the network
//!
//! ```text
//! X -> X·W1 + b1 -> sigmoid -> ·W2 + b2 -> softmax -> cross-entropy
//! ```
//!
//! and the gradient of that cost with respect to every parameter, packed into
//! a flat vector with the same layout as the parameters. A finite-difference
//! gradient checker verifies the analytic gradient.
//!
//! # Panics vs `Result`
//!
//! This crate exposes two layers of API:
//!
//! - Low-level hot path (panics on misuse):
//!   - [`network::forward_backward_into`], [`network::forward_backward_prop`]
//!   - [`params::ParamLayout::unpack`]
//!     Shape mismatches are treated as programmer error and will panic via `assert!`.
//!
//! - High-level convenience APIs (shape-checked):
//!   - [`Batch::from_flat`], [`Dimensions::new`], [`Network::from_parts`]
//!   - [`network::try_forward_backward`], [`gradcheck::gradcheck_naive`]
//!     These validate inputs and return [`Result`].
//!
//! # Data layout and shapes
//!
//! - Scalars are `f64`.
//! - [`Batch`] stores inputs `(M, Dx)` and one-hot labels `(M, Dy)` contiguously
//!   in row-major layout.
//! - Parameters are one flat vector `W1 (Dx, H) | b1 (H) | W2 (H, Dy) | b2 (Dy)`,
//!   described by [`ParamLayout`]. Gradients use the same layout.
//! - The cost is a sum over the batch, not a mean.
//!
//! # Quick start
//!
//! ```rust
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use twolayer_nn::{
//!     Batch, Dimensions, GradCheckConfig, Network, forward_backward_prop, gradcheck_naive,
//! };
//!
//! # fn main() -> twolayer_nn::Result<()> {
//! let dims = Dimensions::new(10, 5, 10)?;
//! let mut rng = StdRng::seed_from_u64(0);
//! let batch = Batch::random(20, 10, 10, &mut rng)?;
//! let mut params = Network::new_with_rng(dims, &mut rng)?.into_params();
//!
//! let (cost, grad) = forward_backward_prop(&batch, &params, dims);
//! assert!(cost >= 0.0);
//! assert_eq!(grad.len(), 115);
//!
//! gradcheck_naive(
//!     |p| forward_backward_prop(&batch, p, dims),
//!     &mut params,
//!     &GradCheckConfig::default(),
//! )?;
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod data;
pub mod error;
pub mod gradcheck;
pub mod loss;
pub(crate) mod matmul;
pub mod network;
pub mod params;
pub mod sanity;

pub use data::Batch;
pub use error::{Error, Result};
pub use gradcheck::{GradCheckConfig, GradCheckReport, gradcheck_naive};
pub use network::{
    Activations, Network, Scratch, forward, forward_backward_into, forward_backward_prop,
    try_forward_backward,
};
pub use params::{Dimensions, ParamLayout, ParamViews, ParamViewsMut};
pub use sanity::{SanityConfig, sanity_check, your_sanity_checks};
