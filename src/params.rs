//! Flat parameter layout.
//!
//! All network parameters live in one contiguous `f64` buffer so that an
//! optimizer or a gradient checker can treat them as a single vector. The
//! layout is fixed:
//!
//! | block | shape      | storage   |
//! |-------|------------|-----------|
//! | `W1`  | `(Dx, H)`  | row-major |
//! | `b1`  | `(H,)`     |           |
//! | `W2`  | `(H, Dy)`  | row-major |
//! | `b2`  | `(Dy,)`    |           |
//!
//! Gradients use the exact same layout, so `params[i]` and `grad[i]` always
//! refer to the same scalar. [`ParamLayout`] is the single source of truth for
//! block offsets; nothing else in the crate does index arithmetic on the flat
//! buffer.

use std::ops::Range;

use crate::{Error, Result};

/// Network dimensions `(Dx, H, Dy)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    /// Input features per example (`Dx`).
    pub input_dim: usize,
    /// Hidden units (`H`).
    pub hidden_dim: usize,
    /// Output classes (`Dy`).
    pub output_dim: usize,
}

impl Dimensions {
    pub fn new(input_dim: usize, hidden_dim: usize, output_dim: usize) -> Result<Self> {
        let dims = Self {
            input_dim,
            hidden_dim,
            output_dim,
        };
        dims.validate()?;
        Ok(dims)
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_dim == 0 || self.hidden_dim == 0 || self.output_dim == 0 {
            return Err(Error::InvalidConfig(format!(
                "all dimensions must be > 0, got {:?}",
                self.as_array()
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn as_array(&self) -> [usize; 3] {
        [self.input_dim, self.hidden_dim, self.output_dim]
    }

    #[inline]
    pub fn layout(&self) -> ParamLayout {
        ParamLayout::new(*self)
    }

    /// Total number of scalar parameters: `Dx*H + H + H*Dy + Dy`.
    #[inline]
    pub fn num_params(&self) -> usize {
        self.layout().len()
    }
}

impl From<[usize; 3]> for Dimensions {
    fn from([input_dim, hidden_dim, output_dim]: [usize; 3]) -> Self {
        Self {
            input_dim,
            hidden_dim,
            output_dim,
        }
    }
}

/// Offset table for the flat parameter (and gradient) buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamLayout {
    dims: Dimensions,
    w1: Range<usize>,
    b1: Range<usize>,
    w2: Range<usize>,
    b2: Range<usize>,
}

/// Borrowed views of the four parameter blocks.
#[derive(Debug, Clone, Copy)]
pub struct ParamViews<'a> {
    /// `(Dx, H)` row-major.
    pub w1: &'a [f64],
    pub b1: &'a [f64],
    /// `(H, Dy)` row-major.
    pub w2: &'a [f64],
    pub b2: &'a [f64],
}

/// Mutable views of the four parameter blocks.
#[derive(Debug)]
pub struct ParamViewsMut<'a> {
    pub w1: &'a mut [f64],
    pub b1: &'a mut [f64],
    pub w2: &'a mut [f64],
    pub b2: &'a mut [f64],
}

impl ParamLayout {
    /// Panics if any dimension is zero.
    pub fn new(dims: Dimensions) -> Self {
        assert!(
            dims.input_dim > 0 && dims.hidden_dim > 0 && dims.output_dim > 0,
            "all dimensions must be > 0, got {:?}",
            dims.as_array()
        );

        let Dimensions {
            input_dim: dx,
            hidden_dim: h,
            output_dim: dy,
        } = dims;

        let mut ofs = 0;
        let mut block = |len: usize| {
            let r = ofs..ofs + len;
            ofs += len;
            r
        };

        let w1 = block(dx * h);
        let b1 = block(h);
        let w2 = block(h * dy);
        let b2 = block(dy);

        Self {
            dims,
            w1,
            b1,
            w2,
            b2,
        }
    }

    #[inline]
    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    /// Length of the flat buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.b2.end
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn w1(&self) -> Range<usize> {
        self.w1.clone()
    }

    #[inline]
    pub fn b1(&self) -> Range<usize> {
        self.b1.clone()
    }

    #[inline]
    pub fn w2(&self) -> Range<usize> {
        self.w2.clone()
    }

    #[inline]
    pub fn b2(&self) -> Range<usize> {
        self.b2.clone()
    }

    /// Slice `params` into `W1, b1, W2, b2`.
    ///
    /// Panics if `params.len() != self.len()`.
    pub fn unpack<'a>(&self, params: &'a [f64]) -> ParamViews<'a> {
        assert_eq!(
            params.len(),
            self.len(),
            "params len {} does not match layout len {} for dims {:?}",
            params.len(),
            self.len(),
            self.dims.as_array()
        );

        ParamViews {
            w1: &params[self.w1()],
            b1: &params[self.b1()],
            w2: &params[self.w2()],
            b2: &params[self.b2()],
        }
    }

    /// Shape-checked variant of [`ParamLayout::unpack`].
    pub fn try_unpack<'a>(&self, params: &'a [f64]) -> Result<ParamViews<'a>> {
        if params.len() != self.len() {
            return Err(Error::InvalidShape(format!(
                "params len {} does not match layout len {} for dims {:?}",
                params.len(),
                self.len(),
                self.dims.as_array()
            )));
        }
        Ok(self.unpack(params))
    }

    /// Mutable split of a flat buffer into `W1, b1, W2, b2`.
    ///
    /// Panics if `buf.len() != self.len()`.
    pub fn unpack_mut<'a>(&self, buf: &'a mut [f64]) -> ParamViewsMut<'a> {
        assert_eq!(
            buf.len(),
            self.len(),
            "buffer len {} does not match layout len {} for dims {:?}",
            buf.len(),
            self.len(),
            self.dims.as_array()
        );

        let (w1, rest) = buf.split_at_mut(self.w1.len());
        let (b1, rest) = rest.split_at_mut(self.b1.len());
        let (w2, b2) = rest.split_at_mut(self.w2.len());
        ParamViewsMut { w1, b1, w2, b2 }
    }

    /// Concatenate four blocks into one flat vector, in layout order.
    ///
    /// Panics if any block does not have the length its layout range expects.
    pub fn pack(&self, w1: &[f64], b1: &[f64], w2: &[f64], b2: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; self.len()];
        let views = self.unpack_mut(&mut out);
        copy_block("W1", views.w1, w1);
        copy_block("b1", views.b1, b1);
        copy_block("W2", views.w2, w2);
        copy_block("b2", views.b2, b2);
        out
    }
}

#[inline]
fn copy_block(name: &str, dst: &mut [f64], src: &[f64]) {
    assert_eq!(
        src.len(),
        dst.len(),
        "{name} block len {} does not match expected {}",
        src.len(),
        dst.len()
    );
    dst.copy_from_slice(src);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_offsets_follow_block_order() {
        let layout = Dimensions::from([10, 5, 10]).layout();
        assert_eq!(layout.w1(), 0..50);
        assert_eq!(layout.b1(), 50..55);
        assert_eq!(layout.w2(), 55..105);
        assert_eq!(layout.b2(), 105..115);
        assert_eq!(layout.len(), 115);
        assert_eq!(Dimensions::from([10, 5, 10]).num_params(), 115);
    }

    #[test]
    fn unpack_then_pack_reproduces_buffer() {
        let layout = Dimensions::from([3, 2, 4]).layout();
        let params: Vec<f64> = (0..layout.len()).map(|i| i as f64 * 0.5 - 3.0).collect();

        let v = layout.unpack(&params);
        assert_eq!(v.w1.len(), 6);
        assert_eq!(v.b1.len(), 2);
        assert_eq!(v.w2.len(), 8);
        assert_eq!(v.b2.len(), 4);

        let packed = layout.pack(v.w1, v.b1, v.w2, v.b2);
        assert_eq!(packed, params);
    }

    #[test]
    fn unpack_mut_writes_through_to_buffer() {
        let layout = Dimensions::from([1, 1, 1]).layout();
        let mut buf = vec![0.0; layout.len()];
        {
            let v = layout.unpack_mut(&mut buf);
            v.w1[0] = 1.0;
            v.b1[0] = 2.0;
            v.w2[0] = 3.0;
            v.b2[0] = 4.0;
        }
        assert_eq!(buf, [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn try_unpack_rejects_wrong_length() {
        let layout = Dimensions::from([2, 2, 2]).layout();
        let err = layout.try_unpack(&[0.0; 3]).unwrap_err();
        assert!(matches!(err, Error::InvalidShape(_)));
        assert!(layout.try_unpack(&vec![0.0; layout.len()]).is_ok());
    }

    #[test]
    #[should_panic]
    fn unpack_panics_on_wrong_length() {
        let layout = Dimensions::from([2, 2, 2]).layout();
        layout.unpack(&[0.0; 3]);
    }

    #[test]
    #[should_panic]
    fn pack_panics_on_wrong_block_length() {
        let layout = Dimensions::from([2, 2, 2]).layout();
        layout.pack(&[0.0; 4], &[0.0; 2], &[0.0; 3], &[0.0; 2]);
    }

    #[test]
    #[should_panic(expected = "all dimensions must be > 0")]
    fn layout_panics_on_zero_dimension() {
        Dimensions::from([2, 0, 2]).layout();
    }

    #[test]
    fn dimensions_must_be_positive() {
        assert!(Dimensions::new(10, 5, 10).is_ok());
        assert!(Dimensions::new(0, 5, 10).is_err());
        assert!(Dimensions::new(10, 0, 10).is_err());
        assert!(Dimensions::new(10, 5, 0).is_err());
    }
}
