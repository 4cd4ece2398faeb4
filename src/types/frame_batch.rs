//! Borrowed view over a batch of frames

use crate::error::{ProcessorError, Result};
use bon::Builder;
use ndarray::{ArrayView, ArrayViewD, CowArray, Dimension, Ix4, IxDyn};
use serde::{Deserialize, Serialize};

/// Number of trailing axes that make up a single frame: (height, width, channels).
pub const FRAME_NDIM: usize = 3;

/// Geometry of a single frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
pub struct FrameShape {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

impl FrameShape {
    pub fn as_vec(&self) -> Vec<usize> {
        vec![self.height, self.width, self.channels]
    }
}

impl From<(usize, usize, usize)> for FrameShape {
    fn from((height, width, channels): (usize, usize, usize)) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }
}

/// A dense tensor holding one or more frames.
///
/// The trailing axes describe the per-frame tensor and every axis in front of
/// them is a batch/time axis. Processors only ever read from the batch; data
/// that has to outlive a call is copied out of it.
#[derive(Debug, Clone)]
pub struct FrameBatch<'a, A> {
    data: ArrayViewD<'a, A>,
}

impl<'a, A, D: Dimension> From<ArrayView<'a, A, D>> for FrameBatch<'a, A> {
    fn from(view: ArrayView<'a, A, D>) -> Self {
        Self::new(view)
    }
}

impl<'a, A> FrameBatch<'a, A> {
    pub fn new<D: Dimension>(view: ArrayView<'a, A, D>) -> Self {
        Self {
            data: view.into_dyn(),
        }
    }

    pub fn view(&self) -> &ArrayViewD<'a, A> {
        &self.data
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// The last `ndim` axes, or `None` if the batch has fewer axes than that.
    pub fn trailing_shape(&self, ndim: usize) -> Option<&[usize]> {
        let shape = self.data.shape();
        (shape.len() >= ndim).then(|| &shape[shape.len() - ndim..])
    }

    /// Axes in front of the last `ndim` ones.
    pub fn leading_shape(&self, ndim: usize) -> &[usize] {
        let shape = self.data.shape();
        &shape[..shape.len().saturating_sub(ndim)]
    }

    /// Product of the leading axes; a batch without leading axes holds one item.
    pub fn count_for(&self, ndim: usize) -> usize {
        self.leading_shape(ndim).iter().product()
    }

    /// Number of frames, treating the last three axes as (height, width, channels).
    pub fn frame_count(&self) -> usize {
        self.count_for(FRAME_NDIM)
    }

    pub fn frame_shape(&self) -> Option<FrameShape> {
        match self.trailing_shape(FRAME_NDIM)? {
            &[height, width, channels] => Some(FrameShape {
                height,
                width,
                channels,
            }),
            _ => None,
        }
    }
}

impl<'a, A: Clone> FrameBatch<'a, A> {
    /// Collapse every leading axis into one, keeping the last `ndim` axes.
    ///
    /// Borrows the caller's buffer when it is already in standard layout and
    /// copies otherwise.
    pub fn flatten_leading(&self, ndim: usize) -> Result<CowArray<'_, A, IxDyn>> {
        let mut shape = vec![self.count_for(ndim)];
        shape.extend_from_slice(self.trailing_shape(ndim).unwrap_or(&[]));
        Ok(self.data.to_shape(IxDyn(&shape))?)
    }

    /// The batch as an `(N, H, W, C)` tensor.
    pub fn frames(&self) -> Result<CowArray<'_, A, Ix4>> {
        let shape = self
            .frame_shape()
            .ok_or_else(|| ProcessorError::MissingFrameAxes {
                found: self.shape().to_vec(),
            })?;
        let n = self.frame_count();
        Ok(self
            .data
            .to_shape((n, shape.height, shape.width, shape.channels))?)
    }
}
