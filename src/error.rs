//! Error type shared by every processor

use thiserror::Error;

/// Errors reported by processors, samplers and the throughput monitor.
///
/// All errors are local to the call that produced them: a failed `update`
/// leaves the processor exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessorError {
    /// The trailing dimensions of a batch disagree with the configured geometry.
    #[error("shape mismatch: expected trailing shape {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// A batch has fewer axes than a single `(height, width, channels)` frame.
    #[error("batch of shape {found:?} has no trailing (height, width, channels) frame axes")]
    MissingFrameAxes { found: Vec<usize> },

    /// A pixel coordinate or box region falls outside the frame.
    #[error(
        "region around ({row}, {col}) spanning rows {rows:?} and cols {cols:?} is outside a {height}x{width} frame"
    )]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: (isize, isize),
        cols: (isize, isize),
        height: usize,
        width: usize,
    },

    /// A rate or an extraction was requested before any data made it defined.
    #[error("undefined result: {0}")]
    DivisionUndefined(&'static str),

    /// A configuration value cannot be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An internal reshape could not be carried out.
    #[error("array layout error: {0}")]
    Layout(#[from] ndarray::ShapeError),
}

pub type Result<T> = std::result::Result<T, ProcessorError>;

impl From<serde_json::Error> for ProcessorError {
    fn from(err: serde_json::Error) -> Self {
        ProcessorError::InvalidConfig(err.to_string())
    }
}
