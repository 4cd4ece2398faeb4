use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

/// Snapshot of running moments over a stream of tensors of a fixed `shape`.
///
/// `variance` is the population variance (denominator `count`). With
/// `count == 0` both `mean` and `variance` are all zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningStatistics {
    pub shape: Vec<usize>,
    pub mean: ArrayD<f64>,
    pub variance: ArrayD<f64>,
    pub count: u64,
}

impl RunningStatistics {
    pub fn zeros(shape: &[usize]) -> Self {
        Self {
            shape: shape.to_vec(),
            mean: ArrayD::zeros(shape),
            variance: ArrayD::zeros(shape),
            count: 0,
        }
    }

    /// Elementwise population standard deviation.
    pub fn std(&self) -> ArrayD<f64> {
        self.variance.mapv(f64::sqrt)
    }
}
