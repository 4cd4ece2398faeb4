use crate::error::{ProcessorError, Result};
use crate::processing::StreamProcessor;
use crate::types::{FrameBatch, RunningStatistics};
use ndarray::{ArrayD, Axis};
use tracing::debug;

/// Running mean and population variance over a stream of tensors.
///
/// Batches are folded in with the pairwise update of Chan et al., so the
/// result does not depend on how the stream was chunked and no past data is
/// ever re-read.
#[derive(Debug, Clone, PartialEq)]
pub struct OnlineStatistics {
    stats: RunningStatistics,
}

impl OnlineStatistics {
    /// Track tensors of `shape`; every batch must end with exactly these axes.
    pub fn new(shape: &[usize]) -> Self {
        Self {
            stats: RunningStatistics::zeros(shape),
        }
    }

    /// Resume from a previously taken snapshot.
    ///
    /// An empty snapshot must hold zero moments and variances are never
    /// negative.
    pub fn from_snapshot(snapshot: RunningStatistics) -> Result<Self> {
        for found in [snapshot.mean.shape(), snapshot.variance.shape()] {
            if found != snapshot.shape.as_slice() {
                return Err(ProcessorError::ShapeMismatch {
                    expected: snapshot.shape.clone(),
                    found: found.to_vec(),
                });
            }
        }

        if snapshot.count == 0
            && snapshot
                .mean
                .iter()
                .chain(snapshot.variance.iter())
                .any(|&v| v != 0.0)
        {
            return Err(ProcessorError::InvalidConfig(
                "snapshot with no samples has non-zero moments".to_string(),
            ));
        }
        if snapshot.variance.iter().any(|&v| v.is_nan() || v < 0.0) {
            return Err(ProcessorError::InvalidConfig(
                "snapshot variance must be non-negative".to_string(),
            ));
        }

        Ok(Self { stats: snapshot })
    }

    pub fn shape(&self) -> &[usize] {
        &self.stats.shape
    }

    pub fn mean(&self) -> &ArrayD<f64> {
        &self.stats.mean
    }

    pub fn variance(&self) -> &ArrayD<f64> {
        &self.stats.variance
    }

    pub fn std(&self) -> ArrayD<f64> {
        self.stats.std()
    }

    pub fn count(&self) -> u64 {
        self.stats.count
    }

    pub fn snapshot(&self) -> RunningStatistics {
        self.stats.clone()
    }

    /// Fold a batch into the running moments.
    ///
    /// Every axis in front of the tracked shape is a sample axis. Returns the
    /// number of samples the batch contributed.
    pub fn update<A>(&mut self, batch: &FrameBatch<'_, A>) -> Result<usize>
    where
        A: Copy + Into<f64>,
    {
        let ndim = self.stats.shape.len();
        if batch.trailing_shape(ndim) != Some(self.stats.shape.as_slice()) {
            return Err(ProcessorError::ShapeMismatch {
                expected: self.stats.shape.clone(),
                found: batch.shape().to_vec(),
            });
        }

        let count = batch.count_for(ndim);
        if count == 0 {
            return Ok(0);
        }

        let data = batch.flatten_leading(ndim)?.mapv(Into::<f64>::into);
        let mean = data
            .mean_axis(Axis(0))
            .ok_or(ProcessorError::DivisionUndefined("empty batch has no mean"))?;
        let variance = data.var_axis(Axis(0), 0.0);

        self.fold(count as u64, &mean, &variance);
        debug!("folded {} samples, count is now {}", count, self.stats.count);
        Ok(count)
    }

    /// Combine with statistics gathered independently over other data.
    pub fn merge(&mut self, other: &OnlineStatistics) -> Result<()> {
        if other.shape() != self.shape() {
            return Err(ProcessorError::ShapeMismatch {
                expected: self.stats.shape.clone(),
                found: other.stats.shape.clone(),
            });
        }
        if other.count() > 0 {
            self.fold(other.count(), other.mean(), other.variance());
        }
        Ok(())
    }

    fn fold(&mut self, n_b: u64, mean_b: &ArrayD<f64>, var_b: &ArrayD<f64>) {
        if self.stats.count == 0 {
            self.stats.mean = mean_b.clone();
            self.stats.variance = var_b.clone();
            self.stats.count = n_b;
            return;
        }

        let n_a = self.stats.count as f64;
        let n_b_f = n_b as f64;
        let n = n_a + n_b_f;

        let delta = mean_b - &self.stats.mean;
        let mean = &self.stats.mean + &(&delta * (n_b_f / n));
        let m2 = &self.stats.variance * n_a
            + var_b * n_b_f
            + (&delta * &delta) * (n_a * n_b_f / n);

        self.stats.mean = mean;
        self.stats.variance = m2 / n;
        self.stats.count += n_b;
    }
}

impl<A> StreamProcessor<A> for OnlineStatistics
where
    A: Copy + Into<f64>,
{
    fn process(&mut self, batch: &FrameBatch<'_, A>) -> Result<usize> {
        self.update(batch)
    }
}
