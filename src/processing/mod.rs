//! Stream processors and the contract they share

pub mod aggregation;
pub mod box_sampler;
pub mod online_stats;
pub mod pixel_sampler;

// Re-export for easier access
pub use aggregation::Aggregation;
pub use box_sampler::{BoxSampler, Retention};
pub use online_stats::OnlineStatistics;
pub use pixel_sampler::PixelSampler;

use crate::error::{ProcessorError, Result};
use crate::types::{FrameBatch, FrameShape};
use crate::utils::monitor::ThroughputMonitor;

/// A consumer of frame batches.
///
/// Each call sees the batch exactly once and either applies fully or fails
/// without touching the processor's state.
pub trait StreamProcessor<A> {
    /// Fold `batch` into the processor and return the number of frames it held.
    fn process(&mut self, batch: &FrameBatch<'_, A>) -> Result<usize>;
}

/// The fixed set of processor kinds, for drivers that hold several of them.
#[derive(Debug)]
pub enum Processor<A> {
    Statistics(OnlineStatistics),
    Pixels(PixelSampler<A>),
    Boxes(BoxSampler<A>),
}

impl<A> StreamProcessor<A> for Processor<A>
where
    A: Copy + Into<f64> + Send + Sync,
{
    fn process(&mut self, batch: &FrameBatch<'_, A>) -> Result<usize> {
        match self {
            Processor::Statistics(p) => p.update(batch),
            Processor::Pixels(p) => p.update(batch),
            Processor::Boxes(p) => p.update(batch),
        }
    }
}

impl<A> From<OnlineStatistics> for Processor<A> {
    fn from(p: OnlineStatistics) -> Self {
        Processor::Statistics(p)
    }
}

impl<A> From<PixelSampler<A>> for Processor<A> {
    fn from(p: PixelSampler<A>) -> Self {
        Processor::Pixels(p)
    }
}

impl<A> From<BoxSampler<A>> for Processor<A> {
    fn from(p: BoxSampler<A>) -> Self {
        Processor::Boxes(p)
    }
}

/// Pairs a processor with a `ThroughputMonitor`.
///
/// Only batches the inner processor accepted are recorded, so the numeric
/// state never depends on whether monitoring is attached.
#[derive(Debug)]
pub struct Monitored<P> {
    inner: P,
    monitor: ThroughputMonitor,
}

impl<P> Monitored<P> {
    pub fn new(inner: P, monitor: ThroughputMonitor) -> Self {
        Self { inner, monitor }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut P {
        &mut self.inner
    }

    pub fn monitor(&self) -> &ThroughputMonitor {
        &self.monitor
    }

    pub fn into_parts(self) -> (P, ThroughputMonitor) {
        (self.inner, self.monitor)
    }
}

impl<A, P: StreamProcessor<A>> StreamProcessor<A> for Monitored<P> {
    fn process(&mut self, batch: &FrameBatch<'_, A>) -> Result<usize> {
        let frames = self.inner.process(batch)?;
        self.monitor.record(frames as u64);
        Ok(frames)
    }
}

/// Frame geometry of `batch`, checked against the geometry locked so far.
pub(crate) fn frame_shape_of<A>(
    batch: &FrameBatch<'_, A>,
    locked: Option<FrameShape>,
) -> Result<FrameShape> {
    let found = batch.shape().to_vec();
    let shape = match (batch.frame_shape(), locked) {
        (Some(shape), _) => shape,
        (None, Some(locked)) => {
            return Err(ProcessorError::ShapeMismatch {
                expected: locked.as_vec(),
                found,
            });
        }
        (None, None) => return Err(ProcessorError::MissingFrameAxes { found }),
    };

    match locked {
        Some(locked) if locked != shape => Err(ProcessorError::ShapeMismatch {
            expected: locked.as_vec(),
            found: shape.as_vec(),
        }),
        _ => Ok(shape),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::config::MonitorConfig;
    use ndarray::Array;

    fn drive<A, P: StreamProcessor<A>>(p: &mut P, batch: &FrameBatch<'_, A>) -> Result<usize> {
        p.process(batch)
    }

    #[test]
    fn test_enum_dispatch_feeds_every_kind() {
        let frames = Array::from_shape_fn((3, 4, 4, 2), |(n, r, c, ch)| (n + r + c + ch) as u8);
        let batch = FrameBatch::from(frames.view());

        let mut processors: Vec<Processor<u8>> = vec![
            OnlineStatistics::new(&[4, 4, 2]).into(),
            PixelSampler::<u8>::builder()
                .pixels(crate::types::PixelSpec::new([(1, 1)]).unwrap())
                .build()
                .unwrap()
                .into(),
            BoxSampler::<u8>::builder()
                .pixels(crate::types::PixelSpec::new([(2, 2)]).unwrap())
                .box_size((3, 3).into())
                .build()
                .unwrap()
                .into(),
        ];

        for p in processors.iter_mut() {
            assert_eq!(p.process(&batch).unwrap(), 3);
        }

        match &processors[0] {
            Processor::Statistics(s) => assert_eq!(s.count(), 3),
            other => panic!("unexpected processor {:?}", other),
        }
        match &processors[2] {
            Processor::Boxes(b) => assert_eq!(b.extract().unwrap().shape(), &[1, 3, 2]),
            other => panic!("unexpected processor {:?}", other),
        }
    }

    #[test]
    fn test_monitored_records_only_accepted_batches() {
        let monitor = ThroughputMonitor::new(MonitorConfig::builder().report(false).build()).unwrap();
        let mut monitored = Monitored::new(OnlineStatistics::new(&[2, 2, 1]), monitor);

        let good = Array::<f32, _>::zeros((5, 2, 2, 1));
        let bad = Array::<f32, _>::zeros((5, 3, 2, 1));

        assert_eq!(drive(&mut monitored, &FrameBatch::from(good.view())).unwrap(), 5);
        assert!(drive(&mut monitored, &FrameBatch::from(bad.view())).is_err());

        assert_eq!(monitored.monitor().total_frames(), 5);
        assert_eq!(monitored.inner().count(), 5);

        let (stats, monitor) = monitored.into_parts();
        assert_eq!(stats.count(), monitor.total_frames());
    }

    #[test]
    fn test_frame_shape_locking() {
        let frames = Array::<u8, _>::zeros((2, 4, 6, 3));
        let batch = FrameBatch::from(frames.view());

        assert_eq!(
            frame_shape_of(&batch, None).unwrap(),
            FrameShape::from((4, 6, 3))
        );
        assert!(frame_shape_of(&batch, Some(FrameShape::from((4, 6, 3)))).is_ok());
        match frame_shape_of(&batch, Some(FrameShape::from((4, 6, 1)))) {
            Err(ProcessorError::ShapeMismatch { expected, found }) => {
                assert_eq!(expected, vec![4, 6, 1]);
                assert_eq!(found, vec![4, 6, 3]);
            }
            other => panic!("expected ShapeMismatch, got {:?}", other),
        }

        let flat = Array::<u8, _>::zeros((4, 6));
        let flat = FrameBatch::from(flat.view());
        assert_eq!(
            frame_shape_of(&flat, None),
            Err(ProcessorError::MissingFrameAxes { found: vec![4, 6] })
        );
        match frame_shape_of(&flat, Some(FrameShape::from((4, 6, 3)))) {
            Err(ProcessorError::ShapeMismatch { expected, found }) => {
                assert_eq!(expected, vec![4, 6, 3]);
                assert_eq!(found, vec![4, 6]);
            }
            other => panic!("expected ShapeMismatch, got {:?}", other),
        }
    }
}
