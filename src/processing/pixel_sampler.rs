use crate::error::{ProcessorError, Result};
use crate::processing::{StreamProcessor, frame_shape_of};
use crate::types::{FrameBatch, FrameShape, PixelSpec, SampleLog};
use bon::bon;
use ndarray::{Array3, Axis, concatenate};
use tracing::debug;

/// Collects the channel vectors of a fixed set of pixels from every frame.
#[derive(Debug, Clone)]
pub struct PixelSampler<A> {
    pixels: PixelSpec,
    frame_shape: Option<FrameShape>,
    log: SampleLog<Array3<A>>,
    total_frames: usize,
}

#[bon]
impl<A> PixelSampler<A> {
    /// Create a sampler for `pixels`.
    ///
    /// # Arguments
    /// * `pixels` - Sampling locations, in output order
    /// * `frame_size` - Optional frame geometry; when given, coordinates are
    ///   checked against it right away and batches must match it
    #[builder]
    pub fn new(pixels: PixelSpec, frame_size: Option<FrameShape>) -> Result<Self> {
        if let Some(frame) = &frame_size {
            pixels.check_within(frame)?;
        }

        Ok(Self {
            pixels,
            frame_shape: frame_size,
            log: SampleLog::new(),
            total_frames: 0,
        })
    }

    pub fn pixels(&self) -> &PixelSpec {
        &self.pixels
    }

    /// Geometry every batch must have; locked by the first non-empty batch
    /// unless configured up front.
    pub fn frame_shape(&self) -> Option<FrameShape> {
        self.frame_shape
    }

    pub fn frame_count(&self) -> usize {
        self.total_frames
    }

    pub fn log(&self) -> &SampleLog<Array3<A>> {
        &self.log
    }
}

impl<A: Clone> PixelSampler<A> {
    /// Capture the sampled pixels of every frame in `batch`.
    ///
    /// Appends one `(N, num_pixels, C)` entry to the log and returns `N`.
    pub fn update(&mut self, batch: &FrameBatch<'_, A>) -> Result<usize> {
        let shape = frame_shape_of(batch, self.frame_shape)?;
        if self.frame_shape.is_none() {
            self.pixels.check_within(&shape)?;
        }

        let n = batch.frame_count();
        if n == 0 {
            return Ok(0);
        }

        let frames = batch.frames()?;
        let pixels = self.pixels.as_slice();
        let values = Array3::from_shape_fn((n, pixels.len(), shape.channels), |(f, p, c)| {
            frames[[f, pixels[p].row, pixels[p].col, c]].clone()
        });

        self.log.push(values);
        self.frame_shape = Some(shape);
        self.total_frames += n;
        debug!(
            "pixel sampler captured {} frames ({} in total)",
            n, self.total_frames
        );
        Ok(n)
    }

    /// Everything captured so far as a `(total_frames, num_pixels, C)` array.
    ///
    /// Does not clear the log, so repeated calls return the same data plus
    /// whatever was added in between.
    pub fn extract(&self) -> Result<Array3<A>> {
        if self.log.is_empty() {
            return Err(ProcessorError::DivisionUndefined(
                "no frames have been sampled yet",
            ));
        }
        let views: Vec<_> = self.log.iter().map(|entry| entry.view()).collect();
        Ok(concatenate(Axis(0), &views)?)
    }
}

impl<A: Clone> StreamProcessor<A> for PixelSampler<A> {
    fn process(&mut self, batch: &FrameBatch<'_, A>) -> Result<usize> {
        self.update(batch)
    }
}
