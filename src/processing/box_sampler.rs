use crate::error::{ProcessorError, Result};
use crate::processing::aggregation::Aggregation;
use crate::processing::{StreamProcessor, frame_shape_of};
use crate::types::{BoxGeometry, BoxSize, FrameBatch, FrameShape, PixelSpec, SampleLog};
use bon::bon;
use ndarray::{Array3, Array4, Axis, Zip, concatenate, s, stack};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How long raw box contents are kept around.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Retention {
    /// Keep every raw value; the aggregation can be changed at any time.
    #[default]
    Raw,
    /// Keep at most `max_raw_frames` frames of raw values. Older entries are
    /// reduced with the aggregation configured at that moment and their raw
    /// values dropped.
    Bounded { max_raw_frames: usize },
    /// Reduce every batch as it arrives and keep only the result.
    Eager,
}

/// One log entry: `(num_pixels, N, box_area, C)` raw values, or
/// `(num_pixels, N, C)` once reduced.
#[derive(Debug, Clone)]
pub enum BoxEntry<A> {
    Raw(Array4<A>),
    Aggregated(Array3<f64>),
}

impl<A> BoxEntry<A> {
    pub fn frames(&self) -> usize {
        match self {
            BoxEntry::Raw(raw) => raw.len_of(Axis(1)),
            BoxEntry::Aggregated(values) => values.len_of(Axis(1)),
        }
    }
}

impl<A> BoxEntry<A>
where
    A: Copy + Into<f64> + Send + Sync,
{
    fn aggregate(&self, aggregation: &Aggregation) -> Array3<f64> {
        match self {
            BoxEntry::Raw(raw) => reduce_boxes(raw, aggregation),
            BoxEntry::Aggregated(values) => values.clone(),
        }
    }
}

/// Collapse the box-interior axis of `(num_pixels, N, box_area, C)` values.
fn reduce_boxes<A>(raw: &Array4<A>, aggregation: &Aggregation) -> Array3<f64>
where
    A: Copy + Into<f64> + Send + Sync,
{
    Zip::from(raw.lanes(Axis(2))).par_map_collect(|lane| aggregation.apply(lane))
}

/// Collects the contents of fixed boxes around a set of pixels.
///
/// Raw box contents are retained and reduced only when `extract` is called,
/// so the reduction can be swapped after the stream has been consumed. The
/// `Retention` policy bounds how much raw data is held.
#[derive(Debug, Clone)]
pub struct BoxSampler<A> {
    pixels: PixelSpec,
    geometry: BoxGeometry,
    aggregation: Aggregation,
    retention: Retention,
    frame_shape: Option<FrameShape>,
    log: SampleLog<BoxEntry<A>>,
    total_frames: usize,
}

#[bon]
impl<A> BoxSampler<A> {
    /// Create a sampler with boxes of `box_size` centered on `pixels`.
    ///
    /// # Arguments
    /// * `pixels` - Box centers, in output order
    /// * `box_size` - `(box_height, box_width)` of every box
    /// * `aggregation` - Reduction used by `extract` (mean by default)
    /// * `retention` - Raw data retention policy (`Retention::Raw` by default)
    /// * `frame_size` - Optional frame geometry checked against the boxes up front
    #[builder]
    pub fn new(
        pixels: PixelSpec,
        box_size: BoxSize,
        #[builder(default)] aggregation: Aggregation,
        #[builder(default)] retention: Retention,
        frame_size: Option<FrameShape>,
    ) -> Result<Self> {
        if let Retention::Bounded { max_raw_frames: 0 } = retention {
            return Err(ProcessorError::InvalidConfig(
                "bounded retention needs room for at least one frame".to_string(),
            ));
        }

        let geometry = BoxGeometry::new(&pixels, box_size)?;
        if let Some(frame) = &frame_size {
            geometry.check_within(frame)?;
        }

        Ok(Self {
            pixels,
            geometry,
            aggregation,
            retention,
            frame_shape: frame_size,
            log: SampleLog::new(),
            total_frames: 0,
        })
    }

    pub fn pixels(&self) -> &PixelSpec {
        &self.pixels
    }

    pub fn geometry(&self) -> &BoxGeometry {
        &self.geometry
    }

    pub fn aggregation(&self) -> &Aggregation {
        &self.aggregation
    }

    /// Replace the reduction used by later calls to `extract`.
    pub fn set_aggregation(&mut self, aggregation: Aggregation) {
        self.aggregation = aggregation;
    }

    pub fn retention(&self) -> Retention {
        self.retention
    }

    pub fn frame_shape(&self) -> Option<FrameShape> {
        self.frame_shape
    }

    pub fn frame_count(&self) -> usize {
        self.total_frames
    }

    /// Frames whose raw box contents are still held.
    pub fn raw_frames(&self) -> usize {
        self.log
            .iter()
            .filter(|entry| matches!(entry, BoxEntry::Raw(_)))
            .map(BoxEntry::frames)
            .sum()
    }

    pub fn log(&self) -> &SampleLog<BoxEntry<A>> {
        &self.log
    }
}

impl<A> BoxSampler<A>
where
    A: Copy + Into<f64> + Send + Sync,
{
    /// Capture the boxes of every frame in `batch` and return the frame count.
    pub fn update(&mut self, batch: &FrameBatch<'_, A>) -> Result<usize> {
        let shape = frame_shape_of(batch, self.frame_shape)?;
        if self.frame_shape.is_none() {
            self.geometry.check_within(&shape)?;
        }

        let n = batch.frame_count();
        if n == 0 {
            return Ok(0);
        }

        use rayon::prelude::*;

        let frames = batch.frames()?;
        let area = self.geometry.area();
        let boxes = self
            .geometry
            .regions()
            .par_iter()
            .map(|region| -> Result<Array3<A>> {
                let window = frames.slice(s![.., region.row_range(), region.col_range(), ..]);
                let values = window.to_shape((n, area, shape.channels))?.into_owned();
                Ok(values)
            })
            .collect::<Result<Vec<_>>>()?;
        let views: Vec<_> = boxes.iter().map(|b| b.view()).collect();
        let raw = stack(Axis(0), &views)?;

        let entry = match self.retention {
            Retention::Eager => BoxEntry::Aggregated(reduce_boxes(&raw, &self.aggregation)),
            Retention::Raw | Retention::Bounded { .. } => BoxEntry::Raw(raw),
        };
        self.log.push(entry);
        self.frame_shape = Some(shape);
        self.total_frames += n;

        if let Retention::Bounded { max_raw_frames } = self.retention {
            self.compact(max_raw_frames);
        }

        debug!(
            "box sampler captured {} frames ({} in total, {} raw)",
            n,
            self.total_frames,
            self.raw_frames()
        );
        Ok(n)
    }

    /// Reduce the oldest raw entries until at most `max_raw_frames` remain raw.
    fn compact(&mut self, max_raw_frames: usize) {
        let mut raw_frames = self.raw_frames();
        for entry in self.log.iter_mut() {
            if raw_frames <= max_raw_frames {
                break;
            }
            if let BoxEntry::Raw(_) = entry {
                raw_frames -= entry.frames();
                *entry = BoxEntry::Aggregated(entry.aggregate(&self.aggregation));
            }
        }
    }

    /// Reduce everything collected so far with the configured aggregation.
    ///
    /// The result has shape `(num_pixels, total_frames, C)`.
    pub fn extract(&self) -> Result<Array3<f64>> {
        self.extract_with(&self.aggregation)
    }

    /// Like `extract`, with a one-off aggregation. Entries already reduced
    /// under a bounded or eager retention keep their earlier reduction.
    pub fn extract_with(&self, aggregation: &Aggregation) -> Result<Array3<f64>> {
        if self.log.is_empty() {
            return Err(ProcessorError::DivisionUndefined(
                "no boxes have been sampled yet",
            ));
        }
        let reduced: Vec<Array3<f64>> = self
            .log
            .iter()
            .map(|entry| entry.aggregate(aggregation))
            .collect();
        let views: Vec<_> = reduced.iter().map(|r| r.view()).collect();
        Ok(concatenate(Axis(1), &views)?)
    }
}

impl<A> StreamProcessor<A> for BoxSampler<A>
where
    A: Copy + Into<f64> + Send + Sync,
{
    fn process(&mut self, batch: &FrameBatch<'_, A>) -> Result<usize> {
        self.update(batch)
    }
}
