//! Construction-time settings for monitors and samplers

use crate::error::{ProcessorError, Result};
use crate::processing::aggregation::Aggregation;
use crate::processing::box_sampler::{BoxSampler, Retention};
use crate::processing::pixel_sampler::PixelSampler;
use crate::types::{BoxSize, Coordinate, FrameShape, PixelSpec};
use bon::Builder;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MONITOR_FREQ: f64 = 0.5;
pub const DEFAULT_WINDOW: usize = 10;

/// Settings for a `ThroughputMonitor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct MonitorConfig {
    /// Seconds between two smoothed-rate measurements.
    #[builder(default = DEFAULT_MONITOR_FREQ)]
    pub monitor_freq: f64,
    /// Number of measurement intervals kept for the smoothed rate.
    #[builder(default = DEFAULT_WINDOW)]
    pub window: usize,
    /// Emit status lines through `tracing`.
    #[builder(default = true)]
    pub report: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            monitor_freq: DEFAULT_MONITOR_FREQ,
            window: DEFAULT_WINDOW,
            report: true,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.monitor_freq.is_finite() || self.monitor_freq < 0.0 {
            return Err(ProcessorError::InvalidConfig(format!(
                "monitor_freq must be a non-negative number of seconds, got {}",
                self.monitor_freq
            )));
        }
        if self.window == 0 {
            return Err(ProcessorError::InvalidConfig(
                "monitor window must hold at least one interval".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings for pixel and box samplers, loadable from JSON.
///
/// ```json
/// {
///   "pixels": [{"row": 10, "col": 12}, {"row": 40, "col": 3}],
///   "box_size": [5, 5],
///   "aggregation": "median",
///   "retention": {"mode": "bounded", "max_raw_frames": 1000},
///   "frame_size": {"height": 480, "width": 640, "channels": 3}
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    pub pixels: Vec<Coordinate>,
    #[serde(default)]
    pub box_size: Option<(usize, usize)>,
    #[serde(default)]
    pub aggregation: Aggregation,
    #[serde(default)]
    pub retention: Retention,
    #[serde(default)]
    pub frame_size: Option<FrameShape>,
}

impl SamplerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn pixel_spec(&self) -> Result<PixelSpec> {
        PixelSpec::new(self.pixels.iter().copied())
    }

    pub fn pixel_sampler<A>(&self) -> Result<PixelSampler<A>> {
        PixelSampler::builder()
            .pixels(self.pixel_spec()?)
            .maybe_frame_size(self.frame_size)
            .build()
    }

    /// Fails with `InvalidConfig` when no `box_size` is set.
    pub fn box_sampler<A>(&self) -> Result<BoxSampler<A>> {
        let box_size: BoxSize = self
            .box_size
            .ok_or_else(|| {
                ProcessorError::InvalidConfig("box sampler needs a box_size".to_string())
            })?
            .into();

        BoxSampler::builder()
            .pixels(self.pixel_spec()?)
            .box_size(box_size)
            .aggregation(self.aggregation.clone())
            .retention(self.retention)
            .maybe_frame_size(self.frame_size)
            .build()
    }
}
