//! Streaming processors for batches of image frames.
//!
//! A driver hands every batch to one or more processors. `OnlineStatistics`
//! keeps running moments without re-reading past frames, while `PixelSampler`
//! and `BoxSampler` copy fixed spatial regions out of each frame for later
//! extraction. A `ThroughputMonitor` can be attached to any of them through
//! `Monitored`.

pub mod error;
pub mod processing;
pub mod types;
pub mod utils;

pub use error::{ProcessorError, Result};
pub use processing::{
    Aggregation, BoxSampler, Monitored, OnlineStatistics, PixelSampler, Processor, Retention,
    StreamProcessor,
};
pub use types::{
    BoxGeometry, BoxSize, Coordinate, FrameBatch, FrameShape, PixelSpec, RunningStatistics,
};
pub use utils::{MonitorConfig, SamplerConfig, ThroughputMonitor};
