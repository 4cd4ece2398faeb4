//! Data types shared by the stream processors

pub mod box_geometry;
pub mod frame_batch;
pub mod pixel_spec;
pub mod sample_log;
pub mod statistics;

// Re-export the main types for convenience
pub use box_geometry::{BoxGeometry, BoxRegion, BoxSize};
pub use frame_batch::{FRAME_NDIM, FrameBatch, FrameShape};
pub use pixel_spec::{Coordinate, PixelSpec};
pub use sample_log::SampleLog;
pub use statistics::RunningStatistics;
