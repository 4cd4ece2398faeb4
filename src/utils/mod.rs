//! Monitoring and configuration utilities

pub mod config;
pub mod monitor;

// Re-export commonly used utilities for convenience
pub use config::{MonitorConfig, SamplerConfig};
pub use monitor::{MonitorWindow, ThroughputMonitor};
