//! Frame-rate bookkeeping for stream processors

use crate::error::{ProcessorError, Result};
use crate::utils::config::MonitorConfig;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{info, trace};

/// Bounded ring of `(elapsed_seconds, frame_count)` measurements, newest first.
#[derive(Debug, Clone)]
pub struct MonitorWindow {
    entries: VecDeque<(f64, u64)>,
    capacity: usize,
}

impl MonitorWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add a measurement, evicting the oldest one when full.
    pub fn push(&mut self, elapsed_seconds: f64, frames: u64) {
        if self.entries.len() == self.capacity {
            self.entries.pop_back();
        }
        self.entries.push_front((elapsed_seconds, frames));
    }

    /// Unweighted mean of the per-interval rates.
    pub fn average_rate(&self) -> Option<f64> {
        let rates: Vec<f64> = self
            .entries
            .iter()
            .filter(|(elapsed, _)| *elapsed > 0.0)
            .map(|&(elapsed, frames)| frames as f64 / elapsed)
            .collect();

        if rates.is_empty() {
            return None;
        }
        Some(rates.iter().sum::<f64>() / rates.len() as f64)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &(f64, u64)> + '_ {
        self.entries.iter()
    }
}

/// Tracks frame counts against wall-clock time.
///
/// Two rates are kept apart: `get_fps` is the lifetime average
/// `total_frames / runtime`, while `smoothed_fps` averages the rates of the
/// last `window` intervals of at least `monitor_freq` seconds each.
#[derive(Debug, Clone)]
pub struct ThroughputMonitor {
    config: MonitorConfig,
    start: Instant,
    last_report: Instant,
    runtime: Duration,
    total_frames: u64,
    pending_frames: u64,
    window: MonitorWindow,
    smoothed_fps: Option<f64>,
}

impl Default for ThroughputMonitor {
    fn default() -> Self {
        Self::starting_at(MonitorConfig::default(), Instant::now())
    }
}

impl ThroughputMonitor {
    pub fn new(config: MonitorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::starting_at(config, Instant::now()))
    }

    /// Monitor whose clock starts at `start`; pair with `record_at`.
    pub fn with_start(config: MonitorConfig, start: Instant) -> Result<Self> {
        config.validate()?;
        Ok(Self::starting_at(config, start))
    }

    fn starting_at(config: MonitorConfig, start: Instant) -> Self {
        let window = MonitorWindow::new(config.window);
        Self {
            config,
            start,
            last_report: start,
            runtime: Duration::ZERO,
            total_frames: 0,
            pending_frames: 0,
            window,
            smoothed_fps: None,
        }
    }

    /// Record a processed batch of `n_frames` now.
    ///
    /// Returns the new smoothed rate when this call closed a measurement interval.
    pub fn record(&mut self, n_frames: u64) -> Option<f64> {
        self.record_at(n_frames, Instant::now())
    }

    /// Record a processed batch of `n_frames` at the given instant.
    pub fn record_at(&mut self, n_frames: u64, now: Instant) -> Option<f64> {
        self.pending_frames += n_frames;
        self.total_frames += n_frames;
        self.runtime = now.saturating_duration_since(self.start);

        let delta = now.saturating_duration_since(self.last_report).as_secs_f64();
        if delta <= self.config.monitor_freq {
            return None;
        }

        self.window.push(delta, self.pending_frames);
        self.smoothed_fps = self.window.average_rate();
        if self.config.report {
            if let Some(fps) = self.smoothed_fps {
                trace!("avg fps: {:7.3}", fps);
            }
        }

        self.last_report = now;
        self.pending_frames = 0;
        self.smoothed_fps
    }

    /// Lifetime average rate.
    pub fn get_fps(&self) -> Result<f64> {
        let seconds = self.runtime.as_secs_f64();
        if seconds == 0.0 {
            return Err(ProcessorError::DivisionUndefined(
                "no time has elapsed since the monitor started",
            ));
        }
        Ok(self.total_frames as f64 / seconds)
    }

    /// Most recent windowed rate, if an interval has been closed yet.
    pub fn smoothed_fps(&self) -> Option<f64> {
        self.smoothed_fps
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Time between the start and the last recorded batch.
    pub fn runtime(&self) -> Duration {
        self.runtime
    }

    pub fn window(&self) -> &MonitorWindow {
        &self.window
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Lifetime summary line.
    pub fn summary(&self) -> Result<String> {
        Ok(format!(
            "{} frames processed in {} seconds (fps: {:7.3})",
            self.total_frames,
            self.runtime.as_secs_f64(),
            self.get_fps()?
        ))
    }

    /// Log the lifetime summary at info level, unless reporting is disabled.
    pub fn print_perf(&self) -> Result<()> {
        let summary = self.summary()?;
        if self.config.report {
            info!("{}", summary);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    fn monitor(start: Instant) -> ThroughputMonitor {
        ThroughputMonitor::with_start(MonitorConfig::default(), start).unwrap()
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut window = MonitorWindow::new(2);
        window.push(1.0, 10);
        window.push(1.0, 20);
        window.push(1.0, 40);

        assert_eq!(window.len(), 2);
        let frames: Vec<u64> = window.iter().map(|&(_, n)| n).collect();
        assert_eq!(frames, vec![40, 20]);
        assert_eq!(window.average_rate(), Some(30.0));
    }

    #[test]
    fn test_window_average_is_unweighted() {
        let mut window = MonitorWindow::new(10);
        window.push(1.0, 10); // 10 fps
        window.push(3.0, 90); // 30 fps

        // a weighted rate would be 100 / 4 = 25
        assert_eq!(window.average_rate(), Some(20.0));
        assert_eq!(MonitorWindow::new(3).average_rate(), None);
    }

    #[test]
    fn test_lifetime_fps() {
        let start = Instant::now();
        let mut m = monitor(start);

        m.record_at(50, start + secs(1.0));
        m.record_at(50, start + secs(2.0));

        assert_eq!(m.total_frames(), 100);
        assert!((m.get_fps().unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_fps_before_any_time_elapsed_is_undefined() {
        let start = Instant::now();
        let mut m = monitor(start);
        assert!(matches!(
            m.get_fps(),
            Err(ProcessorError::DivisionUndefined(_))
        ));

        m.record_at(10, start);
        assert!(m.get_fps().is_err());
        assert!(m.summary().is_err());
    }

    #[test]
    fn test_smoothed_rate_follows_cadence() {
        let start = Instant::now();
        let mut m = monitor(start);

        // below the 0.5 s cadence: only accumulated
        assert_eq!(m.record_at(5, start + secs(0.2)), None);
        assert_eq!(m.record_at(5, start + secs(0.4)), None);
        assert!(m.window().is_empty());

        // 20 frames over 1.0 s
        let fps = m.record_at(10, start + secs(1.0)).unwrap();
        assert!((fps - 20.0).abs() < 1e-9);

        // 30 frames over 1.0 s, averaged with the previous interval
        let fps = m.record_at(30, start + secs(2.0)).unwrap();
        assert!((fps - 25.0).abs() < 1e-9);
        assert_eq!(m.smoothed_fps(), Some(fps));
        assert_eq!(m.window().len(), 2);
    }

    #[test]
    fn test_configured_window_and_cadence() {
        let start = Instant::now();
        let config = MonitorConfig::builder()
            .monitor_freq(0.0)
            .window(1)
            .report(false)
            .build();
        let mut m = ThroughputMonitor::with_start(config, start).unwrap();

        assert!(m.record_at(10, start + secs(1.0)).is_some());
        let fps = m.record_at(40, start + secs(2.0)).unwrap();

        // only the newest interval survives a window of one
        assert!((fps - 40.0).abs() < 1e-9);
        assert!(m.print_perf().is_ok());
    }

    #[test]
    fn test_summary_format() {
        let start = Instant::now();
        let mut m = monitor(start);
        m.record_at(100, start + secs(2.0));

        assert_eq!(
            m.summary().unwrap(),
            "100 frames processed in 2 seconds (fps:  50.000)"
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = MonitorConfig::builder().window(0).build();
        assert!(ThroughputMonitor::new(config).is_err());
    }
}
