//! # Frame Statistics
//!
//! Tracks how long frame updates take so strategies can be compared at
//! runtime. Keeps lifetime totals plus a ring buffer of recent samples for a
//! moving average.
//!
//! ```rust
//! use boids::performance::FrameStats;
//! use std::time::Duration;
//!
//! let mut stats = FrameStats::new();
//! stats.record(Duration::from_millis(4));
//! stats.record(Duration::from_millis(6));
//! assert_eq!(stats.frame_count(), 2);
//! assert_eq!(stats.recent_average(), Duration::from_millis(5));
//! ```

use std::collections::VecDeque;
use std::time::Duration;

/// Frame timing statistics
#[derive(Debug, Clone)]
pub struct FrameStats {
    /// Ring buffer of recent frame times for averaging
    frame_times: VecDeque<Duration>,
    /// Maximum number of frame times to keep for averaging
    max_samples: usize,
    frame_count: u64,
    total: Duration,
    last: Option<Duration>,
    min: Option<Duration>,
    max: Option<Duration>,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameStats {
    pub fn new() -> Self {
        Self::with_window(120)
    }

    /// Keep the last `max_samples` frames for the moving average
    pub fn with_window(max_samples: usize) -> Self {
        let max_samples = max_samples.max(1);
        Self {
            frame_times: VecDeque::with_capacity(max_samples),
            max_samples,
            frame_count: 0,
            total: Duration::ZERO,
            last: None,
            min: None,
            max: None,
        }
    }

    /// Record one frame's duration
    pub fn record(&mut self, frame_time: Duration) {
        if self.frame_times.len() >= self.max_samples {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(frame_time);

        self.frame_count += 1;
        self.total += frame_time;
        self.last = Some(frame_time);
        self.min = Some(self.min.map_or(frame_time, |m| m.min(frame_time)));
        self.max = Some(self.max.map_or(frame_time, |m| m.max(frame_time)));
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn last(&self) -> Option<Duration> {
        self.last
    }

    pub fn min(&self) -> Option<Duration> {
        self.min
    }

    pub fn max(&self) -> Option<Duration> {
        self.max
    }

    /// Average over the whole run
    pub fn average(&self) -> Duration {
        if self.frame_count > 0 {
            Duration::from_nanos((self.total.as_nanos() / self.frame_count as u128) as u64)
        } else {
            Duration::ZERO
        }
    }

    /// Average over the recent window
    pub fn recent_average(&self) -> Duration {
        if self.frame_times.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.frame_times.iter().sum();
        total / self.frame_times.len() as u32
    }

    /// Frames per second over the recent window
    pub fn frames_per_second(&self) -> f64 {
        let avg = self.recent_average().as_secs_f64();
        if avg > 0.0 {
            1.0 / avg
        } else {
            0.0
        }
    }

    pub fn reset(&mut self) {
        *self = Self::with_window(self.max_samples);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stats() {
        let stats = FrameStats::new();
        assert_eq!(stats.frame_count(), 0);
        assert_eq!(stats.average(), Duration::ZERO);
        assert_eq!(stats.frames_per_second(), 0.0);
        assert!(stats.last().is_none());
    }

    #[test]
    fn test_min_max_last() {
        let mut stats = FrameStats::new();
        for ms in [5, 2, 9, 4] {
            stats.record(Duration::from_millis(ms));
        }
        assert_eq!(stats.min(), Some(Duration::from_millis(2)));
        assert_eq!(stats.max(), Some(Duration::from_millis(9)));
        assert_eq!(stats.last(), Some(Duration::from_millis(4)));
        assert_eq!(stats.average(), Duration::from_millis(5));
    }

    #[test]
    fn test_window_drops_old_samples() {
        let mut stats = FrameStats::with_window(2);
        stats.record(Duration::from_millis(100));
        stats.record(Duration::from_millis(10));
        stats.record(Duration::from_millis(10));
        assert_eq!(stats.recent_average(), Duration::from_millis(10));
        assert_eq!(stats.frame_count(), 3);
        assert!((stats.frames_per_second() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_reset_keeps_window() {
        let mut stats = FrameStats::with_window(7);
        stats.record(Duration::from_millis(1));
        stats.reset();
        assert_eq!(stats.frame_count(), 0);
        assert_eq!(stats.max_samples, 7);
    }
}
