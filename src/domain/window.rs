//! Time-bounded rolling window of price samples.
//!
//! Keeps every sample whose timestamp lies strictly inside the trailing
//! window `(now - W, now]` and exposes the simple moving average of the
//! retained prices. "Now" is the timestamp of the most recent `observe`
//! call; callers pass wall-clock time and the window trusts it as given.

use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

pub const DEFAULT_WINDOW_SECS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSample {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

#[derive(Debug, Clone)]
pub struct RollingWindow {
    window: Duration,
    samples: VecDeque<PriceSample>,
}

impl RollingWindow {
    pub fn new(window: Duration) -> Self {
        RollingWindow {
            window,
            samples: VecDeque::new(),
        }
    }

    /// Window of `secs` seconds, saturating at the largest representable
    /// duration.
    pub fn from_secs(secs: i64) -> Self {
        Self::new(Duration::try_seconds(secs).unwrap_or(Duration::MAX))
    }

    /// Append a sample, then evict everything at or before `timestamp - W`.
    /// When `timestamp - W` lies before the earliest representable instant
    /// nothing is evicted.
    pub fn observe(&mut self, timestamp: DateTime<Utc>, price: f64) {
        self.samples.push_back(PriceSample { timestamp, price });
        if let Some(cutoff) = timestamp.checked_sub_signed(self.window) {
            self.samples.retain(|s| s.timestamp > cutoff);
        }
    }

    /// Arithmetic mean of the retained prices, `None` when empty.
    pub fn current_average(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: f64 = self.samples.iter().map(|s| s.price).sum();
        Some(sum / self.samples.len() as f64)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn samples(&self) -> impl Iterator<Item = &PriceSample> {
        self.samples.iter()
    }
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self::from_secs(DEFAULT_WINDOW_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_733_835_600 + secs, 0).unwrap()
    }

    #[test]
    fn empty_window_has_no_average() {
        let window = RollingWindow::default();
        assert!(window.is_empty());
        assert_eq!(window.current_average(), None);
    }

    #[test]
    fn single_sample_average_is_the_price() {
        let mut window = RollingWindow::default();
        window.observe(at(0), 100.0);
        assert_eq!(window.len(), 1);
        assert!((window.current_average().unwrap() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn average_of_samples_inside_window() {
        let mut window = RollingWindow::from_secs(60);
        window.observe(at(0), 10.0);
        window.observe(at(3), 20.0);
        window.observe(at(6), 30.0);
        assert_eq!(window.len(), 3);
        assert!((window.current_average().unwrap() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn evicts_samples_older_than_window() {
        let mut window = RollingWindow::from_secs(60);
        window.observe(at(0), 10.0);
        window.observe(at(30), 20.0);
        window.observe(at(61), 30.0);

        assert_eq!(window.len(), 2);
        assert!((window.current_average().unwrap() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sample_exactly_on_cutoff_is_evicted() {
        let mut window = RollingWindow::from_secs(60);
        window.observe(at(0), 10.0);
        window.observe(at(60), 30.0);

        assert_eq!(window.len(), 1);
        assert!((window.current_average().unwrap() - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn long_gap_leaves_only_latest_sample() {
        let mut window = RollingWindow::from_secs(60);
        for i in 0..10 {
            window.observe(at(i * 3), 100.0 + i as f64);
        }
        window.observe(at(1_000), 42.0);
        assert_eq!(window.len(), 1);
        assert_eq!(window.samples().next().unwrap().price, 42.0);
    }

    #[test]
    fn out_of_order_timestamps_are_trusted() {
        let mut window = RollingWindow::from_secs(60);
        window.observe(at(100), 10.0);
        // An older sample is appended and immediately measured against its
        // own timestamp, so the newer one survives.
        window.observe(at(90), 20.0);
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn window_duration_is_configurable() {
        let window = RollingWindow::from_secs(5);
        assert_eq!(window.window(), Duration::seconds(5));
    }

    #[test]
    fn oversized_window_keeps_everything() {
        let mut window = RollingWindow::from_secs(i64::MAX);
        assert_eq!(window.window(), Duration::MAX);

        window.observe(at(0), 10.0);
        window.observe(Utc::now(), 30.0);
        assert_eq!(window.len(), 2);
        assert!((window.current_average().unwrap() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn huge_window_does_not_overflow_cutoff() {
        let mut window = RollingWindow::from_secs(100_000_000_000_000);
        window.observe(at(0), 100.0);
        assert_eq!(window.len(), 1);
    }
}
