//! Logger metrics for observability
//!
//! Counters for records written, filtered by level, and lost to sink
//! failures.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// # Example
///
/// ```
/// use rivet_log::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_written();
/// metrics.record_sink_failure();
///
/// assert_eq!(metrics.total_written(), 1);
/// assert_eq!(metrics.sink_failures(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Records delivered to every appender
    total_written: AtomicU64,

    /// Records below the minimum level
    filtered_count: AtomicU64,

    /// Individual appender failures
    sink_failures: AtomicU64,

    /// Faults forwarded to the fallback sink
    fallback_reports: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            total_written: AtomicU64::new(0),
            filtered_count: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
            fallback_reports: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn total_written(&self) -> u64 {
        self.total_written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered_count(&self) -> u64 {
        self.filtered_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sink_failures(&self) -> u64 {
        self.sink_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn fallback_reports(&self) -> u64 {
        self.fallback_reports.load(Ordering::Relaxed)
    }

    /// Record a fully delivered record
    #[inline]
    pub fn record_written(&self) -> u64 {
        self.total_written.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.filtered_count.fetch_add(1, Ordering::Relaxed)
    }

    /// Record an appender failure, returning the previous count
    #[inline]
    pub fn record_sink_failure(&self) -> u64 {
        self.sink_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_fallback_report(&self) -> u64 {
        self.fallback_reports.fetch_add(1, Ordering::Relaxed)
    }

    /// Sink failures as a percentage of all delivery attempts (0.0 - 100.0)
    pub fn failure_rate(&self) -> f64 {
        let failed = self.sink_failures() as f64;
        let total = self.total_written() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.total_written.store(0, Ordering::Relaxed);
        self.filtered_count.store(0, Ordering::Relaxed);
        self.sink_failures.store(0, Ordering::Relaxed);
        self.fallback_reports.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            total_written: AtomicU64::new(self.total_written()),
            filtered_count: AtomicU64::new(self.filtered_count()),
            sink_failures: AtomicU64::new(self.sink_failures()),
            fallback_reports: AtomicU64::new(self.fallback_reports()),
        }
    }
}
