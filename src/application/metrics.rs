//! Counters describing rate limiter behavior.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking rate limiter decisions.
///
/// Cloning shares the counters, so several limiters can report into one set.
#[derive(Debug, Clone, Default)]
pub struct LimiterMetrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    attempts_allowed: AtomicU64,
    attempts_blocked: AtomicU64,
    storage_failures: AtomicU64,
}

impl LimiterMetrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_allowed(&self) {
        self.inner.attempts_allowed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_blocked(&self) {
        self.inner.attempts_blocked.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_storage_failure(&self) {
        self.inner.storage_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Attempts that were allowed and recorded.
    pub fn attempts_allowed(&self) -> u64 {
        self.inner.attempts_allowed.load(Ordering::Relaxed)
    }

    /// Attempts rejected because the window was full.
    pub fn attempts_blocked(&self) -> u64 {
        self.inner.attempts_blocked.load(Ordering::Relaxed)
    }

    /// Reads or writes that failed and were treated as empty history.
    pub fn storage_failures(&self) -> u64 {
        self.inner.storage_failures.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            attempts_allowed: self.attempts_allowed(),
            attempts_blocked: self.attempts_blocked(),
            storage_failures: self.storage_failures(),
        }
    }
}

/// A point-in-time snapshot of limiter metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub attempts_allowed: u64,
    pub attempts_blocked: u64,
    pub storage_failures: u64,
}

impl MetricsSnapshot {
    /// Share of attempts that were blocked (0.0 to 1.0).
    ///
    /// Returns 0.0 if no attempts have been made.
    #[allow(clippy::cast_precision_loss)]
    pub fn block_rate(&self) -> f64 {
        let total = self.attempts_allowed.saturating_add(self.attempts_blocked);
        if total == 0 {
            0.0
        } else {
            self.attempts_blocked as f64 / total as f64
        }
    }
}
