//! Sliding-window attempt accounting.
//!
//! A window holds the epoch-millisecond timestamps of recent attempts and
//! answers whether another attempt fits. Attempts older than the window
//! duration are expired lazily whenever the window is consulted.

use std::collections::VecDeque;
use std::time::Duration;

/// Decision made for a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptDecision {
    /// The attempt fits in the window and was recorded
    Allow,
    /// The window is full; nothing was recorded
    Block,
}

impl AttemptDecision {
    /// Check if this decision is Allow.
    pub fn is_allow(&self) -> bool {
        matches!(self, AttemptDecision::Allow)
    }

    /// Check if this decision is Block.
    pub fn is_block(&self) -> bool {
        matches!(self, AttemptDecision::Block)
    }
}

/// Snapshot of a window at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    /// Whether one more attempt would be allowed
    pub allowed: bool,
    /// Attempts left before the window is full
    pub remaining: u32,
    /// Time until the oldest surviving attempt expires, zero when empty
    pub reset_in: Duration,
}

/// Sliding time window allowing up to `max_attempts` attempts per `window`.
///
/// # Example
/// ```
/// use storefront_forms::AttemptWindow;
/// use std::time::Duration;
///
/// let mut window = AttemptWindow::new(2, Duration::from_secs(60));
/// let now = 1_700_000_000_000;
///
/// assert!(window.register_attempt(now).is_allow());
/// assert!(window.register_attempt(now).is_allow());
/// assert!(window.register_attempt(now).is_block());
///
/// // a minute later the window has drained
/// assert!(window.register_attempt(now + 60_000).is_allow());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptWindow {
    max_attempts: u32,
    window: Duration,
    timestamps: VecDeque<u64>,
}

impl AttemptWindow {
    /// Create an empty window.
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            timestamps: VecDeque::new(),
        }
    }

    /// Rebuild a window from persisted timestamps (any order).
    pub fn from_timestamps(
        max_attempts: u32,
        window: Duration,
        timestamps: impl IntoIterator<Item = u64>,
    ) -> Self {
        let mut sorted: Vec<u64> = timestamps.into_iter().collect();
        sorted.sort_unstable();
        Self {
            max_attempts,
            window,
            timestamps: sorted.into(),
        }
    }

    fn window_millis(&self) -> u64 {
        u64::try_from(self.window.as_millis()).unwrap_or(u64::MAX)
    }

    /// Remove attempts that are at least one window old.
    pub fn expire_old_attempts(&mut self, now_ms: u64) {
        let window = self.window_millis();
        while let Some(&oldest) = self.timestamps.front() {
            if now_ms.saturating_sub(oldest) >= window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// Expire old attempts and report the window state.
    pub fn status(&mut self, now_ms: u64) -> RateLimitStatus {
        self.expire_old_attempts(now_ms);

        let count = u32::try_from(self.timestamps.len()).unwrap_or(u32::MAX);
        let reset_in = self
            .timestamps
            .front()
            .map(|&oldest| {
                Duration::from_millis(
                    oldest
                        .saturating_add(self.window_millis())
                        .saturating_sub(now_ms),
                )
            })
            .unwrap_or(Duration::ZERO);

        RateLimitStatus {
            allowed: count < self.max_attempts,
            remaining: self.max_attempts.saturating_sub(count),
            reset_in,
        }
    }

    /// Register an attempt at `now_ms`, recording it only when allowed.
    pub fn register_attempt(&mut self, now_ms: u64) -> AttemptDecision {
        if self.status(now_ms).allowed {
            self.timestamps.push_back(now_ms);
            AttemptDecision::Allow
        } else {
            AttemptDecision::Block
        }
    }

    /// Forget every recorded attempt.
    pub fn reset(&mut self) {
        self.timestamps.clear();
    }

    /// Recorded attempt timestamps, oldest first.
    pub fn timestamps(&self) -> impl Iterator<Item = u64> + '_ {
        self.timestamps.iter().copied()
    }

    /// Number of recorded attempts (including not yet expired ones).
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if no attempts are recorded.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}
