//! Mock clock for testing.

use crate::application::ports::Clock;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Controllable clock reporting epoch milliseconds.
///
/// All clones share the same time value, so a clone handed to a limiter can
/// be advanced from the test body.
///
/// # Examples
///
/// ```
/// use storefront_forms::infrastructure::mocks::MockClock;
/// use storefront_forms::application::ports::Clock;
/// use std::time::Duration;
///
/// let clock = MockClock::new(1_700_000_000_000);
/// let shared = clock.clone();
///
/// shared.advance(Duration::from_secs(10));
/// assert_eq!(clock.now_millis(), 1_700_000_010_000);
///
/// clock.set(42);
/// assert_eq!(shared.now_millis(), 42);
/// ```
#[derive(Debug, Clone)]
pub struct MockClock {
    current_millis: Arc<Mutex<u64>>,
}

impl MockClock {
    /// Create a mock clock starting at `start_millis` since the epoch.
    pub fn new(start_millis: u64) -> Self {
        Self {
            current_millis: Arc::new(Mutex::new(start_millis)),
        }
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, duration: Duration) {
        let step = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        let mut now = self
            .current_millis
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock");
        *now = now.saturating_add(step);
    }

    /// Set the clock to a specific epoch millisecond, possibly backwards.
    pub fn set(&self, millis: u64) {
        *self
            .current_millis
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock") =
            millis;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clock for MockClock {
    fn now_millis(&self) -> u64 {
        *self
            .current_millis
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock")
    }
}
