//! Wall-clock adapter.
//!
//! Attempt timestamps are persisted and may be read back by another process,
//! so time is reported as milliseconds since the Unix epoch.
//!
//! Tests use `MockClock` from `crate::infrastructure::mocks`, available with
//! the `test-helpers` feature:
//!
//! ```toml
//! [dev-dependencies]
//! storefront-forms = { version = "*", features = ["test-helpers"] }
//! ```

use crate::application::ports::Clock;
use chrono::{Local, NaiveDate};
use std::time::{SystemTime, UNIX_EPOCH};

/// Clock backed by `SystemTime::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a new system clock.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        // a clock set before 1970 reads as the epoch
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0)
    }
}

/// Today's date in the local timezone, used for card expiry checks.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}
