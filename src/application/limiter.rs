//! Named sliding-window rate limiter for sensitive form submissions.
//!
//! Each limiter owns one key in a [`KeyValueStore`] holding a JSON array of
//! epoch-millisecond attempt timestamps. The limiter is a UX throttle, not a
//! security boundary: storage failures and corrupt records are logged and
//! treated as an empty history, so `check` and `attempt` never fail.
//!
//! Two processes (browser tabs) sharing a store may race between reading
//! "allowed" and writing the new attempt; the last write wins.

use crate::application::metrics::LimiterMetrics;
use crate::application::ports::{Clock, KeyValueStore};
use crate::domain::window::{AttemptWindow, RateLimitStatus};
use crate::infrastructure::clock::SystemClock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Prefix prepended to limiter names to form storage keys.
pub const DEFAULT_KEY_PREFIX: &str = "ratelimit_";

/// Error returned when a limiter configuration is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// Maximum attempts must be greater than zero
    #[error("max_attempts must be greater than 0")]
    ZeroMaxAttempts,
    /// Window must be at least one millisecond
    #[error("window must be at least 1ms")]
    ZeroWindow,
    /// Limiter names become storage keys and must be non-empty identifiers
    #[error("invalid limiter name `{0}`: use letters, digits, `-` or `_`")]
    InvalidName(String),
}

/// Attempt budget for one limiter.
///
/// Deserializes from `{"maxAttempts": 5, "windowMs": 900000}` so hosts can
/// keep limits in their own configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitConfig {
    /// Attempts allowed per window
    pub max_attempts: u32,
    /// Sliding window length
    #[serde(rename = "windowMs", with = "window_millis")]
    pub window: Duration,
}

mod window_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(window: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(window.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

impl RateLimitConfig {
    /// Create a config allowing `max_attempts` per `window`.
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
        }
    }

    /// Login form: 5 attempts per 15 minutes.
    pub fn login() -> Self {
        Self::new(5, Duration::from_secs(15 * 60))
    }

    /// Checkout submission: 3 attempts per 5 minutes.
    pub fn checkout() -> Self {
        Self::new(3, Duration::from_secs(5 * 60))
    }

    /// Newsletter signup: 3 attempts per hour.
    pub fn newsletter() -> Self {
        Self::new(3, Duration::from_secs(60 * 60))
    }

    /// Check the config describes a usable window.
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.max_attempts == 0 {
            return Err(BuildError::ZeroMaxAttempts);
        }
        if self.window.as_millis() == 0 {
            return Err(BuildError::ZeroWindow);
        }
        Ok(())
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::login()
    }
}

fn validate_name(name: &str) -> Result<(), BuildError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(BuildError::InvalidName(name.to_string()))
    }
}

/// Builder for constructing a [`RateLimiter`].
#[derive(Debug)]
pub struct RateLimiterBuilder {
    name: String,
    config: RateLimitConfig,
    key_prefix: String,
    clock: Option<Arc<dyn Clock>>,
    metrics: Option<LimiterMetrics>,
}

impl RateLimiterBuilder {
    /// Start building a limiter named `name` with the login budget.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: RateLimitConfig::default(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            clock: None,
            metrics: None,
        }
    }

    /// Replace the whole attempt budget.
    pub fn with_config(mut self, config: RateLimitConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the number of attempts allowed per window.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.config.max_attempts = max_attempts;
        self
    }

    /// Set the sliding window length.
    pub fn with_window(mut self, window: Duration) -> Self {
        self.config.window = window;
        self
    }

    /// Namespace storage keys with a custom prefix.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Use a custom clock (tests use `MockClock`).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Report into a shared metrics instance.
    pub fn with_metrics(mut self, metrics: LimiterMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the limiter on top of `store`.
    ///
    /// # Errors
    /// Returns `BuildError` for an empty budget, a zero window or a name that
    /// cannot be used as a storage key.
    pub fn build<S: KeyValueStore>(self, store: S) -> Result<RateLimiter<S>, BuildError> {
        validate_name(&self.name)?;
        self.config.validate()?;

        Ok(RateLimiter {
            key: format!("{}{}", self.key_prefix, self.name),
            name: self.name,
            config: self.config,
            store,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock::new())),
            metrics: self.metrics.unwrap_or_default(),
        })
    }
}

/// A named, persisted sliding-window attempt counter.
#[derive(Debug, Clone)]
pub struct RateLimiter<S: KeyValueStore> {
    name: String,
    key: String,
    config: RateLimitConfig,
    store: S,
    clock: Arc<dyn Clock>,
    metrics: LimiterMetrics,
}

impl<S: KeyValueStore> RateLimiter<S> {
    /// Create a limiter with the system clock and default key prefix.
    ///
    /// # Errors
    /// See [`RateLimiterBuilder::build`].
    pub fn new(
        name: impl Into<String>,
        config: RateLimitConfig,
        store: S,
    ) -> Result<Self, BuildError> {
        RateLimiterBuilder::new(name).with_config(config).build(store)
    }

    /// Current window state. Never writes to storage.
    pub fn check(&self) -> RateLimitStatus {
        let now = self.clock.now_millis();
        self.load_window().status(now)
    }

    /// Record an attempt if the window allows it.
    ///
    /// Returns `false`, leaving storage untouched, when the window is full.
    pub fn attempt(&self) -> bool {
        let now = self.clock.now_millis();
        let mut window = self.load_window();

        if window.register_attempt(now).is_block() {
            self.metrics.record_blocked();
            debug!(limiter = %self.name, "attempt blocked by rate limiter");
            return false;
        }

        self.metrics.record_allowed();
        self.persist(&window);
        true
    }

    /// Forget every recorded attempt for this limiter.
    pub fn reset(&self) {
        if let Err(error) = self.store.remove(&self.key) {
            self.metrics.record_storage_failure();
            warn!(limiter = %self.name, %error, "failed to clear rate limit record");
        }
    }

    /// Limiter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Storage key holding this limiter's attempts.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Attempt budget.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Decision counters.
    pub fn metrics(&self) -> &LimiterMetrics {
        &self.metrics
    }

    fn load_window(&self) -> AttemptWindow {
        let timestamps = match self.store.get(&self.key) {
            Ok(Some(raw)) => self.parse_record(&raw),
            Ok(None) => Vec::new(),
            Err(error) => {
                self.metrics.record_storage_failure();
                warn!(
                    limiter = %self.name,
                    %error,
                    "rate limit storage unavailable, treating history as empty"
                );
                Vec::new()
            }
        };

        AttemptWindow::from_timestamps(self.config.max_attempts, self.config.window, timestamps)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn parse_record(&self, raw: &str) -> Vec<u64> {
        // timestamps written by other clients may be floats
        match serde_json::from_str::<Vec<f64>>(raw) {
            Ok(values) => values
                .into_iter()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| v as u64)
                .collect(),
            Err(error) => {
                self.metrics.record_storage_failure();
                warn!(
                    limiter = %self.name,
                    %error,
                    "corrupt rate limit record, treating history as empty"
                );
                Vec::new()
            }
        }
    }

    fn persist(&self, window: &AttemptWindow) {
        let timestamps: Vec<u64> = window.timestamps().collect();
        let result = serde_json::to_string(&timestamps)
            .map_err(|e| e.to_string())
            .and_then(|raw| {
                self.store
                    .set(&self.key, &raw)
                    .map_err(|e| e.to_string())
            });

        if let Err(error) = result {
            self.metrics.record_storage_failure();
            warn!(limiter = %self.name, %error, "failed to persist rate limit record");
        }
    }
}
