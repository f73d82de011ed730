//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the application
//! layer needs. Infrastructure adapters implement these ports, and tests swap
//! in doubles from `infrastructure::mocks`.

use serde_json::Value;
use std::fmt::Debug;

/// Error raised by a [`KeyValueStore`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The backing store cannot be reached (disabled, private mode, ...)
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    /// The store refused the write because it is full
    #[error("storage quota exceeded for key `{key}`")]
    QuotaExceeded {
        /// Key that could not be written
        key: String,
    },
}

/// Port for obtaining the current wall-clock time.
///
/// Timestamps are persisted, so the clock reports epoch milliseconds rather
/// than a monotonic instant. Infrastructure provides `SystemClock`; tests use
/// `MockClock`.
pub trait Clock: Send + Sync + Debug {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;
}

/// Port for string key-value persistence, the shape of browser local storage.
///
/// Implementations are shared between limiters, so they take `&self` and
/// handle their own synchronization.
pub trait KeyValueStore: Send + Sync + Debug {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// Error returned by a [`Submitter`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("submission failed: {message}")]
pub struct SubmitError {
    /// Description from the downstream service
    pub message: String,
}

impl SubmitError {
    /// Create a submission error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Port for the external collaborator that receives a validated, sanitized
/// payload (an order API, a newsletter service, a login endpoint).
pub trait Submitter {
    /// Response produced by the collaborator.
    type Output;

    /// Hand over the payload.
    fn submit(&mut self, payload: Value) -> Result<Self::Output, SubmitError>;
}

impl<F, O> Submitter for F
where
    F: FnMut(Value) -> Result<O, SubmitError>,
{
    type Output = O;

    fn submit(&mut self, payload: Value) -> Result<O, SubmitError> {
        self(payload)
    }
}
