//! Storage doubles that misbehave on purpose.

use crate::application::ports::{KeyValueStore, StoreError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Store whose every operation fails, like local storage in a locked-down
/// private window.
///
/// Counts calls so tests can assert the limiter kept working.
#[derive(Debug, Clone, Default)]
pub struct FailingStore {
    calls: Arc<AtomicUsize>,
}

impl FailingStore {
    /// Create a failing store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of operations attempted against this store (shared by clones).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn fail(&self) -> StoreError {
        self.calls.fetch_add(1, Ordering::Relaxed);
        StoreError::Unavailable("storage disabled".to_string())
    }
}

impl KeyValueStore for FailingStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(self.fail())
    }

    fn set(&self, key: &str, _value: &str) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Err(StoreError::QuotaExceeded {
            key: key.to_string(),
        })
    }

    fn remove(&self, _key: &str) -> Result<(), StoreError> {
        Err(self.fail())
    }
}
