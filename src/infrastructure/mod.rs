//! Infrastructure layer - adapters for the application ports.
//!
//! This layer provides:
//! - Wall clock (system time vs mock)
//! - In-process key-value storage (sharded map)

pub mod clock;
pub mod storage;

/// Test doubles for the ports.
///
/// Only available with the `test-helpers` feature or in test builds. Add to
/// your `Cargo.toml`:
/// ```toml
/// [dev-dependencies]
/// storefront-forms = { version = "*", features = ["test-helpers"] }
/// ```
#[cfg(any(test, feature = "test-helpers"))]
pub mod mocks;
