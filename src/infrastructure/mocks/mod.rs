//! Test doubles for the application ports.

pub mod clock;
pub mod layer;
pub mod store;

pub use clock::MockClock;
pub use layer::{CaptureLayer, CapturedEvent};
pub use store::FailingStore;
