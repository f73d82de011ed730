//! Application layer - orchestration of domain logic.
//!
//! This layer turns the pure domain functions into form workflows:
//! - Schema evaluation and the predefined storefront schemas
//! - Persistent sliding-window rate limiting
//! - The submission guard (honeypot, injection scan, validation, throttling)
//! - The checkout wizard
//!
//! ## Ports
//!
//! The application layer defines ports (traits) for the clock, string
//! storage and the submission collaborator. Infrastructure adapters and test
//! doubles implement them.

pub mod checkout;
pub mod forms;
pub mod guard;
pub mod limiter;
pub mod metrics;
pub mod ports;
pub mod schema;
