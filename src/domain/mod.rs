//! Domain layer - pure logic with no I/O.
//!
//! This layer contains the building blocks every form relies on:
//! - Display formatters and input masks
//! - Field validators, card brand detection and password strength
//! - Script-injection detection and HTML sanitizing
//! - Sliding-window attempt accounting
//!
//! All functions here are total: bad input produces an empty or negative
//! result, never a panic.

pub mod card;
pub mod format;
pub mod input;
pub mod sanitize;
pub mod validate;
pub mod window;
